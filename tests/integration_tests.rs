// Integration tests for the LifeDrops HTTP API over the in-memory store

use actix_web::{http::StatusCode, test, web, App};
use chrono::{Duration, Utc};
use lifedrops::core::DonorMatcher;
use async_trait::async_trait;
use lifedrops::models::{BloodGroup, DonorQuery, DonorRecord, Location, RecipientRecord, Role};
use lifedrops::routes::{self, AppState};
use lifedrops::services::{CandidateCache, DonorStore, MemoryStore, StoreError};
use serde_json::{json, Value};
use std::sync::Arc;

fn create_donor(id: &str, group: BloodGroup, lat: f64, lng: f64, days_since_donation: Option<i64>) -> DonorRecord {
    DonorRecord {
        id: id.to_string(),
        role: Role::Donor,
        full_name: format!("Donor {}", id),
        phone: Some("+8801900000000".to_string()),
        email: Some(format!("{}@example.com", id)),
        blood_group: group,
        last_donation_date: days_since_donation
            .map(|days| (Utc::now() - Duration::days(days)).format("%Y-%m-%d").to_string()),
        disease: None,
        location: Some(Location::new(lat, lng)),
        city: None,
        area: None,
        is_available: true,
        is_verified: true,
        created_at: Some(1_700_000_000_000),
    }
}

fn seeded_store() -> Arc<MemoryStore> {
    let mut unverified = create_donor("unverified", BloodGroup::OPositive, 23.811, 90.413, None);
    unverified.is_verified = false;
    let mut unavailable = create_donor("unavailable", BloodGroup::OPositive, 23.811, 90.413, None);
    unavailable.is_available = false;
    let mut nowhere = create_donor("nowhere", BloodGroup::OPositive, 0.0, 0.0, None);
    nowhere.location = None;

    Arc::new(MemoryStore::with_donors(vec![
        create_donor("chittagong", BloodGroup::OPositive, 22.3569, 91.7832, Some(365)),
        create_donor("gulshan", BloodGroup::OPositive, 23.7925, 90.4078, None),
        create_donor("recent", BloodGroup::OPositive, 23.8110, 90.4130, Some(30)),
        create_donor("b-group", BloodGroup::BPositive, 23.8110, 90.4130, None),
        unverified,
        unavailable,
        nowhere,
    ]))
}

/// Takes its snapshot, then stalls before answering like a slow network round trip
struct SlowStore {
    inner: MemoryStore,
    delay: std::time::Duration,
}

#[async_trait]
impl DonorStore for SlowStore {
    async fn query_donors(&self, query: &DonorQuery) -> Result<Vec<DonorRecord>, StoreError> {
        let snapshot = self.inner.query_donors(query).await?;
        tokio::time::sleep(self.delay).await;
        Ok(snapshot)
    }

    async fn get_donor(&self, id: &str) -> Result<DonorRecord, StoreError> {
        self.inner.get_donor(id).await
    }

    async fn create_donor(&self, id: Option<&str>, donor: DonorRecord) -> Result<DonorRecord, StoreError> {
        self.inner.create_donor(id, donor).await
    }

    async fn create_recipient(
        &self,
        id: Option<&str>,
        recipient: RecipientRecord,
    ) -> Result<RecipientRecord, StoreError> {
        self.inner.create_recipient(id, recipient).await
    }

    async fn set_availability(&self, id: &str, is_available: bool) -> Result<(), StoreError> {
        self.inner.set_availability(id, is_available).await
    }

    async fn set_verified(&self, id: &str, is_verified: bool) -> Result<(), StoreError> {
        self.inner.set_verified(id, is_verified).await
    }

    async fn set_last_donation_date(&self, id: &str, date: Option<String>) -> Result<(), StoreError> {
        self.inner.set_last_donation_date(id, date).await
    }

    async fn count_donors(&self) -> Result<u64, StoreError> {
        self.inner.count_donors().await
    }

    async fn count_requests(&self) -> Result<u64, StoreError> {
        self.inner.count_requests().await
    }

    fn backend(&self) -> &'static str {
        "slow-memory"
    }
}

fn app_state(store: Arc<MemoryStore>, with_cache: bool) -> AppState {
    AppState {
        store,
        cache: with_cache.then(|| Arc::new(CandidateCache::new(16, 300))),
        matcher: DonorMatcher::with_default_policy(),
        query_timeout: std::time::Duration::from_secs(5),
    }
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(routes::configure_extractors)
                .configure(routes::configure_routes),
        )
        .await
    };
}

fn donor_ids(body: &Value) -> Vec<String> {
    body["donors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn test_search_returns_eligible_nearest_first() {
    let app = init_app!(app_state(seeded_store(), false));

    let req = test::TestRequest::post()
        .uri("/api/v1/donors/search")
        .set_json(json!({ "lat": 23.8103, "lng": 90.4125, "bloodGroup": "O+" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(donor_ids(&body), vec!["gulshan", "chittagong"]);
    assert_eq!(body["totalCandidates"], 4);
    assert_eq!(body["bloodGroup"], "O+");
    assert!(body["message"].is_null());

    let far = &body["donors"][1];
    let km = far["distanceKm"].as_f64().unwrap();
    assert!((km - 244.0).abs() < 5.0);
    assert_eq!(far["eligibility"]["status"], "eligible");
    assert_eq!(far["cityLabel"], "Dhaka, Bangladesh");
    assert!(far["distanceLabel"].as_str().unwrap().ends_with(" km away"));
}

#[actix_web::test]
async fn test_search_with_no_matches_has_message() {
    let app = init_app!(app_state(seeded_store(), false));

    let req = test::TestRequest::post()
        .uri("/api/v1/donors/search")
        .set_json(json!({ "lat": 23.8103, "lng": 90.4125, "bloodGroup": "AB-" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["donors"].as_array().unwrap().is_empty());
    assert_eq!(body["message"], "No eligible donors found nearby for this group.");
}

#[actix_web::test]
async fn test_search_rejects_bad_input() {
    let app = init_app!(app_state(seeded_store(), false));

    let out_of_range = test::TestRequest::post()
        .uri("/api/v1/donors/search")
        .set_json(json!({ "lat": 123.0, "lng": 90.4125, "bloodGroup": "O+" }))
        .to_request();
    let resp = test::call_service(&app, out_of_range).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_failed");

    let not_a_number = test::TestRequest::post()
        .uri("/api/v1/donors/search")
        .set_json(json!({ "lat": "north", "lng": 90.4125, "bloodGroup": "O+" }))
        .to_request();
    let resp = test::call_service(&app, not_a_number).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
    assert_eq!(body["statusCode"], 400);
}

#[actix_web::test]
async fn test_search_limit() {
    let app = init_app!(app_state(seeded_store(), false));

    let req = test::TestRequest::post()
        .uri("/api/v1/donors/search")
        .set_json(json!({ "lat": 23.8103, "lng": 90.4125, "bloodGroup": "O+", "limit": 1 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(donor_ids(&body), vec!["gulshan"]);
}

#[actix_web::test]
async fn test_register_verify_then_match() {
    let store = Arc::new(MemoryStore::new());
    let app = init_app!(app_state(store.clone(), true));

    let req = test::TestRequest::post()
        .uri("/api/v1/donors")
        .set_json(json!({
            "userId": "uid-42",
            "fullName": "  Farhana  ",
            "phone": "+8801711111111",
            "email": "farhana@example.com",
            "bloodGroup": "A-",
            "lastDonationDate": "",
            "lat": 23.78,
            "lng": 90.40
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["id"], "uid-42");
    assert_eq!(created["fullName"], "Farhana");
    assert_eq!(created["isVerified"], false);
    assert!(created.get("lastDonationDate").is_none());

    let search = || {
        test::TestRequest::post()
            .uri("/api/v1/donors/search")
            .set_json(json!({ "lat": 23.8103, "lng": 90.4125, "bloodGroup": "A-" }))
            .to_request()
    };

    // Unverified donors are filtered out by the store query
    let body: Value = test::call_and_read_body_json(&app, search()).await;
    assert!(donor_ids(&body).is_empty());

    let verify = test::TestRequest::patch()
        .uri("/api/v1/donors/uid-42/verification")
        .set_json(json!({ "isVerified": true }))
        .to_request();
    let resp = test::call_service(&app, verify).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // The write invalidated the cached empty pool
    let body: Value = test::call_and_read_body_json(&app, search()).await;
    assert_eq!(donor_ids(&body), vec!["uid-42"]);

    let recent = (Utc::now() - Duration::days(10)).format("%Y-%m-%d").to_string();
    let donated = test::TestRequest::patch()
        .uri("/api/v1/donors/uid-42/last-donation")
        .set_json(json!({ "lastDonationDate": recent }))
        .to_request();
    assert_eq!(test::call_service(&app, donated).await.status(), StatusCode::NO_CONTENT);

    let body: Value = test::call_and_read_body_json(&app, search()).await;
    assert!(donor_ids(&body).is_empty());

    let eligibility = test::TestRequest::get()
        .uri("/api/v1/donors/uid-42/eligibility")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, eligibility).await;
    assert_eq!(body["eligible"], false);
    assert_eq!(body["daysRemaining"], 80);
    assert_eq!(body["lastDonationDate"], recent);
}

#[actix_web::test]
async fn test_availability_toggle() {
    let store = seeded_store();
    let app = init_app!(app_state(store.clone(), true));

    let req = test::TestRequest::patch()
        .uri("/api/v1/donors/gulshan/availability")
        .set_json(json!({ "isAvailable": false }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    assert!(!store.get_donor("gulshan").await.unwrap().is_available);

    let missing = test::TestRequest::patch()
        .uri("/api/v1/donors/ghost/availability")
        .set_json(json!({ "isAvailable": true }))
        .to_request();
    let resp = test::call_service(&app, missing).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_register_recipient_and_duplicate() {
    let app = init_app!(app_state(Arc::new(MemoryStore::new()), false));

    let body = json!({
        "userId": "uid-7",
        "requesterName": "Hasan",
        "requesterPhone": "+8801555555555",
        "email": "hasan@example.com"
    });

    let req = test::TestRequest::post().uri("/api/v1/recipients").set_json(&body).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["role"], "recipient");

    let again = test::TestRequest::post().uri("/api/v1/recipients").set_json(&body).to_request();
    assert_eq!(test::call_service(&app, again).await.status(), StatusCode::CONFLICT);

    // Recipient ids are not donors on any donor route
    let patch = test::TestRequest::patch()
        .uri("/api/v1/donors/uid-7/availability")
        .set_json(json!({ "isAvailable": false }))
        .to_request();
    assert_eq!(test::call_service(&app, patch).await.status(), StatusCode::NOT_FOUND);

    let eligibility = test::TestRequest::get().uri("/api/v1/donors/uid-7/eligibility").to_request();
    assert_eq!(test::call_service(&app, eligibility).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_stats_and_health() {
    let store = seeded_store();
    store.set_request_count(3).await;
    let app = init_app!(app_state(store, false));

    let stats: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/stats").to_request(),
    )
    .await;
    assert_eq!(stats, json!({ "donors": 7, "requests": 3 }));

    let health: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/v1/health").to_request(),
    )
    .await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["store"], "memory");
}

#[actix_web::test]
async fn test_write_during_pool_fetch_is_not_cached() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::with_donors(vec![create_donor("x", BloodGroup::BNegative, 23.80, 90.41, None)]),
        delay: std::time::Duration::from_millis(200),
    });
    let app = init_app!(AppState {
        store,
        cache: Some(Arc::new(CandidateCache::new(16, 300))),
        matcher: DonorMatcher::with_default_policy(),
        query_timeout: std::time::Duration::from_secs(5),
    });

    let search = || {
        test::TestRequest::post()
            .uri("/api/v1/donors/search")
            .set_json(json!({ "lat": 23.8103, "lng": 90.4125, "bloodGroup": "B-" }))
            .to_request()
    };
    let opt_out = async {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let req = test::TestRequest::patch()
            .uri("/api/v1/donors/x/availability")
            .set_json(json!({ "isAvailable": false }))
            .to_request();
        test::call_service(&app, req).await.status()
    };

    let first_search = async {
        let body: Value = test::call_and_read_body_json(&app, search()).await;
        body
    };

    let (in_flight, patched) = tokio::join!(first_search, opt_out);

    // The search started before the write, so it may still see the donor
    assert_eq!(donor_ids(&in_flight), vec!["x"]);
    assert_eq!(patched, StatusCode::NO_CONTENT);

    let after: Value = test::call_and_read_body_json(&app, search()).await;
    assert!(donor_ids(&after).is_empty(), "unavailable donor served from a stale pool");
}
