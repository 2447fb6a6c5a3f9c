use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

use crate::core::{render, DonorMatcher};
use crate::error::ApiError;
use crate::models::{
    BloodGroup, Coordinate, DonorQuery, DonorRecord, EligibilityResponse, HealthResponse,
    Location, RecipientRecord, RegisterDonorRequest, RegisterRecipientRequest, Role,
    SearchDonorsRequest, UpdateAvailabilityRequest, UpdateLastDonationRequest,
    UpdateVerificationRequest,
};
use crate::services::{CandidateCache, DonorStore, StoreError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DonorStore>,
    pub cache: Option<Arc<CandidateCache>>,
    pub matcher: DonorMatcher,
    pub query_timeout: Duration,
}

impl AppState {
    /// First filtering stage: the store's equality query, cached per group
    async fn candidate_pool(&self, blood_group: BloodGroup) -> Result<Vec<DonorRecord>, StoreError> {
        if let Some(cache) = &self.cache {
            if let Some(pool) = cache.get(blood_group).await {
                return Ok(pool);
            }
        }

        let generation = self.cache.as_ref().map(|cache| cache.generation());
        let query = DonorQuery::eligible_pool(blood_group);
        let pool = tokio::time::timeout(self.query_timeout, self.store.query_donors(&query))
            .await
            .map_err(|_| StoreError::Timeout(self.query_timeout.as_secs()))??;

        if let (Some(cache), Some(generation)) = (&self.cache, generation) {
            cache.insert(blood_group, pool.clone(), generation).await;
        }

        Ok(pool)
    }

    fn invalidate_pools(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}

/// Configure all donor-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/stats", web::get().to(get_stats))
        .route("/donors/search", web::post().to(search_donors))
        .route("/donors", web::post().to(register_donor))
        .route("/recipients", web::post().to(register_recipient))
        .route("/donors/{id}/eligibility", web::get().to(get_eligibility))
        .route("/donors/{id}/availability", web::patch().to(update_availability))
        .route("/donors/{id}/last-donation", web::patch().to(update_last_donation))
        .route("/donors/{id}/verification", web::patch().to(update_verification));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        store: state.store.backend().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Donor and request counts
///
/// GET /api/v1/stats
async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let stats = state.store.stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Find nearby eligible donors
///
/// POST /api/v1/donors/search
///
/// Request body:
/// ```json
/// {
///   "lat": 23.8103,
///   "lng": 90.4125,
///   "bloodGroup": "O+",
///   "limit": 20
/// }
/// ```
async fn search_donors(
    state: web::Data<AppState>,
    req: web::Json<SearchDonorsRequest>,
) -> Result<HttpResponse, ApiError> {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return Err(errors.into());
    }

    let requester = Coordinate::try_new(req.lat, req.lng)?;
    let candidates = match state.candidate_pool(req.blood_group).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to query donors for {}: {}", req.blood_group, e);
            return Err(e.into());
        }
    };

    let now = Utc::now();
    let outcome = state.matcher.find_nearby_donors_with_stats(
        requester,
        req.blood_group,
        candidates,
        now,
        req.limit,
    )?;

    tracing::info!(
        "Returning {} donors for {} (from {} candidates)",
        outcome.matches.len(),
        req.blood_group,
        outcome.total_candidates
    );

    let results = render::search_results(&outcome, state.matcher.policy(), now);
    Ok(HttpResponse::Ok().json(results))
}

/// Donor signup
///
/// POST /api/v1/donors
async fn register_donor(
    state: web::Data<AppState>,
    req: web::Json<RegisterDonorRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    let donor = DonorRecord {
        id: String::new(),
        role: Role::Donor,
        full_name: req.full_name.trim().to_string(),
        phone: non_blank(req.phone),
        email: Some(req.email.trim().to_string()),
        blood_group: req.blood_group,
        last_donation_date: non_blank(req.last_donation_date),
        disease: non_blank(req.disease),
        location: Some(Location::new(req.lat, req.lng)),
        city: None,
        area: None,
        is_available: true,
        is_verified: false,
        created_at: Some(Utc::now().timestamp_millis()),
    };

    let created = state.store.create_donor(req.user_id.as_deref(), donor).await?;
    state.invalidate_pools();

    tracing::info!("Registered donor {} ({})", created.id, created.blood_group);
    Ok(HttpResponse::Created().json(created))
}

/// Recipient signup
///
/// POST /api/v1/recipients
async fn register_recipient(
    state: web::Data<AppState>,
    req: web::Json<RegisterRecipientRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    let recipient = RecipientRecord {
        id: String::new(),
        role: Role::Recipient,
        requester_name: req.requester_name.trim().to_string(),
        requester_phone: req.requester_phone.trim().to_string(),
        email: req.email.trim().to_string(),
        created_at: Some(Utc::now().timestamp_millis()),
    };

    let created = state
        .store
        .create_recipient(req.user_id.as_deref(), recipient)
        .await?;

    tracing::info!("Registered recipient {}", created.id);
    Ok(HttpResponse::Created().json(created))
}

/// Eligibility badge for one donor
///
/// GET /api/v1/donors/{id}/eligibility
async fn get_eligibility(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let donor = state.store.get_donor(&path).await?;
    let now = Utc::now();
    let policy = state.matcher.policy();
    let last_donation = donor.last_donation();

    Ok(HttpResponse::Ok().json(EligibilityResponse {
        donor_id: donor.id,
        eligible: policy.is_eligible(last_donation, now),
        days_remaining: policy.days_remaining(last_donation, now),
        last_donation_date: donor.last_donation_date,
    }))
}

/// PATCH /api/v1/donors/{id}/availability
async fn update_availability(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateAvailabilityRequest>,
) -> Result<HttpResponse, ApiError> {
    state.store.set_availability(&path, req.is_available).await?;
    state.invalidate_pools();

    tracing::info!("Donor {} availability set to {}", path, req.is_available);
    Ok(HttpResponse::NoContent().finish())
}

/// PATCH /api/v1/donors/{id}/last-donation
async fn update_last_donation(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateLastDonationRequest>,
) -> Result<HttpResponse, ApiError> {
    let date = non_blank(req.into_inner().last_donation_date);
    state.store.set_last_donation_date(&path, date).await?;
    state.invalidate_pools();

    tracing::info!("Donor {} last donation date updated", path);
    Ok(HttpResponse::NoContent().finish())
}

/// Set by the external verification process
///
/// PATCH /api/v1/donors/{id}/verification
async fn update_verification(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateVerificationRequest>,
) -> Result<HttpResponse, ApiError> {
    state.store.set_verified(&path, req.is_verified).await?;
    state.invalidate_pools();

    tracing::info!("Donor {} verification set to {}", path, req.is_verified);
    Ok(HttpResponse::NoContent().finish())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
