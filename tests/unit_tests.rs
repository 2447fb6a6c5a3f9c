// Unit tests for the LifeDrops matching core

use chrono::{DateTime, Duration, TimeZone, Utc};
use lifedrops::core::{
    distance::distance_km,
    eligibility::{days_remaining, is_eligible, parse_donation_date},
    DonorMatcher,
};
use lifedrops::models::{BloodGroup, Coordinate, DonorRecord, Location, Role};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap()
}

fn donor(id: &str, location: Option<Location>, last_donation_date: Option<String>) -> DonorRecord {
    DonorRecord {
        id: id.to_string(),
        role: Role::Donor,
        full_name: format!("Donor {}", id),
        phone: Some("+8801800000000".to_string()),
        email: None,
        blood_group: BloodGroup::APositive,
        last_donation_date,
        disease: None,
        location,
        city: None,
        area: None,
        is_available: true,
        is_verified: true,
        created_at: None,
    }
}

#[test]
fn test_distance_zero_for_same_point() {
    let points = [
        Coordinate::new(0.0, 0.0),
        Coordinate::new(23.8103, 90.4125),
        Coordinate::new(-33.8688, 151.2093),
        Coordinate::new(89.9, -179.9),
    ];

    for p in points {
        assert!(distance_km(p, p) < 1e-9, "distance({:?}, itself) should be 0", p);
    }
}

#[test]
fn test_distance_symmetric() {
    let a = Coordinate::new(51.5074, -0.1278);
    let b = Coordinate::new(-33.8688, 151.2093);

    assert_eq!(distance_km(a, b), distance_km(b, a));
    assert!(distance_km(a, b) > 0.0);
}

#[test]
fn test_dhaka_chittagong_regression() {
    let dhaka = Coordinate::new(23.8103, 90.4125);
    let chittagong = Coordinate::new(22.3569, 91.7832);

    let distance = distance_km(dhaka, chittagong);
    assert!((distance - 244.0).abs() <= 5.0, "Expected ~244km, got {}", distance);
}

#[test]
fn test_eligibility_boundaries() {
    assert!(is_eligible(None, now()));

    let ninety = now() - Duration::days(90);
    assert!(is_eligible(Some(ninety), now()));
    assert_eq!(days_remaining(Some(ninety), now()), None);

    let eighty_nine = now() - Duration::days(89);
    assert!(!is_eligible(Some(eighty_nine), now()));
    assert_eq!(days_remaining(Some(eighty_nine), now()), Some(1));
}

#[test]
fn test_malformed_date_is_eligible() {
    let record = donor("x", Some(Location::new(23.0, 90.0)), Some("31/12/2024".to_string()));

    assert_eq!(parse_donation_date("31/12/2024"), None);
    assert!(record.last_donation().is_none());
    assert!(is_eligible(record.last_donation(), now()));
}

#[test]
fn test_find_nearby_excludes_unlocated() {
    let matcher = DonorMatcher::with_default_policy();
    let requester = Coordinate::new(23.8103, 90.4125);

    let candidates = vec![
        donor("no-location", None, None),
        donor("lat-only", Some(Location { lat: Some(23.81), lng: None }), None),
        donor("lng-only", Some(Location { lat: None, lng: Some(90.41) }), None),
        donor("located", Some(Location::new(23.75, 90.39)), None),
    ];

    let results = matcher
        .find_nearby_donors(requester, BloodGroup::APositive, candidates, now())
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].donor.id, "located");
}

#[test]
fn test_find_nearby_sorted_non_decreasing() {
    let matcher = DonorMatcher::with_default_policy();
    let requester = Coordinate::new(23.8103, 90.4125);

    let candidates: Vec<DonorRecord> = (0..25)
        .map(|i| {
            // Scatter around the requester in a deterministic pattern
            let lat = 23.8103 + ((i * 7) % 11) as f64 * 0.05 - 0.25;
            let lng = 90.4125 + ((i * 5) % 13) as f64 * 0.04 - 0.24;
            donor(&i.to_string(), Some(Location::new(lat, lng)), None)
        })
        .collect();

    let results = matcher
        .find_nearby_donors(requester, BloodGroup::APositive, candidates, now())
        .unwrap();

    assert_eq!(results.len(), 25);
    for pair in results.windows(2) {
        assert!(pair[0].distance_km <= pair[1].distance_km, "Results not sorted by distance");
    }
}

#[test]
fn test_find_nearby_empty_pool() {
    let matcher = DonorMatcher::with_default_policy();
    let results = matcher
        .find_nearby_donors(Coordinate::new(0.0, 0.0), BloodGroup::ONegative, vec![], now())
        .unwrap();

    assert!(results.is_empty());
}

#[test]
fn test_find_nearby_mixed_eligibility() {
    let matcher = DonorMatcher::with_default_policy();
    let requester = Coordinate::new(23.8103, 90.4125);
    let km_north = |km: f64| Some(Location::new(23.8103 + km / 111.195, 90.4125));
    let recent = Some((now() - Duration::days(20)).format("%Y-%m-%d").to_string());
    let old = Some((now() - Duration::days(200)).format("%Y-%m-%d").to_string());

    let candidates = vec![
        donor("A", km_north(10.0), None),
        donor("B", km_north(5.0), recent),
        donor("C", km_north(20.0), old),
    ];

    let results = matcher
        .find_nearby_donors(requester, BloodGroup::APositive, candidates, now())
        .unwrap();

    let ids: Vec<_> = results.iter().map(|r| r.donor.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C"]);
}
