use chrono::{DateTime, Utc};

use crate::core::eligibility::EligibilityPolicy;
use crate::models::{Coordinate, DonorQuery, DonorRecord, Role};

/// Store-side pre-filter
///
/// The equality predicates a document store applies before candidates reach
/// the matcher: role, blood group, availability and verification. Remote
/// stores push these into their query; the in-memory store calls this.
#[inline]
pub fn matches_store_query(donor: &DonorRecord, query: &DonorQuery) -> bool {
    donor.role == Role::Donor
        && donor.blood_group == query.blood_group
        && donor.is_available == query.is_available
        && donor.is_verified == query.is_verified
}

/// Core-side location check
///
/// Returns the donor's coordinate only when both halves are present and finite.
#[inline]
pub fn located(donor: &DonorRecord) -> Option<Coordinate> {
    donor.coordinate()
}

/// Core-side eligibility check against an injected clock
#[inline]
pub fn passes_eligibility(
    donor: &DonorRecord,
    policy: &EligibilityPolicy,
    now: DateTime<Utc>,
) -> bool {
    policy.is_eligible(donor.last_donation(), now)
}
