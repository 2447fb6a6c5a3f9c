use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::{
    distance::distance_km,
    eligibility::EligibilityPolicy,
    filters::{located, passes_eligibility},
};
use crate::models::{BloodGroup, Coordinate, DonorRecord, MatchResult};

/// Errors raised by the matching core
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MatchError {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub blood_group: BloodGroup,
    pub matches: Vec<MatchResult>,
    /// Size of the pool handed in by the store, before core-side filtering
    pub total_candidates: usize,
}

/// Nearest-eligible-donor matcher
///
/// # Pipeline Stages
/// 1. Store pre-filter (role, blood group, availability, verification), done
///    by the caller's `DonorStore` before candidates get here
/// 2. Drop candidates without a complete location
/// 3. Annotate each remaining candidate with its distance
/// 4. Drop candidates still inside the donation interval
/// 5. Stable sort, nearest first
#[derive(Debug, Clone, Default)]
pub struct DonorMatcher {
    policy: EligibilityPolicy,
    max_results: Option<usize>,
}

impl DonorMatcher {
    pub fn new(policy: EligibilityPolicy) -> Self {
        Self {
            policy,
            max_results: None,
        }
    }

    pub fn with_default_policy() -> Self {
        Self::default()
    }

    /// Cap every result list at `max_results`
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    /// Find eligible donors sorted by distance from the requester
    ///
    /// # Arguments
    /// * `requester` - Where the search is made from
    /// * `blood_group` - The group the candidate pool was narrowed to
    /// * `candidates` - Pool returned by the store query
    /// * `now` - Reference time for the eligibility rule
    ///
    /// An empty result means no match, not an error.
    pub fn find_nearby_donors(
        &self,
        requester: Coordinate,
        blood_group: BloodGroup,
        candidates: Vec<DonorRecord>,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchResult>, MatchError> {
        self.find_nearby_donors_with_stats(requester, blood_group, candidates, now, None)
            .map(|outcome| outcome.matches)
    }

    /// Same as [`find_nearby_donors`](Self::find_nearby_donors), also
    /// reporting the pool size and applying an optional per-call limit
    pub fn find_nearby_donors_with_stats(
        &self,
        requester: Coordinate,
        blood_group: BloodGroup,
        candidates: Vec<DonorRecord>,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<MatchOutcome, MatchError> {
        let requester = Coordinate::try_new(requester.latitude, requester.longitude)?;
        let total_candidates = candidates.len();

        let mut matches: Vec<MatchResult> = candidates
            .into_iter()
            // Stage 2 & 3: location + distance
            .filter_map(|donor| {
                let location = located(&donor)?;
                let distance_km = distance_km(requester, location);
                Some(MatchResult { donor, distance_km })
            })
            // Stage 4: donation interval
            .filter(|result| passes_eligibility(&result.donor, &self.policy, now))
            .collect();

        // Stage 5: sort_by is stable, so equal distances keep store order
        matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        let cap = match (limit, self.max_results) {
            (Some(limit), Some(max)) => Some(limit.min(max)),
            (limit, max) => limit.or(max),
        };
        if let Some(cap) = cap {
            matches.truncate(cap);
        }

        Ok(MatchOutcome {
            blood_group,
            matches,
            total_candidates,
        })
    }
}
