// Core algorithm exports
pub mod distance;
pub mod eligibility;
pub mod filters;
pub mod matcher;
pub mod render;

pub use distance::{distance_km, haversine_distance, EARTH_RADIUS_KM};
pub use eligibility::{days_remaining, elapsed_days, is_eligible, parse_donation_date, EligibilityPolicy, ELIGIBILITY_WINDOW_DAYS};
pub use filters::{located, matches_store_query, passes_eligibility};
pub use matcher::{DonorMatcher, MatchError, MatchOutcome};
pub use render::{donor_card, match_card, search_results, DonorCard, SearchResults};
