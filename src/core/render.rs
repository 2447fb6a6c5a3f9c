//! Toolkit-neutral view model for donor listings.
//!
//! Everything a donor card shows is computed here, so the page only has to
//! lay the fields out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::eligibility::EligibilityPolicy;
use crate::core::matcher::MatchOutcome;
use crate::models::{BloodGroup, DonorRecord, MatchResult};

pub const NO_MATCHES_MESSAGE: &str = "No eligible donors found nearby for this group.";
pub const DEFAULT_CITY_LABEL: &str = "Dhaka, Bangladesh";
pub const NO_AREA_LABEL: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EligibilityBadge {
    Eligible,
    NotEligible {
        #[serde(rename = "daysLeft")]
        days_left: i64,
    },
}

impl EligibilityBadge {
    pub fn label(&self) -> String {
        match self {
            EligibilityBadge::Eligible => "Eligible".to_string(),
            EligibilityBadge::NotEligible { days_left } => {
                format!("Not eligible ({} days left)", days_left)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityBadge {
    Available,
    Unavailable,
}

/// One donor card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorCard {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "bloodGroup")]
    pub blood_group: BloodGroup,
    #[serde(rename = "distanceKm")]
    pub distance_km: Option<f64>,
    #[serde(rename = "distanceLabel")]
    pub distance_label: String,
    #[serde(rename = "lastDonationLabel")]
    pub last_donation_label: String,
    #[serde(rename = "cityLabel")]
    pub city_label: String,
    #[serde(rename = "areaLabel")]
    pub area_label: String,
    pub availability: AvailabilityBadge,
    pub eligibility: EligibilityBadge,
    #[serde(rename = "eligibilityLabel")]
    pub eligibility_label: String,
    pub phone: Option<String>,
    #[serde(rename = "contactVisible")]
    pub contact_visible: bool,
}

/// A rendered search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(rename = "bloodGroup")]
    pub blood_group: BloodGroup,
    pub donors: Vec<DonorCard>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    pub message: Option<String>,
}

pub fn donor_card(
    donor: &DonorRecord,
    distance_km: Option<f64>,
    policy: &EligibilityPolicy,
    now: DateTime<Utc>,
) -> DonorCard {
    let last_donation = donor.last_donation();
    let eligibility = match policy.days_remaining(last_donation, now) {
        None => EligibilityBadge::Eligible,
        Some(days_left) => EligibilityBadge::NotEligible { days_left },
    };

    let distance_km = distance_km.filter(|d| d.is_finite());
    let distance_label = match distance_km {
        Some(d) => format!("{:.2} km away", d),
        None => "Distance N/A".to_string(),
    };

    let display_name = match donor.full_name.trim() {
        "" => "Donor".to_string(),
        name => name.to_string(),
    };

    let last_donation_label = label_or(donor.last_donation_date.as_deref(), "N/A");

    let contact_visible = donor.has_phone();

    DonorCard {
        id: donor.id.clone(),
        display_name,
        blood_group: donor.blood_group,
        distance_km,
        distance_label,
        last_donation_label,
        city_label: label_or(donor.city.as_deref(), DEFAULT_CITY_LABEL),
        area_label: label_or(donor.area.as_deref(), NO_AREA_LABEL),
        availability: if donor.is_available {
            AvailabilityBadge::Available
        } else {
            AvailabilityBadge::Unavailable
        },
        eligibility,
        eligibility_label: eligibility.label(),
        phone: donor.phone.clone().filter(|_| contact_visible),
        contact_visible,
    }
}

fn label_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub fn match_card(result: &MatchResult, policy: &EligibilityPolicy, now: DateTime<Utc>) -> DonorCard {
    donor_card(&result.donor, Some(result.distance_km), policy, now)
}

pub fn search_results(
    outcome: &MatchOutcome,
    policy: &EligibilityPolicy,
    now: DateTime<Utc>,
) -> SearchResults {
    let donors: Vec<DonorCard> = outcome
        .matches
        .iter()
        .map(|result| match_card(result, policy, now))
        .collect();

    let message = donors.is_empty().then(|| NO_MATCHES_MESSAGE.to_string());

    SearchResults {
        blood_group: outcome.blood_group,
        donors,
        total_candidates: outcome.total_candidates,
        message,
    }
}
