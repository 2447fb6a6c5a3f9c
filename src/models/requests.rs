use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::BloodGroup;

/// Request to find nearby donors
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchDonorsRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    #[serde(alias = "blood_group", rename = "bloodGroup")]
    pub blood_group: BloodGroup,
    #[validate(range(min = 1, max = 200))]
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Donor signup; `userId` is the uid issued by the auth provider
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterDonorRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId", default)]
    pub user_id: Option<String>,
    #[validate(length(min = 1))]
    #[serde(alias = "full_name", rename = "fullName")]
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: String,
    #[serde(alias = "blood_group", rename = "bloodGroup")]
    pub blood_group: BloodGroup,
    #[serde(alias = "last_donation_date", rename = "lastDonationDate", default)]
    pub last_donation_date: Option<String>,
    #[serde(default)]
    pub disease: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

/// Recipient signup
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRecipientRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId", default)]
    pub user_id: Option<String>,
    #[validate(length(min = 1))]
    #[serde(alias = "requester_name", rename = "requesterName")]
    pub requester_name: String,
    #[validate(length(min = 1))]
    #[serde(alias = "requester_phone", rename = "requesterPhone")]
    pub requester_phone: String,
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAvailabilityRequest {
    #[serde(alias = "is_available", rename = "isAvailable")]
    pub is_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVerificationRequest {
    #[serde(alias = "is_verified", rename = "isVerified")]
    pub is_verified: bool,
}

/// `null` or an empty string clears the recorded date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLastDonationRequest {
    #[serde(alias = "last_donation_date", rename = "lastDonationDate", default)]
    pub last_donation_date: Option<String>,
}
