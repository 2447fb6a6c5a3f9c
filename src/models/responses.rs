use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

/// Eligibility badge data for one donor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityResponse {
    #[serde(rename = "donorId")]
    pub donor_id: String,
    pub eligible: bool,
    #[serde(rename = "daysRemaining")]
    pub days_remaining: Option<i64>,
    #[serde(rename = "lastDonationDate")]
    pub last_donation_date: Option<String>,
}
