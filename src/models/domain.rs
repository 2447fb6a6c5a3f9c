use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build a coordinate, rejecting NaN and infinities
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, crate::core::MatchError> {
        let coordinate = Self::new(latitude, longitude);
        if coordinate.is_finite() {
            Ok(coordinate)
        } else {
            Err(crate::core::MatchError::InvalidCoordinate { latitude, longitude })
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    #[inline]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// ABO/Rh blood group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        BloodGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == normalized)
            .ok_or_else(|| format!("unknown blood group: {}", s))
    }
}

/// Account role stored on every user document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Recipient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Recipient => "recipient",
        }
    }
}

fn default_donor_role() -> Role {
    Role::Donor
}

/// Stored location; either half may be missing on legacy documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
        }
    }

    /// Both halves present and finite
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Coordinate::try_new(lat, lng).ok(),
            _ => None,
        }
    }
}

/// Donor document as stored in the `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_donor_role")]
    pub role: Role,
    #[serde(rename = "fullName", default)]
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "bloodGroup")]
    pub blood_group: BloodGroup,
    #[serde(rename = "lastDonationDate", default, skip_serializing_if = "Option::is_none")]
    pub last_donation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(rename = "isAvailable", default)]
    pub is_available: bool,
    #[serde(rename = "isVerified", default)]
    pub is_verified: bool,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl DonorRecord {
    /// Coordinate when both latitude and longitude are known
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.location.as_ref().and_then(Location::coordinate)
    }

    /// Last donation date, `None` when missing or unparseable
    pub fn last_donation(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.last_donation_date
            .as_deref()
            .and_then(crate::core::eligibility::parse_donation_date)
    }

    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// Recipient document as stored in the `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipientRecord {
    #[serde(default)]
    pub id: String,
    pub role: Role,
    #[serde(rename = "requesterName")]
    pub requester_name: String,
    #[serde(rename = "requesterPhone")]
    pub requester_phone: String,
    pub email: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// Donor annotated with its distance from the requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(flatten)]
    pub donor: DonorRecord,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

/// Equality predicates the store applies before the core sees candidates
#[derive(Debug, Clone, PartialEq)]
pub struct DonorQuery {
    pub blood_group: BloodGroup,
    pub is_available: bool,
    pub is_verified: bool,
}

impl DonorQuery {
    /// Available, verified donors of one blood group
    pub fn eligible_pool(blood_group: BloodGroup) -> Self {
        Self {
            blood_group,
            is_available: true,
            is_verified: true,
        }
    }
}

/// Headline counts shown on the landing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub donors: u64,
    pub requests: u64,
}
