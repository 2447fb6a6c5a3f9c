// Model exports
pub mod document;
pub mod domain;
pub mod requests;
pub mod responses;

pub use document::{DocumentError, FirestoreDocument};
pub use domain::{BloodGroup, Coordinate, DonorQuery, DonorRecord, Location, MatchResult, PlatformStats, RecipientRecord, Role};
pub use requests::{RegisterDonorRequest, RegisterRecipientRequest, SearchDonorsRequest, UpdateAvailabilityRequest, UpdateLastDonationRequest, UpdateVerificationRequest};
pub use responses::{EligibilityResponse, ErrorResponse, HealthResponse};
