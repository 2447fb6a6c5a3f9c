use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DocumentError, DonorQuery, DonorRecord, PlatformStats, RecipientRecord};

/// Errors that can occur when talking to the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("store returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Document mapping failed: {0}")]
    Document(#[from] DocumentError),

    #[error("store query timed out after {0}s")]
    Timeout(u64),
}

/// Document store holding user accounts
///
/// `query_donors` is the first filtering stage: implementations must return
/// only donors matching every equality predicate in the query. Geometry and
/// eligibility are left to the matcher.
#[async_trait]
pub trait DonorStore: Send + Sync {
    async fn query_donors(&self, query: &DonorQuery) -> Result<Vec<DonorRecord>, StoreError>;

    async fn get_donor(&self, id: &str) -> Result<DonorRecord, StoreError>;

    /// Persist a new donor under `id`, or a store-assigned id when `None`
    async fn create_donor(
        &self,
        id: Option<&str>,
        donor: DonorRecord,
    ) -> Result<DonorRecord, StoreError>;

    async fn create_recipient(
        &self,
        id: Option<&str>,
        recipient: RecipientRecord,
    ) -> Result<RecipientRecord, StoreError>;

    async fn set_availability(&self, id: &str, is_available: bool) -> Result<(), StoreError>;

    async fn set_verified(&self, id: &str, is_verified: bool) -> Result<(), StoreError>;

    async fn set_last_donation_date(
        &self,
        id: &str,
        last_donation_date: Option<String>,
    ) -> Result<(), StoreError>;

    async fn count_donors(&self) -> Result<u64, StoreError>;

    async fn count_requests(&self) -> Result<u64, StoreError>;

    async fn stats(&self) -> Result<PlatformStats, StoreError> {
        Ok(PlatformStats {
            donors: self.count_donors().await?,
            requests: self.count_requests().await?,
        })
    }

    /// Backend name for health output
    fn backend(&self) -> &'static str;
}
