use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::filters::matches_store_query;
use crate::models::{DonorQuery, DonorRecord, RecipientRecord, Role};
use crate::services::store::{DonorStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    // Insertion order doubles as query order, like a store without orderBy
    donors: Vec<DonorRecord>,
    recipients: Vec<RecipientRecord>,
    requests: u64,
}

impl MemoryState {
    fn id_taken(&self, id: &str) -> bool {
        self.donors.iter().any(|d| d.id == id) || self.recipients.iter().any(|r| r.id == id)
    }

    fn donor_mut(&mut self, id: &str) -> Result<&mut DonorRecord, StoreError> {
        self.donors
            .iter_mut()
            .find(|d| d.id == id && d.role == Role::Donor)
            .ok_or_else(|| StoreError::NotFound(format!("donor {}", id)))
    }
}

/// In-process store for local runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing donors
    pub fn with_donors(donors: Vec<DonorRecord>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                donors,
                ..MemoryState::default()
            }),
        }
    }

    /// Seed the `requests` collection count
    pub async fn set_request_count(&self, requests: u64) {
        self.state.write().await.requests = requests;
    }

    fn assign_id(id: Option<&str>) -> String {
        match id {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().simple().to_string(),
        }
    }
}

#[async_trait]
impl DonorStore for MemoryStore {
    async fn query_donors(&self, query: &DonorQuery) -> Result<Vec<DonorRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .donors
            .iter()
            .filter(|donor| matches_store_query(donor, query))
            .cloned()
            .collect())
    }

    async fn get_donor(&self, id: &str) -> Result<DonorRecord, StoreError> {
        let state = self.state.read().await;
        state
            .donors
            .iter()
            .find(|d| d.id == id && d.role == Role::Donor)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("donor {}", id)))
    }

    async fn create_donor(
        &self,
        id: Option<&str>,
        mut donor: DonorRecord,
    ) -> Result<DonorRecord, StoreError> {
        let mut state = self.state.write().await;
        donor.id = Self::assign_id(id);
        if state.id_taken(&donor.id) {
            return Err(StoreError::AlreadyExists(donor.id));
        }
        state.donors.push(donor.clone());
        Ok(donor)
    }

    async fn create_recipient(
        &self,
        id: Option<&str>,
        mut recipient: RecipientRecord,
    ) -> Result<RecipientRecord, StoreError> {
        let mut state = self.state.write().await;
        recipient.id = Self::assign_id(id);
        if state.id_taken(&recipient.id) {
            return Err(StoreError::AlreadyExists(recipient.id));
        }
        state.recipients.push(recipient.clone());
        Ok(recipient)
    }

    async fn set_availability(&self, id: &str, is_available: bool) -> Result<(), StoreError> {
        self.state.write().await.donor_mut(id)?.is_available = is_available;
        Ok(())
    }

    async fn set_verified(&self, id: &str, is_verified: bool) -> Result<(), StoreError> {
        self.state.write().await.donor_mut(id)?.is_verified = is_verified;
        Ok(())
    }

    async fn set_last_donation_date(
        &self,
        id: &str,
        last_donation_date: Option<String>,
    ) -> Result<(), StoreError> {
        self.state.write().await.donor_mut(id)?.last_donation_date = last_donation_date;
        Ok(())
    }

    async fn count_donors(&self) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        Ok(state.donors.iter().filter(|d| d.role == Role::Donor).count() as u64)
    }

    async fn count_requests(&self) -> Result<u64, StoreError> {
        Ok(self.state.read().await.requests)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
