// Service exports
pub mod cache;
pub mod firestore;
pub mod memory;
pub mod store;

pub use cache::CandidateCache;
pub use firestore::{FirestoreClient, FirestoreCollections, FirestoreOptions};
pub use memory::MemoryStore;
pub use store::{DonorStore, StoreError};
