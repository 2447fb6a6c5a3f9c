use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::models::document::{encode_record, encode_value};
use crate::models::{DonorQuery, DonorRecord, FirestoreDocument, RecipientRecord, Role};
use crate::services::store::{DonorStore, StoreError};

/// Collection IDs in Firestore
#[derive(Debug, Clone)]
pub struct FirestoreCollections {
    pub users: String,
    pub requests: String,
}

impl Default for FirestoreCollections {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            requests: "requests".to_string(),
        }
    }
}

/// Connection parameters for [`FirestoreClient`]
#[derive(Debug, Clone)]
pub struct FirestoreOptions {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub request_timeout: Duration,
    pub collections: FirestoreCollections,
}

/// Firestore REST API client
///
/// Handles all communication with the hosted document store:
/// - Querying donor pools with equality filters
/// - Creating donor and recipient documents
/// - Patching donor flags and dates
/// - Counting documents for the landing page stats
pub struct FirestoreClient {
    documents_url: String,
    api_key: Option<String>,
    bearer_token: Option<String>,
    client: Client,
    collections: FirestoreCollections,
}

/// One element of a `runQuery` response stream
#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct AggregationItem {
    #[serde(default)]
    result: Option<AggregationResult>,
}

#[derive(Debug, Deserialize)]
struct AggregationResult {
    #[serde(rename = "aggregateFields", default)]
    aggregate_fields: Map<String, Value>,
}

impl FirestoreClient {
    /// Create a new Firestore client
    pub fn new(options: FirestoreOptions) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(options.request_timeout).build()?;

        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            options.endpoint.trim_end_matches('/'),
            options.project_id,
            options.database_id
        );

        Ok(Self {
            documents_url,
            api_key: options.api_key.filter(|k| !k.is_empty()),
            bearer_token: options.bearer_token.filter(|t| !t.is_empty()),
            client,
            collections: options.collections,
        })
    }

    pub fn documents_url(&self) -> &str {
        &self.documents_url
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, urlencoding::encode(id))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key)]);
        }
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Map non-success statuses onto store errors
    async fn check(response: Response, what: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);

        match status {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(what.to_string())),
            StatusCode::CONFLICT => Err(StoreError::AlreadyExists(what.to_string())),
            _ => {
                tracing::error!("Firestore {} failed: {} - {}", what, status, message);
                Err(StoreError::ApiError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn equal(field: &str, value: Value) -> Value {
        json!({
            "fieldFilter": {
                "field": { "fieldPath": field },
                "op": "EQUAL",
                "value": encode_value(&value),
            }
        })
    }

    /// Structured query for the first filtering stage
    pub fn donor_query(&self, query: &DonorQuery) -> Value {
        json!({
            "from": [{ "collectionId": self.collections.users }],
            "where": {
                "compositeFilter": {
                    "op": "AND",
                    "filters": [
                        Self::equal("role", json!(Role::Donor.as_str())),
                        Self::equal("bloodGroup", json!(query.blood_group.as_str())),
                        Self::equal("isAvailable", json!(query.is_available)),
                        Self::equal("isVerified", json!(query.is_verified)),
                    ]
                }
            }
        })
    }

    async fn run_query(&self, structured_query: Value) -> Result<Vec<FirestoreDocument>, StoreError> {
        let url = format!("{}:runQuery", self.documents_url);
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "structuredQuery": structured_query }))
            .send()
            .await?;
        let response = Self::check(response, "runQuery").await?;

        let items: Vec<RunQueryItem> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("runQuery body: {}", e)))?;

        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    async fn run_count(&self, structured_query: Value) -> Result<u64, StoreError> {
        let url = format!("{}:runAggregationQuery", self.documents_url);
        let body = json!({
            "structuredAggregationQuery": {
                "structuredQuery": structured_query,
                "aggregations": [{ "alias": "count", "count": {} }]
            }
        });

        let response = self.request(Method::POST, &url).json(&body).send().await?;
        let response = Self::check(response, "runAggregationQuery").await?;

        let items: Vec<AggregationItem> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("aggregation body: {}", e)))?;

        let count = items
            .into_iter()
            .find_map(|item| item.result)
            .and_then(|result| result.aggregate_fields.get("count").cloned())
            .ok_or_else(|| StoreError::InvalidResponse("missing count aggregate".into()))?;

        match crate::models::document::decode_value(&count)? {
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| StoreError::InvalidResponse(format!("bad count: {}", n))),
            other => Err(StoreError::InvalidResponse(format!("bad count: {}", other))),
        }
    }

    async fn create_document(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<FirestoreDocument, StoreError> {
        let url = format!("{}/{}", self.documents_url, collection);
        let mut builder = self.request(Method::POST, &url);
        if let Some(id) = id {
            builder = builder.query(&[("documentId", id)]);
        }

        let response = builder.json(&json!({ "fields": fields })).send().await?;
        let what = format!("{}/{}", collection, id.unwrap_or("<auto>"));
        let response = Self::check(response, &what).await?;

        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("created document: {}", e)))
    }

    async fn fetch_user(&self, id: &str) -> Result<FirestoreDocument, StoreError> {
        let url = self.document_url(&self.collections.users, id);
        let response = self.request(Method::GET, &url).send().await?;
        let response = Self::check(response, &format!("donor {}", id)).await?;

        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(format!("donor document: {}", e)))
    }

    /// Fetch a user document, rejecting anything that is not a donor
    ///
    /// Recipients live in the same collection and lack donor fields.
    async fn fetch_donor_document(&self, id: &str) -> Result<FirestoreDocument, StoreError> {
        let doc = self.fetch_user(id).await?;
        let is_donor = doc
            .fields
            .get("role")
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str)
            == Some(Role::Donor.as_str());

        if !is_donor {
            return Err(StoreError::NotFound(format!("donor {}", id)));
        }
        Ok(doc)
    }

    /// Update only `field` on a donor; a `None` value deletes it
    ///
    /// The write is conditioned on the document's `updateTime`, so a document
    /// that changed role after the check is not touched.
    async fn patch_field(&self, id: &str, field: &str, value: Option<Value>) -> Result<(), StoreError> {
        let doc = self.fetch_donor_document(id).await?;
        let url = self.document_url(&self.collections.users, id);

        let mut fields = Map::new();
        if let Some(value) = value {
            fields.insert(field.to_string(), encode_value(&value));
        }

        let precondition = match &doc.update_time {
            Some(update_time) => ("currentDocument.updateTime", update_time.as_str()),
            None => ("currentDocument.exists", "true"),
        };

        let response = self
            .request(Method::PATCH, &url)
            .query(&[("updateMask.fieldPaths", field), precondition])
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        Self::check(response, &format!("donor {}", id)).await?;

        tracing::debug!("Patched {} on donor {}", field, id);
        Ok(())
    }
}

#[async_trait]
impl DonorStore for FirestoreClient {
    async fn query_donors(&self, query: &DonorQuery) -> Result<Vec<DonorRecord>, StoreError> {
        let documents = self.run_query(self.donor_query(query)).await?;
        let total = documents.len();

        let donors: Vec<DonorRecord> = documents
            .iter()
            .filter_map(|doc| match doc.decode::<DonorRecord>() {
                Ok(donor) => Some(donor),
                Err(e) => {
                    tracing::warn!("Skipping undecodable donor document {}: {}", doc.id(), e);
                    None
                }
            })
            .collect();

        tracing::debug!(
            "Queried {} donors for {} ({} documents returned)",
            donors.len(),
            query.blood_group,
            total
        );

        Ok(donors)
    }

    async fn get_donor(&self, id: &str) -> Result<DonorRecord, StoreError> {
        let doc = self.fetch_donor_document(id).await?;
        Ok(doc.decode()?)
    }

    async fn create_donor(
        &self,
        id: Option<&str>,
        donor: DonorRecord,
    ) -> Result<DonorRecord, StoreError> {
        let fields = encode_record(&donor)?;
        let doc = self
            .create_document(&self.collections.users, id, fields)
            .await?;
        tracing::debug!("Created donor document {}", doc.id());
        Ok(doc.decode()?)
    }

    async fn create_recipient(
        &self,
        id: Option<&str>,
        recipient: RecipientRecord,
    ) -> Result<RecipientRecord, StoreError> {
        let fields = encode_record(&recipient)?;
        let doc = self
            .create_document(&self.collections.users, id, fields)
            .await?;
        tracing::debug!("Created recipient document {}", doc.id());
        Ok(doc.decode()?)
    }

    async fn set_availability(&self, id: &str, is_available: bool) -> Result<(), StoreError> {
        self.patch_field(id, "isAvailable", Some(json!(is_available))).await
    }

    async fn set_verified(&self, id: &str, is_verified: bool) -> Result<(), StoreError> {
        self.patch_field(id, "isVerified", Some(json!(is_verified))).await
    }

    async fn set_last_donation_date(
        &self,
        id: &str,
        last_donation_date: Option<String>,
    ) -> Result<(), StoreError> {
        self.patch_field(id, "lastDonationDate", last_donation_date.map(Value::String))
            .await
    }

    async fn count_donors(&self) -> Result<u64, StoreError> {
        self.run_count(json!({
            "from": [{ "collectionId": self.collections.users }],
            "where": Self::equal("role", json!(Role::Donor.as_str())),
        }))
        .await
    }

    async fn count_requests(&self) -> Result<u64, StoreError> {
        self.run_count(json!({
            "from": [{ "collectionId": self.collections.requests }],
        }))
        .await
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}
