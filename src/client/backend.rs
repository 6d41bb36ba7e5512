//! Collaborator interfaces the staging core talks to.
//!
//! Payloads for carrier calls are opaque JSON; only the shipped-order record
//! and job status shapes are interpreted here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::Carrier;
use crate::error::FreightResult;
use crate::models::{
    CreateShippedOrder, FileRef, JobKind, JobStatus, ScrapeConfig, ShippedOrderPayload,
    ShippedOrderRecord,
};

/// Response body of a create call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedJob {
    #[serde(alias = "id")]
    pub job_id: String,
}

/// Shipped-order persistence and carrier booking calls
#[async_trait]
pub trait ShipmentBackend: Send + Sync {
    async fn create_shipped_order(&self, body: &CreateShippedOrder) -> FreightResult<CreatedRecord>;

    /// Sends multipart when `files` is non-empty, JSON otherwise
    async fn update_shipped_order(
        &self,
        record_id: i64,
        payload: &ShippedOrderPayload,
        files: &[FileRef],
    ) -> FreightResult<()>;

    /// Case-insensitive exact match on `sku`, narrowed by marketplace order
    /// number when given
    async fn find_shipped_order(
        &self,
        sku: &str,
        order_on_market_place: Option<&str>,
    ) -> FreightResult<Option<ShippedOrderRecord>>;

    async fn create_rate_quote(&self, carrier: Carrier, request: &Value) -> FreightResult<Value>;

    async fn create_bill_of_lading(&self, carrier: Carrier, request: &Value) -> FreightResult<Value>;

    async fn create_pickup_request(&self, carrier: Carrier, request: &Value) -> FreightResult<Value>;

    /// Remove the originating marketplace order once booking is complete
    async fn delete_order(&self, order_id: i64) -> FreightResult<()>;
}

/// Long-running import and scrape jobs
#[async_trait]
pub trait JobBackend: Send + Sync {
    async fn submit_import(&self, file: &FileRef) -> FreightResult<SubmittedJob>;

    async fn submit_scrape(&self, config: &ScrapeConfig) -> FreightResult<SubmittedJob>;

    /// Status of every job of `kind` the collaborator knows about
    async fn list_jobs(&self, kind: JobKind) -> FreightResult<Vec<JobStatus>>;
}
