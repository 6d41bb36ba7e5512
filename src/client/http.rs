//! # HTTP Backend Client
//!
//! reqwest implementation of [`ShipmentBackend`] and [`JobBackend`]. Each
//! carrier call carries that carrier's bearer token; shipped-order and job
//! endpoints use the default token. Failures are returned as-is, there are
//! no automatic retries.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info};

use super::backend::{CreatedRecord, JobBackend, ShipmentBackend, SubmittedJob};
use crate::config::BackendConfig;
use crate::constants::Carrier;
use crate::error::{FreightError, FreightResult};
use crate::models::{
    CreateShippedOrder, FileRef, JobKind, JobStatus, ScrapeConfig, ShippedOrderPayload,
    ShippedOrderRecord,
};

pub struct HttpBackendClient {
    client: Client,
    base_url: Url,
    config: BackendConfig,
}

impl std::fmt::Debug for HttpBackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut carriers: Vec<&String> = self.config.carrier_tokens.keys().collect();
        carriers.sort();
        f.debug_struct("HttpBackendClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("carrier_tokens", &carriers)
            .field("default_token", &self.config.default_token.is_some())
            .finish()
    }
}

impl HttpBackendClient {
    pub fn new(config: BackendConfig) -> FreightResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            FreightError::ConfigurationError(format!(
                "Invalid base URL '{}': {}",
                config.base_url, e
            ))
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(format!("freight-booking-core/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                FreightError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            "Created HttpBackendClient for base_url: {}, timeout: {}ms",
            base_url, config.timeout_ms
        );

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> FreightResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| FreightError::ConfigurationError(format!("Invalid URL path {path}: {e}")))
    }

    fn carrier_endpoint(&self, carrier: Carrier, action: &str) -> FreightResult<Url> {
        self.endpoint(&format!("/api/carriers/{}/{action}", carrier.as_str()))
    }

    fn authorize(&self, request: RequestBuilder, carrier: Option<Carrier>) -> RequestBuilder {
        match self.config.token_for(carrier) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        carrier: Option<Carrier>,
        operation: &str,
    ) -> FreightResult<Response> {
        let response = self.authorize(request, carrier).send().await.map_err(|e| {
            error!(operation = %operation, error = %e, "Backend request failed");
            FreightError::NetworkError(format!("{operation} request failed: {e}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!(
            operation = %operation,
            status = %status,
            "Backend request rejected: {}",
            error_text
        );

        if status == StatusCode::NOT_FOUND {
            Err(FreightError::NotFoundError(format!(
                "{operation}: {status} - {error_text}"
            )))
        } else {
            Err(FreightError::NetworkError(format!(
                "{operation} failed: {status} - {error_text}"
            )))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, operation: &str) -> FreightResult<T> {
        response.json().await.map_err(|e| {
            FreightError::NetworkError(format!("{operation}: failed to parse response: {e}"))
        })
    }

    async fn carrier_call(
        &self,
        carrier: Carrier,
        action: &str,
        request: &Value,
    ) -> FreightResult<Value> {
        let url = self.carrier_endpoint(carrier, action)?;
        debug!(carrier = %carrier, action = %action, "Calling carrier endpoint {}", url);

        let response = self
            .send(self.client.post(url).json(request), Some(carrier), action)
            .await?;
        Self::parse(response, action).await
    }
}

fn file_part(file: &FileRef) -> FreightResult<Part> {
    Part::bytes(file.bytes.to_vec())
        .file_name(file.name.clone())
        .mime_str(&file.content_type)
        .map_err(|e| {
            FreightError::ValidationError(format!(
                "Attachment {} has an invalid content type: {e}",
                file.name
            ))
        })
}

/// Case-insensitive sku match, narrowed by marketplace order number
pub(crate) fn select_record(
    records: Vec<ShippedOrderRecord>,
    sku: &str,
    order_on_market_place: Option<&str>,
) -> Option<ShippedOrderRecord> {
    records.into_iter().find(|record| {
        record.sku.eq_ignore_ascii_case(sku)
            && order_on_market_place
                .map(|order| record.order_on_market_place == order)
                .unwrap_or(true)
    })
}

#[async_trait]
impl ShipmentBackend for HttpBackendClient {
    async fn create_shipped_order(&self, body: &CreateShippedOrder) -> FreightResult<CreatedRecord> {
        let url = self.endpoint("/api/shipped-orders")?;
        let response = self
            .send(self.client.post(url).json(body), None, "create_shipped_order")
            .await?;
        let created: CreatedRecord = Self::parse(response, "create_shipped_order").await?;

        info!(sku = %body.sku, record_id = created.id, "Shipped order created");
        Ok(created)
    }

    async fn update_shipped_order(
        &self,
        record_id: i64,
        payload: &ShippedOrderPayload,
        files: &[FileRef],
    ) -> FreightResult<()> {
        let url = self.endpoint(&format!("/api/shipped-orders/{record_id}"))?;

        let request = if files.is_empty() {
            self.client
                .put(url)
                .json(&serde_json::json!({ "ordersJsonb": payload }))
        } else {
            let mut form = Form::new().text(
                "ordersJsonb",
                serde_json::to_string(payload)?,
            );
            for file in files {
                form = form.part("files", file_part(file)?);
            }
            self.client.put(url).multipart(form)
        };

        self.send(request, None, "update_shipped_order").await?;
        info!(
            record_id = record_id,
            attachments = files.len(),
            "Shipped order updated"
        );
        Ok(())
    }

    async fn find_shipped_order(
        &self,
        sku: &str,
        order_on_market_place: Option<&str>,
    ) -> FreightResult<Option<ShippedOrderRecord>> {
        let mut url = self.endpoint("/api/shipped-orders")?;
        url.query_pairs_mut().append_pair("sku", sku);
        if let Some(order) = order_on_market_place {
            url.query_pairs_mut().append_pair("orderOnMarketPlace", order);
        }

        debug!("Looking up shipped order at: {}", url);
        let response = match self
            .send(self.client.get(url), None, "find_shipped_order")
            .await
        {
            Ok(response) => response,
            Err(FreightError::NotFoundError(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let records: Vec<ShippedOrderRecord> = Self::parse(response, "find_shipped_order").await?;
        Ok(select_record(records, sku, order_on_market_place))
    }

    async fn create_rate_quote(&self, carrier: Carrier, request: &Value) -> FreightResult<Value> {
        self.carrier_call(carrier, "rate-quote", request).await
    }

    async fn create_bill_of_lading(&self, carrier: Carrier, request: &Value) -> FreightResult<Value> {
        self.carrier_call(carrier, "bill-of-lading", request).await
    }

    async fn create_pickup_request(&self, carrier: Carrier, request: &Value) -> FreightResult<Value> {
        self.carrier_call(carrier, "pickup-request", request).await
    }

    async fn delete_order(&self, order_id: i64) -> FreightResult<()> {
        let url = self.endpoint(&format!("/api/orders/{order_id}"))?;
        self.send(self.client.delete(url), None, "delete_order").await?;
        info!(order_id = order_id, "Order deleted");
        Ok(())
    }
}

#[async_trait]
impl JobBackend for HttpBackendClient {
    async fn submit_import(&self, file: &FileRef) -> FreightResult<SubmittedJob> {
        let url = self.endpoint("/api/jobs/import")?;
        let form = Form::new().part("file", file_part(file)?);
        let response = self
            .send(self.client.post(url).multipart(form), None, "submit_import")
            .await?;
        Self::parse(response, "submit_import").await
    }

    async fn submit_scrape(&self, config: &ScrapeConfig) -> FreightResult<SubmittedJob> {
        let url = self.endpoint("/api/jobs/scrape")?;
        let response = self
            .send(self.client.post(url).json(config), None, "submit_scrape")
            .await?;
        Self::parse(response, "submit_scrape").await
    }

    async fn list_jobs(&self, kind: JobKind) -> FreightResult<Vec<JobStatus>> {
        let url = self.endpoint(&format!("/api/jobs/{kind}"))?;
        let response = self.send(self.client.get(url), None, "list_jobs").await?;
        let mut statuses: Vec<JobStatus> = Self::parse(response, "list_jobs").await?;
        for status in &mut statuses {
            status.kind = kind;
        }
        Ok(statuses)
    }
}
