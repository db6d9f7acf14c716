//! Backend API Client
//!
//! Typed JSON-over-HTTP client for the workflow persistence and record
//! APIs. All payloads are plain JSON; no custom wire formats. A bearer
//! token from the session store is attached when present.

use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::form::wizard::RemoteFieldError;
use crate::reconcile::ExternalRecord;
use crate::schema::WorkflowSchema;

use super::session;
use super::StoreError;

/// Request timeout for API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout for API calls.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of the remote validation round-trip.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<RemoteFieldError>,
}

/// HTTP client for the workflow and record backend.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client against the given base URL.
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Fetches a workflow schema by id.
    pub async fn get_workflow(&self, id: &str) -> Result<WorkflowSchema, StoreError> {
        self.get(&format!("/api/workflows/{}", id)).await
    }

    /// Lists workflows, optionally only active ones.
    pub async fn list_workflows(&self, active_only: bool) -> Result<Vec<WorkflowSchema>, StoreError> {
        let path = if active_only {
            "/api/workflows?active=true".to_string()
        } else {
            "/api/workflows".to_string()
        };
        self.get(&path).await
    }

    /// Creates a workflow; the server echoes the persisted schema.
    pub async fn create_workflow(
        &self,
        schema: &WorkflowSchema,
    ) -> Result<WorkflowSchema, StoreError> {
        self.post("/api/workflows", schema).await
    }

    /// Updates a workflow; the server echoes the persisted schema.
    pub async fn update_workflow(
        &self,
        id: &str,
        schema: &WorkflowSchema,
    ) -> Result<WorkflowSchema, StoreError> {
        self.put(&format!("/api/workflows/{}", id), schema).await
    }

    /// Deletes a workflow.
    pub async fn delete_workflow(&self, id: &str) -> Result<(), StoreError> {
        let url = format!("{}/api/workflows/{}", self.base_url, id);
        let response = Self::authorize(self.client.delete(url)).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Fetches a record for editing.
    pub async fn get_record(
        &self,
        workflow_id: &str,
        record_id: &str,
    ) -> Result<ExternalRecord, StoreError> {
        let raw: Value = self
            .get(&format!(
                "/api/workflows/{}/records/{}",
                workflow_id, record_id
            ))
            .await?;
        Ok(ExternalRecord::new(raw))
    }

    /// Runs server-side validation of a submission payload.
    pub async fn validate_record(
        &self,
        workflow_id: &str,
        payload: &serde_json::Map<String, Value>,
        is_update: bool,
    ) -> Result<ValidationOutcome, StoreError> {
        #[derive(Serialize)]
        struct ValidateRequest<'a> {
            payload: &'a serde_json::Map<String, Value>,
            is_update: bool,
        }

        self.post(
            &format!("/api/workflows/{}/validate", workflow_id),
            &ValidateRequest { payload, is_update },
        )
        .await
    }

    /// Creates a record; the server echoes the persisted record.
    pub async fn create_record(
        &self,
        workflow_id: &str,
        payload: &serde_json::Map<String, Value>,
    ) -> Result<ExternalRecord, StoreError> {
        let raw: Value = self
            .post(&format!("/api/workflows/{}/records", workflow_id), payload)
            .await?;
        Ok(ExternalRecord::new(raw))
    }

    /// Updates a record; the server echoes the persisted record.
    pub async fn update_record(
        &self,
        workflow_id: &str,
        record_id: &str,
        payload: &serde_json::Map<String, Value>,
    ) -> Result<ExternalRecord, StoreError> {
        let url = format!(
            "{}/api/workflows/{}/records/{}",
            self.base_url, workflow_id, record_id
        );
        let request = Self::authorize(self.client.put(url)).json(payload);
        let response = request.send().await?;
        let response = Self::check_status(response).await?;
        let raw: Value = response.json().await?;
        Ok(ExternalRecord::new(raw))
    }

    /// Generic GET returning a decoded JSON body.
    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = Self::authorize(self.client.get(&url)).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<R>().await?)
    }

    /// Generic POST returning a decoded JSON body.
    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = Self::authorize(self.client.post(&url)).json(body).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<R>().await?)
    }

    /// Generic PUT returning a decoded JSON body.
    async fn put<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PUT {}", url);

        let response = Self::authorize(self.client.put(&url)).json(body).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<R>().await?)
    }

    /// Attaches the session bearer token when one is set.
    fn authorize(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match session::current_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Maps non-2xx responses to `StoreError::Remote` with the body as
    /// the message.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        warn!("Request failed with status {}: {}", status, message);
        Err(StoreError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}
