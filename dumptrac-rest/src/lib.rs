//! REST transport for the dumptrac backend (`/bins` and `/reports`).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use dumptrac_core::{
    backend::Backend,
    model::{Bin, NewBin, NewReport, Report, ReportId},
    ports::{BinPort, PortError, ReportPort},
};

/// Base URL of a locally running backend.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Bin and report ports backed by the JSON REST API.
pub struct RestBackend {
    client: Client,
    base_url: String,
}

impl RestBackend {
    /// Create a backend talking to `base_url` through the given HTTP client.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "backend request");
        self.client.request(method, format!("{}{path}", self.base_url))
    }
}

#[async_trait]
impl BinPort for RestBackend {
    async fn list_bins(&self) -> Result<Vec<Bin>, PortError> {
        fetch_json(self.request(Method::GET, "/bins")).await
    }

    async fn upsert_bin(&self, new_bin: &NewBin) -> Result<Bin, PortError> {
        fetch_json(self.request(Method::POST, "/bins").json(new_bin)).await
    }
}

#[async_trait]
impl ReportPort for RestBackend {
    async fn list_reports(&self) -> Result<Vec<Report>, PortError> {
        fetch_json(self.request(Method::GET, "/reports")).await
    }

    async fn create_report(&self, new_report: &NewReport) -> Result<Report, PortError> {
        fetch_json(self.request(Method::POST, "/reports").json(new_report)).await
    }

    async fn clear_report(&self, id: ReportId) -> Result<Report, PortError> {
        fetch_json(self.request(Method::PUT, &format!("/reports/{id}/clear"))).await
    }
}

/// Build the backend bundle for a REST endpoint.
#[must_use]
pub fn backend(client: Client, base_url: impl Into<String>) -> Backend {
    let rest = Arc::new(RestBackend::new(client, base_url));
    let name = rest.base_url().to_owned();
    Backend::from_shared(name, rest)
}

// Send a request and decode a JSON body, mapping non-success statuses to typed errors.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    let resp = req.send().await.map_err(|err| {
        tracing::warn!(error = %err, "backend unreachable");
        PortError::from(err)
    })?;

    let status = resp.status();
    if !status.is_success() {
        let err = status_error(status, resp).await;
        tracing::warn!(status = status.as_u16(), error = %err, "backend rejected request");
        return Err(err);
    }

    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| {
        tracing::warn!(error = %err, "backend response did not decode");
        PortError::InvalidResponse(format!("undecodable backend response: {err}"))
    })
}

async fn status_error(status: StatusCode, resp: Response) -> PortError {
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(status, &body);

    if status == StatusCode::NOT_FOUND {
        PortError::NotFound(message)
    } else {
        PortError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Prefers a string `detail` field, then the JSON itself, then the raw text,
/// and finally the status reason when the body is empty.
#[must_use]
pub fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        return match json.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(detail) => detail.to_string(),
            None => json.to_string(),
        };
    }

    if body.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| status.to_string(), str::to_owned)
    } else {
        body.to_owned()
    }
}
