//! Traits describing the backend collaborator and the shared error taxonomy.

use async_trait::async_trait;
use reqwest::Error as ReqwestError;

use crate::model::{Bin, NewBin, NewReport, Report, ReportId};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while talking to the backend or validating input.
pub enum PortError {
    /// The backend could not be reached or its answer could not be read.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code.
        status: u16,
        /// Message supplied by the backend.
        message: String,
    },
    /// Required input was missing or malformed before a write.
    #[error("Invalid input: {0}")]
    Validation(String),
    /// The referenced report or bin does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The backend answered but the payload broke a lifecycle rule.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
/// Backend operations on the bin collection.
pub trait BinPort: Send + Sync {
    /// List every known bin.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    async fn list_bins(&self) -> Result<Vec<Bin>, PortError>;

    /// Create a bin for `new_bin.location`, or return the existing one
    /// unchanged when a bin with that exact location is already stored.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    async fn upsert_bin(&self, new_bin: &NewBin) -> Result<Bin, PortError>;
}

#[async_trait]
/// Backend operations on the report collection.
pub trait ReportPort: Send + Sync {
    /// List every report in backend order.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the backend request fails.
    async fn list_reports(&self) -> Result<Vec<Report>, PortError>;

    /// File a new report.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::NotFound`] when the bin does not exist, or another
    /// [`PortError`] when the backend request fails.
    async fn create_report(&self, new_report: &NewReport) -> Result<Report, PortError>;

    /// Mark a report as cleared.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::NotFound`] when the report does not exist, or another
    /// [`PortError`] when the backend request fails.
    async fn clear_report(&self, id: ReportId) -> Result<Report, PortError>;
}
