// vodfetch - Twitch VOD and clip downloader
// Copyright (C) 2025 vodfetch contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Error types for vodfetch
//!
//! Errors are defined with thiserror and categorized by domain (API,
//! manifest, download, assembly, filesystem). Every fatal kind aborts the
//! pipeline and surfaces a single user-facing error; nothing is silently
//! swallowed.

use thiserror::Error;

/// Result type alias using our VodError type
pub type Result<T> = std::result::Result<T, VodError>;

/// Main error type for vodfetch
#[derive(Error, Debug)]
pub enum VodError {
    // ===== Catalog/API Errors =====

    /// User, video or clip does not exist upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic API request failure
    #[error("API request failed: {message}")]
    ApiRequestFailed {
        message: String,
        /// HTTP status code if available
        status_code: Option<u16>,
        /// API endpoint that failed
        endpoint: Option<String>,
    },

    /// API returned invalid or unexpected response format
    #[error("Invalid API response: {0}")]
    InvalidApiResponse(String),

    // ===== Manifest Errors =====

    /// Playlist text could not be parsed
    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    /// Master manifest listed no renditions to choose from
    #[error("No renditions available in master manifest")]
    NoRenditionsAvailable,

    // ===== Download Errors =====

    /// Requested time window is invalid (end must be greater than start)
    #[error("Invalid time window: end ({end}s) must be greater than start ({start}s)")]
    InvalidTimeWindow { start: f64, end: f64 },

    /// One segment failed to download; fatal for the whole batch
    #[error("Segment fetch failed for '{locator}': {cause}")]
    SegmentFetchFailed { locator: String, cause: String },

    /// Temporary workspace directory could not be created
    #[error("Workspace unavailable at {path}: {cause}")]
    WorkspaceUnavailable { path: String, cause: String },

    // ===== Assembly Errors =====

    /// External concat tool exited with a failure status
    #[error("Assembly failed: {0}")]
    AssemblyFailed(String),

    /// FFmpeg binary not found in PATH
    #[error("FFmpeg not found. Please install FFmpeg and ensure it's in your PATH.")]
    FfmpegNotFound,

    // ===== General Errors =====

    /// Generic input validation error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    // ===== External Library Errors =====

    /// HTTP client error from reqwest
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

// Helper methods for creating common errors
impl VodError {
    /// Create a NotFound error with a resource description
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        VodError::NotFound(resource.into())
    }

    /// Create an InvalidInput error with a message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        VodError::InvalidInput(message.into())
    }

    /// Create an ApiRequestFailed error
    pub fn api_failed<S: Into<String>>(
        message: S,
        status_code: Option<u16>,
        endpoint: Option<String>,
    ) -> Self {
        VodError::ApiRequestFailed {
            message: message.into(),
            status_code,
            endpoint,
        }
    }

    /// Create a SegmentFetchFailed error
    pub fn segment_failed<S: Into<String>, C: ToString>(locator: S, cause: C) -> Self {
        VodError::SegmentFetchFailed {
            locator: locator.into(),
            cause: cause.to_string(),
        }
    }

    /// Create a WorkspaceUnavailable error from an I/O failure
    pub fn workspace_unavailable(path: &std::path::Path, cause: &std::io::Error) -> Self {
        VodError::WorkspaceUnavailable {
            path: path.display().to_string(),
            cause: cause.to_string(),
        }
    }

    /// Check if the error might succeed on retry (server faults, transport
    /// errors). Client errors, validation errors and missing resources are
    /// not retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            VodError::ApiRequestFailed {
                status_code: Some(500..=599),
                ..
            } => true,
            VodError::ReqwestError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Check if the error was caused by user input rather than an
    /// upstream or local fault
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            VodError::InvalidInput(_)
                | VodError::InvalidTimeWindow { .. }
                | VodError::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let server_fault = VodError::api_failed("bad gateway", Some(502), None);
        assert!(server_fault.is_retryable());

        let client_fault = VodError::api_failed("forbidden", Some(403), None);
        assert!(!client_fault.is_retryable());

        assert!(!VodError::NoRenditionsAvailable.is_retryable());
        assert!(!VodError::segment_failed("0.ts", "status 404").is_retryable());
    }

    #[test]
    fn test_user_error_classification() {
        assert!(VodError::InvalidTimeWindow { start: 5.0, end: 2.0 }.is_user_error());
        assert!(VodError::not_found("user bob").is_user_error());
        assert!(!VodError::AssemblyFailed("exit 1".into()).is_user_error());
    }

    #[test]
    fn test_display_messages() {
        let err = VodError::segment_failed("chunk/3.ts", "status 503");
        assert_eq!(
            err.to_string(),
            "Segment fetch failed for 'chunk/3.ts': status 503"
        );

        let err = VodError::InvalidTimeWindow { start: 10.0, end: 5.0 };
        assert!(err.to_string().contains("end (5s)"));
        assert!(err.to_string().contains("start (10s)"));
    }
}
