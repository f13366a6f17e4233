//! Request and response bodies for the checklist endpoints.

use serde::{Deserialize, Serialize};

// === Upload ===

/// JSON body of `POST /api/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadRequest {
    /// The checklist payload, as an array or as JSON text.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Link to the rendered checklist.
    pub url: String,
}

// === Serverless-style store ===

/// Response of `POST /api/storeData`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDataResponse {
    /// Identifier the payload was stored under.
    pub id: String,
}

// === Shared ===

/// Query string carrying an entry identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdQuery {
    /// The identifier, exactly as sent.
    #[serde(default)]
    pub id: Option<String>,
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable message.
    pub error: String,
}

impl ErrorBody {
    /// Creates an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Service status report.
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    /// Always `"running"`.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    /// Name of the active store backend.
    pub store_backend: String,
    /// Payloads currently held.
    pub stored_entries: usize,
    /// Request counters.
    #[serde(flatten)]
    pub metrics: mobile_check_telemetry::MetricsSnapshot,
}
