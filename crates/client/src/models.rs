//! Response model for the clustering API.
//!
//! The service wraps every representation in a single top-level key named
//! after the resource (`{"cluster": {...}}`). `ApiResponse` keeps the raw
//! JSON and exposes typed accessors over the unwrapped record, plus the
//! action handle carried by the `Location` header of 202 responses.

use serde_json::Value;

use crate::error::{ClientError, Result};

/// Parsed response from a clustering API call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Location` header, present on asynchronous (202 Accepted) responses.
    pub location: Option<String>,
    /// Decoded JSON body, if any.
    pub body: Option<Value>,
}

impl ApiResponse {
    /// The representation underneath the single-key wrapper, or the body
    /// itself for unwrapped payloads (listings, version discovery).
    pub fn record(&self) -> Option<&Value> {
        let body = self.body.as_ref()?;
        if let Some(map) = body.as_object()
            && map.len() == 1
            && let Some(inner) = map.values().next()
            && (inner.is_object() || inner.is_array())
        {
            return Some(inner);
        }
        Some(body)
    }

    /// A named field of the record.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.record()?.get(name)
    }

    /// The record's `id`.
    pub fn id(&self) -> Result<String> {
        self.field("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClientError::InvalidResponse("missing 'id' in response body".to_string()))
    }

    /// The record's `status`, required on any polled representation.
    pub fn status_field(&self) -> Result<&str> {
        self.field("status")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::InvalidResponse("missing 'status' in response body".to_string())
            })
    }

    /// The record's `status_reason`, if the service provided one.
    pub fn status_reason(&self) -> Option<&str> {
        self.field("status_reason").and_then(Value::as_str)
    }

    /// Action id extracted from the `Location` header of a 202 response
    /// (`.../actions/<id>`).
    pub fn action_id(&self) -> Result<String> {
        let location = self.location.as_deref().ok_or_else(|| {
            ClientError::InvalidResponse(
                "missing Location header on asynchronous response".to_string(),
            )
        })?;
        location
            .split_once("/actions/")
            .map(|(_, id)| id.to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ClientError::InvalidResponse(format!("no action id in location '{location}'"))
            })
    }
}
