//! JSON API calls and their envelopes.
//!
//! Requests name a call either in the `method` field of a JSON envelope or as
//! the last segment of a versioned path. Only calls listed in [`ApiCall`] are
//! dispatched.

use crate::service::BuildCatalogService;
use cm_buildlist::{BuildListError, DEFAULT_CHANNEL};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Envelope error for undecodable requests and unknown calls.
pub const DECODE_ERROR: &str = "Error decoding JSON";

/// Envelope error for requests without a device.
pub const MISSING_DEVICE: &str = "Missing parameter: device";

/// Envelope error when the build catalog could not be loaded.
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Message returned by every delta request.
pub const DELTA_NOT_FOUND: &str = "Unable to find delta";

/// Media type accepted for request bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Allow-list of callable API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCall {
    /// List every build of a device
    GetAllBuilds,
    /// Look up a delta between two incrementals
    GetDelta,
}

impl ApiCall {
    /// All dispatchable calls.
    pub const ALL: [Self; 2] = [Self::GetAllBuilds, Self::GetDelta];

    /// Wire name of the call.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetAllBuilds => "get_all_builds",
            Self::GetDelta => "get_delta",
        }
    }

    /// Look up a call by wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|call| call.name() == name)
    }
}

/// Decoded request envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiRequest {
    /// Call name (envelope endpoint only)
    pub method: Option<String>,
    /// Call parameters; anything but an object reads as no parameters
    #[serde(deserialize_with = "lenient_params")]
    pub params: ApiParams,
}

/// Parameters shared by all calls.
///
/// Values of an unexpected type are dropped rather than failing the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiParams {
    /// Device codename
    #[serde(deserialize_with = "lenient_string")]
    pub device: Option<String>,
    /// Requested channels, the first one is used
    #[serde(deserialize_with = "lenient_list")]
    pub channels: Vec<String>,
    /// Incremental the client runs (delta requests)
    #[serde(deserialize_with = "lenient_string")]
    pub source_incremental: Option<String>,
    /// Incremental the client wants (delta requests)
    #[serde(deserialize_with = "lenient_string")]
    pub target_incremental: Option<String>,
}

fn scalar_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_string(Value::deserialize(deserializer)?))
}

/// A list of strings, a single string, or nothing.
fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_string).collect(),
        other => scalar_string(other).into_iter().collect(),
    })
}

fn lenient_params<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ApiParams, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        params @ Value::Object(_) => ApiParams::deserialize(params).unwrap_or_default(),
        _ => ApiParams::default(),
    })
}

impl ApiParams {
    /// Channel to resolve builds for.
    #[must_use]
    pub fn channel(&self) -> &str {
        self.channels
            .first()
            .map_or(DEFAULT_CHANNEL, String::as_str)
    }

    /// Non-empty device codename.
    #[must_use]
    pub fn device(&self) -> Option<&str> {
        self.device.as_deref().filter(|device| !device.is_empty())
    }
}

impl ApiRequest {
    /// Decode a request body sent with the given `Content-Type` header.
    ///
    /// Returns `None` unless the media type is JSON and the body is a JSON
    /// object of the expected shape.
    #[must_use]
    pub fn decode(content_type: Option<&str>, body: &[u8]) -> Option<Self> {
        if !is_json_media_type(content_type?) {
            return None;
        }
        serde_json::from_slice(body).ok()
    }

    /// Resolve the call named in the envelope.
    #[must_use]
    pub fn call(&self) -> Option<ApiCall> {
        self.method.as_deref().and_then(ApiCall::from_name)
    }
}

/// Whether a `Content-Type` value names JSON, ignoring parameters.
#[must_use]
pub fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

/// Standard response envelope. All three fields are always serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    /// Request id, always `null`
    pub id: Value,
    /// Call result
    pub result: Option<Value>,
    /// Error message
    pub error: Option<String>,
}

impl ApiResponse {
    /// Successful envelope.
    #[must_use]
    pub const fn success(result: Value) -> Self {
        Self {
            id: Value::Null,
            result: Some(result),
            error: None,
        }
    }

    /// Failed envelope.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            id: Value::Null,
            result: None,
            error: Some(message.into()),
        }
    }
}

/// Envelope returned by delta lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeltaResponse {
    /// Lookup errors
    pub errors: Vec<ErrorMessage>,
}

/// Single error entry of a [`DeltaResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    /// Human readable message
    pub message: String,
}

impl DeltaResponse {
    /// The response for a delta that does not exist.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            errors: vec![ErrorMessage {
                message: DELTA_NOT_FOUND.to_string(),
            }],
        }
    }
}

/// Body produced by a dispatched call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallResponse {
    /// Standard `{id, result, error}` envelope
    Envelope(ApiResponse),
    /// Delta lookup `{errors}` envelope
    Delta(DeltaResponse),
}

/// Run a call against the catalog and return the body to send.
///
/// # Errors
///
/// Returns `BuildListError` if the catalog cannot be loaded.
pub fn execute(
    call: ApiCall,
    params: &ApiParams,
    service: &BuildCatalogService,
) -> Result<CallResponse, BuildListError> {
    let body = match call {
        ApiCall::GetAllBuilds => match params.device() {
            Some(device) => {
                let records = service
                    .all_builds(device, params.channel())?
                    .iter()
                    .map(|build| Value::Object(build.to_record()))
                    .collect();
                CallResponse::Envelope(ApiResponse::success(Value::Array(records)))
            }
            None => CallResponse::Envelope(ApiResponse::error(MISSING_DEVICE)),
        },
        ApiCall::GetDelta => {
            tracing::debug!(
                "Delta requested from {:?} to {:?}",
                params.source_incremental,
                params.target_incremental
            );
            CallResponse::Delta(DeltaResponse::not_found())
        }
    };

    Ok(body)
}
