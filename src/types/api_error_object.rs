use serde::{Deserialize, Serialize};

/// The error body returned by the provider, both for failed requests and
/// for errors reported mid-stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The error details.
    pub error: ApiErrorObject,
}

/// Details of a provider error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiErrorObject {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,

    /// Error category, e.g. `invalid_request_error`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,

    /// The request parameter at fault, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,

    /// Machine-readable code, e.g. `model_not_found`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
