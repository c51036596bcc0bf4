use serde::Serialize;

/// Response body carrying the resolved pipeline configuration.
#[derive(Debug, Serialize)]
pub struct FindConfigResponse {
    /// Raw YAML, possibly multi-document.
    pub data: String,
}
