// Error records handed back to the request pipeline

use serde::{Deserialize, Serialize};

use crate::types::{ErrorKind, GatewayError};

/// Structured error attached to a request context by an executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorError {
    pub code: String,
    pub title: String,
    pub description: String,
    pub http_status: u16,
}

impl ExecutorError {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        http_status: u16,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            description: description.into(),
            http_status,
        }
    }
}

impl From<&GatewayError> for ExecutorError {
    fn from(error: &GatewayError) -> Self {
        Self::new(
            error.code(),
            error.title(),
            error.description(),
            error.http_status(),
        )
    }
}

impl From<GatewayError> for ExecutorError {
    fn from(error: GatewayError) -> Self {
        Self::from(&error)
    }
}

/// Log a gateway error at a level matching its kind and convert it into a record
pub fn report_error(executor: &str, error: &GatewayError) -> ExecutorError {
    match error.kind() {
        ErrorKind::Configuration => tracing::error!(
            executor = executor,
            error_code = error.code(),
            error = %error,
            "Gateway misconfiguration"
        ),
        ErrorKind::MalformedInput | ErrorKind::PolicyRejection => tracing::warn!(
            executor = executor,
            error_code = error.code(),
            error = %error,
            "Request rejected"
        ),
    }
    ExecutorError::from(error)
}
