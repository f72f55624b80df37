//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain errors to the message printed on stderr.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ProviderNotConfigured(_) => format!(
            "{}\nhint: set VEIL_API_KEY or add api_key to the [provider] table",
            e
        ),
        ApiError::ProviderAuthFailed(_) => {
            format!("{}\nhint: check the configured API key and auth scheme", e)
        }
        _ => e.to_string(),
    }
}
