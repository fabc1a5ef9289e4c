//! Gateway error types
//!
//! Re-exports proofcraft-error and maps provider failures onto it.

pub use proofcraft_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::provider::ProviderError;

/// Translate a provider failure into a proofcraft error, keeping the original as source
pub fn provider_error(provider: &str, err: ProviderError) -> Error {
    let kind = match &err {
        ProviderError::Network(_) => ErrorKind::NetworkFailed,
        ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
        ProviderError::AuthenticationFailed | ProviderError::InvalidRequest(_) => {
            ErrorKind::ConfigInvalid
        }
        ProviderError::Unavailable(_) => ErrorKind::ProviderUnavailable,
        ProviderError::Parse(_) => ErrorKind::ParseFailed,
        ProviderError::Api { .. } | ProviderError::Other(_) => ErrorKind::InferenceFailed,
    };
    // A 4xx the backend rejects outright will be rejected again
    let status = match &err {
        ProviderError::Api { status, .. } if (400..500).contains(status) => ErrorStatus::Permanent,
        _ => ErrorStatus::default_for(kind),
    };
    Error::new(kind, err.to_string())
        .with_status(status)
        .with_operation("provider::stream")
        .with_context("provider", provider)
        .set_source(err)
}

/// Create a ConfigInvalid error for a missing setting
pub fn missing_setting(setting: &'static str, provider: &str) -> Error {
    Error::config_invalid(format!("{} is required for the {} backend", setting, provider))
        .with_context("setting", setting)
        .with_context("provider", provider)
}
