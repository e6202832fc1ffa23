use serde::Serialize;
use thiserror::Error;

/// Failures the cache can run into.
///
/// None of these are fatal: storage and payload errors degrade to an empty
/// collection, remote errors fall back to the cached collection.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub enum CacheError {
    #[error("Remote menu source unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Local storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Malformed menu payload: {0}")]
    MalformedPayload(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::MalformedPayload(e.to_string())
    }
}

impl From<crate::api::ApiError> for CacheError {
    fn from(e: crate::api::ApiError) -> Self {
        CacheError::RemoteUnavailable(e.to_string())
    }
}
