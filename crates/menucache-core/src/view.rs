//! Read-only menu projection for UIs.
//!
//! A `MenuView` is recomputed by the sync coordinator after every event and
//! published through [`MenuCache::subscribe`](crate::sync::MenuCache::subscribe).
//! It holds no state of its own.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CacheError;
use crate::models::MenuCollection;
use crate::sync::{DataSource, SyncStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct MenuView {
    /// The currently active collection
    pub items: MenuCollection,
    /// True only while the first fetch runs and nothing is cached
    pub loading: bool,
    /// Set when the first load failed with no cached fallback
    pub error: Option<CacheError>,
    pub is_offline: bool,
    pub is_syncing: bool,
    pub source: DataSource,
    pub sync_status: SyncStatus,
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl MenuView {
    pub fn sync_failed(&self) -> bool {
        self.sync_status == SyncStatus::Failed
    }

    /// Human readable age of the last successful sync.
    pub fn last_synced_display(&self) -> String {
        match self.last_synced_at {
            Some(at) => age_display((Utc::now() - at).num_minutes()),
            None => "never".to_string(),
        }
    }
}

fn age_display(minutes: i64) -> String {
    if minutes < 1 {
        // Negative ages come from clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}
