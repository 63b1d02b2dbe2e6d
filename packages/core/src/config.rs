/// Configuration for a tree replica
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Branch;

/// Environment variable that overrides the replica id
pub const REPLICA_ID_ENV: &str = "MEDIATREE_REPLICA_ID";

/// Upper bound for broadcast channel capacities
const MAX_CHANNEL_CAPACITY: usize = 65_536;

/// Per-replica settings for the tree, its event channel and its transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeSyncConfig {
    /// Identity used as lock holder and as message sender
    pub replica_id: String,

    /// Localized display label for each branch root
    pub root_labels: BTreeMap<Branch, String>,

    /// Capacity of the `TreeEvent` broadcast channel
    pub event_channel_capacity: usize,

    /// Capacity of the in-process message hub
    pub transport_channel_capacity: usize,

    /// Allow appending Clips/Snapshots without scanning siblings
    pub fast_append: bool,

    /// Reload cached sort orders of later siblings when a positioned Clip or
    /// Snapshot is inserted
    pub refresh_sort_orders_on_insert: bool,
}

impl Default for TreeSyncConfig {
    fn default() -> Self {
        Self {
            replica_id: uuid::Uuid::new_v4().to_string(),
            root_labels: Branch::ALL
                .into_iter()
                .map(|branch| (branch, branch.marker().to_string()))
                .collect(),
            event_channel_capacity: 128,
            transport_channel_capacity: 256,
            fast_append: true,
            refresh_sort_orders_on_insert: true,
        }
    }
}

impl TreeSyncConfig {
    /// Default configuration with `replica_id` taken from `MEDIATREE_REPLICA_ID`
    /// when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(id) = std::env::var(REPLICA_ID_ENV) {
            if !id.trim().is_empty() {
                config.replica_id = id.trim().to_string();
            }
        }
        config
    }

    pub fn with_replica_id(mut self, replica_id: impl Into<String>) -> Self {
        self.replica_id = replica_id.into();
        self
    }

    pub fn with_root_label(mut self, branch: Branch, label: impl Into<String>) -> Self {
        self.root_labels.insert(branch, label.into());
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.replica_id.trim().is_empty() {
            return Err("replica_id cannot be empty".to_string());
        }

        // Tabs and newlines would corrupt the message envelope
        if self.replica_id.contains(['\t', '\n']) {
            return Err("replica_id cannot contain tabs or newlines".to_string());
        }

        for (branch, label) in &self.root_labels {
            if label.trim().is_empty() {
                return Err(format!("root label for {} cannot be empty", branch));
            }
        }

        for (name, capacity) in [
            ("event_channel_capacity", self.event_channel_capacity),
            ("transport_channel_capacity", self.transport_channel_capacity),
        ] {
            if capacity == 0 {
                return Err(format!("{} must be greater than 0", name));
            }
            if capacity > MAX_CHANNEL_CAPACITY {
                return Err(format!(
                    "{} cannot exceed {}",
                    name, MAX_CHANNEL_CAPACITY
                ));
            }
        }

        Ok(())
    }
}
