//! Common types for the client SDK

use serde::{Deserialize, Serialize};

/// One page of a SCIM-style collection (users, groups)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScimPage<T> {
    /// 1-based index of the first returned item
    #[serde(default)]
    pub start_index: u64,
    /// Number of items across all pages
    #[serde(default)]
    pub total_results: u64,
    /// Number of items on this page
    #[serde(default)]
    pub items_per_page: u64,
    #[serde(default = "Vec::new")]
    pub resources: Vec<T>,
}

impl<T> ScimPage<T> {
    /// Whether more items follow this page
    pub fn has_more(&self) -> bool {
        let seen = self.start_index.saturating_sub(1) + self.items_per_page;
        seen < self.total_results
    }

    /// `startIndex` of the following page
    pub fn next_start_index(&self) -> u64 {
        self.start_index + self.items_per_page
    }
}

/// Options for listing SCIM-style collections
#[derive(Clone, Debug, Default)]
pub struct ScimListOptions {
    /// 1-based index of the first item
    pub start_index: Option<u32>,
    /// Maximum items to return
    pub count: Option<u32>,
    /// SCIM filter expression, e.g. `email eq "jdoe@example.com"`
    pub filter: Option<String>,
}
