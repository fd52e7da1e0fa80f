use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_code(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column_id: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }

    pub fn asc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Asc)
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, SortDirection::Desc)
    }
}

/// User-facing grid state. `selection` outlives data refreshes and may be
/// seeded or read back by whatever workflow hosts the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    /// Sort keys in priority order.
    #[serde(default)]
    pub sort: Vec<SortSpec>,
    #[serde(default)]
    pub global_filter: String,
    #[serde(default)]
    pub selection: BTreeMap<String, bool>,
}

impl GridState {
    pub fn selected_ids(&self) -> BTreeSet<String> {
        self.selection
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(id, _)| id.clone())
            .collect()
    }
}
