use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Kind of a favorited asset.
///
/// Only the three named kinds are accepted as a listing filter. Values
/// written by earlier clients are kept as [`AssetType::Other`] so they
/// round-trip through the API unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    Chart,
    Insight,
    Audience,
    Other(String),
}

impl AssetType {
    /// Parses a listing filter; `None` for anything but the recognized kinds.
    pub fn parse_filter(value: &str) -> Option<AssetType> {
        match AssetType::from(value.to_string()) {
            AssetType::Other(_) => None,
            recognized => Some(recognized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AssetType::Chart => "Chart",
            AssetType::Insight => "Insight",
            AssetType::Audience => "Audience",
            AssetType::Other(s) => s,
        }
    }
}

impl From<String> for AssetType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Chart" => AssetType::Chart,
            "Insight" => AssetType::Insight,
            "Audience" => AssetType::Audience,
            _ => AssetType::Other(value),
        }
    }
}

impl From<AssetType> for String {
    fn from(value: AssetType) -> Self {
        match value {
            AssetType::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

/// A body without `type` decodes to an empty kind.
impl Default for AssetType {
    fn default() -> Self {
        AssetType::Other(String::new())
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A favorited chart, insight or audience report. `data` is stored and
/// returned without being checked against `asset_type`. Missing fields
/// decode to their empty values; only undecodable JSON is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Body of a description update.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDescriptionRequest {
    #[serde(default)]
    pub description: String,
}

/// Raw listing query. Every field stays a string so that bad pagination
/// input can fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FavoritesQuery {
    pub asset_type: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl FavoritesQuery {
    /// Builds the query from decoded `key=value` pairs. The first occurrence
    /// of a repeated key wins; unknown keys are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
        Self { asset_type: first("type"), page: first("page"), page_size: first("pageSize") }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_PAGE_SIZE: u32 = 10;

    /// Absent, non-numeric or non-positive values fall back to page 1 / size 10.
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Self {
        fn positive(raw: Option<&str>) -> Option<u32> {
            raw.and_then(|v| v.trim().parse::<i64>().ok())
                .filter(|v| *v >= 1)
                .map(|v| v.min(u32::MAX as i64) as u32)
        }
        Self {
            page: positive(page).unwrap_or(Self::DEFAULT_PAGE),
            page_size: positive(page_size).unwrap_or(Self::DEFAULT_PAGE_SIZE),
        }
    }

    /// Rows to skip; saturates at `i64::MAX` for very large pages.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1).saturating_mul(self.page_size as i64)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: Self::DEFAULT_PAGE, page_size: Self::DEFAULT_PAGE_SIZE }
    }
}

/// An asset that could not be persisted during a batch add.
#[derive(Debug)]
pub struct AssetError {
    pub asset: Asset,
    pub error: StoreError,
}
