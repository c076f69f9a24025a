//! Session metadata: the selectable levels, locations and date bounds.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

use crate::dates::parse_date;
use crate::error::ApiError;

const DEFAULT_LEVEL: &str = "Country";

#[derive(Debug, Deserialize)]
struct RawMetadata {
    min_date: String,
    max_date: String,
    #[serde(default)]
    levels: Option<Vec<String>>,
    #[serde(default)]
    locations_by_level: HashMap<String, Vec<String>>,
}

/// Immutable description of what the API can be queried for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub levels: Vec<String>,
    pub locations_by_level: HashMap<String, Vec<String>>,
}

impl Metadata {
    /// Decodes a `/metadata` payload.
    ///
    /// A missing `levels` list falls back to `["Country"]`. Bounds that are
    /// unparseable or inverted are a decode error.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ApiError> {
        let raw: RawMetadata =
            serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;

        let min_date = parse_date(&raw.min_date)
            .ok_or_else(|| ApiError::Decode(format!("invalid min_date '{}'", raw.min_date)))?;
        let max_date = parse_date(&raw.max_date)
            .ok_or_else(|| ApiError::Decode(format!("invalid max_date '{}'", raw.max_date)))?;
        if min_date > max_date {
            return Err(ApiError::Decode(format!(
                "min_date {min_date} is after max_date {max_date}"
            )));
        }

        let levels = raw
            .levels
            .unwrap_or_else(|| vec![DEFAULT_LEVEL.to_string()]);

        Ok(Self {
            min_date,
            max_date,
            levels,
            locations_by_level: raw.locations_by_level,
        })
    }

    pub fn has_level(&self, level: &str) -> bool {
        self.levels.iter().any(|l| l == level)
    }

    /// Locations for `level`, empty when the level is unknown or has none.
    pub fn locations(&self, level: &str) -> &[String] {
        if !self.has_level(level) {
            return &[];
        }
        self.locations_by_level
            .get(level)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min_date <= date && date <= self.max_date
    }
}
