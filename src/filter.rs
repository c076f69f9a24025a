//! The user's current selection: level, location and reporting window.

use chrono::NaiveDate;

use crate::error::FilterError;
use crate::metadata::Metadata;

/// Location chosen by default whenever a level offers it.
pub const PREFERRED_LOCATION: &str = "Indonesia";

/// A selection that always satisfies the metadata invariants.
///
/// Every mutator validates first and leaves the state untouched on error,
/// so a rejected change never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    level: String,
    location: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl FilterState {
    /// Initial selection: the first level that lists any location, its
    /// default location, and the full date range. Empty levels are skipped.
    pub fn from_metadata(meta: &Metadata) -> Result<Self, FilterError> {
        let (level, location) = meta
            .levels
            .iter()
            .find_map(|level| Some((level, default_location(meta, level).ok()?)))
            .ok_or_else(|| {
                FilterError::InvalidSelection("metadata lists no level with locations".into())
            })?;

        Ok(Self {
            level: level.clone(),
            location,
            start: meta.min_date,
            end: meta.max_date,
        })
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Switches level and resets the location to that level's default.
    pub fn set_level(&mut self, meta: &Metadata, level: &str) -> Result<(), FilterError> {
        if !meta.has_level(level) {
            return Err(FilterError::InvalidSelection(format!(
                "unknown level '{level}'"
            )));
        }
        let location = default_location(meta, level)?;

        self.level = level.to_string();
        self.location = location;
        Ok(())
    }

    pub fn set_location(&mut self, meta: &Metadata, location: &str) -> Result<(), FilterError> {
        if !meta.locations(&self.level).iter().any(|l| l == location) {
            return Err(FilterError::InvalidSelection(format!(
                "location '{location}' is not available for level '{}'",
                self.level
            )));
        }
        self.location = location.to_string();
        Ok(())
    }

    pub fn set_date_range(
        &mut self,
        meta: &Metadata,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), FilterError> {
        if start > end {
            return Err(FilterError::InvalidRange { start, end });
        }
        if let Some(date) = [start, end].into_iter().find(|d| !meta.contains(*d)) {
            return Err(FilterError::OutOfBounds {
                date,
                min: meta.min_date,
                max: meta.max_date,
            });
        }

        self.start = start;
        self.end = end;
        Ok(())
    }
}

/// `"Indonesia"` when the level lists it, otherwise the first location.
pub fn default_location(meta: &Metadata, level: &str) -> Result<String, FilterError> {
    let locations = meta.locations(level);
    if locations.iter().any(|l| l == PREFERRED_LOCATION) {
        return Ok(PREFERRED_LOCATION.to_string());
    }
    locations.first().cloned().ok_or_else(|| {
        FilterError::InvalidSelection(format!("no locations available for level '{level}'"))
    })
}
