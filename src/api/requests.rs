use tracing::info;

use super::{ApiSource, Endpoint, QueryParams};
use crate::dates::ISO_DATE;
use crate::error::ApiError;
use crate::filter::FilterState;
use crate::kpi::SummaryResult;
use crate::metadata::Metadata;
use crate::records::{CaseTable, normalize};

/// Row cap sent with every `/cases` request.
pub const DEFAULT_CASES_LIMIT: usize = 8000;

pub fn summary_params(filter: &FilterState) -> QueryParams {
    QueryParams::new()
        .with("level", filter.level())
        .with("location", filter.location())
        .with("start", filter.start().format(ISO_DATE))
        .with("end", filter.end().format(ISO_DATE))
}

pub fn cases_params(filter: &FilterState, limit: usize) -> QueryParams {
    summary_params(filter).with("limit", limit)
}

#[tracing::instrument(skip(api))]
pub async fn fetch_metadata<A: ApiSource + ?Sized>(api: &A) -> Result<Metadata, ApiError> {
    let value = api.get(Endpoint::Metadata, &QueryParams::new()).await?;
    let meta = Metadata::from_json(value)?;
    info!(
        levels = meta.levels.len(),
        min_date = %meta.min_date,
        max_date = %meta.max_date,
        "Metadata loaded"
    );
    Ok(meta)
}

#[tracing::instrument(skip(api, filter), fields(level = filter.level(), location = filter.location()))]
pub async fn fetch_summary<A: ApiSource + ?Sized>(
    api: &A,
    filter: &FilterState,
) -> Result<SummaryResult, ApiError> {
    let value = api.get(Endpoint::Summary, &summary_params(filter)).await?;
    Ok(SummaryResult::from_json(&value))
}

#[tracing::instrument(skip(api, filter), fields(level = filter.level(), location = filter.location()))]
pub async fn fetch_cases<A: ApiSource + ?Sized>(
    api: &A,
    filter: &FilterState,
    limit: usize,
) -> Result<CaseTable, ApiError> {
    let value = api.get(Endpoint::Cases, &cases_params(filter, limit)).await?;
    let table = normalize(&value);
    info!(rows = table.len(), columns = table.columns.len(), "Cases loaded");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn filter() -> FilterState {
        let meta = Metadata {
            min_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            max_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            levels: vec!["Country".into()],
            locations_by_level: HashMap::from([(
                "Country".to_string(),
                vec!["Indonesia".to_string()],
            )]),
        };
        FilterState::from_metadata(&meta).unwrap()
    }

    #[test]
    fn test_summary_params_use_iso_dates() {
        let params = summary_params(&filter());

        assert_eq!(params.get("level"), Some("Country"));
        assert_eq!(params.get("location"), Some("Indonesia"));
        assert_eq!(params.get("start"), Some("2020-01-01"));
        assert_eq!(params.get("end"), Some("2023-01-01"));
        assert_eq!(params.get("limit"), None);
    }

    #[test]
    fn test_cases_params_add_limit() {
        let params = cases_params(&filter(), DEFAULT_CASES_LIMIT);
        assert_eq!(params.get("limit"), Some("8000"));
    }
}
