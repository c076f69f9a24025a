//! View models for the three dashboard sections.
//!
//! Builders here are pure: they read the fetched data and never modify it.
//! An empty case table short-circuits to a single notice.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::filter::FilterState;
use crate::kpi::{KpiCard, SummaryResult, kpi_panel};
use crate::quality::{self, QualityReport};
use crate::records::CaseTable;
use crate::report::{SituationReport, build_report, export_csv, export_filename};

pub const NO_DATA_NOTICE: &str =
    "No data for this selection. Try another level/location or date range.";

/// Rows shown in the overview preview table.
pub const PREVIEW_ROWS: usize = 10;

pub const GOVERNANCE_NOTES: [&str; 4] = [
    "This system uses aggregated public health data (no personal identifiers).",
    "Public view: aggregate KPIs only.",
    "Analyst view: trend + export features.",
    "Auditability is supported through reproducible filters and exportable reports.",
];

const CHARTS: [(&str, &str); 2] = [
    ("new_cases", "New Cases Over Time"),
    ("new_deaths", "New Deaths Over Time"),
];

/// A line chart input: dated points in ascending date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub title: &'static str,
    pub column: &'static str,
    pub points: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub level: String,
    pub location: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: usize,
    pub latest_record: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewView {
    pub kpis: Vec<KpiCard>,
    pub charts: Vec<ChartSeries>,
    pub notices: Vec<String>,
    pub snapshot: Snapshot,
    pub preview: Preview,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub report: SituationReport,
    pub filename: String,
    pub csv: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GovernanceView {
    pub quality: QualityReport,
    pub notes: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sections {
    pub overview: OverviewView,
    pub report: ReportView,
    pub governance: GovernanceView,
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    NoData { notice: String },
    Ready(Box<Sections>),
}

impl Dashboard {
    pub fn sections(&self) -> Option<&Sections> {
        match self {
            Dashboard::Ready(sections) => Some(sections),
            Dashboard::NoData { .. } => None,
        }
    }
}

/// Composes all three sections, or the no-data notice when `table` is empty.
pub fn compose(
    filter: &FilterState,
    summary: &SummaryResult,
    table: &CaseTable,
    today: NaiveDate,
) -> Result<Dashboard> {
    if table.is_empty() {
        return Ok(Dashboard::NoData {
            notice: NO_DATA_NOTICE.to_string(),
        });
    }

    Ok(Dashboard::Ready(Box::new(Sections {
        overview: overview(filter, summary, table),
        report: report_view(filter, table)?,
        governance: governance(table, today),
    })))
}

pub fn overview(filter: &FilterState, summary: &SummaryResult, table: &CaseTable) -> OverviewView {
    let charts: Vec<ChartSeries> = CHARTS
        .into_iter()
        .filter(|(column, _)| table.has_column(column))
        .map(|(column, title)| chart_series(table, column, title))
        .collect();

    let mut notices = Vec::new();
    if !table.has_column("new_cases") {
        notices.push("Column `new_cases` is not available.".to_string());
    }

    OverviewView {
        kpis: kpi_panel(summary),
        charts,
        notices,
        snapshot: Snapshot {
            level: filter.level().to_string(),
            location: filter.location().to_string(),
            start: filter.start(),
            end: filter.end(),
            rows: table.len(),
            latest_record: table.latest_date(),
        },
        preview: preview(table),
    }
}

pub fn report_view(filter: &FilterState, table: &CaseTable) -> Result<ReportView> {
    Ok(ReportView {
        report: build_report(filter, table),
        filename: export_filename(filter),
        csv: export_csv(table)?,
    })
}

pub fn governance(table: &CaseTable, today: NaiveDate) -> GovernanceView {
    GovernanceView {
        quality: quality::evaluate(table, today),
        notes: GOVERNANCE_NOTES.to_vec(),
    }
}

fn chart_series(table: &CaseTable, column: &'static str, title: &'static str) -> ChartSeries {
    let points = table
        .sorted_by_date()
        .into_iter()
        .filter_map(|r| Some((r.date?, r.numeric(column)?)))
        .collect();
    ChartSeries {
        title,
        column,
        points,
    }
}

fn preview(table: &CaseTable) -> Preview {
    let sorted = table.sorted_by_date();
    let skip = sorted.len().saturating_sub(PREVIEW_ROWS);
    Preview {
        columns: table.columns.clone(),
        rows: sorted[skip..]
            .iter()
            .map(|r| table.columns.iter().map(|c| r.cell(c)).collect())
            .collect(),
    }
}
