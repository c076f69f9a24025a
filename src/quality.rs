//! Data-quality checks run over every fetched case table.
//!
//! Checks run in a fixed order and each may raise the overall severity but
//! never lower it. Findings are informational: they are rendered with the
//! governance view and never turned into errors.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::records::{CaseTable, DATE, LOCATION, NUMERIC_COLUMNS};

/// A latest record older than this many days is stale.
pub const TIMELINESS_THRESHOLD_DAYS: i64 = 30;

const REQUIRED_COLUMNS: [&str; 2] = [DATE, LOCATION];

pub const NO_ISSUES: &str = "No quality issues detected for the selected window.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Ok,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    pub status: Severity,
    pub findings: Vec<String>,
}

impl QualityReport {
    fn escalate(&mut self, severity: Severity, finding: String) {
        self.status = self.status.max(severity);
        self.findings.push(finding);
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

type Check = fn(&CaseTable, NaiveDate, &mut QualityReport);

const CHECKS: [(&str, Check); 4] = [
    ("completeness", check_completeness),
    ("date_validity", check_date_validity),
    ("non_negative", check_non_negative),
    ("timeliness", check_timeliness),
];

/// Runs every check against `table`, judging timeliness relative to `today`.
pub fn evaluate(table: &CaseTable, today: NaiveDate) -> QualityReport {
    let mut report = QualityReport::default();
    for (name, check) in CHECKS {
        check(table, today, &mut report);
        debug!(check = name, status = %report.status, "Quality check done");
    }
    report
}

fn check_completeness(table: &CaseTable, _today: NaiveDate, report: &mut QualityReport) {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|c| !table.has_column(c))
        .collect();
    if !missing.is_empty() {
        report.escalate(
            Severity::Critical,
            format!("Missing columns: {}", missing.join(", ")),
        );
    }
}

fn check_date_validity(table: &CaseTable, _today: NaiveDate, report: &mut QualityReport) {
    if !table.has_column(DATE) {
        return;
    }
    let invalid = table.rows.iter().filter(|r| r.date.is_none()).count();
    if invalid > 0 {
        report.escalate(Severity::Warning, format!("Invalid date rows: {invalid}"));
    }
}

fn check_non_negative(table: &CaseTable, _today: NaiveDate, report: &mut QualityReport) {
    for column in NUMERIC_COLUMNS {
        if !table.has_column(column) {
            continue;
        }
        let negative = table
            .rows
            .iter()
            .filter(|r| r.numeric(column).unwrap_or(0.0) < 0.0)
            .count();
        if negative > 0 {
            report.escalate(
                Severity::Warning,
                format!("Negative values detected in {column}: {negative}"),
            );
        }
    }
}

fn check_timeliness(table: &CaseTable, today: NaiveDate, report: &mut QualityReport) {
    let Some(latest) = table.latest_date() else {
        return;
    };
    let gap = (today - latest).num_days();
    if gap > TIMELINESS_THRESHOLD_DAYS {
        report.escalate(
            Severity::Warning,
            format!("Data timeliness warning: latest record is {gap} days old."),
        );
    }
}
