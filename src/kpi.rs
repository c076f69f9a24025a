//! Executive KPIs from the `/summary` endpoint.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::records::format_number;

/// Shown in place of any metric the API did not provide.
pub const UNAVAILABLE: &str = "—";

/// The `kpi` object of a summary response, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryResult {
    pub kpi: Map<String, Value>,
}

impl SummaryResult {
    /// A missing or non-object `kpi` field decodes to an empty set.
    pub fn from_json(value: &Value) -> Self {
        let kpi = value
            .get("kpi")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self { kpi }
    }

    /// Display text for a metric: the raw value, or [`UNAVAILABLE`] when it
    /// is absent, `null` or blank.
    pub fn display(&self, name: &str) -> String {
        match self.kpi.get(name) {
            None | Some(Value::Null) => UNAVAILABLE.to_string(),
            Some(Value::String(s)) if s.trim().is_empty() => UNAVAILABLE.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(f) if n.is_f64() => format_number(f),
                _ => n.to_string(),
            },
            Some(other) => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
}

/// The four headline cards at the top of the dashboard.
pub fn kpi_panel(summary: &SummaryResult) -> Vec<KpiCard> {
    vec![
        KpiCard {
            label: "Total Cases",
            value: summary.display("total_cases"),
        },
        KpiCard {
            label: "Total Deaths",
            value: summary.display("total_deaths"),
        },
        KpiCard {
            label: "New Cases (7d)",
            value: summary.display("new_cases_7d"),
        },
        KpiCard {
            label: "Data Range",
            value: format!(
                "{} → {}",
                summary.display("min_date"),
                summary.display("max_date")
            ),
        },
    ]
}
