//! Plain-text rendering of dashboards for the terminal.

use serde_json::{Value, json};
use std::io::{self, Write};

use crate::dates::ISO_DATE;
use crate::kpi::UNAVAILABLE;
use crate::metadata::Metadata;
use crate::quality::{NO_ISSUES, Severity};
use crate::records::format_number;
use crate::view::{ChartSeries, Dashboard, GovernanceView, OverviewView, ReportView};

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Widest sparkline drawn; longer series are bucketed by mean.
const SPARK_WIDTH: usize = 60;

pub fn render_dashboard<W: Write>(out: &mut W, dashboard: &Dashboard) -> io::Result<()> {
    match dashboard {
        Dashboard::NoData { notice } => writeln!(out, "! {notice}"),
        Dashboard::Ready(sections) => {
            render_overview(out, &sections.overview)?;
            render_report(out, &sections.report)?;
            render_governance(out, &sections.governance)
        }
    }
}

pub fn render_overview<W: Write>(out: &mut W, view: &OverviewView) -> io::Result<()> {
    heading(out, "Executive KPIs")?;
    for card in &view.kpis {
        writeln!(out, "  {:<16} {}", card.label, card.value)?;
    }

    heading(out, "Overview")?;
    for chart in &view.charts {
        render_chart(out, chart)?;
    }
    for notice in &view.notices {
        writeln!(out, "  i {notice}")?;
    }

    let snap = &view.snapshot;
    writeln!(out, "\n  Snapshot")?;
    writeln!(out, "    Level:         {}", snap.level)?;
    writeln!(out, "    Location:      {}", snap.location)?;
    writeln!(
        out,
        "    Window:        {} → {}",
        snap.start.format(ISO_DATE),
        snap.end.format(ISO_DATE)
    )?;
    writeln!(out, "    Rows:          {}", snap.rows)?;
    if let Some(latest) = snap.latest_record {
        writeln!(out, "    Latest record: {}", latest.format(ISO_DATE))?;
    }

    writeln!(out, "\n  Preview")?;
    render_table(out, &view.preview.columns, &view.preview.rows)
}

pub fn render_report<W: Write>(out: &mut W, view: &ReportView) -> io::Result<()> {
    heading(out, "Situation Report")?;
    for line in view.report.narrative.lines() {
        writeln!(out, "  {line}")?;
    }
    writeln!(out, "\n  Export: {} ({} bytes)", view.filename, view.csv.len())
}

pub fn render_governance<W: Write>(out: &mut W, view: &GovernanceView) -> io::Result<()> {
    heading(out, "Data Quality & Governance")?;
    let badge = match view.quality.status {
        Severity::Ok => "[ OK ]",
        Severity::Warning => "[ WARNING ]",
        Severity::Critical => "[ CRITICAL ]",
    };
    writeln!(out, "  Quality Status: {badge}")?;

    if view.quality.is_clean() {
        writeln!(out, "  {NO_ISSUES}")?;
    } else {
        writeln!(out, "  Findings")?;
        for finding in &view.quality.findings {
            writeln!(out, "    - {finding}")?;
        }
    }

    writeln!(out, "\n  Governance Notes")?;
    for note in &view.notes {
        writeln!(out, "    - {note}")?;
    }
    Ok(())
}

pub fn render_metadata<W: Write>(out: &mut W, meta: &Metadata) -> io::Result<()> {
    heading(out, "Metadata")?;
    writeln!(
        out,
        "  Dates: {} → {}",
        meta.min_date.format(ISO_DATE),
        meta.max_date.format(ISO_DATE)
    )?;
    for level in &meta.levels {
        let locations = meta.locations(level);
        writeln!(out, "  {level} ({} locations)", locations.len())?;
        for location in locations {
            writeln!(out, "    - {location}")?;
        }
    }
    Ok(())
}

/// Machine-readable form of a dashboard; the CSV body is omitted.
pub fn dashboard_json(dashboard: &Dashboard) -> Value {
    match dashboard {
        Dashboard::NoData { notice } => json!({ "notice": notice }),
        Dashboard::Ready(sections) => json!({
            "overview": sections.overview,
            "report": {
                "narrative": sections.report.report.narrative,
                "latest_date": sections.report.report.latest_date,
                "filename": sections.report.filename,
            },
            "governance": sections.governance,
        }),
    }
}

fn heading<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "\n== {title} ==")
}

fn render_chart<W: Write>(out: &mut W, chart: &ChartSeries) -> io::Result<()> {
    writeln!(out, "  {}", chart.title)?;
    let values: Vec<f64> = chart.points.iter().map(|(_, v)| *v).collect();
    let (Some((first, _)), Some((last, last_value))) = (chart.points.first(), chart.points.last())
    else {
        return writeln!(out, "    (no dated values)");
    };

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    writeln!(out, "    {}", sparkline(&values, SPARK_WIDTH))?;
    writeln!(
        out,
        "    {} → {}  min {}  max {}  last {}",
        first.format(ISO_DATE),
        last.format(ISO_DATE),
        format_number(min),
        format_number(max),
        format_number(*last_value)
    )
}

/// Draws `values` as unicode block characters, at most `width` wide.
pub fn sparkline(values: &[f64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let buckets: Vec<f64> = if values.len() <= width {
        values.to_vec()
    } else {
        let size = values.len().div_ceil(width);
        values
            .chunks(size)
            .map(|c| c.iter().sum::<f64>() / c.len() as f64)
            .collect()
    };

    let min = buckets.iter().copied().fold(f64::INFINITY, f64::min);
    let max = buckets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    buckets
        .iter()
        .map(|v| {
            if span == 0.0 {
                SPARK[SPARK.len() / 2]
            } else {
                let idx = ((v - min) / span * (SPARK.len() - 1) as f64).round() as usize;
                SPARK[idx.min(SPARK.len() - 1)]
            }
        })
        .collect()
}

fn render_table<W: Write>(out: &mut W, columns: &[String], rows: &[Vec<String>]) -> io::Result<()> {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|v| display_cell(v).chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    writeln!(out, "    {}", line(columns.iter().map(String::as_str).collect()))?;
    for row in rows {
        writeln!(out, "    {}", line(row.iter().map(|v| display_cell(v)).collect()))?;
    }
    Ok(())
}

fn display_cell(value: &str) -> &str {
    if value.is_empty() { UNAVAILABLE } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterState;
    use crate::kpi::SummaryResult;
    use crate::records::normalize;
    use crate::view::{NO_DATA_NOTICE, compose};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    #[test]
    fn test_sparkline_scales_to_blocks() {
        assert_eq!(sparkline(&[0.0, 7.0], 10), "▁█");
        assert_eq!(sparkline(&[5.0, 5.0, 5.0], 10), "▅▅▅");
        assert_eq!(sparkline(&[], 10), "");
    }

    #[test]
    fn test_sparkline_buckets_long_series() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        assert_eq!(sparkline(&values, 20).chars().count(), 20);
    }

    #[test]
    fn test_render_no_data() {
        let mut out = Vec::new();
        let dashboard = Dashboard::NoData {
            notice: NO_DATA_NOTICE.to_string(),
        };

        render_dashboard(&mut out, &dashboard).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), format!("! {NO_DATA_NOTICE}\n"));
    }

    #[test]
    fn test_render_full_dashboard() {
        let dashboard = create_dashboard();
        let mut out = Vec::new();

        render_dashboard(&mut out, &dashboard).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("== Executive KPIs =="));
        assert!(text.contains("New Cases Over Time"));
        assert!(text.contains("Latest record: 2022-01-02"));
        assert!(text.contains("Quality Status: [ WARNING ]"));
        assert!(text.contains("Negative values detected in new_deaths: 1"));
        assert!(text.contains("Export: PHARS_Report_Country_Indonesia_2020-01-01_2023-01-01.csv"));
    }

    #[test]
    fn test_dashboard_json_shape() {
        let value = dashboard_json(&create_dashboard());

        assert_eq!(value["governance"]["quality"]["status"], "WARNING");
        assert_eq!(value["overview"]["snapshot"]["rows"], 2);
        assert_eq!(value["report"]["latest_date"], "2022-01-02");
    }

    // Helper functions for tests
    fn create_dashboard() -> Dashboard {
        let meta = Metadata {
            min_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            max_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            levels: vec!["Country".into()],
            locations_by_level: HashMap::from([(
                "Country".to_string(),
                vec!["Indonesia".to_string()],
            )]),
        };
        let filter = FilterState::from_metadata(&meta).unwrap();
        let table = normalize(&serde_json::json!({ "data": [
            { "date": "2022-01-01", "location": "Indonesia", "new_cases": 4, "new_deaths": -5 },
            { "date": "2022-01-02", "location": "Indonesia", "new_cases": 6, "new_deaths": 0 }
        ]}));
        let today = NaiveDate::from_ymd_opt(2022, 1, 10).unwrap();
        compose(&filter, &SummaryResult::default(), &table, today).unwrap()
    }
}
