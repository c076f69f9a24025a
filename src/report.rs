//! Situation report narrative and CSV export.

use chrono::NaiveDate;
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::dates::ISO_DATE;
use crate::error::Result;
use crate::filter::FilterState;
use crate::kpi::UNAVAILABLE;
use crate::records::CaseTable;

pub const AUDIENCE: &str = "Public Health Agency / Hospital Management";
pub const PURPOSE: &str = "weekly monitoring & resource planning.";

const DECISION_VALUE: [&str; 2] = [
    "Executive KPIs + trends support quicker situational awareness.",
    "API-based design enables interoperability across systems.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SituationReport {
    pub narrative: String,
    pub latest_date: Option<NaiveDate>,
}

/// Builds the situation report for the current selection.
///
/// The narrative is deterministic in its inputs; a table without any valid
/// date reports the latest record as unavailable.
pub fn build_report(filter: &FilterState, table: &CaseTable) -> SituationReport {
    let latest_date = table.latest_date();
    let latest = latest_date
        .map(|d| d.format(ISO_DATE).to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string());

    let mut narrative = String::new();
    narrative.push_str(&format!("Audience: {AUDIENCE}\n"));
    narrative.push_str(&format!("Purpose: {PURPOSE}\n\n"));
    narrative.push_str("Context\n");
    narrative.push_str(&format!("- Level: {}\n", filter.level()));
    narrative.push_str(&format!("- Location: {}\n", filter.location()));
    narrative.push_str(&format!(
        "- Reporting window: {} → {}\n",
        filter.start().format(ISO_DATE),
        filter.end().format(ISO_DATE)
    ));
    narrative.push_str(&format!("- Latest record date: {latest}\n\n"));
    narrative.push_str("Decision Value\n");
    for line in DECISION_VALUE {
        narrative.push_str(&format!("- {line}\n"));
    }

    SituationReport {
        narrative,
        latest_date,
    }
}

/// Serializes the whole table as UTF-8 CSV, sorted by ascending date with
/// undated rows last. The header is the table's original column set.
///
/// A table without columns has no header to write and exports as empty.
pub fn export_csv(table: &CaseTable) -> Result<Vec<u8>> {
    if table.columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for record in table.sorted_by_date() {
        writer.write_record(table.columns.iter().map(|c| record.cell(c)))?;
    }
    writer.flush()?;

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    debug!(rows = table.len(), bytes = bytes.len(), "CSV export built");
    Ok(bytes)
}

/// `PHARS_Report_{level}_{location}_{start}_{end}.csv` with ISO dates.
pub fn export_filename(filter: &FilterState) -> String {
    format!(
        "PHARS_Report_{}_{}_{}_{}.csv",
        path_safe(filter.level()),
        path_safe(filter.location()),
        filter.start().format(ISO_DATE),
        filter.end().format(ISO_DATE)
    )
}

fn path_safe(part: &str) -> String {
    part.replace(['/', '\\'], "-")
}

/// Writes an export into `dir`, gzip-compressing it (and appending `.gz`)
/// when asked. Returns the path written.
pub fn write_export(dir: &Path, filename: &str, csv: &[u8], gzip: bool) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let (path, body) = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(csv)?;
        (dir.join(format!("{filename}.gz")), encoder.finish()?)
    } else {
        (dir.join(filename), csv.to_vec())
    };

    fs::write(&path, &body)?;
    info!(path = %path.display(), bytes = body.len(), gzip, "Report exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use crate::records::normalize;
    use flate2::read::GzDecoder;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Read;

    #[test]
    fn test_report_embeds_selection() {
        let table = normalize(&json!({ "data": [
            { "date": "2022-12-30", "location": "Indonesia" },
            { "date": "2022-12-31", "location": "Indonesia" }
        ]}));

        let report = build_report(&create_filter(), &table);

        assert_eq!(report.latest_date, NaiveDate::from_ymd_opt(2022, 12, 31));
        assert!(report.narrative.contains("- Level: Country\n"));
        assert!(report.narrative.contains("- Location: Indonesia\n"));
        assert!(report.narrative.contains("- Reporting window: 2020-01-01 → 2023-01-01\n"));
        assert!(report.narrative.contains("- Latest record date: 2022-12-31\n"));
    }

    #[test]
    fn test_report_without_dates_marks_unavailable() {
        let table = normalize(&json!({ "data": [{ "location": "Indonesia" }] }));

        let report = build_report(&create_filter(), &table);

        assert_eq!(report.latest_date, None);
        assert!(report.narrative.contains("- Latest record date: —\n"));
    }

    #[test]
    fn test_export_csv_sorts_and_quotes() {
        let table = normalize(&json!({ "data": [
            { "date": "2022-01-02", "location": "Jakarta, ID", "new_cases": 2 },
            { "date": null, "location": "Bali", "new_cases": null },
            { "date": "2022-01-01", "location": "Say \"hi\"", "new_cases": 1.5 }
        ]}));

        let csv = String::from_utf8(export_csv(&table).unwrap()).unwrap();

        assert_eq!(
            csv,
            "date,location,new_cases\n\
             2022-01-01,\"Say \"\"hi\"\"\",1.5\n\
             2022-01-02,\"Jakarta, ID\",2\n\
             ,Bali,\n"
        );
    }

    #[test]
    fn test_export_csv_round_trip_keeps_columns_and_rows() {
        let table = normalize(&json!({ "data": [
            { "date": "2022-01-03", "location": "USA", "new_deaths": -5, "iso_code": "USA" },
            { "date": "2022-01-01", "location": "USA", "new_deaths": 1 },
            { "location": "USA", "new_deaths": 2, "iso_code": "USA" }
        ]}));

        let bytes = export_csv(&table).unwrap();
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();

        assert_eq!(headers, table.columns);
        assert_eq!(rows.len(), table.len());
        assert_eq!(&rows[0][0], "2022-01-01");
        assert_eq!(&rows[1][2], "-5");
    }

    #[test]
    fn test_export_csv_empty_table_is_empty() {
        assert!(export_csv(&CaseTable::default()).unwrap().is_empty());
    }

    #[test]
    fn test_export_csv_rows_without_columns_is_empty() {
        let table = normalize(&json!({ "data": [42, "x"] }));
        assert_eq!(table.len(), 2);

        assert!(export_csv(&table).unwrap().is_empty());
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename(&create_filter()),
            "PHARS_Report_Country_Indonesia_2020-01-01_2023-01-01.csv"
        );
    }

    #[test]
    fn test_write_export_plain_and_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let csv = b"date,location\n2022-01-01,USA\n";

        let plain = write_export(dir.path(), "report.csv", csv, false).unwrap();
        assert_eq!(fs::read(&plain).unwrap(), csv);

        let gz = write_export(dir.path(), "report.csv", csv, true).unwrap();
        assert!(gz.to_string_lossy().ends_with("report.csv.gz"));
        let mut decoded = Vec::new();
        GzDecoder::new(fs::File::open(&gz).unwrap())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, csv);
    }

    // Helper functions for tests
    fn create_filter() -> FilterState {
        let meta = Metadata {
            min_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            max_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            levels: vec!["Country".into()],
            locations_by_level: HashMap::from([(
                "Country".to_string(),
                vec!["Indonesia".to_string(), "USA".to_string()],
            )]),
        };
        FilterState::from_metadata(&meta).unwrap()
    }
}
