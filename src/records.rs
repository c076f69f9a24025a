//! Typed case records decoded from the `/cases` payload.

use chrono::NaiveDate;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::dates::{ISO_DATE, date_from_value};

pub const DATE: &str = "date";
pub const LOCATION: &str = "location";

/// Count columns coerced to numbers; negative values in these are suspect.
pub const NUMERIC_COLUMNS: [&str; 4] = ["new_cases", "new_deaths", "total_cases", "total_deaths"];

/// One row of the cases dataset.
///
/// Known columns are coerced on decode; any other column is kept verbatim
/// in `extra` so the export can reproduce it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseRecord {
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    pub new_cases: Option<f64>,
    pub new_deaths: Option<f64>,
    pub total_cases: Option<f64>,
    pub total_deaths: Option<f64>,
    pub extra: BTreeMap<String, Value>,
}

impl CaseRecord {
    fn from_row(row: &Value) -> Self {
        let Some(obj) = row.as_object() else {
            return Self::default();
        };

        let mut record = CaseRecord {
            date: obj.get(DATE).and_then(date_from_value),
            location: obj.get(LOCATION).and_then(text_from_value),
            ..Default::default()
        };
        for column in NUMERIC_COLUMNS {
            if let Some(slot) = record.numeric_mut(column) {
                *slot = obj.get(column).and_then(number_from_value);
            }
        }
        record.extra = obj
            .iter()
            .filter(|(k, _)| !is_known_column(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        record
    }

    /// Value of one of [`NUMERIC_COLUMNS`]; `None` for other names.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "new_cases" => self.new_cases,
            "new_deaths" => self.new_deaths,
            "total_cases" => self.total_cases,
            "total_deaths" => self.total_deaths,
            _ => None,
        }
    }

    fn numeric_mut(&mut self, column: &str) -> Option<&mut Option<f64>> {
        match column {
            "new_cases" => Some(&mut self.new_cases),
            "new_deaths" => Some(&mut self.new_deaths),
            "total_cases" => Some(&mut self.total_cases),
            "total_deaths" => Some(&mut self.total_deaths),
            _ => None,
        }
    }

    /// Text rendering of a column for tables and CSV; missing values are empty.
    pub fn cell(&self, column: &str) -> String {
        match column {
            DATE => self
                .date
                .map(|d| d.format(ISO_DATE).to_string())
                .unwrap_or_default(),
            LOCATION => self.location.clone().unwrap_or_default(),
            c if is_known_column(c) => self.numeric(c).map(format_number).unwrap_or_default(),
            c => self.extra.get(c).map(format_value).unwrap_or_default(),
        }
    }
}

/// The decoded dataset: its column set plus rows in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseTable {
    pub columns: Vec<String>,
    pub rows: Vec<CaseRecord>,
}

impl CaseTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Most recent valid date, if any row has one.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().filter_map(|r| r.date).max()
    }

    /// Rows ordered by ascending date, undated rows last. Stored order is
    /// untouched and ties keep their fetch order.
    pub fn sorted_by_date(&self) -> Vec<&CaseRecord> {
        let mut rows: Vec<&CaseRecord> = self.rows.iter().collect();
        rows.sort_by(|a, b| compare_dates(a.date, b.date));
        rows
    }
}

/// Decodes a `/cases` payload without ever failing.
///
/// Every element of `data` becomes exactly one record; malformed dates and
/// numbers are treated as missing. The column set is the union of row keys
/// in first-seen order.
pub fn normalize(payload: &Value) -> CaseTable {
    let Some(data) = payload.get("data").and_then(Value::as_array) else {
        return CaseTable::default();
    };

    let mut columns: Vec<String> = Vec::new();
    for obj in data.iter().filter_map(Value::as_object) {
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    CaseTable {
        columns,
        rows: data.iter().map(CaseRecord::from_row).collect(),
    }
}

fn is_known_column(column: &str) -> bool {
    column == DATE || column == LOCATION || NUMERIC_COLUMNS.contains(&column)
}

fn compare_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Integral values print without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_empty_payloads() {
        assert!(normalize(&json!({ "data": [] })).is_empty());
        assert!(normalize(&json!({})).is_empty());
        assert!(normalize(&json!({ "data": "nope" })).is_empty());
    }

    #[test]
    fn test_normalize_coerces_known_columns() {
        let table = normalize(&json!({ "data": [
            { "date": "2022-03-01", "location": "Indonesia", "new_cases": 12,
              "new_deaths": "3", "total_cases": " 1500.5 ", "iso_code": "IDN" }
        ]}));

        let r = &table.rows[0];
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2022, 3, 1));
        assert_eq!(r.location.as_deref(), Some("Indonesia"));
        assert_eq!(r.new_cases, Some(12.0));
        assert_eq!(r.new_deaths, Some(3.0));
        assert_eq!(r.total_cases, Some(1500.5));
        assert_eq!(r.total_deaths, None);
        assert_eq!(r.extra.get("iso_code"), Some(&json!("IDN")));
        assert_eq!(
            table.columns,
            vec!["date", "location", "new_cases", "new_deaths", "total_cases", "iso_code"]
        );
    }

    #[test]
    fn test_normalize_keeps_malformed_rows() {
        let table = normalize(&json!({ "data": [
            { "location": "USA", "new_cases": 4 },
            { "date": "31/02/2022", "new_cases": "many" },
            { "date": null, "new_cases": true },
            42
        ]}));

        assert_eq!(table.len(), 4);
        assert!(table.rows.iter().all(|r| r.date.is_none()));
        assert_eq!(table.rows[0].new_cases, Some(4.0));
        assert_eq!(table.rows[1].new_cases, None);
        assert_eq!(table.rows[2].new_cases, None);
        assert_eq!(table.rows[3], CaseRecord::default());
    }

    #[test]
    fn test_column_order_is_first_seen() {
        let table = normalize(&json!({ "data": [
            { "location": "USA" },
            { "date": "2022-01-01", "location": "USA", "new_cases": 1 }
        ]}));

        assert_eq!(table.columns, vec!["location", "date", "new_cases"]);
    }

    #[test]
    fn test_sorted_by_date_puts_undated_last_and_preserves_storage() {
        let table = normalize(&json!({ "data": [
            { "date": "2022-01-03", "new_cases": 3 },
            { "date": "bad", "new_cases": 0 },
            { "date": "2022-01-01", "new_cases": 1 }
        ]}));

        let sorted: Vec<_> = table.sorted_by_date().iter().map(|r| r.cell("new_cases")).collect();

        assert_eq!(sorted, vec!["1", "3", "0"]);
        assert_eq!(table.rows[0].new_cases, Some(3.0));
        assert_eq!(table.latest_date(), NaiveDate::from_ymd_opt(2022, 1, 3));
    }

    #[test]
    fn test_cell_rendering() {
        let record = CaseRecord::from_row(&json!({
            "date": "2022-01-01",
            "new_cases": 7.0,
            "total_cases": 2.5,
            "note": null,
            "flag": true
        }));

        assert_eq!(record.cell("date"), "2022-01-01");
        assert_eq!(record.cell("new_cases"), "7");
        assert_eq!(record.cell("total_cases"), "2.5");
        assert_eq!(record.cell("new_deaths"), "");
        assert_eq!(record.cell("note"), "");
        assert_eq!(record.cell("flag"), "true");
        assert_eq!(record.cell("unknown"), "");
    }
}
