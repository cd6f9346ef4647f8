//! Export a panel table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::SeriesTable;
use crate::error::AppError;

/// Write `table` as CSV: `date,period,<labels...>`, empty cell for missing.
pub fn write_table_csv(path: &Path, table: &SeriesTable) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(3, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_table(&mut file, table)
        .map_err(|e| AppError::new(3, format!("Failed to write export CSV '{}': {e}", path.display())))
}

pub fn write_table<W: Write>(out: &mut W, table: &SeriesTable) -> std::io::Result<()> {
    let mut header = vec!["date".to_string(), "period".to_string()];
    header.extend(table.columns.iter().map(|c| escape(&c.label)));
    writeln!(out, "{}", header.join(","))?;

    for (row, date) in table.dates.iter().enumerate() {
        let period = table.periods.get(row).map(String::as_str).unwrap_or("");
        let mut fields = vec![date.to_string(), escape(period)];
        for c in &table.columns {
            fields.push(c.values[row].map(|v| v.to_string()).unwrap_or_default());
        }
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Column;
    use chrono::NaiveDate;

    #[test]
    fn writes_header_rows_and_blank_missing_cells() {
        let table = SeriesTable {
            dates: vec![
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
            ],
            periods: vec!["2023 JAN".to_string(), "2023 FEB".to_string()],
            columns: vec![
                Column {
                    label: "16-24".to_string(),
                    values: vec![Some(11.2), None],
                },
                Column {
                    label: "Aged 50+, all".to_string(),
                    values: vec![Some(3.0), Some(3.1)],
                },
            ],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ages.csv");
        write_table_csv(&path, &table).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "date,period,16-24,\"Aged 50+, all\"\n2023-01-01,2023 JAN,11.2,3\n2023-02-01,2023 FEB,,3.1\n"
        );
    }
}
