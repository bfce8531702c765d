//! Parse the telemetry CSV
//!
//! Expected layout (first line is a header and is skipped):
//!
//! ```text
//! date,Power Consumption,Outdoor Temperature,Occupancy
//! 2024-06-01 08:00,42.7,31.5,12
//! ```

use std::path::Path;

use super::TelemetrySample;
use crate::core::error::LoadError;

/// Parse dataset text into samples
///
/// `source` only names the dataset in error messages.
pub fn parse_dataset(content: &str, source: &str) -> Result<Vec<TelemetrySample>, LoadError> {
    let mut samples = Vec::new();

    for (idx, line) in content.lines().enumerate().skip(1) {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        samples.push(parse_row(line, line_no)?);
    }

    if samples.is_empty() {
        return Err(LoadError::EmptyDataset(source.to_string()));
    }

    Ok(samples)
}

/// Load and parse a dataset file
pub fn load_dataset_from_file(path: &Path) -> Result<Vec<TelemetrySample>, LoadError> {
    let content = std::fs::read_to_string(path)?;
    let samples = parse_dataset(&content, &path.display().to_string())?;
    tracing::info!("Loaded {} telemetry rows from {}", samples.len(), path.display());
    Ok(samples)
}

fn parse_row(line: &str, line_no: usize) -> Result<TelemetrySample, LoadError> {
    let cols: Vec<&str> = line.split(',').map(str::trim).collect();
    if cols.len() < 4 {
        return Err(LoadError::MalformedRow {
            line: line_no,
            reason: format!("expected 4 columns, found {}", cols.len()),
        });
    }

    let number = |col: usize, what: &str| -> Result<f64, LoadError> {
        let value = cols[col].parse::<f64>().map_err(|e| LoadError::MalformedRow {
            line: line_no,
            reason: format!("invalid {} '{}': {}", what, cols[col], e),
        })?;
        if !value.is_finite() {
            return Err(LoadError::MalformedRow {
                line: line_no,
                reason: format!("{} must be a finite number, got '{}'", what, cols[col]),
            });
        }
        Ok(value)
    };

    let power_kw = number(1, "power consumption")?;
    let outdoor_temp_c = number(2, "outdoor temperature")?;
    let occupancy = cols[3].parse::<u32>().map_err(|e| LoadError::MalformedRow {
        line: line_no,
        reason: format!("invalid occupancy '{}': {}", cols[3], e),
    })?;

    Ok(TelemetrySample {
        date: cols[0].to_string(),
        power_kw,
        outdoor_temp_c,
        occupancy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "date,Power Consumption,Outdoor Temperature,Occupancy\n\
                       2024-06-01 08:00,42.7,31.5,12\n\
                       \n\
                       2024-06-01 08:15, 40.1 , 32.0 , 9\n";

    #[test]
    fn test_parse_skips_header_and_blank_lines() {
        let samples = parse_dataset(CSV, "test.csv").unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].date, "2024-06-01 08:00");
        assert_eq!(samples[1].power_kw, 40.1);
        assert_eq!(samples[1].outdoor_temp_c, 32.0);
        assert_eq!(samples[1].occupancy, 9);
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let result = parse_dataset("date,power,temp,occ\n", "empty.csv");
        assert!(matches!(result, Err(LoadError::EmptyDataset(name)) if name == "empty.csv"));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let csv = "h\n2024-06-01,1.0,2.0,3\n2024-06-02,abc,2.0,3\n";
        match parse_dataset(csv, "bad.csv") {
            Err(LoadError::MalformedRow { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("power consumption"));
            }
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_short_row_rejected() {
        let result = parse_dataset("h\n2024-06-01,1.0\n", "short.csv");
        assert!(matches!(result, Err(LoadError::MalformedRow { line: 2, .. })));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let rows = [
            ("d1,NaN,30.0,0", "power consumption"),
            ("d1,inf,30.0,0", "power consumption"),
            ("d1,40.0,NaN,0", "outdoor temperature"),
            ("d1,40.0,-inf,0", "outdoor temperature"),
        ];

        for (row, column) in rows {
            let csv = format!("h\nd0,40.0,30.0,0\n{}\n", row);
            match parse_dataset(&csv, "non-finite.csv") {
                Err(LoadError::MalformedRow { line, reason }) => {
                    assert_eq!(line, 3, "{}", row);
                    assert!(reason.contains(column), "{}: {}", row, reason);
                }
                other => panic!("expected MalformedRow for {}, got {:?}", row, other),
            }
        }
    }
}
