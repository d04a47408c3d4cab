//! Spectrum file ingestion.
//!
//! FTIR exports open with two description lines (sample and instrument
//! settings) followed by comma-separated `wavenumber,absorbance` rows in
//! descending wavenumber order. The header lines are free text and are
//! skipped verbatim; every data row must parse, and the resulting grid
//! must satisfy the [`Trace`] invariants.

use std::io::BufRead;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use log::debug;
use ndarray::Array1;

use crate::error::{Result, RovibError};
use crate::trace::Trace;

/// Number of free-text lines before the data rows.
pub const HEADER_LINES: usize = 2;

/// Reads a spectrum export from a file.
///
/// # Arguments
///
/// * `path` - Path to a two-line-header CSV export
///
/// # Returns
///
/// The parsed trace, or an error naming the offending line.
pub fn read_spectrum<P: AsRef<Path>>(path: P) -> Result<Trace> {
    let file = std::fs::File::open(path.as_ref())?;
    let trace = read_spectrum_from(std::io::BufReader::new(file))?;
    debug!(
        "read {} samples from {}",
        trace.len(),
        path.as_ref().display()
    );
    Ok(trace)
}

/// Reads a spectrum export from any buffered reader.
pub fn read_spectrum_from<R: BufRead>(mut reader: R) -> Result<Trace> {
    let mut header = String::new();
    for line in 1..=HEADER_LINES {
        header.clear();
        if reader.read_line(&mut header)? == 0 {
            return Err(RovibError::Ingest {
                line,
                message: "file ends inside the two-line header".to_string(),
            });
        }
    }

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut wavenumber = Vec::new();
    let mut absorption = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let line = HEADER_LINES + i + 1;
        let record = record?;
        if record.len() != 2 {
            return Err(RovibError::Ingest {
                line,
                message: format!("expected two columns, found {}", record.len()),
            });
        }
        wavenumber.push(parse_field(&record[0], "wavenumber", line)?);
        absorption.push(parse_field(&record[1], "absorbance", line)?);
    }

    Trace::new(Array1::from_vec(wavenumber), Array1::from_vec(absorption))
}

fn parse_field(field: &str, name: &str, line: usize) -> Result<f64> {
    field.parse().map_err(|_| RovibError::Ingest {
        line,
        message: format!("invalid {} '{}'", name, field),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    const WELL_FORMED: &str = "\
Sample: HCl gas cell
Wavenumber (cm-1), Absorbance
2906.250, 0.610
2906.125, 0.598
2906.000, 0.575
";

    #[test]
    fn test_reads_two_line_header_export() {
        let trace = read_spectrum_from(Cursor::new(WELL_FORMED)).unwrap();

        assert_eq!(trace.len(), 3);
        assert_relative_eq!(trace.wavenumber()[0], 2906.25);
        assert_relative_eq!(trace.absorption()[2], 0.575);
    }

    #[test]
    fn test_truncated_header_is_reported() {
        let err = read_spectrum_from(Cursor::new("only one line\n")).unwrap_err();
        match err {
            RovibError::Ingest { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("header"));
            }
            other => panic!("expected Ingest error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_names_the_line() {
        let text = "h1\nh2\n2906.250, 0.610\n2906.125\n";
        let err = read_spectrum_from(Cursor::new(text)).unwrap_err();
        match err {
            RovibError::Ingest { line, message } => {
                assert_eq!(line, 4);
                assert!(message.contains("two columns"));
            }
            other => panic!("expected Ingest error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_names_the_field() {
        let text = "h1\nh2\n2906.250, 0.610\nnot-a-number, 0.598\n";
        let err = read_spectrum_from(Cursor::new(text)).unwrap_err();
        match err {
            RovibError::Ingest { line, message } => {
                assert_eq!(line, 4);
                assert!(message.contains("wavenumber"));
                assert!(message.contains("not-a-number"));
            }
            other => panic!("expected Ingest error, got {:?}", other),
        }
    }

    #[test]
    fn test_ascending_grid_is_rejected() {
        let text = "h1\nh2\n2906.000, 0.575\n2906.125, 0.598\n";
        let err = read_spectrum_from(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, RovibError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_data_section_is_rejected() {
        let err = read_spectrum_from(Cursor::new("h1\nh2\n")).unwrap_err();
        assert!(matches!(err, RovibError::InvalidInput(_)));
    }
}
