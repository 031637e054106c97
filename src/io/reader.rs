//! Streaming CSV reader for operation records
//!
//! Provides an iterator over operation records from a CSV file. Format
//! concerns are delegated to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `open()`
//! - Malformed rows are yielded as `PointError::ParseError` with the line
//!   number, so the caller can log them and keep going

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{OperationRecord, PointError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Operation reader with constant memory usage
#[derive(Debug)]
pub struct OperationReader<R: Read = File> {
    reader: csv::Reader<R>,
    line_num: u64,
}

impl OperationReader<File> {
    /// Open a CSV file for streaming
    pub fn open(path: &Path) -> Result<Self, PointError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PointError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => PointError::from(e),
        })?;

        Ok(Self::from_reader(file))
    }
}

impl<R: Read> OperationReader<R> {
    /// Wrap any reader producing CSV with a `type,user,amount` header
    ///
    /// Whitespace is trimmed from all fields and rows may omit the amount
    /// column.
    pub fn from_reader(input: R) -> Self {
        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(input);

        Self {
            reader,
            line_num: 1,
        }
    }
}

impl<R: Read> Iterator for OperationReader<R> {
    type Item = Result<OperationRecord, PointError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let next = deserializer.next()?;
        self.line_num += 1;

        Some(match next {
            Ok(csv_record) => convert_csv_record(csv_record).map_err(|message| {
                PointError::ParseError {
                    line: Some(self.line_num),
                    message,
                }
            }),
            Err(e) => Err(PointError::ParseError {
                line: Some(self.line_num),
                message: e.to_string(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_open_missing_file() {
        let err = OperationReader::open(Path::new("nonexistent.csv")).unwrap_err();
        assert_eq!(
            err,
            PointError::FileNotFound {
                path: "nonexistent.csv".to_string()
            }
        );
    }

    #[test]
    fn test_reads_records_in_order() {
        let file = create_temp_csv("type,user,amount\ncharge,1,100\nuse, 1 , 30\ncharge,2,5\n");

        let records: Vec<_> = OperationReader::open(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            records,
            vec![
                OperationRecord { kind: TransactionKind::Charge, user_id: 1, amount: 100 },
                OperationRecord { kind: TransactionKind::Use, user_id: 1, amount: 30 },
                OperationRecord { kind: TransactionKind::Charge, user_id: 2, amount: 5 },
            ]
        );
    }

    #[test]
    fn test_malformed_rows_report_line_and_continue() {
        let input = "type,user,amount\ncharge,1,100\nrefund,1,5\ncharge,abc,5\nuse,1\nuse,1,10\n";
        let results: Vec<_> = OperationReader::from_reader(input.as_bytes()).collect();

        assert_eq!(results.len(), 5);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(PointError::ParseError { line: Some(3), .. })
        ));
        assert!(matches!(
            results[2],
            Err(PointError::ParseError { line: Some(4), .. })
        ));
        assert!(matches!(
            results[3],
            Err(PointError::ParseError { line: Some(5), .. })
        ));
        assert_eq!(
            results[4].as_ref().unwrap(),
            &OperationRecord { kind: TransactionKind::Use, user_id: 1, amount: 10 }
        );
    }

    #[test]
    fn test_header_only() {
        let results: Vec<_> =
            OperationReader::from_reader("type,user,amount\n".as_bytes()).collect();
        assert!(results.is_empty());
    }
}
