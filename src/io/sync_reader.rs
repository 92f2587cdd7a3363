//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over wallet seeds or transfer requests from a
//! CSV file. Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! `SyncReader<T>` yields `Result<T, String>` for each CSV row:
//!
//! ```no_run
//! use wallet_transfer_engine::io::sync_reader::SyncReader;
//! use wallet_transfer_engine::types::TransferRequest;
//! use std::path::Path;
//!
//! let reader = SyncReader::<TransferRequest>::new(Path::new("transfers.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(request) => println!("Transfer request: {:?}", request),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Individual row errors are yielded as Err variants, with line numbers

use crate::io::csv_format::FromCsvRecord;
use crate::types::TransferError;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io;
use std::marker::PhantomData;
use std::path::Path;

/// Synchronous CSV reader
///
/// Reads one row at a time; memory usage does not grow with the file size.
#[derive(Debug)]
pub struct SyncReader<T> {
    reader: csv::Reader<File>,
    line_num: usize,
    _record: PhantomData<fn() -> T>,
}

impl<T: FromCsvRecord> SyncReader<T> {
    /// Open a CSV file for streaming iteration
    ///
    /// The CSV reader trims whitespace from all fields and tolerates rows with
    /// a varying number of fields (they surface as row errors).
    ///
    /// # Errors
    ///
    /// Returns an error message if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path).map_err(|e| {
            let error = match e.kind() {
                io::ErrorKind::NotFound => TransferError::FileNotFound {
                    path: path.display().to_string(),
                },
                _ => TransferError::from(e),
            };
            format!("Failed to open file '{}': {}", path.display(), error)
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
            _record: PhantomData,
        })
    }
}

impl<T: FromCsvRecord> Iterator for SyncReader<T> {
    type Item = Result<T, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<T::Raw>();

        match deserializer.next()? {
            Ok(raw) => {
                self.line_num += 1;
                // +1 for the header row
                Some(T::from_csv_record(raw).map_err(|e| format!("Line {}: {}", self.line_num + 1, e)))
            }
            Err(e) => {
                self.line_num += 1;
                Some(Err(format!(
                    "Line {}: {}",
                    self.line_num + 1,
                    TransferError::from(e)
                )))
            }
        }
    }
}
