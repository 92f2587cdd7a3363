//! Asynchronous CSV reader with batch interface
//!
//! Provides batched reading of transfer requests for the async strategy.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - the csv_format module for row conversion
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of TransferRequests
//!                  ↓
//!           csv_format module
//!           (CsvTransferRecord, convert_transfer_record)
//! ```

use crate::io::csv_format::{convert_transfer_record, CsvTransferRecord};
use crate::types::TransferRequest;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader for transfer requests
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

/// One batch of requests plus the number of rows skipped while reading it
#[derive(Debug, Default)]
pub struct RequestBatch {
    pub requests: Vec<TransferRequest>,
    pub skipped: usize,
}

impl RequestBatch {
    /// True when the end of input was reached without reading anything
    pub fn is_exhausted(&self) -> bool {
        self.requests.is_empty() && self.skipped == 0
    }
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` rows
    ///
    /// Invalid rows are logged and counted in `skipped`; they use up room in
    /// the batch like valid rows. An exhausted batch means end of file.
    pub async fn read_batch(&mut self, batch_size: usize) -> RequestBatch {
        let mut batch = RequestBatch {
            requests: Vec::with_capacity(batch_size),
            skipped: 0,
        };
        let mut records = self.csv_reader.deserialize::<CsvTransferRecord>();

        while batch.requests.len() + batch.skipped < batch_size {
            match records.next().await {
                Some(Ok(record)) => match convert_transfer_record(record) {
                    Ok(request) => batch.requests.push(request),
                    Err(e) => {
                        warn!(error = %e, "Record conversion error");
                        batch.skipped += 1;
                    }
                },
                Some(Err(e)) => {
                    warn!(error = %e, "CSV parse error");
                    batch.skipped += 1;
                }
                None => break,
            }
        }

        batch
    }
}
