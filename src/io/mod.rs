//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `sync_reader` - Synchronous CSV reader with iterator interface
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::{AsyncReader, RequestBatch};
pub use csv_format::{
    convert_transfer_record, convert_wallet_record, write_transfers_csv, write_wallets_csv,
    CsvTransferRecord, CsvWalletRecord, FromCsvRecord,
};
pub use sync_reader::SyncReader;
