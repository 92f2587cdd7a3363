//! CSV format handling for wallet seeds, transfer requests and outputs
//!
//! This module centralizes all CSV format concerns, providing:
//! - Raw record structures for deserialization
//! - Conversion from raw records to domain types (`FromCsvRecord`)
//! - Wallet and transfer output serialization
//!
//! All functions are pure (no file I/O) for easy testing.
//!
//! # Formats
//!
//! ```text
//! wallets.csv          transfers.csv        output (wallets)       transfers-out
//! id,type,balance      payer,payee,value    id,type,balance        id,payer,payee,value,created_at
//! 1,common,100.00      1,2,40.00            1,common,60.0000       <uuid>,1,2,40.0000,<rfc3339>
//! ```

use crate::types::{Transfer, TransferRequest, Wallet, WalletId, WalletType};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Domain types that can be built from one CSV row
pub trait FromCsvRecord: Sized {
    /// Raw row as deserialized by csv
    type Raw: DeserializeOwned;

    /// Convert a raw row, describing the problem on failure
    fn from_csv_record(raw: Self::Raw) -> Result<Self, String>;
}

/// Wallet seed row: id, type, balance
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvWalletRecord {
    pub id: WalletId,
    #[serde(rename = "type")]
    pub wallet_type: String,
    pub balance: String,
}

/// Transfer request row: payer, payee, value
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvTransferRecord {
    pub payer: WalletId,
    pub payee: WalletId,
    pub value: String,
}

fn parse_decimal(raw: &str, field: &str, context: &str) -> Result<Decimal, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{} requires a {}", context, field));
    }

    Decimal::from_str(trimmed).map_err(|_| format!("Invalid {} '{}' for {}", field, raw, context))
}

/// Convert a CsvWalletRecord to a Wallet
///
/// Rejects unknown wallet types, unparsable balances and negative balances.
pub fn convert_wallet_record(record: CsvWalletRecord) -> Result<Wallet, String> {
    let context = format!("wallet {}", record.id);
    let wallet_type = WalletType::from_str(&record.wallet_type)
        .map_err(|e| format!("{} for {}", e, context))?;
    let balance = parse_decimal(&record.balance, "balance", &context)?;

    Wallet::new(record.id, wallet_type, balance).map_err(|e| format!("{} for {}", e, context))
}

/// Convert a CsvTransferRecord to a TransferRequest
///
/// Only the value format is checked here. Business validation (positive value,
/// distinct wallets) belongs to the orchestrator.
pub fn convert_transfer_record(record: CsvTransferRecord) -> Result<TransferRequest, String> {
    let context = format!("transfer {} -> {}", record.payer, record.payee);
    let value = parse_decimal(&record.value, "value", &context)?;

    Ok(TransferRequest::new(record.payer, record.payee, value))
}

impl FromCsvRecord for Wallet {
    type Raw = CsvWalletRecord;

    fn from_csv_record(raw: Self::Raw) -> Result<Self, String> {
        convert_wallet_record(raw)
    }
}

impl FromCsvRecord for TransferRequest {
    type Raw = CsvTransferRecord;

    fn from_csv_record(raw: Self::Raw) -> Result<Self, String> {
        convert_transfer_record(raw)
    }
}

/// Write wallet states to CSV format
///
/// Writes wallets with columns: id, type, balance.
/// Wallets are sorted by id for deterministic output.
pub fn write_wallets_csv(wallets: &[Wallet], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["id", "type", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_wallets = wallets.to_vec();
    sorted_wallets.sort_by_key(|wallet| wallet.id());

    for wallet in sorted_wallets {
        writer
            .write_record(&[
                wallet.id().to_string(),
                wallet.wallet_type().to_string(),
                format!("{:.4}", wallet.balance()),
            ])
            .map_err(|e| format!("Failed to write wallet record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write committed transfers to CSV format
///
/// Writes transfers with columns: id, payer, payee, value, created_at,
/// in the order given.
pub fn write_transfers_csv(transfers: &[Transfer], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["id", "payer", "payee", "value", "created_at"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for transfer in transfers {
        writer
            .write_record(&[
                transfer.id().to_string(),
                transfer.payer().to_string(),
                transfer.payee().to_string(),
                format!("{:.4}", transfer.value()),
                transfer.created_at().to_rfc3339(),
            ])
            .map_err(|e| format!("Failed to write transfer record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
