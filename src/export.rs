// 📤 Export - accounts and transfers as CSV
//
// Amounts are written with 2 decimal places. Rows follow store and log order.

use serde::Serialize;
use std::io::Write;

use crate::entities::{AccountStore, Transfer};

/// Output row for `write_accounts`. Headers: `id,name,type,balance`.
#[derive(Serialize)]
struct AccountRow<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    account_type: &'static str,
    balance: String,
}

/// Output row for `write_transfers`, one per recipient line.
///
/// Headers: `transfer_id,date,source_account_id,recipient_account_id,amount`.
/// A transfer without recipients still gets one row with empty recipient columns.
#[derive(Serialize)]
struct TransferRow<'a> {
    transfer_id: &'a str,
    date: String,
    source_account_id: &'a str,
    recipient_account_id: Option<&'a str>,
    amount: Option<String>,
}

/// Writes accounts in store order, balances with 2 decimal places.
///
/// # Examples
///
/// ```
/// use transfer_ledger::export::write_accounts;
/// use transfer_ledger::{AccountType, Ledger};
///
/// let mut ledger = Ledger::new();
/// ledger.add_account("Rainy Day", AccountType::Savings);
///
/// let mut out = Vec::new();
/// write_accounts(&mut out, ledger.accounts()).unwrap();
///
/// let s = String::from_utf8(out).unwrap();
/// assert!(s.starts_with("id,name,type,balance\n"));
/// assert!(s.contains(",Rainy Day,savings,0.00\n"));
/// ```
pub fn write_accounts<W: Write>(writer: W, accounts: &AccountStore) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for account in accounts.iter() {
        wtr.serialize(AccountRow {
            id: account.id(),
            name: &account.name,
            account_type: account.account_type.as_str(),
            balance: format!("{:.2}", account.balance()),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the transfer log in submission order, one row per recipient line.
pub fn write_transfers<W: Write>(writer: W, transfers: &[Transfer]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for transfer in transfers {
        let date = transfer.date().format("%Y-%m-%d").to_string();

        if transfer.recipients().is_empty() {
            wtr.serialize(TransferRow {
                transfer_id: transfer.id(),
                date,
                source_account_id: transfer.source_account_id(),
                recipient_account_id: None,
                amount: None,
            })?;
            continue;
        }

        for recipient in transfer.recipients() {
            wtr.serialize(TransferRow {
                transfer_id: transfer.id(),
                date: date.clone(),
                source_account_id: transfer.source_account_id(),
                recipient_account_id: Some(&recipient.account_id),
                amount: Some(format!("{:.2}", recipient.amount)),
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}
