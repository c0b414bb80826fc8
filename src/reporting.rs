// 📊 Reporting - monthly volume received per recipient account
//
// Pure recomputation over the whole transfer history on every call.
//
// Months are bucketed by calendar month NAME only: March 2023 and March 2024
// land in the same "March" bucket. The month axis follows first appearance in
// the transfer log, not calendar order.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::entities::{AccountStore, Transfer};

/// Series name used when a recipient account has since been deleted
pub const UNKNOWN_ACCOUNT: &str = "Unknown Account";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSeries {
    pub account_id: String,
    pub name: String,
    /// One amount per entry of `MonthlyVolumeReport::months`
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyVolumeReport {
    pub months: Vec<String>,
    pub series: Vec<VolumeSeries>,
}

impl MonthlyVolumeReport {
    pub fn series_for(&self, account_id: &str) -> Option<&VolumeSeries> {
        self.series.iter().find(|s| s.account_id == account_id)
    }

    /// Volume of one account in one month bucket (0 when absent)
    pub fn volume(&self, account_id: &str, month: &str) -> f64 {
        let Some(index) = self.months.iter().position(|m| m == month) else {
            return 0.0;
        };
        self.series_for(account_id)
            .and_then(|s| s.data.get(index).copied())
            .unwrap_or(0.0)
    }

    /// Volume across every recipient for one month bucket
    pub fn month_total(&self, month: &str) -> f64 {
        let Some(index) = self.months.iter().position(|m| m == month) else {
            return 0.0;
        };
        self.series.iter().filter_map(|s| s.data.get(index)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Calendar month name, e.g. "March". The year is deliberately not part of the label.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B").to_string()
}

pub fn monthly_volume_by_recipient(
    transfers: &[Transfer],
    accounts: &AccountStore,
) -> MonthlyVolumeReport {
    let mut months: Vec<String> = Vec::new();

    // recipient id -> (month -> amount), recipients kept in first-seen order
    let mut order: Vec<&str> = Vec::new();
    let mut volumes: HashMap<&str, HashMap<String, f64>> = HashMap::new();

    for transfer in transfers {
        let month = month_label(transfer.date());
        if !months.contains(&month) {
            months.push(month.clone());
        }

        for recipient in transfer.recipients() {
            let account_id = recipient.account_id.as_str();
            let by_month = volumes.entry(account_id).or_insert_with(|| {
                order.push(account_id);
                HashMap::new()
            });
            *by_month.entry(month.clone()).or_insert(0.0) += recipient.amount;
        }
    }

    let series = order
        .into_iter()
        .map(|account_id| {
            let by_month = &volumes[account_id];
            VolumeSeries {
                account_id: account_id.to_string(),
                name: accounts
                    .get(account_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| UNKNOWN_ACCOUNT.to_string()),
                data: months
                    .iter()
                    .map(|m| by_month.get(m).copied().unwrap_or(0.0))
                    .collect(),
            }
        })
        .collect();

    MonthlyVolumeReport { months, series }
}

// ============================================================================
// TESTS
// ============================================================================
