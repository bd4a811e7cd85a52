use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PipelineError, Result};

/// Account types that mark a listing as fraudulent.
pub const FRAUD_ACCT_TYPES: [&str; 3] = ["fraudster_event", "fraudster", "fraudster_att"];

/// One ticket tier of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketType {
    pub quantity_total: f64,
    pub quantity_sold: f64,
}

/// One event listing as ingested.
///
/// Fields outside the ones the pipeline reads are ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Raw, markup-bearing description.
    pub description: String,
    #[serde(default)]
    pub org_desc: String,
    pub country: Option<String>,
    pub venue_country: Option<String>,
    /// Gross ticket sales.
    pub gts: f64,
    /// Payout objects; only their count matters here.
    pub previous_payouts: Vec<Value>,
    pub ticket_types: Vec<TicketType>,
    pub email_domain: String,
    pub delivery_method: Option<f64>,
    pub approx_payout_date: f64,
    pub sale_duration2: Option<f64>,
    pub num_order: f64,
    pub body_length: f64,
    /// Label source; absent on records submitted for inference.
    #[serde(default)]
    pub acct_type: Option<String>,
}

impl Record {
    /// Decode a JSON row. `row` is the position used in error messages.
    pub fn from_value(value: &Value, row: usize) -> Result<Self> {
        Record::deserialize(value).map_err(|source| PipelineError::InvalidRecord { row, source })
    }

    /// `Some(1)` for fraud account types, `Some(0)` otherwise, `None` when the
    /// record carries no account type.
    pub fn fraud_label(&self) -> Option<u8> {
        self.acct_type
            .as_deref()
            .map(|t| u8::from(FRAUD_ACCT_TYPES.contains(&t)))
    }
}

/// Decode a batch of JSON rows, failing on the first malformed one.
pub fn records_from_values(rows: &[Value]) -> Result<Vec<Record>> {
    rows.iter()
        .enumerate()
        .map(|(i, v)| Record::from_value(v, i))
        .collect()
}
