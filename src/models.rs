use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::categories::Label;

/// One bank-statement line as served by the workflow backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub row_number: u64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mode: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub debit_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub credit_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub balance: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub remarks: String,
    #[serde(
        rename = "ai.Category",
        default,
        deserialize_with = "non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub ai_category: Option<String>,
    #[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "non_empty", skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

impl Transaction {
    pub fn is_debit(&self) -> bool {
        self.debit_amount > 0.0
    }

    /// Signed amount: debits negative, credits positive.
    pub fn amount(&self) -> f64 {
        if self.is_debit() {
            -self.debit_amount
        } else {
            self.credit_amount
        }
    }

    pub fn direction_label(&self) -> &'static str {
        if self.is_debit() {
            "To"
        } else {
            "From"
        }
    }

    /// "UPI To: Swiggy on 2024-03-01", or just the date when the mode is unknown.
    pub fn counterparty_line(&self) -> String {
        if self.mode.is_empty() {
            self.date.clone()
        } else {
            format!(
                "{} {}: {} on {}",
                self.mode,
                self.direction_label(),
                self.name,
                self.date
            )
        }
    }

    pub fn apply_label(&mut self, label: Label) {
        self.category = Some(label.category.name().to_string());
        self.subcategory = label.subcategory.map(str::to_string);
    }

    pub fn clear_label(&mut self) {
        self.category = None;
        self.subcategory = None;
    }
}

/// The exact shape the update webhook expects for a labeled row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmittedTransaction {
    pub row_number: u64,
    pub date: String,
    pub description: String,
    pub mode: String,
    pub name: String,
    pub debit_amount: f64,
    pub credit_amount: f64,
    pub balance: f64,
    pub remarks: String,
    pub category: String,
    pub subcategory: String,
}

impl From<&Transaction> for SubmittedTransaction {
    fn from(t: &Transaction) -> Self {
        Self {
            row_number: t.row_number,
            date: t.date.clone(),
            description: t.description.clone(),
            mode: t.mode.clone(),
            name: t.name.clone(),
            debit_amount: t.debit_amount,
            credit_amount: t.credit_amount,
            balance: t.balance,
            remarks: t.remarks.clone(),
            category: t.category.clone().unwrap_or_default(),
            subcategory: t.subcategory.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Submission {
    pub transactions: Vec<SubmittedTransaction>,
}

/// Decode a fetch response. The workflow may answer with a bare array of rows
/// or wrap it as `[{"response": {"body": [...]}}]`. Rows without a row number
/// get their 1-based position.
pub fn transactions_from_json(value: Value) -> Vec<Transaction> {
    let rows = match unwrap_envelope(value) {
        Some(rows) => rows,
        None => return vec![],
    };

    rows.into_iter()
        .enumerate()
        .filter_map(|(idx, row)| match serde_json::from_value::<Transaction>(row) {
            Ok(mut txn) => {
                if txn.row_number == 0 {
                    txn.row_number = idx as u64 + 1;
                }
                Some(txn)
            }
            Err(e) => {
                warn!(index = idx, error = %e, "skipping malformed transaction row");
                None
            }
        })
        .collect()
}

pub(crate) fn unwrap_envelope(value: Value) -> Option<Vec<Value>> {
    let Value::Array(mut items) = value else {
        return None;
    };
    let wrapped = items
        .first()
        .and_then(|first| first.pointer("/response/body"))
        .is_some_and(Value::is_array);
    if wrapped {
        let mut first = items.swap_remove(0);
        if let Some(Value::Array(body)) = first.pointer_mut("/response/body").map(Value::take) {
            return Some(body);
        }
    }
    Some(items)
}

// ---------------------------------------------------------------------------
// Lenient field decoders. Spreadsheet rows send numbers as strings, blanks
// as "" and missing cells as null.
// ---------------------------------------------------------------------------

pub(crate) fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().replace(',', "").parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

pub(crate) fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

pub(crate) fn non_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let s = lenient_string(d)?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[cfg(test)]
pub(crate) fn sample_transaction(row_number: u64, description: &str, debit: f64) -> Transaction {
    Transaction {
        row_number,
        date: "2024-03-01".to_string(),
        description: description.to_string(),
        mode: "UPI".to_string(),
        name: "Swiggy".to_string(),
        debit_amount: debit,
        credit_amount: if debit > 0.0 { 0.0 } else { 1500.0 },
        balance: 10_000.0,
        remarks: String::new(),
        ai_category: Some("Dining Out".to_string()),
        category: None,
        subcategory: None,
    }
}
