use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::{LedgerError, Result};
use crate::models::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionType {
    #[default]
    Debit,
    Credit,
}

impl TransactionType {
    pub fn amount(self, txn: &Transaction) -> f64 {
        match self {
            TransactionType::Debit => txn.debit_amount,
            TransactionType::Credit => txn.credit_amount,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TransactionType::Debit => TransactionType::Credit,
            TransactionType::Credit => TransactionType::Debit,
        }
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "debit" | "debits" => Ok(TransactionType::Debit),
            "credit" | "credits" => Ok(TransactionType::Credit),
            other => Err(LedgerError::Other(format!(
                "Unknown transaction type '{other}' (expected debit or credit)"
            ))),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionType::Debit => "Debit",
            TransactionType::Credit => "Credit",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Category,
    Mode,
}

impl FromStr for ViewMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "category" | "categories" => Ok(ViewMode::Category),
            "mode" | "modes" => Ok(ViewMode::Mode),
            other => Err(LedgerError::Other(format!(
                "Unknown view '{other}' (expected category or mode)"
            ))),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewMode::Category => "By category",
            ViewMode::Mode => "By payment mode",
        })
    }
}

/// Amount buckets; lower bound inclusive, upper exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmountRange {
    #[default]
    All,
    UpTo500,
    From500To1000,
    From1000To5000,
    Over5000,
}

impl AmountRange {
    pub const ALL: [AmountRange; 5] = [
        AmountRange::All,
        AmountRange::UpTo500,
        AmountRange::From500To1000,
        AmountRange::From1000To5000,
        AmountRange::Over5000,
    ];

    fn bounds(self) -> (f64, f64) {
        match self {
            AmountRange::All => (f64::NEG_INFINITY, f64::INFINITY),
            AmountRange::UpTo500 => (0.0, 500.0),
            AmountRange::From500To1000 => (500.0, 1000.0),
            AmountRange::From1000To5000 => (1000.0, 5000.0),
            AmountRange::Over5000 => (5000.0, f64::INFINITY),
        }
    }

    pub fn contains(self, amount: f64) -> bool {
        let (lo, hi) = self.bounds();
        amount >= lo && amount < hi
    }

    pub fn key(self) -> &'static str {
        match self {
            AmountRange::All => "all",
            AmountRange::UpTo500 => "0-500",
            AmountRange::From500To1000 => "500-1000",
            AmountRange::From1000To5000 => "1000-5000",
            AmountRange::Over5000 => "5000+",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|r| *r == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl FromStr for AmountRange {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.key() == key)
            .ok_or_else(|| {
                LedgerError::Other(format!(
                    "Unknown amount range '{s}' (expected all, 0-500, 500-1000, 1000-5000 or 5000+)"
                ))
            })
    }
}

impl fmt::Display for AmountRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountRange::All => f.write_str("All amounts"),
            AmountRange::Over5000 => write!(f, "{}5000+", crate::fmt::CURRENCY),
            other => {
                let (lo, hi) = other.bounds();
                write!(f, "{c}{lo}-{c}{hi}", c = crate::fmt::CURRENCY)
            }
        }
    }
}

/// One bar/slice of the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSlice {
    pub name: String,
    pub value: f64,
}

/// Filter state for the analytics screen. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsFilter {
    pub transaction_type: TransactionType,
    pub view_mode: ViewMode,
    category: Option<String>,
    mode: Option<String>,
    range: AmountRange,
}

impl AnalyticsFilter {
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    pub fn range(&self) -> AmountRange {
        self.range
    }

    pub fn set_transaction_type(&mut self, t: TransactionType) {
        self.transaction_type = t;
    }

    /// Switching views resets the amount range, and the mode filter when
    /// going back to the category view.
    pub fn set_view_mode(&mut self, view: ViewMode) {
        if view == ViewMode::Category {
            self.mode = None;
        }
        self.view_mode = view;
        self.range = AmountRange::All;
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category.filter(|c| !c.eq_ignore_ascii_case("all"));
        self.range = AmountRange::All;
    }

    pub fn set_mode(&mut self, mode: Option<String>) {
        self.mode = mode.filter(|m| !m.eq_ignore_ascii_case("all"));
        self.range = AmountRange::All;
    }

    pub fn set_range(&mut self, range: AmountRange) {
        self.range = range;
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        let amount = self.transaction_type.amount(txn);
        if amount <= 0.0 || !self.range.contains(amount) {
            return false;
        }
        // The category filter only applies in the category view.
        if self.view_mode == ViewMode::Category {
            if let Some(cat) = &self.category {
                if txn.category.as_deref() != Some(cat.as_str()) {
                    return false;
                }
            }
        }
        match &self.mode {
            Some(mode) => txn.mode == *mode,
            None => true,
        }
    }

    pub fn filtered<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions.iter().filter(|t| self.matches(t)).collect()
    }

    fn group_key<'a>(&self, txn: &'a Transaction) -> Option<&'a str> {
        let key = match self.view_mode {
            ViewMode::Category => txn.category.as_deref().unwrap_or(""),
            ViewMode::Mode => txn.mode.as_str(),
        };
        (!key.is_empty()).then_some(key)
    }

    /// Totals per category or mode, largest first.
    pub fn chart_data(&self, transactions: &[Transaction]) -> Vec<ChartSlice> {
        let mut totals: HashMap<&str, f64> = HashMap::new();
        for txn in self.filtered(transactions) {
            if let Some(key) = self.group_key(txn) {
                *totals.entry(key).or_default() += self.transaction_type.amount(txn);
            }
        }
        let mut slices: Vec<ChartSlice> = totals
            .into_iter()
            .map(|(name, value)| ChartSlice {
                name: name.to_string(),
                value,
            })
            .collect();
        slices.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
        slices
    }
}

/// Percentage of the chart total each slice represents.
pub fn share(slices: &[ChartSlice]) -> Vec<f64> {
    let total: f64 = slices.iter().map(|s| s.value).sum();
    slices
        .iter()
        .map(|s| if total > 0.0 { s.value / total * 100.0 } else { 0.0 })
        .collect()
}

pub fn unique_categories(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .filter_map(|t| t.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn unique_modes(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .filter(|t| !t.mode.is_empty())
        .map(|t| t.mode.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_transaction;

    fn txn(row: u64, category: &str, mode: &str, debit: f64, credit: f64) -> Transaction {
        let mut t = sample_transaction(row, "test", debit);
        t.credit_amount = credit;
        t.mode = mode.to_string();
        t.category = (!category.is_empty()).then(|| category.to_string());
        t
    }

    fn data() -> Vec<Transaction> {
        vec![
            txn(1, "Dining Out", "UPI", 320.0, 0.0),
            txn(2, "Dining Out", "CARD", 780.0, 0.0),
            txn(3, "Transport", "UPI", 1200.0, 0.0),
            txn(4, "Income", "NEFT", 0.0, 50_000.0),
            txn(5, "", "UPI", 99.0, 0.0),
            txn(6, "Shopping", "CARD", 6400.0, 0.0),
        ]
    }

    #[test]
    fn test_range_bounds() {
        assert!(AmountRange::UpTo500.contains(0.0));
        assert!(!AmountRange::UpTo500.contains(500.0));
        assert!(AmountRange::From500To1000.contains(500.0));
        assert!(AmountRange::Over5000.contains(5000.0));
        assert_eq!("5000+".parse::<AmountRange>().unwrap(), AmountRange::Over5000);
        assert!("10-20".parse::<AmountRange>().is_err());
        assert_eq!(AmountRange::Over5000.next(), AmountRange::All);
    }

    #[test]
    fn test_debit_chart_by_category() {
        let f = AnalyticsFilter::default();
        let chart = f.chart_data(&data());
        let names: Vec<&str> = chart.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Shopping", "Transport", "Dining Out"]);
        assert_eq!(chart[2].value, 1100.0);
    }

    #[test]
    fn test_credit_only_counts_credits() {
        let mut f = AnalyticsFilter::default();
        f.set_transaction_type(TransactionType::Credit);
        assert_eq!(f.filtered(&data()).len(), 1);
        assert_eq!(f.chart_data(&data())[0].name, "Income");
    }

    #[test]
    fn test_mode_view_groups_by_mode() {
        let mut f = AnalyticsFilter::default();
        f.set_view_mode(ViewMode::Mode);
        let chart = f.chart_data(&data());
        assert_eq!(chart[0].name, "CARD");
        assert_eq!(chart[0].value, 7180.0);
        assert_eq!(chart[1].value, 1619.0);
    }

    #[test]
    fn test_filters_reset_range() {
        let mut f = AnalyticsFilter::default();
        f.set_range(AmountRange::From500To1000);
        f.set_category(Some("Dining Out".into()));
        assert_eq!(f.range(), AmountRange::All);

        f.set_range(AmountRange::UpTo500);
        assert_eq!(f.filtered(&data()).len(), 1);

        f.set_mode(Some("CARD".into()));
        assert_eq!(f.range(), AmountRange::All);
        f.set_view_mode(ViewMode::Mode);
        assert_eq!(f.mode(), Some("CARD"));
        f.set_view_mode(ViewMode::Category);
        assert_eq!(f.mode(), None);
    }

    #[test]
    fn test_view_switch_resets_range() {
        let mut f = AnalyticsFilter::default();
        f.set_range(AmountRange::Over5000);
        f.set_view_mode(ViewMode::Mode);
        assert_eq!(f.range(), AmountRange::All);

        f.set_range(AmountRange::Over5000);
        f.set_view_mode(ViewMode::Category);
        assert_eq!(f.range(), AmountRange::All);
    }

    #[test]
    fn test_category_filter_ignored_in_mode_view() {
        let mut f = AnalyticsFilter::default();
        f.set_category(Some("Shopping".into()));
        assert_eq!(f.filtered(&data()).len(), 1);
        f.set_view_mode(ViewMode::Mode);
        assert_eq!(f.filtered(&data()).len(), 5);
    }

    #[test]
    fn test_all_clears_filter() {
        let mut f = AnalyticsFilter::default();
        f.set_category(Some("all".into()));
        assert_eq!(f.category(), None);
    }

    #[test]
    fn test_share_and_options() {
        let slices = vec![
            ChartSlice { name: "A".into(), value: 75.0 },
            ChartSlice { name: "B".into(), value: 25.0 },
        ];
        assert_eq!(share(&slices), vec![75.0, 25.0]);
        assert!(share(&[]).is_empty());
        assert_eq!(unique_modes(&data()), ["CARD", "NEFT", "UPI"]);
        assert_eq!(unique_categories(&data()).len(), 4);
    }
}
