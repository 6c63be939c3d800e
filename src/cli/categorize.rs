use colored::Colorize;
use tracing::info;

use crate::api::LedgerBackend;
use crate::categories::Label;
use crate::error::{LedgerError, Result};
use crate::models::Transaction;

pub fn run(
    backend: &dyn LedgerBackend,
    row: u64,
    category: &str,
    subcategory: Option<&str>,
) -> Result<()> {
    let label = Label::parse(category, subcategory)?;
    let txn = categorize_row(backend, row, label)?;
    println!(
        "{} Row {} '{}' \u{2192} {}{}",
        "\u{2713}".green(),
        txn.row_number,
        txn.description,
        label.category,
        label
            .subcategory
            .map(|s| format!(" / {s}"))
            .unwrap_or_default(),
    );
    Ok(())
}

/// Label one uncategorized row and submit it on its own.
pub(crate) fn categorize_row(
    backend: &dyn LedgerBackend,
    row: u64,
    label: Label,
) -> Result<Transaction> {
    let mut txn = backend
        .fetch_uncategorized()?
        .into_iter()
        .find(|t| t.row_number == row)
        .ok_or(LedgerError::UnknownTransaction(row))?;
    txn.apply_label(label);
    backend.submit_categorized(std::slice::from_ref(&txn))?;
    info!(row, category = %label.category, "categorized from command line");
    Ok(txn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::categories::Category;
    use crate::models::sample_transaction;

    #[test]
    fn test_categorize_submits_single_row() {
        let backend = FakeBackend::with_uncategorized(vec![
            sample_transaction(1, "Swiggy", 320.0),
            sample_transaction(2, "Ola cab", 180.0),
        ]);
        let label = Label::new(Category::Transport, "taxi").unwrap();
        let txn = categorize_row(&backend, 2, label).unwrap();
        assert_eq!(txn.subcategory.as_deref(), Some("Taxi"));

        let submitted = backend.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].len(), 1);
        assert_eq!(submitted[0][0].category.as_deref(), Some("Transport"));
        assert_eq!(backend.uncategorized.borrow().len(), 1);
    }

    #[test]
    fn test_unknown_row() {
        let backend = FakeBackend::with_uncategorized(vec![sample_transaction(1, "Swiggy", 320.0)]);
        let label = Label::new(Category::DiningOut, "").unwrap();
        assert!(matches!(
            categorize_row(&backend, 42, label),
            Err(LedgerError::UnknownTransaction(42))
        ));
        assert!(backend.submitted.borrow().is_empty());
    }
}
