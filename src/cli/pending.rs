use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::api::LedgerBackend;
use crate::error::Result;
use crate::fmt::{signed_money, truncate};
use crate::models::Transaction;

pub fn run(backend: &dyn LedgerBackend) -> Result<()> {
    let txns = backend.fetch_uncategorized()?;
    if txns.is_empty() {
        println!("No transactions waiting for a category.");
        return Ok(());
    }
    println!("{} transactions to categorize\n{}", txns.len(), pending_table(&txns));
    Ok(())
}

pub(crate) fn pending_table(txns: &[Transaction]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Row", "Date", "Description", "Mode", "Name", "Amount", "Suggested"]);
    for t in txns {
        let amount = if t.is_debit() {
            signed_money(t.amount()).red().to_string()
        } else {
            signed_money(t.amount()).green().to_string()
        };
        table.add_row(vec![
            Cell::new(t.row_number),
            Cell::new(&t.date),
            Cell::new(truncate(&t.description, 40)),
            Cell::new(&t.mode),
            Cell::new(truncate(&t.name, 24)),
            Cell::new(amount),
            Cell::new(t.ai_category.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_transaction;

    #[test]
    fn test_pending_table_lists_rows() {
        colored::control::set_override(false);
        let table = pending_table(&[
            sample_transaction(4, "Swiggy order", 320.0),
            sample_transaction(9, "Salary March", 0.0),
        ])
        .to_string();
        assert!(table.contains("Swiggy order"));
        assert!(table.contains("-\u{20b9}320.00"));
        assert!(table.contains("+\u{20b9}1,500.00"));
        assert!(table.contains("Dining Out"));
    }
}
