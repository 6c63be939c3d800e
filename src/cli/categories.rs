use comfy_table::{Cell, Table};

use crate::categories::Category;
use crate::error::Result;

pub fn run() -> Result<()> {
    println!("Categories\n{}", categories_table());
    Ok(())
}

pub(crate) fn categories_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Subcategories"]);
    for category in Category::ALL {
        table.add_row(vec![
            Cell::new(category.name()),
            Cell::new(category.subcategories().join(", ")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_every_category() {
        let table = categories_table();
        assert_eq!(table.row_iter().count(), Category::ALL.len());
        let text = table.to_string();
        assert!(text.contains("Gifts/Donations"));
        assert!(text.contains("Food Delivery"));
    }
}
