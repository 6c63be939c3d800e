use colored::Colorize;
use comfy_table::{Cell, Table};
use tracing::info;

use crate::api::LedgerBackend;
use crate::error::Result;
use crate::rules::{CategoryRule, RuleBook, RuleField, RuleFilter, RuleSort, SortDirection};

pub fn list(
    backend: &dyn LedgerBackend,
    category: Option<String>,
    mode: Option<String>,
    sort: &str,
    desc: bool,
) -> Result<()> {
    let book = RuleBook::new(backend.fetch_rules()?);
    let filter = RuleFilter { category, mode };
    let sort = RuleSort {
        field: RuleField::parse(sort)?,
        direction: if desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
    };
    let rows = book.view(&filter, sort);
    println!("Category rules ({} of {})\n{}", rows.len(), book.len(), rules_table(&rows));
    Ok(())
}

pub(crate) fn rules_table(rules: &[&CategoryRule]) -> Table {
    let mut table = Table::new();
    table.set_header(RuleField::ALL.iter().map(|f| f.label()).collect::<Vec<_>>());
    for rule in rules {
        table.add_row(
            RuleField::ALL
                .iter()
                .map(|f| Cell::new(rule.get(*f).unwrap_or_default()))
                .collect::<Vec<_>>(),
        );
    }
    table
}

/// Values for a new rule, one per editable column.
#[derive(Debug, Default)]
pub struct NewRule {
    pub mode: Option<String>,
    pub name: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

pub fn add(backend: &dyn LedgerBackend, new_rule: NewRule) -> Result<()> {
    let rule_id = add_rule(backend, new_rule)?;
    println!("{} Added rule {rule_id}", "\u{2713}".green());
    Ok(())
}

pub(crate) fn add_rule(backend: &dyn LedgerBackend, new_rule: NewRule) -> Result<u64> {
    let mut book = RuleBook::new(backend.fetch_rules()?);
    let rule_id = book.add_rule();
    // Category before subcategory: the subcategory is checked against it.
    let fields = [
        (RuleField::Mode, new_rule.mode),
        (RuleField::Name, new_rule.name),
        (RuleField::AmountMin, new_rule.min),
        (RuleField::AmountMax, new_rule.max),
        (RuleField::Category, new_rule.category),
        (RuleField::Subcategory, new_rule.subcategory),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            book.update(rule_id, field, &value)?;
        }
    }
    backend.save_rules(book.rules())?;
    info!(rule_id, "added category rule");
    Ok(rule_id)
}

pub fn clear(backend: &dyn LedgerBackend, rule_id: u64) -> Result<()> {
    let mut book = RuleBook::new(backend.fetch_rules()?);
    book.clear(rule_id)?;
    backend.save_rules(book.rules())?;
    info!(rule_id, "cleared category rule");
    println!("{} Cleared rule {rule_id}", "\u{2713}".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::error::LedgerError;

    fn backend() -> FakeBackend {
        let backend = FakeBackend::default();
        *backend.rules.borrow_mut() = vec![CategoryRule {
            rule_id: 5,
            row_number: 1,
            mode: Some("UPI".into()),
            name: Some("Zomato".into()),
            category: Some("Dining Out".into()),
            ..CategoryRule::default()
        }];
        backend
    }

    #[test]
    fn test_add_rule_saves_whole_table() {
        let backend = backend();
        let id = add_rule(
            &backend,
            NewRule {
                mode: Some("CARD".into()),
                min: Some("1,000".into()),
                category: Some("travel".into()),
                subcategory: Some("hotels".into()),
                ..NewRule::default()
            },
        )
        .unwrap();
        assert_eq!(id, 6);
        let saved = backend.rules.borrow();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[1].row_number, 2);
        assert_eq!(saved[1].amount_min.as_deref(), Some("1000"));
        assert_eq!(saved[1].category.as_deref(), Some("Travel"));
        assert_eq!(saved[1].subcategory.as_deref(), Some("Hotels"));
    }

    #[test]
    fn test_add_rule_rejects_bad_subcategory() {
        let backend = backend();
        let result = add_rule(
            &backend,
            NewRule {
                category: Some("Travel".into()),
                subcategory: Some("Pizza".into()),
                ..NewRule::default()
            },
        );
        assert!(matches!(result, Err(LedgerError::InvalidSubcategory { .. })));
        assert_eq!(backend.rules.borrow().len(), 1);
    }

    #[test]
    fn test_clear_blanks_rule() {
        let backend = backend();
        clear(&backend, 5).unwrap();
        let saved = backend.rules.borrow();
        assert!(saved[0].is_blank());
        assert_eq!(saved[0].rule_id, 5);
        assert!(matches!(clear(&backend, 99), Err(LedgerError::UnknownRule(99))));
    }

    #[test]
    fn test_rules_table_has_every_column() {
        let rules = backend().rules.borrow().clone();
        let refs: Vec<&CategoryRule> = rules.iter().collect();
        let table = rules_table(&refs).to_string();
        assert!(table.contains("Rule ID"));
        assert!(table.contains("Zomato"));
    }
}
