use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::categories::{Category, Label};
use crate::error::{LedgerError, Result};
use crate::models::{lenient_u64, non_empty};

/// A row of the backend's category-rule sheet. The backend does the matching;
/// the client only edits the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    #[serde(rename = "ruleId", default, deserialize_with = "lenient_u64")]
    pub rule_id: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub row_number: u64,
    #[serde(default, deserialize_with = "non_empty")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub amount_min: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub amount_max: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub subcategory: Option<String>,
    #[serde(rename = "Categories", default, deserialize_with = "non_empty")]
    pub categories: Option<String>,
}

impl CategoryRule {
    pub fn get(&self, field: RuleField) -> Option<String> {
        match field {
            RuleField::RuleId => Some(self.rule_id.to_string()),
            RuleField::Mode => self.mode.clone(),
            RuleField::Name => self.name.clone(),
            RuleField::AmountMin => self.amount_min.clone(),
            RuleField::AmountMax => self.amount_max.clone(),
            RuleField::Category => self.category.clone(),
            RuleField::Subcategory => self.subcategory.clone(),
        }
    }

    fn slot(&mut self, field: RuleField) -> Option<&mut Option<String>> {
        match field {
            RuleField::RuleId => None,
            RuleField::Mode => Some(&mut self.mode),
            RuleField::Name => Some(&mut self.name),
            RuleField::AmountMin => Some(&mut self.amount_min),
            RuleField::AmountMax => Some(&mut self.amount_max),
            RuleField::Category => Some(&mut self.category),
            RuleField::Subcategory => Some(&mut self.subcategory),
        }
    }

    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        self.mode.is_none()
            && self.name.is_none()
            && self.amount_min.is_none()
            && self.amount_max.is_none()
            && self.category.is_none()
            && self.subcategory.is_none()
            && self.categories.is_none()
    }
}

/// The editable/sortable columns, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    RuleId,
    Mode,
    Name,
    AmountMin,
    AmountMax,
    Category,
    Subcategory,
}

impl RuleField {
    pub const ALL: [RuleField; 7] = [
        RuleField::RuleId,
        RuleField::Mode,
        RuleField::Name,
        RuleField::AmountMin,
        RuleField::AmountMax,
        RuleField::Category,
        RuleField::Subcategory,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RuleField::RuleId => "Rule ID",
            RuleField::Mode => "Mode",
            RuleField::Name => "Name",
            RuleField::AmountMin => "Min Amount",
            RuleField::AmountMax => "Max Amount",
            RuleField::Category => "Category",
            RuleField::Subcategory => "Subcategory",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match key.as_str() {
            "id" | "ruleid" => Ok(RuleField::RuleId),
            "mode" => Ok(RuleField::Mode),
            "name" => Ok(RuleField::Name),
            "min" | "amountmin" | "minamount" => Ok(RuleField::AmountMin),
            "max" | "amountmax" | "maxamount" => Ok(RuleField::AmountMax),
            "category" => Ok(RuleField::Category),
            "subcategory" => Ok(RuleField::Subcategory),
            _ => Err(LedgerError::Other(format!("Unknown rule column: {s}"))),
        }
    }

    fn is_amount(self) -> bool {
        matches!(self, RuleField::AmountMin | RuleField::AmountMax)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSort {
    pub field: RuleField,
    pub direction: SortDirection,
}

impl Default for RuleSort {
    fn default() -> Self {
        Self {
            field: RuleField::RuleId,
            direction: SortDirection::Asc,
        }
    }
}

impl RuleSort {
    /// Same column flips direction; a new column starts ascending.
    pub fn toggle(&mut self, field: RuleField) {
        if field == self.field {
            self.direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }
}

/// `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub category: Option<String>,
    pub mode: Option<String>,
}

impl RuleFilter {
    pub fn matches(&self, rule: &CategoryRule) -> bool {
        if let Some(cat) = &self.category {
            if rule.category.as_deref() != Some(cat.as_str()) {
                return false;
            }
        }
        if let Some(mode) = &self.mode {
            if rule.mode.as_deref() != Some(mode.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: Vec<CategoryRule>,
}

impl RuleBook {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn find(&self, rule_id: u64) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }

    /// Append an empty rule and return its id.
    pub fn add_rule(&mut self) -> u64 {
        let rule_id = self.rules.iter().map(|r| r.rule_id).max().unwrap_or(0) + 1;
        self.rules.push(CategoryRule {
            rule_id,
            row_number: self.rules.len() as u64 + 1,
            ..CategoryRule::default()
        });
        rule_id
    }

    /// Set one text column. Empty input clears it. Category values are
    /// canonicalized; a subcategory must belong to the rule's category, and
    /// changing the category drops a subcategory that no longer fits.
    pub fn update(&mut self, rule_id: u64, field: RuleField, value: &str) -> Result<()> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.rule_id == rule_id)
            .ok_or(LedgerError::UnknownRule(rule_id))?;
        let value = value.trim();

        let new_value = if value.is_empty() {
            None
        } else {
            match field {
                RuleField::RuleId => {
                    return Err(LedgerError::Other("Rule ID cannot be edited".into()));
                }
                RuleField::Category => Some(value.parse::<Category>()?.name().to_string()),
                RuleField::Subcategory => {
                    let category = rule.category.as_deref().ok_or_else(|| {
                        LedgerError::Other("Set a category before the subcategory".into())
                    })?;
                    let label = Label::parse(category, Some(value))?;
                    Some(label.subcategory_str().to_string())
                }
                RuleField::AmountMin | RuleField::AmountMax => {
                    let cleaned = value.replace(',', "");
                    cleaned.parse::<f64>().map_err(|_| {
                        LedgerError::Other(format!("{} must be a number", field.label()))
                    })?;
                    Some(cleaned)
                }
                RuleField::Mode | RuleField::Name => Some(value.to_string()),
            }
        };

        if field == RuleField::Category {
            let keeps_sub = match (&new_value, &rule.subcategory) {
                (Some(cat), Some(sub)) => Label::parse(cat, Some(sub.as_str())).is_ok(),
                _ => false,
            };
            if !keeps_sub {
                rule.subcategory = None;
            }
        }

        if let Some(slot) = rule.slot(field) {
            *slot = new_value;
        }
        Ok(())
    }

    /// Blank every column but keep the rule's id and sheet row, so the backend
    /// overwrites the row instead of leaving a gap.
    pub fn clear(&mut self, rule_id: u64) -> Result<()> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.rule_id == rule_id)
            .ok_or(LedgerError::UnknownRule(rule_id))?;
        *rule = CategoryRule {
            rule_id: rule.rule_id,
            row_number: rule.row_number,
            ..CategoryRule::default()
        };
        Ok(())
    }

    /// Filtered and sorted view for display. Missing values sort last in
    /// either direction.
    pub fn view(&self, filter: &RuleFilter, sort: RuleSort) -> Vec<&CategoryRule> {
        let mut rows: Vec<&CategoryRule> = self.rules.iter().filter(|r| filter.matches(r)).collect();
        rows.sort_by(|a, b| compare_rules(a, b, sort));
        rows
    }

    pub fn unique_categories(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|r| r.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn unique_modes(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|r| r.mode.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn compare_rules(a: &CategoryRule, b: &CategoryRule, sort: RuleSort) -> Ordering {
    let ordered = |ord: Ordering| match sort.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    };

    if sort.field == RuleField::RuleId {
        return ordered(a.rule_id.cmp(&b.rule_id));
    }

    match (a.get(sort.field), b.get(sort.field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let numeric = if sort.field.is_amount() {
                x.parse::<f64>().ok().zip(y.parse::<f64>().ok())
            } else {
                None
            };
            match numeric {
                Some((nx, ny)) => ordered(nx.total_cmp(&ny)),
                None => ordered(x.to_lowercase().cmp(&y.to_lowercase())),
            }
        }
    }
}
