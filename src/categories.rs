use std::fmt;
use std::str::FromStr;

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Groceries,
    DiningOut,
    Transport,
    Utilities,
    Housing,
    Entertainment,
    Healthcare,
    Apparel,
    Travel,
    Education,
    Income,
    GiftsDonations,
    PersonalCare,
    Subscriptions,
    Miscellaneous,
}

impl Category {
    /// Display order used by every picker.
    pub const ALL: [Category; 15] = [
        Category::Groceries,
        Category::DiningOut,
        Category::Transport,
        Category::Utilities,
        Category::Housing,
        Category::Entertainment,
        Category::Healthcare,
        Category::Apparel,
        Category::Travel,
        Category::Education,
        Category::Income,
        Category::GiftsDonations,
        Category::PersonalCare,
        Category::Subscriptions,
        Category::Miscellaneous,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Groceries => "Groceries",
            Category::DiningOut => "Dining Out",
            Category::Transport => "Transport",
            Category::Utilities => "Utilities",
            Category::Housing => "Housing",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Apparel => "Apparel",
            Category::Travel => "Travel",
            Category::Education => "Education",
            Category::Income => "Income",
            Category::GiftsDonations => "Gifts/Donations",
            Category::PersonalCare => "Personal Care",
            Category::Subscriptions => "Subscriptions",
            Category::Miscellaneous => "Miscellaneous",
        }
    }

    pub fn subcategories(self) -> &'static [&'static str] {
        match self {
            Category::Groceries => &["Supermarket", "Local Market", "Online Grocery"],
            Category::DiningOut => &["Restaurant", "Cafe", "Fast Food", "Food Delivery"],
            Category::Transport => &["Public Transport", "Taxi", "Fuel", "Maintenance"],
            Category::Utilities => &["Electricity", "Water", "Gas", "Internet", "Phone"],
            Category::Housing => &["Rent", "Mortgage", "Maintenance", "Furniture"],
            Category::Entertainment => &["Movies", "Streaming", "Games", "Events"],
            Category::Healthcare => &["Doctor", "Pharmacy", "Insurance", "Fitness"],
            Category::Apparel => &["Clothing", "Shoes", "Accessories"],
            Category::Travel => &["Flights", "Hotels", "Local Transport", "Activities"],
            Category::Education => &["Tuition", "Books", "Courses", "Supplies"],
            Category::Income => &["Salary", "Freelance", "Investments", "Gifts"],
            Category::GiftsDonations => &["Charity", "Personal Gifts", "Tips"],
            Category::PersonalCare => &["Haircut", "Beauty", "Spa", "Cosmetics"],
            Category::Subscriptions => &["Software", "Memberships", "Services"],
            Category::Miscellaneous => &["Other"],
        }
    }

    /// Canonical spelling of `sub` if it belongs to this category.
    pub fn find_subcategory(self, sub: &str) -> Option<&'static str> {
        let sub = sub.trim();
        self.subcategories()
            .iter()
            .copied()
            .find(|s| s.eq_ignore_ascii_case(sub))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LedgerError::UnknownCategory(wanted.to_string()))
    }
}

/// A category plus an optional subcategory that is guaranteed to belong to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub category: Category,
    pub subcategory: Option<&'static str>,
}

impl Label {
    pub fn new(category: Category, subcategory: &str) -> Result<Self> {
        if subcategory.trim().is_empty() {
            return Ok(Self {
                category,
                subcategory: None,
            });
        }
        match category.find_subcategory(subcategory) {
            Some(sub) => Ok(Self {
                category,
                subcategory: Some(sub),
            }),
            None => Err(LedgerError::InvalidSubcategory {
                category: category.name().to_string(),
                subcategory: subcategory.trim().to_string(),
            }),
        }
    }

    /// Parse both halves from free text, as typed on the command line.
    pub fn parse(category: &str, subcategory: Option<&str>) -> Result<Self> {
        let category: Category = category.parse()?;
        Self::new(category, subcategory.unwrap_or(""))
    }

    pub fn subcategory_str(&self) -> &'static str {
        self.subcategory.unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_subcategories() {
        for cat in Category::ALL {
            assert!(!cat.subcategories().is_empty(), "{cat} has none");
        }
        assert_eq!(Category::ALL.len(), 15);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("dining out".parse::<Category>().unwrap(), Category::DiningOut);
        assert_eq!("  GIFTS/DONATIONS ".parse::<Category>().unwrap(), Category::GiftsDonations);
        assert!("Crypto".parse::<Category>().is_err());
    }

    #[test]
    fn test_label_accepts_member_subcategory() {
        let label = Label::new(Category::Transport, "fuel").unwrap();
        assert_eq!(label.subcategory, Some("Fuel"));
    }

    #[test]
    fn test_label_rejects_foreign_subcategory() {
        let err = Label::new(Category::Groceries, "Fuel").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidSubcategory { .. }));
    }

    #[test]
    fn test_label_allows_empty_subcategory() {
        let label = Label::new(Category::Income, "  ").unwrap();
        assert_eq!(label.subcategory, None);
        assert_eq!(label.subcategory_str(), "");
    }

    #[test]
    fn test_shared_subcategory_names_stay_per_category() {
        // "Maintenance" exists under both Transport and Housing
        assert!(Label::new(Category::Housing, "Maintenance").is_ok());
        assert!(Label::new(Category::Transport, "Maintenance").is_ok());
        assert!(Label::new(Category::Utilities, "Maintenance").is_err());
    }
}
