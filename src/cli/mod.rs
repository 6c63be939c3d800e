pub mod analytics;
pub mod categories;
pub mod categorize;
pub mod config;
pub mod dashboard;
pub mod guide;
pub mod pending;
pub mod process;
pub mod review;
pub mod rules;
pub mod rules_manager;

use clap::{Parser, Subcommand};

/// Step a filter through `None` ("all") and then each option in turn.
pub(crate) fn cycle_option(current: &Option<String>, options: &[String]) -> Option<String> {
    let next = match current {
        None => 0,
        Some(value) => match options.iter().position(|o| o == value) {
            Some(i) => i + 1,
            None => 0,
        },
    };
    options.get(next).cloned()
}

#[derive(Parser)]
#[command(
    name = "ledgerlens",
    version,
    about = "Review and categorize bank transactions served by a workflow backend."
)]
pub struct Cli {
    /// Webhook base URL (overrides the saved setting)
    #[arg(long = "base-url", env = "LEDGERLENS_BASE_URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Card-by-card review of uncategorized transactions.
    Review,
    /// List transactions waiting for a category.
    Pending,
    /// Categorize one transaction by row number and submit it.
    Categorize {
        /// Row number (shown in `ledgerlens pending`)
        row: u64,
        /// Category name, e.g. 'Dining Out'
        #[arg(long)]
        category: String,
        /// Subcategory within the category
        #[arg(long)]
        subcategory: Option<String>,
    },
    /// Ask the backend to ingest a new bank statement.
    Process {
        /// Statement location for the workflow to read
        #[arg(long)]
        url: Option<String>,
    },
    /// Spending and income totals by category or payment mode.
    Analytics {
        /// debit or credit
        #[arg(long = "type", default_value = "debit")]
        transaction_type: String,
        /// category or mode
        #[arg(long, default_value = "category")]
        by: String,
        /// Only this category (category view)
        #[arg(long)]
        category: Option<String>,
        /// Only this payment mode
        #[arg(long)]
        mode: Option<String>,
        /// Amount range: all, 0-500, 500-1000, 1000-5000, 5000+
        #[arg(long, default_value = "all")]
        range: String,
        /// Also list the matching transactions
        #[arg(long)]
        list: bool,
    },
    /// Manage the backend's category rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Show the fixed category and subcategory list.
    Categories,
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// How to use LedgerLens.
    Guide,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List category rules.
    List {
        /// Only rules for this category
        #[arg(long)]
        category: Option<String>,
        /// Only rules for this payment mode
        #[arg(long)]
        mode: Option<String>,
        /// Sort column: id, mode, name, min, max, category, subcategory
        #[arg(long, default_value = "id")]
        sort: String,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Append a rule and save the table.
    Add {
        #[arg(long)]
        mode: Option<String>,
        /// Payee name to match
        #[arg(long)]
        name: Option<String>,
        /// Minimum amount
        #[arg(long)]
        min: Option<String>,
        /// Maximum amount
        #[arg(long)]
        max: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        subcategory: Option<String>,
    },
    /// Blank a rule's fields and save the table.
    Clear {
        /// Rule ID (shown in `ledgerlens rules list`)
        rule_id: u64,
    },
    /// Interactive rules table.
    Manage,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the active settings.
    Show,
    /// Save the webhook base URL.
    SetUrl {
        /// e.g. http://localhost:5698/webhook
        url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cycle_option_wraps_to_all() {
        let options = vec!["CARD".to_string(), "UPI".to_string()];
        let mut current = None;
        current = cycle_option(&current, &options);
        assert_eq!(current.as_deref(), Some("CARD"));
        current = cycle_option(&current, &options);
        assert_eq!(current.as_deref(), Some("UPI"));
        current = cycle_option(&current, &options);
        assert_eq!(current, None);
        assert_eq!(cycle_option(&Some("gone".into()), &options).as_deref(), Some("CARD"));
    }

    #[test]
    fn test_parses_global_base_url() {
        let cli = Cli::try_parse_from([
            "ledgerlens",
            "categorize",
            "7",
            "--category",
            "Travel",
            "--base-url",
            "http://example.test/webhook",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://example.test/webhook"));
        assert!(matches!(cli.command, Some(Commands::Categorize { row: 7, .. })));
    }
}
