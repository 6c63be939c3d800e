mod analytics;
mod api;
mod categories;
mod cli;
mod error;
mod fmt;
mod logging;
mod models;
mod rules;
mod session;
mod settings;
mod swipe;
mod tui;

use clap::Parser;
use tracing::error;

use api::WebhookClient;
use cli::rules::NewRule;
use cli::{Cli, Commands, ConfigCommands, RulesCommands};
use error::Result;
use settings::{load_settings, Settings};

fn main() {
    let cli = Cli::parse();
    logging::init();
    let settings = load_settings().with_base_url(cli.base_url);

    let result = match cli.command {
        None => cli::dashboard::run(&settings),
        Some(command) => dispatch(command, &settings),
    };

    if let Err(e) = result {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn dispatch(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Review => cli::review::run(settings),
        Commands::Pending => cli::pending::run(&connect(settings)?),
        Commands::Categorize {
            row,
            category,
            subcategory,
        } => cli::categorize::run(&connect(settings)?, row, &category, subcategory.as_deref()),
        Commands::Process { url } => cli::process::run(&connect(settings)?, url.as_deref()),
        Commands::Analytics {
            transaction_type,
            by,
            category,
            mode,
            range,
            list,
        } => cli::analytics::run(
            &connect(settings)?,
            &transaction_type,
            &by,
            category,
            mode,
            &range,
            list,
        ),
        Commands::Rules { command } => match command {
            RulesCommands::List {
                category,
                mode,
                sort,
                desc,
            } => cli::rules::list(&connect(settings)?, category, mode, &sort, desc),
            RulesCommands::Add {
                mode,
                name,
                min,
                max,
                category,
                subcategory,
            } => cli::rules::add(
                &connect(settings)?,
                NewRule {
                    mode,
                    name,
                    min,
                    max,
                    category,
                    subcategory,
                },
            ),
            RulesCommands::Clear { rule_id } => cli::rules::clear(&connect(settings)?, rule_id),
            RulesCommands::Manage => cli::rules_manager::run(settings),
        },
        Commands::Categories => cli::categories::run(),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(settings),
            ConfigCommands::SetUrl { url } => cli::config::set_url(&url),
        },
        Commands::Guide => cli::guide::run(),
    }
}

/// Offline commands never build a client, so they work without a backend.
fn connect(settings: &Settings) -> Result<WebhookClient> {
    WebhookClient::new(settings)
}
