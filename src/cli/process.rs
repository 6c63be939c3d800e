use colored::Colorize;
use tracing::info;

use crate::api::LedgerBackend;
use crate::error::Result;

pub fn run(backend: &dyn LedgerBackend, url: Option<&str>) -> Result<()> {
    println!("Processing new statement via {}\u{2026}", backend.location());
    backend.process_statement(url)?;
    info!(url = url.unwrap_or(""), "statement processing requested");

    let waiting = backend.fetch_uncategorized()?.len();
    println!(
        "{} Statement processed. {waiting} transactions waiting for a category.",
        "\u{2713}".green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;

    #[test]
    fn test_process_forwards_url() {
        let backend = FakeBackend::default();
        run(&backend, Some("https://drive.example/statement.pdf")).unwrap();
        assert_eq!(
            backend.processed.borrow().as_slice(),
            &[Some("https://drive.example/statement.pdf".to_string())]
        );
    }

    #[test]
    fn test_process_failure_propagates() {
        let backend = FakeBackend::default();
        *backend.fail.borrow_mut() = true;
        assert!(run(&backend, None).is_err());
    }
}
