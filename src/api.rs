use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};
use crate::models::{transactions_from_json, unwrap_envelope, Submission, SubmittedTransaction, Transaction};
use crate::rules::CategoryRule;
use crate::settings::Settings;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Tunnels such as ngrok interpose an HTML warning page unless this is set.
const SKIP_BROWSER_WARNING: &str = "ngrok-skip-browser-warning";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Uncategorized,
    AllTransactions,
    CategoryRules,
    SaveCategoryRules,
    UpdateCategorized,
    ProcessStatement,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Uncategorized => "/getUncategorizedTransactions",
            Endpoint::AllTransactions => "/getData",
            Endpoint::CategoryRules => "/getCat",
            Endpoint::SaveCategoryRules => "/saveCat",
            Endpoint::UpdateCategorized => "/updateCategorizedTransactions",
            Endpoint::ProcessStatement => "/processNew",
        }
    }
}

/// Everything the UI needs from the workflow service. The webhook client is
/// the only production implementation.
pub trait LedgerBackend {
    fn fetch_uncategorized(&self) -> Result<Vec<Transaction>>;
    fn fetch_all(&self) -> Result<Vec<Transaction>>;
    fn fetch_rules(&self) -> Result<Vec<CategoryRule>>;
    fn save_rules(&self, rules: &[CategoryRule]) -> Result<()>;
    fn submit_categorized(&self, transactions: &[Transaction]) -> Result<()>;
    /// Kick off statement ingestion. `statement_url` points the workflow at a
    /// specific file; without it the workflow scans its watched folder.
    fn process_statement(&self, statement_url: Option<&str>) -> Result<()>;
    fn location(&self) -> String;
}

pub struct WebhookClient {
    http: Client,
    base_url: String,
}

impl WebhookClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(SKIP_BROWSER_WARNING),
            HeaderValue::from_static("true"),
        );
        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.request_timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn check(&self, endpoint: Endpoint, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        warn!(
            endpoint = endpoint.path(),
            status = status.as_u16(),
            body = %body,
            "webhook returned an error"
        );
        Err(LedgerError::Status {
            endpoint: endpoint.path().to_string(),
            status: status.as_u16(),
        })
    }

    fn get_json(&self, endpoint: Endpoint) -> Result<Value> {
        let url = self.url(endpoint);
        debug!(%url, "GET");
        let response = self.check(endpoint, self.http.get(&url).send()?)?;
        let text = response.text()?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn post(&self, endpoint: Endpoint, body: Option<&impl Serialize>) -> Result<()> {
        let url = self.url(endpoint);
        debug!(%url, "POST");
        let request = self.http.post(&url);
        let request = match body {
            Some(b) => request.json(b),
            None => request,
        };
        self.check(endpoint, request.send()?)?;
        Ok(())
    }
}

impl LedgerBackend for WebhookClient {
    fn fetch_uncategorized(&self) -> Result<Vec<Transaction>> {
        let txns = transactions_from_json(self.get_json(Endpoint::Uncategorized)?);
        info!(count = txns.len(), "fetched uncategorized transactions");
        Ok(txns)
    }

    fn fetch_all(&self) -> Result<Vec<Transaction>> {
        let txns = transactions_from_json(self.get_json(Endpoint::AllTransactions)?);
        info!(count = txns.len(), "fetched all transactions");
        Ok(txns)
    }

    fn fetch_rules(&self) -> Result<Vec<CategoryRule>> {
        let rows = unwrap_envelope(self.get_json(Endpoint::CategoryRules)?).unwrap_or_default();
        let rules: Vec<CategoryRule> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(error = %e, "skipping malformed category rule");
                    None
                }
            })
            .collect();
        info!(count = rules.len(), "fetched category rules");
        Ok(rules)
    }

    fn save_rules(&self, rules: &[CategoryRule]) -> Result<()> {
        self.post(Endpoint::SaveCategoryRules, Some(&rules))?;
        info!(count = rules.len(), "saved category rules");
        Ok(())
    }

    fn submit_categorized(&self, transactions: &[Transaction]) -> Result<()> {
        let body = Submission {
            transactions: transactions.iter().map(SubmittedTransaction::from).collect(),
        };
        self.post(Endpoint::UpdateCategorized, Some(&body))?;
        info!(count = transactions.len(), "submitted categorized transactions");
        Ok(())
    }

    fn process_statement(&self, statement_url: Option<&str>) -> Result<()> {
        match statement_url {
            Some(url) => self.post(Endpoint::ProcessStatement, Some(&json!({ "url": url })))?,
            None => self.post(Endpoint::ProcessStatement, None::<&Value>)?,
        }
        info!(statement_url, "statement processing triggered");
        Ok(())
    }

    fn location(&self) -> String {
        self.base_url.clone()
    }
}

// ---------------------------------------------------------------------------
// In-memory backend for UI tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    pub struct FakeBackend {
        pub uncategorized: RefCell<Vec<Transaction>>,
        pub all: RefCell<Vec<Transaction>>,
        pub rules: RefCell<Vec<CategoryRule>>,
        pub submitted: RefCell<Vec<Vec<Transaction>>>,
        pub processed: RefCell<Vec<Option<String>>>,
        pub fail: RefCell<bool>,
    }

    impl FakeBackend {
        pub fn with_uncategorized(txns: Vec<Transaction>) -> Self {
            let backend = Self::default();
            *backend.uncategorized.borrow_mut() = txns;
            backend
        }

        fn gate(&self, endpoint: Endpoint) -> Result<()> {
            if *self.fail.borrow() {
                Err(LedgerError::Status {
                    endpoint: endpoint.path().to_string(),
                    status: 500,
                })
            } else {
                Ok(())
            }
        }
    }

    impl LedgerBackend for FakeBackend {
        fn fetch_uncategorized(&self) -> Result<Vec<Transaction>> {
            self.gate(Endpoint::Uncategorized)?;
            Ok(self.uncategorized.borrow().clone())
        }

        fn fetch_all(&self) -> Result<Vec<Transaction>> {
            self.gate(Endpoint::AllTransactions)?;
            Ok(self.all.borrow().clone())
        }

        fn fetch_rules(&self) -> Result<Vec<CategoryRule>> {
            self.gate(Endpoint::CategoryRules)?;
            Ok(self.rules.borrow().clone())
        }

        fn save_rules(&self, rules: &[CategoryRule]) -> Result<()> {
            self.gate(Endpoint::SaveCategoryRules)?;
            *self.rules.borrow_mut() = rules.to_vec();
            Ok(())
        }

        fn submit_categorized(&self, transactions: &[Transaction]) -> Result<()> {
            self.gate(Endpoint::UpdateCategorized)?;
            self.submitted.borrow_mut().push(transactions.to_vec());
            let done: Vec<u64> = transactions.iter().map(|t| t.row_number).collect();
            self.uncategorized
                .borrow_mut()
                .retain(|t| !done.contains(&t.row_number));
            Ok(())
        }

        fn process_statement(&self, statement_url: Option<&str>) -> Result<()> {
            self.gate(Endpoint::ProcessStatement)?;
            self.processed
                .borrow_mut()
                .push(statement_url.map(str::to_string));
            Ok(())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }
}
