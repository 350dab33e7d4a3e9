use std::collections::HashSet;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result, SubmitError};
use crate::models::Transaction;

const API_MEDIA_TYPE: &str = "application/vnd.api+json";
const TRANSACTIONS_PATH: &str = "/api/v1/transactions";

pub const DEFAULT_REMOTE_WINDOW: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The remote ledger as the pipeline sees it: one listing call for known
/// fingerprints and one create call per row.
pub trait LedgerService {
    fn known_fingerprints(&self) -> Result<HashSet<String>>;
    fn create_transaction(&self, transaction: &Transaction) -> std::result::Result<(), SubmitError>;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct StoreTransactionRequest<'a> {
    apply_rules: bool,
    fire_webhooks: bool,
    transactions: Vec<TransactionSplit<'a>>,
}

#[derive(Serialize)]
struct TransactionSplit<'a> {
    date: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    description: &'a str,
    amount: String,
    currency: &'a str,
    source_id: &'a str,
    destination_id: &'a str,
    category_name: &'a str,
}

#[derive(Deserialize)]
struct TransactionListResponse {
    #[serde(default)]
    data: Vec<TransactionGroup>,
}

#[derive(Deserialize)]
struct TransactionGroup {
    attributes: GroupAttributes,
}

#[derive(Deserialize)]
struct GroupAttributes {
    #[serde(default)]
    transactions: Vec<TransactionSplitRead>,
}

#[derive(Deserialize)]
struct TransactionSplitRead {
    #[serde(default)]
    import_hash_v2: Option<String>,
}

fn store_request<'a>(
    transaction: &'a Transaction,
    apply_rules: bool,
    fire_webhooks: bool,
) -> StoreTransactionRequest<'a> {
    StoreTransactionRequest {
        apply_rules,
        fire_webhooks,
        transactions: vec![TransactionSplit {
            date: &transaction.date,
            kind: transaction.direction.as_str(),
            description: &transaction.description,
            amount: transaction.amount.to_string(),
            currency: &transaction.currency,
            source_id: &transaction.source_id,
            destination_id: &transaction.destination_id,
            category_name: &transaction.category_name,
        }],
    }
}

/// Collects every `import_hash_v2` in a listing body; splits without one are ignored.
pub fn extract_import_hashes(body: &str) -> std::result::Result<HashSet<String>, serde_json::Error> {
    let response: TransactionListResponse = serde_json::from_str(body)?;
    Ok(response
        .data
        .into_iter()
        .flat_map(|group| group.attributes.transactions)
        .filter_map(|split| split.import_hash_v2)
        .filter(|hash| !hash.is_empty())
        .collect())
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    pub remote_window: u32,
    pub timeout: Duration,
    pub apply_rules: bool,
    pub fire_webhooks: bool,
}

pub struct HttpLedgerService {
    client: Client,
    config: ApiConfig,
}

impl HttpLedgerService {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn transactions_url(&self) -> String {
        transactions_url(&self.config.base_url)
    }
}

pub fn transactions_url(base_url: &str) -> String {
    format!("{}{TRANSACTIONS_PATH}", base_url.trim_end_matches('/'))
}

impl LedgerService for HttpLedgerService {
    fn known_fingerprints(&self) -> Result<HashSet<String>> {
        log::debug!("Requesting the {} most recent remote transactions...", self.config.remote_window);
        let response = self
            .client
            .get(self.transactions_url())
            .query(&[("limit", self.config.remote_window)])
            .bearer_auth(&self.config.token)
            .header(ACCEPT, API_MEDIA_TYPE)
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ImportError::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(extract_import_hashes(&body)?)
    }

    fn create_transaction(&self, transaction: &Transaction) -> std::result::Result<(), SubmitError> {
        let request = store_request(transaction, self.config.apply_rules, self.config.fire_webhooks);
        let response = self
            .client
            .post(self.transactions_url())
            .bearer_auth(&self.config.token)
            .header(ACCEPT, API_MEDIA_TYPE)
            .json(&request)
            .send()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
        Err(SubmitError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
