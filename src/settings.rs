use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};
use crate::filter::{RowFilter, DEFAULT_COMPLETED_STATUS, DEFAULT_DEPOSIT_TYPE};
use crate::fingerprint::FingerprintScheme;
use crate::importer::ImportOptions;
use crate::remote::{ApiConfig, DEFAULT_REMOTE_WINDOW, DEFAULT_TIMEOUT_SECS};
use crate::transform::{InputLocale, Transformer, Zone};

const DEFAULT_DELIMITER: char = ';';

/// Every configurable value. Loaded from the settings file, then overlaid
/// with flags and environment; `None` means "not given at this layer".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub bank_account_id: Option<String>,
    pub cash_account_id: Option<String>,
    pub input_file: Option<PathBuf>,
    pub store_path: Option<PathBuf>,
    pub delimiter: Option<char>,
    pub locale: Option<InputLocale>,
    pub utc_offset: Option<String>,
    pub deposit_type: Option<String>,
    pub completed_status: Option<String>,
    pub fingerprint_scheme: Option<FingerprintScheme>,
    pub remote_window: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub apply_rules: Option<bool>,
    pub fire_webhooks: Option<bool>,
}

impl Settings {
    /// Values present in `overlay` win.
    pub fn merge(self, overlay: Settings) -> Settings {
        Settings {
            base_url: overlay.base_url.or(self.base_url),
            token: overlay.token.or(self.token),
            bank_account_id: overlay.bank_account_id.or(self.bank_account_id),
            cash_account_id: overlay.cash_account_id.or(self.cash_account_id),
            input_file: overlay.input_file.or(self.input_file),
            store_path: overlay.store_path.or(self.store_path),
            delimiter: overlay.delimiter.or(self.delimiter),
            locale: overlay.locale.or(self.locale),
            utc_offset: overlay.utc_offset.or(self.utc_offset),
            deposit_type: overlay.deposit_type.or(self.deposit_type),
            completed_status: overlay.completed_status.or(self.completed_status),
            fingerprint_scheme: overlay.fingerprint_scheme.or(self.fingerprint_scheme),
            remote_window: overlay.remote_window.or(self.remote_window),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
            apply_rules: overlay.apply_rules.or(self.apply_rules),
            fire_webhooks: overlay.fire_webhooks.or(self.fire_webhooks),
        }
    }

    /// Validates presence of every required value, reporting all missing
    /// ones at once.
    pub fn into_import_config(self) -> Result<ImportConfig> {
        let mut missing = Vec::new();
        let base_url = required(self.base_url, "base URL (--url / LEDGER_API_URL)", &mut missing);
        let token = required(self.token, "API token (--token / LEDGER_API_TOKEN)", &mut missing);
        let bank_account_id = required(
            self.bank_account_id,
            "bank account id (--bank-account / LEDGER_BANK_ACCOUNT_ID)",
            &mut missing,
        );
        let cash_account_id = required(
            self.cash_account_id,
            "cash account id (--cash-account / LEDGER_CASH_ACCOUNT_ID)",
            &mut missing,
        );
        let input_file = required(self.input_file, "input file (--file / LEDGER_INPUT_FILE)", &mut missing);
        let store_path = required(self.store_path, "ledger store (--store / LEDGER_STORE_PATH)", &mut missing);

        let (
            Some(base_url),
            Some(token),
            Some(bank_account_id),
            Some(cash_account_id),
            Some(input_file),
            Some(store_path),
        ) = (base_url, token, bank_account_id, cash_account_id, input_file, store_path)
        else {
            return Err(ImportError::MissingConfig(missing.join(", ")));
        };

        let delimiter = parse_delimiter(self.delimiter.unwrap_or(DEFAULT_DELIMITER))?;
        let zone = match self.utc_offset.as_deref() {
            Some(raw) => Zone::Fixed(parse_utc_offset(raw)?),
            None => Zone::Local,
        };
        let deposit_type = self
            .deposit_type
            .unwrap_or_else(|| DEFAULT_DEPOSIT_TYPE.to_string());
        let completed_status = self
            .completed_status
            .unwrap_or_else(|| DEFAULT_COMPLETED_STATUS.to_string());
        let remote_window = self.remote_window.unwrap_or(DEFAULT_REMOTE_WINDOW);
        if remote_window == 0 {
            return Err(ImportError::InvalidConfig("remote window must be at least 1".to_string()));
        }
        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ImportError::InvalidConfig(
                "timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(ImportConfig {
            api: ApiConfig {
                base_url,
                token,
                remote_window,
                timeout: Duration::from_secs(timeout_secs),
                apply_rules: self.apply_rules.unwrap_or(true),
                fire_webhooks: self.fire_webhooks.unwrap_or(true),
            },
            input_file,
            store_path,
            delimiter,
            filter: RowFilter::new(&deposit_type, &completed_status),
            transformer: Transformer {
                locale: self.locale.unwrap_or_default(),
                zone,
                deposit_type,
                bank_account_id,
                cash_account_id,
            },
            scheme: self.fingerprint_scheme.unwrap_or_default(),
        })
    }
}

trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for PathBuf {
    fn is_blank(&self) -> bool {
        self.as_os_str().is_empty()
    }
}

fn required<T: Blank>(value: Option<T>, name: &str, missing: &mut Vec<String>) -> Option<T> {
    let value = value.filter(|v| !v.is_blank());
    if value.is_none() {
        missing.push(name.to_string());
    }
    value
}

/// Validated configuration for one import run.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub api: ApiConfig,
    pub input_file: PathBuf,
    pub store_path: PathBuf,
    pub delimiter: u8,
    pub filter: RowFilter,
    pub transformer: Transformer,
    pub scheme: FingerprintScheme,
}

impl ImportConfig {
    pub fn import_options(&self, dry_run: bool, skip_remote_check: bool) -> ImportOptions {
        ImportOptions {
            delimiter: self.delimiter,
            filter: self.filter.clone(),
            transformer: self.transformer.clone(),
            scheme: self.scheme,
            dry_run,
            skip_remote_check,
        }
    }
}

pub fn parse_delimiter(c: char) -> Result<u8> {
    if c.is_ascii() && c != '\n' && c != '\r' {
        Ok(c as u8)
    } else {
        Err(ImportError::InvalidConfig(format!(
            "delimiter must be a single ASCII character other than a line break, got {c:?}"
        )))
    }
}

/// `+03:00`, `-0530`, `+3`, `Z` or `UTC`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let invalid = || ImportError::InvalidConfig(format!("invalid UTC offset {raw:?}"));
    let s = raw.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }
    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ledger-import")
}

pub fn default_settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// An explicitly named file must exist; the default one is optional.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_settings_path();
            if !path.exists() {
                return Ok(Settings::default());
            }
            path
        }
    };
    let content = std::fs::read_to_string(&path)
        .map_err(|e| ImportError::Settings(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content).map_err(|e| ImportError::Settings(format!("{}: {e}", path.display())))
}
