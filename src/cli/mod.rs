pub mod import;
pub mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::fingerprint::FingerprintScheme;
use crate::settings::Settings;
use crate::transform::InputLocale;

#[derive(Parser)]
#[command(
    name = "ledger-import",
    about = "Import a bank export into a remote ledger, once per transaction."
)]
pub struct Cli {
    /// Settings file (default: ~/.config/ledger-import/settings.json)
    #[arg(long, global = true, env = "LEDGER_IMPORT_SETTINGS")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit every eligible, not yet imported row of a bank export.
    Import(ImportArgs),
    /// Show the local ledger location and how many rows it holds.
    Status {
        /// Local ledger store
        #[arg(long, env = "LEDGER_STORE_PATH")]
        store: Option<PathBuf>,
    },
    /// Print the row recorded under a fingerprint.
    Lookup {
        /// 64-character hex fingerprint
        fingerprint: String,
        /// Local ledger store
        #[arg(long, env = "LEDGER_STORE_PATH")]
        store: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct ImportArgs {
    /// Bank export to import
    #[arg(long, env = "LEDGER_INPUT_FILE")]
    pub file: Option<PathBuf>,
    /// Base URL of the ledger service, e.g. https://ledger.example.com
    #[arg(long, env = "LEDGER_API_URL")]
    pub url: Option<String>,
    /// Personal access token
    #[arg(long, env = "LEDGER_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Ledger id of the bank account the export belongs to
    #[arg(long = "bank-account", env = "LEDGER_BANK_ACCOUNT_ID")]
    pub bank_account: Option<String>,
    /// Ledger id of the cash/counterparty account
    #[arg(long = "cash-account", env = "LEDGER_CASH_ACCOUNT_ID")]
    pub cash_account: Option<String>,
    /// Local ledger store (created if absent)
    #[arg(long, env = "LEDGER_STORE_PATH")]
    pub store: Option<PathBuf>,
    /// Field delimiter of the export (default ';')
    #[arg(long)]
    pub delimiter: Option<char>,
    /// Date conventions of the export (default ru)
    #[arg(long, value_enum)]
    pub locale: Option<InputLocale>,
    /// Offset the export's times are in, e.g. +03:00 (default: system time zone)
    #[arg(long = "utc-offset", allow_hyphen_values = true)]
    pub utc_offset: Option<String>,
    /// Type value marking a deposit (case-insensitive)
    #[arg(long = "deposit-type")]
    pub deposit_type: Option<String>,
    /// Status value marking a settled transaction (exact match)
    #[arg(long = "completed-status")]
    pub completed_status: Option<String>,
    /// How field values are combined into a fingerprint (default concatenated)
    #[arg(long = "fingerprint-scheme", value_enum)]
    pub fingerprint_scheme: Option<FingerprintScheme>,
    /// How many recent remote transactions to check for known fingerprints
    #[arg(long = "remote-window")]
    pub remote_window: Option<u32>,
    /// Per-request timeout in seconds (default 30)
    #[arg(long = "timeout-secs")]
    pub timeout_secs: Option<u64>,
    /// Do not ask the ledger to apply its rules to new transactions
    #[arg(long = "no-apply-rules")]
    pub no_apply_rules: bool,
    /// Do not ask the ledger to fire webhooks for new transactions
    #[arg(long = "no-fire-webhooks")]
    pub no_fire_webhooks: bool,
    /// Rely on the local ledger only
    #[arg(long = "skip-remote-check")]
    pub skip_remote_check: bool,
    /// Filter, dedup and transform, but submit and record nothing
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

impl ImportArgs {
    /// The values given on the command line or in the environment.
    pub fn overlay(&self) -> Settings {
        Settings {
            base_url: self.url.clone(),
            token: self.token.clone(),
            bank_account_id: self.bank_account.clone(),
            cash_account_id: self.cash_account.clone(),
            input_file: self.file.clone(),
            store_path: self.store.clone(),
            delimiter: self.delimiter,
            locale: self.locale,
            utc_offset: self.utc_offset.clone(),
            deposit_type: self.deposit_type.clone(),
            completed_status: self.completed_status.clone(),
            fingerprint_scheme: self.fingerprint_scheme,
            remote_window: self.remote_window,
            timeout_secs: self.timeout_secs,
            apply_rules: self.no_apply_rules.then_some(false),
            fire_webhooks: self.no_fire_webhooks.then_some(false),
        }
    }
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
    fn test_import_flags_become_overlay() {
        let cli = Cli::try_parse_from([
            "ledger-import",
            "import",
            "--file",
            "export.csv",
            "--url",
            "https://ledger.example.com",
            "--utc-offset",
            "-05:00",
            "--locale",
            "us",
            "--fingerprint-scheme",
            "delimited",
            "--no-fire-webhooks",
        ])
        .unwrap();
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        let overlay = args.overlay();
        assert_eq!(overlay.input_file, Some(PathBuf::from("export.csv")));
        assert_eq!(overlay.base_url.as_deref(), Some("https://ledger.example.com"));
        assert_eq!(overlay.utc_offset.as_deref(), Some("-05:00"));
        assert_eq!(overlay.locale, Some(InputLocale::Us));
        assert_eq!(overlay.fingerprint_scheme, Some(FingerprintScheme::Delimited));
        assert_eq!(overlay.fire_webhooks, Some(false));
        assert_eq!(overlay.apply_rules, None);
    }

    #[test]
    fn test_lookup_takes_positional_fingerprint() {
        let cli = Cli::try_parse_from(["ledger-import", "lookup", "abc", "--store", "ledger.db"]).unwrap();
        match cli.command {
            Commands::Lookup { fingerprint, store } => {
                assert_eq!(fingerprint, "abc");
                assert_eq!(store, Some(PathBuf::from("ledger.db")));
            }
            _ => panic!("expected lookup"),
        }
    }
}
