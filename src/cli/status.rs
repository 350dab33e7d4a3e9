use std::path::{Path, PathBuf};

use crate::error::{ImportError, Result};
use crate::ledger::LocalLedger;
use crate::settings::load_settings;

fn store_path(settings_path: Option<&Path>, store: Option<PathBuf>) -> Result<PathBuf> {
    match store {
        Some(path) => Ok(path),
        None => load_settings(settings_path)?.store_path.ok_or_else(|| {
            ImportError::MissingConfig("ledger store (--store / LEDGER_STORE_PATH)".to_string())
        }),
    }
}

pub fn run(settings_path: Option<&Path>, store: Option<PathBuf>) -> Result<()> {
    let path = store_path(settings_path, store)?;
    println!("Ledger:     {}", path.display());

    if !path.exists() {
        println!();
        println!("Ledger not found. It is created by the first `ledger-import import`.");
        return Ok(());
    }

    let size = std::fs::metadata(&path)?.len();
    let ledger = LocalLedger::open(&path)?;
    println!("Size:       {size} bytes");
    println!("Imported:   {} rows", ledger.count()?);
    Ok(())
}

pub fn lookup(settings_path: Option<&Path>, fingerprint: &str, store: Option<PathBuf>) -> Result<()> {
    let path = store_path(settings_path, store)?;
    if !path.exists() {
        println!("Ledger not found: {}", path.display());
        return Ok(());
    }

    let ledger = LocalLedger::open(&path)?;
    match ledger.get(fingerprint.trim())? {
        Some(row_json) => {
            let value: serde_json::Value = serde_json::from_str(&row_json)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        None => println!("No row recorded under {fingerprint}"),
    }
    Ok(())
}
