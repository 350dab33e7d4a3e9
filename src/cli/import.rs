use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::ImportArgs;
use crate::error::Result;
use crate::importer::{import_file, ImportResult};
use crate::ledger::LocalLedger;
use crate::remote::HttpLedgerService;
use crate::settings::load_settings;

pub fn run(settings_path: Option<&Path>, args: &ImportArgs) -> Result<()> {
    let config = load_settings(settings_path)?
        .merge(args.overlay())
        .into_import_config()?;

    let service = HttpLedgerService::new(config.api.clone())?;
    let ledger = LocalLedger::open(&config.store_path)?;
    let options = config.import_options(args.dry_run, args.skip_remote_check);

    let result = import_file(&ledger, &service, &config.input_file, options)?;
    print_summary(&result);
    Ok(())
}

fn print_summary(result: &ImportResult) {
    let suffix = if result.dry_run { " (dry run)" } else { "" };
    println!(
        "{} processed, {} skipped{suffix}",
        result.processed.to_string().green().bold(),
        result.skipped.to_string().yellow().bold()
    );
    if result.skipped == 0 {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Skipped because", "Rows"]);
    for (label, count) in [
        ("not eligible", result.filtered),
        ("already imported", result.duplicate_local),
        ("known to remote ledger", result.duplicate_remote),
        ("unparseable", result.invalid),
        ("rejected by remote ledger", result.rejected),
    ] {
        if count > 0 {
            table.add_row(vec![Cell::new(label), Cell::new(count)]);
        }
    }
    println!("{table}");
}
