use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::filter::RowFilter;
use crate::fingerprint::{fingerprint, FingerprintScheme};
use crate::ledger::LocalLedger;
use crate::models::Row;
use crate::remote::LedgerService;
use crate::row::RowReader;
use crate::transform::Transformer;

// ---------------------------------------------------------------------------
// Remote fingerprint backstop
// ---------------------------------------------------------------------------

/// Fingerprints the remote ledger already knows from its recent window.
/// Not a complete index; only catches what the local ledger missed.
#[derive(Debug, Default)]
pub struct RemoteFingerprintSet {
    hashes: HashSet<String>,
}

impl RemoteFingerprintSet {
    /// Any failure degrades to an empty set.
    pub fn fetch(service: &impl LedgerService) -> Self {
        match service.known_fingerprints() {
            Ok(hashes) => {
                let set = Self { hashes };
                log::info!("Remote ledger reports {} recent fingerprints", set.len());
                set
            }
            Err(e) => {
                log::warn!("Could not fetch remote fingerprints, relying on local ledger only: {e}");
                Self::default()
            }
        }
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.hashes.contains(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }
}

impl FromIterator<String> for RemoteFingerprintSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            hashes: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Failed the eligibility rule.
    Filtered,
    /// Already in the local ledger, or seen earlier in this run.
    DuplicateLocal,
    /// Known to the remote ledger's recent window.
    DuplicateRemote,
    /// Unreadable line, bad date or bad amount.
    Invalid,
    /// The create call failed.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Processed,
    Skipped(SkipReason),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub processed: usize,
    pub skipped: usize,
    pub filtered: usize,
    pub duplicate_local: usize,
    pub duplicate_remote: usize,
    pub invalid: usize,
    pub rejected: usize,
    pub dry_run: bool,
}

impl ImportResult {
    fn tally(&mut self, outcome: RowOutcome) {
        let reason = match outcome {
            RowOutcome::Processed => {
                self.processed += 1;
                return;
            }
            RowOutcome::Skipped(reason) => reason,
        };
        self.skipped += 1;
        match reason {
            SkipReason::Filtered => self.filtered += 1,
            SkipReason::DuplicateLocal => self.duplicate_local += 1,
            SkipReason::DuplicateRemote => self.duplicate_remote += 1,
            SkipReason::Invalid => self.invalid += 1,
            SkipReason::Rejected => self.rejected += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct ImportPipeline<'a, S: LedgerService> {
    ledger: &'a LocalLedger,
    service: &'a S,
    remote: RemoteFingerprintSet,
    filter: RowFilter,
    transformer: Transformer,
    scheme: FingerprintScheme,
    dry_run: bool,
    seen: HashSet<String>,
}

impl<'a, S: LedgerService> ImportPipeline<'a, S> {
    pub fn new(
        ledger: &'a LocalLedger,
        service: &'a S,
        remote: RemoteFingerprintSet,
        filter: RowFilter,
        transformer: Transformer,
        scheme: FingerprintScheme,
    ) -> Self {
        Self {
            ledger,
            service,
            remote,
            filter,
            transformer,
            scheme,
            dry_run: false,
            seen: HashSet::new(),
        }
    }

    /// Run filter, dedup and transform only; nothing is submitted or recorded.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Drives one row to a terminal outcome. Only ledger storage errors escape.
    pub fn process_row(&mut self, n: usize, row: &Row) -> Result<RowOutcome> {
        if !self.filter.is_eligible(row) {
            log::debug!("record {n}: not eligible, skipping");
            return Ok(RowOutcome::Skipped(SkipReason::Filtered));
        }

        let fp = fingerprint(row, self.scheme);
        if self.seen.contains(&fp) || self.ledger.exists(&fp)? {
            log::debug!("record {n}: {fp} already imported");
            return Ok(RowOutcome::Skipped(SkipReason::DuplicateLocal));
        }
        if self.remote.contains(&fp) {
            log::debug!("record {n}: {fp} already known to the remote ledger");
            return Ok(RowOutcome::Skipped(SkipReason::DuplicateRemote));
        }

        let transaction = match self.transformer.transform(row) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("record {n}: skipped, {e}");
                return Ok(RowOutcome::Skipped(SkipReason::Invalid));
            }
        };

        if self.dry_run {
            log::info!(
                "record {n}: would submit {} {} {} on {} ({} -> {})",
                transaction.direction.as_str(),
                transaction.amount,
                transaction.currency,
                transaction.date,
                transaction.source_id,
                transaction.destination_id,
            );
            self.seen.insert(fp);
            return Ok(RowOutcome::Processed);
        }

        if let Err(e) = self.service.create_transaction(&transaction) {
            log::error!("record {n}: submission failed, {e}");
            return Ok(RowOutcome::Skipped(SkipReason::Rejected));
        }

        self.ledger.record(&fp, row)?;
        self.seen.insert(fp);
        log::debug!("record {n}: submitted and recorded");
        Ok(RowOutcome::Processed)
    }

    pub fn run<R: Read>(&mut self, mut reader: RowReader<R>) -> Result<ImportResult> {
        let mut result = ImportResult {
            dry_run: self.dry_run,
            ..Default::default()
        };
        for (index, record) in reader.rows().enumerate() {
            let n = index + 1;
            let outcome = match record {
                Ok(row) => self.process_row(n, &row)?,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    log::warn!("record {n}: unreadable, {e}");
                    RowOutcome::Skipped(SkipReason::Invalid)
                }
            };
            result.tally(outcome);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

pub struct ImportOptions {
    pub delimiter: u8,
    pub filter: RowFilter,
    pub transformer: Transformer,
    pub scheme: FingerprintScheme,
    pub dry_run: bool,
    pub skip_remote_check: bool,
}

/// Reads the header first so an unusable file fails before any remote call,
/// then bootstraps the remote set and streams every row.
pub fn import_file<S: LedgerService>(
    ledger: &LocalLedger,
    service: &S,
    file_path: &Path,
    options: ImportOptions,
) -> Result<ImportResult> {
    let reader = RowReader::open(file_path, options.delimiter)?;
    log::info!(
        "Importing {} ({} columns)",
        file_path.display(),
        reader.columns().len()
    );

    let remote = if options.skip_remote_check {
        RemoteFingerprintSet::default()
    } else {
        RemoteFingerprintSet::fetch(service)
    };

    let mut pipeline = ImportPipeline::new(
        ledger,
        service,
        remote,
        options.filter,
        options.transformer,
        options.scheme,
    )
    .dry_run(options.dry_run);
    pipeline.run(reader)
}
