use std::io::Read;
use std::path::Path;

use crate::error::{ImportError, Result};
use crate::models::{Row, REQUIRED_COLUMNS};

// ---------------------------------------------------------------------------
// Naive delimited reader: quoting is disabled, so a quote character is an
// ordinary byte and a delimiter inside quotes still splits the field.
// ---------------------------------------------------------------------------

pub struct RowReader<R: Read> {
    reader: csv::Reader<R>,
    columns: Vec<String>,
}

impl RowReader<std::fs::File> {
    pub fn open(path: &Path, delimiter: u8) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| ImportError::Input {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, delimiter).map_err(|e| match e {
            ImportError::EmptyInput(_) => ImportError::EmptyInput(path.to_path_buf()),
            other => other,
        })
    }
}

impl<R: Read> RowReader<R> {
    pub fn from_reader(input: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quoting(false)
            .flexible(true)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let name = if i == 0 { name.trim_start_matches('\u{feff}') } else { name };
                name.trim().to_string()
            })
            .collect();

        if columns.iter().all(|c| c.is_empty()) {
            return Err(ImportError::EmptyInput(Default::default()));
        }
        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c == required) {
                return Err(ImportError::MissingColumn(required.to_string()));
            }
        }

        Ok(Self { reader, columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Streams rows in file order. Blank lines are skipped by the reader.
    pub fn rows(&mut self) -> impl Iterator<Item = std::result::Result<Row, csv::Error>> + '_ {
        let columns = &self.columns;
        self.reader
            .records()
            .map(move |record| record.map(|record| build_row(columns, &record)))
    }
}

/// Zips header names with field values; extra trailing fields are dropped and
/// missing trailing fields stay absent.
pub fn build_row(columns: &[String], record: &csv::StringRecord) -> Row {
    Row::new(
        columns
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.clone(), value.trim().to_string()))
            .collect(),
    )
}
