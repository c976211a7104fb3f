use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoadError;

/// Tab-separated table with a header row, kept as strings.
///
/// Typing is left to the consumers (`EntityTable`, the mixing-column lookup)
/// because both tedana tables mix integer labels, enums and floats.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    source: PathBuf,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|err| LoadError::io(path, err))?;
        Self::parse(path, &text)
    }

    pub fn parse(source: impl Into<PathBuf>, text: &str) -> Result<Self, LoadError> {
        let source = source.into();
        let mut lines = text
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.trim().is_empty());

        let Some(header_line) = lines.next() else {
            return Err(LoadError::parse(&source, "table is empty"));
        };
        let header: Vec<String> = header_line
            .split('\t')
            .map(|cell| cell.trim().to_string())
            .collect();

        let rows = lines
            .map(|line| line.split('\t').map(|cell| cell.trim().to_string()).collect())
            .collect();
        Self::from_rows(source, header, rows)
    }

    /// Builds a table from already split cells; every row must match the
    /// header width.
    pub fn from_rows(
        source: impl Into<PathBuf>,
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, LoadError> {
        let source = source.into();
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != header.len())
        {
            return Err(LoadError::parse(
                &source,
                format!(
                    "row {} has {} cells, header has {}",
                    i + 1,
                    row.len(),
                    header.len()
                ),
            ));
        }
        Ok(Self {
            source,
            header,
            rows,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.header.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// First column whose header matches one of `names`, ignoring ASCII case.
    pub fn column_index(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| {
            self.header
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
        })
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[idx].as_str())
    }

    /// Content fingerprint (xxh3 over header and cells), stable across runs.
    pub fn content_hash(&self) -> u64 {
        let mut hash = crate::core::cache::ParamsHash::new();
        for cell in self.header.iter().chain(self.rows.iter().flatten()) {
            hash = hash.str(cell);
        }
        hash.finish()
    }
}
