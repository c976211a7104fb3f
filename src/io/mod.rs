//! Dataset files: discovery by suffix and the loaders behind [`DatasetSource`].

pub mod document;
pub mod nifti;
pub mod tsv;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::FilesConfig;
use crate::error::LoadError;

use self::document::CrossComponentMetrics;
use self::nifti::Volume;
use self::tsv::Table;

/// First regular file in `dir` (sorted by name) whose name ends with `suffix`.
pub fn find_by_suffix(dir: &Path, suffix: &str) -> Result<PathBuf, LoadError> {
    let not_found = || LoadError::NotFound {
        dir: dir.to_path_buf(),
        suffix: suffix.to_string(),
    };
    let entries = fs::read_dir(dir).map_err(|_| not_found())?;
    let mut names: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    names.sort();
    names
        .into_iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(suffix))
        })
        .ok_or_else(not_found)
}

/// The four files that make up one dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetFiles {
    pub metrics: PathBuf,
    pub mixing: PathBuf,
    pub volume: PathBuf,
    pub document: PathBuf,
}

/// Where datasets come from. The session only talks to this trait, so a
/// loaded dataset can be injected without touching the filesystem.
pub trait DatasetSource {
    fn resolve(&self, dir: &Path) -> Result<DatasetFiles, LoadError>;
    fn load_table(&self, path: &Path) -> Result<Table, LoadError>;
    fn load_volume(&self, path: &Path) -> Result<Volume, LoadError>;
    fn load_document(&self, path: &Path) -> Result<CrossComponentMetrics, LoadError>;
}

/// Reads datasets from a local folder.
#[derive(Clone, Debug, Default)]
pub struct FsSource {
    suffixes: FilesConfig,
}

impl FsSource {
    pub fn new(suffixes: FilesConfig) -> Self {
        Self { suffixes }
    }
}

impl DatasetSource for FsSource {
    fn resolve(&self, dir: &Path) -> Result<DatasetFiles, LoadError> {
        let files = DatasetFiles {
            metrics: find_by_suffix(dir, &self.suffixes.metrics_suffix)?,
            mixing: find_by_suffix(dir, &self.suffixes.mixing_suffix)?,
            volume: find_by_suffix(dir, &self.suffixes.volume_suffix)?,
            document: find_by_suffix(dir, &self.suffixes.document_suffix)?,
        };
        debug!(target: "io", ?files, "resolved dataset files");
        Ok(files)
    }

    fn load_table(&self, path: &Path) -> Result<Table, LoadError> {
        Table::load(path)
    }

    fn load_volume(&self, path: &Path) -> Result<Volume, LoadError> {
        Volume::load(path)
    }

    fn load_document(&self, path: &Path) -> Result<CrossComponentMetrics, LoadError> {
        CrossComponentMetrics::load(path)
    }
}
