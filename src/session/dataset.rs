use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::entity::{Elbows, EntityTable};
use crate::core::token::TokenFormat;
use crate::error::{LoadError, OutOfRange, RenderError};
use crate::io::document::CrossComponentMetrics;
use crate::io::nifti::Volume;
use crate::io::tsv::Table;
use crate::io::{DatasetFiles, DatasetSource};

/// One validated, mutually consistent set of inputs. Published to the rest
/// of the session only after every check passed.
#[derive(Debug)]
pub struct Dataset {
    pub folder: PathBuf,
    pub files: Option<DatasetFiles>,
    pub entities: EntityTable,
    /// Content hash of the metrics table; identity of the scatter artifact.
    pub metrics_hash: u64,
    pub mixing: Table,
    pub volume: Volume,
    pub document: CrossComponentMetrics,
}

impl Dataset {
    pub fn load<S: DatasetSource + ?Sized>(source: &S, dir: &Path) -> Result<Self, LoadError> {
        if dir.as_os_str().is_empty() {
            return Err(LoadError::EmptyPath);
        }
        let files = source.resolve(dir)?;
        let mixing = source.load_table(&files.mixing)?;
        let volume = source.load_volume(&files.volume)?;
        let metrics = source.load_table(&files.metrics)?;
        let document = source.load_document(&files.document)?;

        let mut dataset = Self::assemble(dir, metrics, mixing, volume, document)?;
        dataset.files = Some(files);
        info!(
            target: "session",
            folder = %dir.display(),
            n_comps = dataset.n_comps(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Cross-checks already loaded parts. Component ids are used directly as
    /// 0-based indices on the volume's 4th axis.
    pub fn assemble(
        folder: &Path,
        metrics: Table,
        mixing: Table,
        volume: Volume,
        document: CrossComponentMetrics,
    ) -> Result<Self, LoadError> {
        let n_comps = volume.n_frames();
        if mixing.n_cols() != n_comps {
            return Err(LoadError::ShapeMismatch {
                what: "mixing table",
                table: mixing.n_cols(),
                volume: n_comps,
            });
        }
        if metrics.n_rows() != n_comps {
            return Err(LoadError::ShapeMismatch {
                what: "metrics table",
                table: metrics.n_rows(),
                volume: n_comps,
            });
        }

        let entities = EntityTable::from_table(&metrics, Elbows::from(&document))?;
        let metrics_hash = metrics.content_hash();
        if let Some(id) = entities.ids().find(|&id| id < 0 || id as usize >= n_comps) {
            return Err(LoadError::IdOutsideVolume { id, n_comps });
        }

        Ok(Self {
            folder: folder.to_path_buf(),
            files: None,
            entities,
            metrics_hash,
            mixing,
            volume,
            document,
        })
    }

    pub fn n_comps(&self) -> usize {
        self.volume.n_frames()
    }

    /// Volume index of `id`, or `OutOfRange` if the id is not a component
    /// of this dataset.
    pub fn resolve(&self, id: i64) -> Result<usize, OutOfRange> {
        if self.entities.contains(id) && id >= 0 && (id as usize) < self.n_comps() {
            Ok(id as usize)
        } else {
            Err(OutOfRange { id })
        }
    }

    /// The mixing-table column of component `id`, e.g. `ICA_07`.
    pub fn series(&self, id: i64, columns: &TokenFormat) -> Result<Vec<f64>, RenderError> {
        let name = columns.encode(id);
        let col = self
            .mixing
            .column_index(&[name.as_str()])
            .ok_or_else(|| RenderError::MissingColumn(name.clone()))?;
        self.mixing
            .column(col)
            .enumerate()
            .map(|(row, cell)| {
                cell.parse::<f64>().map_err(|_| RenderError::BadSample {
                    column: name.clone(),
                    row,
                    value: cell.to_string(),
                })
            })
            .collect()
    }

    /// Sampling interval of the time series: the header TR when requested
    /// and usable, else one volume.
    pub fn sample_interval(&self, use_header_tr: bool) -> f64 {
        match self.volume.tr() {
            Some(tr) if use_header_tr => tr as f64,
            _ => 1.0,
        }
    }
}
