//! One user's view of one dataset: the loaded inputs, the selection, the
//! artifact cache and the event loop that ties them to the panels.

pub mod controller;
pub mod dataset;

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::bridge::BridgeMessage;
use crate::core::cache::ArtifactCache;
use crate::core::render::{ScatterData, SpatialMap, TimeSeriesFigure};
use crate::core::selection::{SelectionState, SelectionStore};
use crate::error::RenderError;

pub use controller::SessionController;
pub use dataset::Dataset;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    /// Only observable from inside `load_folder`.
    Loading,
    Ready,
}

/// Inputs to the session, applied one at a time in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    LoadFolder(PathBuf),
    /// A row click in the component table; `None` clears.
    TableSelect(Option<i64>),
    EmbeddedMessage(BridgeMessage),
    /// The shareable query string was edited.
    UrlChanged(String),
}

/// Per-session mutable state. Nothing here is shared between sessions.
#[derive(Default)]
pub struct Session {
    pub dataset: Option<Arc<Dataset>>,
    pub selection: SelectionStore,
    pub cache: ArtifactCache,
}

/// Everything the panels draw for one render pass.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub state: SessionState,
    pub selection: SelectionState,
    pub dataset_version: u64,
    pub dataset: Option<Arc<Dataset>>,
    pub scatter: Option<Arc<ScatterData>>,
    /// `None` when nothing is selected; an error stays inside its panel.
    pub spatial_map: Option<Result<Arc<SpatialMap>, RenderError>>,
    pub time_series: Option<Result<Arc<TimeSeriesFigure>, RenderError>>,
    pub url_query: String,
    /// Last load failure, shown in the status line.
    pub error: Option<String>,
}

impl Frame {
    /// `ICA_07 (accepted)` style banner for the selected component.
    pub fn banner(&self, columns: &crate::core::token::TokenFormat) -> Option<String> {
        let id = self.selection.selected_id?;
        let dataset = self.dataset.as_ref()?;
        let entity = dataset.entities.get(id)?;
        Some(format!(
            "{} ({})",
            columns.encode(id),
            entity.classification.as_str()
        ))
    }

    pub fn has_failed_panel(&self) -> bool {
        matches!(self.spatial_map, Some(Err(_))) || matches!(self.time_series, Some(Err(_)))
    }
}
