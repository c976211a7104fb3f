use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::bridge::{EmbeddedView, SyncBridge, connect};
use crate::core::cache::{ArtifactCache, ArtifactKind, Identity, ParamsHash};
use crate::core::render::{MosaicRenderer, Renderer, SpatialMap, TimeSeriesFigure};
use crate::core::selection::{SelectionSource, SelectionState};
use crate::core::token::UrlState;
use crate::error::{LoadError, RenderError};
use crate::io::DatasetSource;
use crate::session::{Dataset, Frame, Session, SessionEvent, SessionState};

/// Drives one session: owns the event queue, applies events in order and
/// produces at most one new [`Frame`] per cycle.
pub struct SessionController {
    source: Box<dyn DatasetSource>,
    renderer: Box<dyn Renderer>,
    config: AppConfig,
    session: Session,
    bridge: SyncBridge,
    queue: VecDeque<SessionEvent>,
    state: SessionState,
    last_error: Option<String>,
    error_epoch: u64,
    url_query: String,
    frame: Arc<Frame>,
    /// `(generation, dataset_version, error_epoch)` of `frame`, unset while
    /// a panel of `frame` failed.
    frame_stamp: Option<(u64, u64, u64)>,
    renders: u64,
}

impl SessionController {
    /// A controller with no dataset, plus the embedded surface wired to its
    /// bridge.
    pub fn new<S: DatasetSource + 'static>(source: S, config: AppConfig) -> (Self, EmbeddedView) {
        let (bridge, view) = connect(config.addressing.token_format());
        let renderer = MosaicRenderer::new(config.map.clone());
        let url_query = UrlState::default().to_query(&config.addressing.token_format());
        let controller = Self {
            source: Box::new(source),
            renderer: Box::new(renderer),
            config,
            session: Session::default(),
            bridge,
            queue: VecDeque::new(),
            state: SessionState::Idle,
            last_error: None,
            error_epoch: 0,
            url_query,
            frame: Arc::new(Frame::default()),
            frame_stamp: None,
            renders: 0,
        };
        (controller, view)
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Queues an event for the next cycle. Embedded notifications that
    /// already arrived are queued first so arrival order is kept.
    pub fn submit(&mut self, event: SessionEvent) {
        self.collect_inbound();
        self.queue.push_back(event);
    }

    /// Loads `dir` and publishes it atomically. On failure the previous
    /// dataset, selection and cache stay as they were.
    pub fn load_folder(&mut self, dir: &Path) -> Result<(), LoadError> {
        self.state = SessionState::Loading;
        match Dataset::load(self.source.as_ref(), dir) {
            Ok(dataset) => {
                let version = self.session.cache.bump_dataset_version();
                self.session.dataset = Some(Arc::new(dataset));
                self.state = SessionState::Ready;
                if self.last_error.take().is_some() {
                    self.error_epoch += 1;
                }
                let current = self.session.selection.current().selected_id;
                if let Some(id) = current {
                    if self.clamp(Some(id)).is_none() {
                        self.session.selection.clear();
                    }
                }
                info!(target: "session", dataset_version = version, "dataset published");
                Ok(())
            }
            Err(err) => {
                warn!(target: "session", folder = %dir.display(), %err, "load failed");
                self.state = if self.session.dataset.is_some() {
                    SessionState::Ready
                } else {
                    SessionState::Idle
                };
                self.last_error = Some(err.to_string());
                self.error_epoch += 1;
                Err(err)
            }
        }
    }

    /// Applies every queued event, then rebuilds the frame if the selection,
    /// the dataset or the error changed, or if a panel failed last time.
    pub fn run_cycle(&mut self) -> Arc<Frame> {
        self.collect_inbound();
        while let Some(event) = self.queue.pop_front() {
            self.apply(event);
        }

        let selection = self.session.selection.current();
        let version = self.session.cache.dataset_version();
        let stamp = (selection.generation, version, self.error_epoch);
        if self.frame_stamp == Some(stamp) {
            return Arc::clone(&self.frame);
        }

        let format = self.config.addressing.token_format();
        self.url_query = UrlState::new(selection.selected_id, selection.source).to_query(&format);
        let frame = self.build_frame(selection, version);
        if self.session.dataset.is_some() {
            self.bridge.push(&selection, version);
        }
        // A frame with a failed panel is rebuilt next cycle so the failed
        // artifact is retried; the cache never stored it.
        self.frame_stamp = (!frame.has_failed_panel()).then_some(stamp);
        self.frame = Arc::new(frame);
        self.renders += 1;
        debug!(
            target: "session",
            generation = selection.generation,
            dataset_version = version,
            renders = self.renders,
            "frame rebuilt"
        );
        Arc::clone(&self.frame)
    }

    fn collect_inbound(&mut self) {
        for message in self.bridge.drain_inbound() {
            self.queue.push_back(SessionEvent::EmbeddedMessage(message));
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::LoadFolder(dir) => {
                // Recorded in `last_error`; the frame shows it.
                let _ = self.load_folder(&dir);
            }
            SessionEvent::TableSelect(candidate) => {
                self.select(candidate, SelectionSource::Table);
            }
            SessionEvent::EmbeddedMessage(message) => {
                let candidate = message.selected_ids().first().copied();
                self.select(candidate, SelectionSource::EmbeddedView);
            }
            SessionEvent::UrlChanged(query) => {
                if query.trim().trim_start_matches('?') == self.url_query {
                    return;
                }
                let parsed = UrlState::parse_query(&query);
                self.select(parsed.first(), SelectionSource::Url);
            }
        }
    }

    fn select(&mut self, candidate: Option<i64>, source: SelectionSource) -> bool {
        let resolved = self.clamp(candidate);
        self.session.selection.apply(resolved, source)
    }

    /// `candidate` if it names a component of the loaded dataset, else `None`.
    fn clamp(&self, candidate: Option<i64>) -> Option<i64> {
        let id = candidate?;
        let dataset = self.session.dataset.as_ref()?;
        match dataset.resolve(id) {
            Ok(_) => Some(id),
            Err(err) => {
                debug!(target: "selection", %err, "clamping selection to none");
                None
            }
        }
    }

    fn build_frame(&mut self, selection: SelectionState, version: u64) -> Frame {
        let mut frame = Frame {
            state: self.state,
            selection,
            dataset_version: version,
            dataset: self.session.dataset.clone(),
            url_query: self.url_query.clone(),
            error: self.last_error.clone(),
            ..Frame::default()
        };
        let Some(dataset) = self.session.dataset.clone() else {
            return frame;
        };

        let renderer = self.renderer.as_ref();
        let cache = &mut self.session.cache;
        let scatter = cache
            .get_or_compute(
                ArtifactKind::NormalizedTable,
                Identity::Content(dataset.metrics_hash),
                0,
                || Ok::<_, std::convert::Infallible>(renderer.render_scatter(&dataset.entities)),
            )
            .unwrap_or_else(|never| match never {});
        frame.scatter = Some(scatter);

        if let Some(id) = selection.selected_id {
            frame.spatial_map = Some(spatial_map(cache, renderer, &self.config, &dataset, id));
            frame.time_series = Some(time_series(cache, renderer, &self.config, &dataset, id));
        }
        frame
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selection(&self) -> SelectionState {
        self.session.selection.current()
    }

    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.session.dataset.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.session.cache
    }

    pub fn bridge(&self) -> &SyncBridge {
        &self.bridge
    }

    pub fn url_query(&self) -> &str {
        &self.url_query
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Frames built so far; a cycle that changed nothing does not count.
    pub fn renders(&self) -> u64 {
        self.renders
    }
}

fn spatial_map(
    cache: &mut ArtifactCache,
    renderer: &dyn Renderer,
    config: &AppConfig,
    dataset: &Dataset,
    id: i64,
) -> Result<Arc<SpatialMap>, RenderError> {
    let params = ParamsHash::new()
        .f64(config.map.vmax_fraction as f64)
        .u64(config.map.slices as u64)
        .u64(config.map.columns as u64)
        .finish();
    cache.get_or_compute(ArtifactKind::SpatialMap, Identity::Entity(id), params, || {
        let index = dataset
            .resolve(id)
            .map_err(|err| RenderError::Other(err.to_string()))?;
        renderer.render_spatial_map(&dataset.volume, index)
    })
}

fn time_series(
    cache: &mut ArtifactCache,
    renderer: &dyn Renderer,
    config: &AppConfig,
    dataset: &Dataset,
    id: i64,
) -> Result<Arc<TimeSeriesFigure>, RenderError> {
    let columns = config.addressing.column_format();
    let params = ParamsHash::new()
        .str(columns.prefix())
        .u64(config.addressing.column_width as u64)
        .u64(config.spectrum.use_header_tr as u64)
        .finish();
    cache.get_or_compute(ArtifactKind::TimeSeriesFigure, Identity::Entity(id), params, || {
        let series = dataset.series(id, &columns)?;
        let classification = dataset
            .entities
            .get(id)
            .map(|e| e.classification)
            .unwrap_or_default();
        renderer.render_time_series_and_spectrum(
            &columns.encode(id),
            &series,
            dataset.sample_interval(config.spectrum.use_header_tr),
            classification,
        )
    })
}
