//! Selection traffic between the host session and the embedded plot surface.
//!
//! The embedded surface keeps its own selection model and redraw cycle. The
//! two sides share nothing but JSON `set_selected` messages over a channel
//! pair, and both suppress messages that would not change the receiver.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::selection::{SelectionSource, SelectionState};
use crate::core::token::{TokenFormat, decode_token};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeMessage {
    SetSelected {
        selected: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
}

impl BridgeMessage {
    pub fn set_selected(ids: &[i64], format: &TokenFormat, source: SelectionSource) -> Self {
        Self::SetSelected {
            selected: ids.iter().map(|&id| format.encode(id)).collect(),
            source: source.url_tag().map(str::to_string),
        }
    }

    /// Decoded ids in message order; undecodable tokens are dropped.
    pub fn selected_ids(&self) -> Vec<i64> {
        match self {
            Self::SetSelected { selected, .. } => {
                selected.iter().filter_map(|t| decode_token(t)).collect()
            }
        }
    }

    pub fn source(&self) -> Option<SelectionSource> {
        match self {
            Self::SetSelected { source, .. } => {
                source.as_deref().and_then(SelectionSource::from_url_tag)
            }
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing a plain enum of strings cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// One side of the channel pair. Messages cross as JSON text, as they would
/// across a script sandbox.
#[derive(Debug)]
pub struct Endpoint {
    tx: Sender<String>,
    rx: Receiver<String>,
}

impl Endpoint {
    fn send(&self, message: &BridgeMessage) -> bool {
        self.tx.send(message.to_json()).is_ok()
    }

    fn drain(&self) -> Vec<BridgeMessage> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(text) => match BridgeMessage::from_json(&text) {
                    Ok(msg) => out.push(msg),
                    Err(err) => warn!(target: "bridge", %err, "dropping malformed bridge message"),
                },
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }
}

/// Connected host and embedded endpoints.
pub fn channel() -> (Endpoint, Endpoint) {
    let (host_tx, embedded_rx) = unbounded();
    let (embedded_tx, host_rx) = unbounded();
    (
        Endpoint {
            tx: host_tx,
            rx: host_rx,
        },
        Endpoint {
            tx: embedded_tx,
            rx: embedded_rx,
        },
    )
}

/// Host side: pushes the resolved selection into the embedded surface and
/// collects its notifications.
#[derive(Debug)]
pub struct SyncBridge {
    endpoint: Endpoint,
    format: TokenFormat,
    /// `(dataset_version, generation)` of the last push.
    last_pushed: Option<(u64, u64)>,
    last_message: Option<BridgeMessage>,
    pushes: u64,
}

impl SyncBridge {
    pub fn new(endpoint: Endpoint, format: TokenFormat) -> Self {
        Self {
            endpoint,
            format,
            last_pushed: None,
            last_message: None,
            pushes: 0,
        }
    }

    /// Sends the resolved selection once per selection generation and
    /// dataset version. Returns whether a message was sent.
    pub fn push(&mut self, resolved: &SelectionState, dataset_version: u64) -> bool {
        let stamp = (dataset_version, resolved.generation);
        if self.last_pushed == Some(stamp) {
            return false;
        }
        let ids: Vec<i64> = resolved.selected_id.into_iter().collect();
        let message = BridgeMessage::set_selected(&ids, &self.format, SelectionSource::None);
        if !self.endpoint.send(&message) {
            debug!(target: "bridge", "embedded surface detached; push skipped");
        }
        debug!(target: "bridge", ?ids, dataset_version, "pushed selection to embedded view");
        self.last_pushed = Some(stamp);
        self.last_message = Some(message);
        self.pushes += 1;
        true
    }

    pub fn drain_inbound(&self) -> Vec<BridgeMessage> {
        self.endpoint.drain()
    }

    pub fn last_message(&self) -> Option<&BridgeMessage> {
        self.last_message.as_ref()
    }

    pub fn pushes(&self) -> u64 {
        self.pushes
    }
}

/// The embedded plot surface's own selection model.
///
/// Rows are the surface's addressing (point order in its data source); the
/// host speaks ids. Host pushes update the model silently; only a user
/// interaction that changes what the surface last observed emits a message.
#[derive(Debug)]
pub struct EmbeddedView {
    endpoint: Endpoint,
    format: TokenFormat,
    rows: Vec<i64>,
    selected: Vec<i64>,
    emitted: u64,
}

impl EmbeddedView {
    pub fn new(endpoint: Endpoint, format: TokenFormat) -> Self {
        Self {
            endpoint,
            format,
            rows: Vec::new(),
            selected: Vec::new(),
            emitted: 0,
        }
    }

    /// Construction data for this redraw: the id behind each row.
    pub fn set_rows(&mut self, rows: Vec<i64>) {
        self.rows = rows;
    }

    /// Applies pending host pushes. Returns whether the selection changed.
    pub fn receive_host(&mut self) -> bool {
        let mut changed = false;
        for message in self.endpoint.drain() {
            let ids = message.selected_ids();
            if ids != self.selected {
                self.selected = ids;
                changed = true;
            }
        }
        changed
    }

    /// Native selection event from a user interaction on `rows`. Emits one
    /// `set_selected` notification iff the resolved ids differ from the
    /// current selection.
    pub fn user_select(&mut self, rows: &[usize]) -> bool {
        let ids: Vec<i64> = rows.iter().filter_map(|&r| self.rows.get(r).copied()).collect();
        if ids == self.selected {
            debug!(target: "bridge", ?ids, "embedded selection unchanged; not notifying host");
            return false;
        }
        let message = BridgeMessage::set_selected(&ids, &self.format, SelectionSource::EmbeddedView);
        self.selected = ids;
        if self.endpoint.send(&message) {
            self.emitted += 1;
        }
        true
    }

    pub fn selected_ids(&self) -> &[i64] {
        &self.selected
    }

    /// Selected ids translated to row indices; ids without a row are skipped.
    pub fn selected_rows(&self) -> Vec<usize> {
        self.selected
            .iter()
            .filter_map(|id| self.rows.iter().position(|r| r == id))
            .collect()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

/// A connected host bridge and embedded surface.
pub fn connect(format: TokenFormat) -> (SyncBridge, EmbeddedView) {
    let (host, embedded) = channel();
    (
        SyncBridge::new(host, format.clone()),
        EmbeddedView::new(embedded, format),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: Option<i64>, generation: u64) -> SelectionState {
        SelectionState {
            selected_id: id,
            source: SelectionSource::Table,
            generation,
        }
    }

    #[test]
    fn message_json_shape() {
        let msg = BridgeMessage::set_selected(&[2], &TokenFormat::default(), SelectionSource::None);
        assert_eq!(msg.to_json(), r#"{"type":"set_selected","selected":["ica_002"]}"#);

        let parsed =
            BridgeMessage::from_json(r#"{"type":"set_selected","selected":["ica_004","7"],"source":"bokeh"}"#)
                .unwrap();
        assert_eq!(parsed.selected_ids(), vec![4, 7]);
        assert_eq!(parsed.source(), Some(SelectionSource::EmbeddedView));
        assert!(BridgeMessage::from_json(r#"{"type":"other"}"#).is_err());
    }

    #[test]
    fn push_is_once_per_generation() {
        let (mut bridge, mut view) = connect(TokenFormat::default());
        view.set_rows(vec![10, 11, 12]);
        assert!(bridge.push(&state(Some(11), 1), 1));
        assert!(!bridge.push(&state(Some(11), 1), 1));
        assert!(view.receive_host());
        assert_eq!(view.selected_rows(), vec![1]);
        assert!(!view.receive_host());

        // same selection, new dataset: pushed again
        assert!(bridge.push(&state(Some(11), 1), 2));
        assert_eq!(bridge.pushes(), 2);
        assert!(!view.receive_host());
    }

    #[test]
    fn host_push_never_echoes_back() {
        let (mut bridge, mut view) = connect(TokenFormat::default());
        view.set_rows(vec![0, 1, 2]);
        bridge.push(&state(Some(2), 1), 1);
        view.receive_host();
        assert!(!view.user_select(&[2]));
        assert_eq!(view.emitted(), 0);
        assert!(bridge.drain_inbound().is_empty());
    }

    #[test]
    fn user_selection_emits_single_notification() {
        let (bridge, mut view) = connect(TokenFormat::default());
        view.set_rows(vec![5, 6, 7]);
        assert!(view.user_select(&[1, 2]));
        assert!(!view.user_select(&[1, 2]));

        let inbound = bridge.drain_inbound();
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].selected_ids(), vec![6, 7]);
        assert_eq!(inbound[0].source(), Some(SelectionSource::EmbeddedView));
    }

    #[test]
    fn malformed_inbound_is_dropped() {
        let (host, embedded) = channel();
        embedded.tx.send("not json".to_string()).unwrap();
        embedded
            .tx
            .send(r#"{"type":"set_selected","selected":["ica_001"]}"#.to_string())
            .unwrap();
        let bridge = SyncBridge::new(host, TokenFormat::default());
        let inbound = bridge.drain_inbound();
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].selected_ids(), vec![1]);
    }
}
