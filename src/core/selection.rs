use tracing::debug;

/// Where a selection change came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectionSource {
    #[default]
    None,
    Url,
    EmbeddedView,
    Table,
}

impl SelectionSource {
    /// Tag written to `selected_source` in the shareable URL.
    pub fn url_tag(self) -> Option<&'static str> {
        match self {
            Self::EmbeddedView => Some("bokeh"),
            Self::Table => Some("table"),
            Self::Url | Self::None => None,
        }
    }

    pub fn from_url_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "bokeh" => Some(Self::EmbeddedView),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_id: Option<i64>,
    pub source: SelectionSource,
    /// Bumped on every accepted change; never on a reaffirmation.
    pub generation: u64,
}

/// Single authority for the selected component.
///
/// Last writer wins: there is no priority between sources, so when two
/// sources fire in the same cycle the later event decides. Equality is on
/// the id only; the same id arriving from another source is not a change.
#[derive(Debug, Default)]
pub struct SelectionStore {
    state: SelectionState,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` iff the selected id changed.
    pub fn apply(&mut self, candidate: Option<i64>, source: SelectionSource) -> bool {
        if candidate == self.state.selected_id {
            debug!(
                target: "selection",
                ?candidate,
                ?source,
                generation = self.state.generation,
                "selection reaffirmed"
            );
            return false;
        }
        self.state = SelectionState {
            selected_id: candidate,
            source,
            generation: self.state.generation + 1,
        };
        debug!(
            target: "selection",
            ?candidate,
            ?source,
            generation = self.state.generation,
            "selection changed"
        );
        true
    }

    pub fn current(&self) -> SelectionState {
        self.state
    }

    pub fn clear(&mut self) -> bool {
        self.apply(None, SelectionSource::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_is_idempotent_per_id() {
        let mut store = SelectionStore::new();
        assert!(store.apply(Some(4), SelectionSource::Table));
        assert!(!store.apply(Some(4), SelectionSource::Table));
        assert_eq!(store.current().generation, 1);
    }

    #[test]
    fn reaffirming_from_another_source_keeps_provenance() {
        let mut store = SelectionStore::new();
        store.apply(Some(4), SelectionSource::Table);
        assert!(!store.apply(Some(4), SelectionSource::EmbeddedView));
        let state = store.current();
        assert_eq!(state.source, SelectionSource::Table);
        assert_eq!(state.generation, 1);
    }

    #[test]
    fn last_writer_wins() {
        let mut store = SelectionStore::new();
        store.apply(Some(1), SelectionSource::Table);
        store.apply(Some(2), SelectionSource::EmbeddedView);
        let state = store.current();
        assert_eq!(state.selected_id, Some(2));
        assert_eq!(state.source, SelectionSource::EmbeddedView);
        assert_eq!(state.generation, 2);
    }

    #[test]
    fn clear_only_counts_when_something_was_selected() {
        let mut store = SelectionStore::new();
        assert!(!store.clear());
        store.apply(Some(0), SelectionSource::Url);
        assert!(store.clear());
        assert_eq!(store.current().selected_id, None);
        assert_eq!(store.current().generation, 2);
    }

    #[test]
    fn url_tags_round_trip() {
        for source in [SelectionSource::EmbeddedView, SelectionSource::Table] {
            let tag = source.url_tag().unwrap();
            assert_eq!(SelectionSource::from_url_tag(tag), Some(source));
        }
        assert_eq!(SelectionSource::Url.url_tag(), None);
        assert_eq!(SelectionSource::from_url_tag("other"), None);
    }
}
