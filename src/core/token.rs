//! Compact component tokens (`ica_007`) and the shareable URL query that
//! carries them.

use tracing::debug;

use crate::core::selection::SelectionSource;

/// `<prefix>_<zero-padded id>`. Used for URL state and bridge messages
/// (`ica`, width 3) and for mixing-table column names (`ICA`, width 2).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenFormat {
    prefix: String,
    width: usize,
}

impl Default for TokenFormat {
    fn default() -> Self {
        Self::new("ica", 3)
    }
}

impl TokenFormat {
    pub fn new(prefix: &str, width: usize) -> Self {
        Self {
            prefix: prefix.to_string(),
            width,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn encode(&self, id: i64) -> String {
        format!("{}_{:0width$}", self.prefix, id, width = self.width)
    }
}

pub fn encode_token(id: i64) -> String {
    TokenFormat::default().encode(id)
}

/// Accepts `<anything>_<digits>` or a bare integer. The prefix is not
/// checked, so tokens written with a different prefix still resolve.
pub fn decode_token(token: &str) -> Option<i64> {
    let token = token.trim();
    let digits = match token.split_once('_') {
        Some((_, rest)) => rest,
        None => token,
    };
    digits.trim().parse().ok()
}

/// Parsed shareable state: `selected=ica_002,ica_004&selected_source=table`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlState {
    pub selected: Vec<i64>,
    /// Provenance of the last write. Diagnostic only.
    pub source: Option<SelectionSource>,
}

impl UrlState {
    pub fn new(selected: Option<i64>, source: SelectionSource) -> Self {
        Self {
            selected: selected.into_iter().collect(),
            source: source.url_tag().map(|_| source),
        }
    }

    pub fn parse_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut state = Self::default();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = percent_decode(value);
            match key {
                "selected" => {
                    state.selected = value
                        .split(',')
                        .filter(|t| !t.trim().is_empty())
                        .filter_map(|t| {
                            let id = decode_token(t);
                            if id.is_none() {
                                debug!(target: "selection", token = t, "skipping undecodable token");
                            }
                            id
                        })
                        .collect();
                }
                "selected_source" => state.source = SelectionSource::from_url_tag(&value),
                _ => {}
            }
        }
        state
    }

    pub fn to_query(&self, format: &TokenFormat) -> String {
        let tokens: Vec<String> = self.selected.iter().map(|&id| format.encode(id)).collect();
        let mut query = format!("selected={}", tokens.join(","));
        if let Some(tag) = self.source.and_then(SelectionSource::url_tag) {
            query.push_str("&selected_source=");
            query.push_str(tag);
        }
        query
    }

    /// The host only consumes the first selected id.
    pub fn first(&self) -> Option<i64> {
        self.selected.first().copied()
    }
}

/// Decodes `%XX` escapes and `+`; invalid escapes are kept verbatim.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(b) => {
                        out.push(b);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
