use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::LoadError;

pub const KAPPA_ELBOW_KEY: &str = "kappa_elbow";
pub const RHO_ELBOW_KEY: &str = "rho_elbow";

/// The cross-component metrics document written next to the component table.
///
/// Both elbow keys must be present. tedana writes `null` when no elbow could
/// be estimated; that is kept as `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossComponentMetrics {
    pub kappa_elbow: Option<f64>,
    pub rho_elbow: Option<f64>,
    pub extra: Map<String, Value>,
}

impl CrossComponentMetrics {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|err| LoadError::io(path, err))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self, LoadError> {
        let path = path.into();
        let malformed = |reason: String| LoadError::MalformedDocument {
            path: path.clone(),
            reason,
        };

        let value: Value = serde_json::from_str(text)
            .map_err(|err| malformed(format!("not a valid JSON document ({err})")))?;
        let Value::Object(mut map) = value else {
            return Err(malformed("top-level value is not an object".to_string()));
        };

        let mut elbow = |key: &str| -> Result<Option<f64>, LoadError> {
            match map.remove(key) {
                None => Err(malformed(format!("missing `{key}`"))),
                Some(Value::Null) => Ok(None),
                Some(Value::Number(n)) => n
                    .as_f64()
                    .map(Some)
                    .ok_or_else(|| malformed(format!("`{key}` is not representable as f64"))),
                Some(other) => Err(malformed(format!("`{key}` is not a number: {other}"))),
            }
        };
        let kappa_elbow = elbow(KAPPA_ELBOW_KEY)?;
        let rho_elbow = elbow(RHO_ELBOW_KEY)?;

        Ok(Self {
            kappa_elbow,
            rho_elbow,
            extra: map,
        })
    }
}
