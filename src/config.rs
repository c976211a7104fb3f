use crate::core::token::TokenFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesConfig {
    #[serde(default = "FilesConfig::default_metrics_suffix")]
    pub metrics_suffix: String,
    #[serde(default = "FilesConfig::default_mixing_suffix")]
    pub mixing_suffix: String,
    #[serde(default = "FilesConfig::default_volume_suffix")]
    pub volume_suffix: String,
    #[serde(default = "FilesConfig::default_document_suffix")]
    pub document_suffix: String,
}

impl FilesConfig {
    fn default_metrics_suffix() -> String {
        "desc-tedana_metrics.tsv".to_string()
    }
    fn default_mixing_suffix() -> String {
        "desc-ICA_mixing.tsv".to_string()
    }
    fn default_volume_suffix() -> String {
        "desc-ICA_components.nii.gz".to_string()
    }
    fn default_document_suffix() -> String {
        "desc-ICACrossComponent_metrics.json".to_string()
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            metrics_suffix: Self::default_metrics_suffix(),
            mixing_suffix: Self::default_mixing_suffix(),
            volume_suffix: Self::default_volume_suffix(),
            document_suffix: Self::default_document_suffix(),
        }
    }
}

/// Naming of component ids in URL/bridge tokens (`ica_007`) and in the
/// mixing table header (`ICA_07`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressingConfig {
    #[serde(default = "AddressingConfig::default_token_prefix")]
    pub token_prefix: String,
    #[serde(default = "AddressingConfig::default_token_width")]
    pub token_width: usize,
    #[serde(default = "AddressingConfig::default_column_prefix")]
    pub column_prefix: String,
    #[serde(default = "AddressingConfig::default_column_width")]
    pub column_width: usize,
}

impl AddressingConfig {
    fn default_token_prefix() -> String {
        "ica".to_string()
    }
    fn default_token_width() -> usize {
        3
    }
    fn default_column_prefix() -> String {
        "ICA".to_string()
    }
    fn default_column_width() -> usize {
        2
    }

    pub fn token_format(&self) -> TokenFormat {
        TokenFormat::new(&self.token_prefix, self.token_width)
    }

    pub fn column_format(&self) -> TokenFormat {
        TokenFormat::new(&self.column_prefix, self.column_width)
    }
}

impl Default for AddressingConfig {
    fn default() -> Self {
        Self {
            token_prefix: Self::default_token_prefix(),
            token_width: Self::default_token_width(),
            column_prefix: Self::default_column_prefix(),
            column_width: Self::default_column_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SpectrumConfig {
    /// Take the sampling interval from the volume header (`pixdim[4]`)
    /// instead of plotting frequency in cycles per volume.
    #[serde(default)]
    pub use_header_tr: bool,
    #[serde(default)]
    pub show_db: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapConfig {
    #[serde(default = "MapConfig::default_vmax_fraction")]
    pub vmax_fraction: f32,
    #[serde(default = "MapConfig::default_slices")]
    pub slices: usize,
    #[serde(default = "MapConfig::default_columns")]
    pub columns: usize,
}

impl MapConfig {
    fn default_vmax_fraction() -> f32 {
        0.1
    }
    fn default_slices() -> usize {
        12
    }
    fn default_columns() -> usize {
        4
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            vmax_fraction: Self::default_vmax_fraction(),
            slices: Self::default_slices(),
            columns: Self::default_columns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    #[serde(default = "UiConfig::default_pixels_per_point")]
    pub pixels_per_point: f32,
    #[serde(default = "UiConfig::default_plot_height")]
    pub plot_height: f32,
}

impl UiConfig {
    fn default_pixels_per_point() -> f32 {
        1.25
    }
    fn default_plot_height() -> f32 {
        220.0
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            pixels_per_point: Self::default_pixels_per_point(),
            plot_height: Self::default_plot_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub addressing: AddressingConfig,
    #[serde(default)]
    pub spectrum: SpectrumConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    fn round_f32(x: f32) -> f32 {
        (x * 1_000_000.0).round() / 1_000_000.0
    }

    fn format_f32_compact(x: f32) -> String {
        let mut s = format!("{:.6}", x);
        while s.contains('.') && s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        if s.is_empty() { "0".to_string() } else { s }
    }

    fn rounded(mut self) -> Self {
        self.map.vmax_fraction = Self::round_f32(self.map.vmax_fraction);
        self.ui.pixels_per_point = Self::round_f32(self.ui.pixels_per_point);
        self.ui.plot_height = Self::round_f32(self.ui.plot_height);
        self
    }

    /// Every value line commented out, so the file documents the defaults
    /// without pinning them.
    fn commented_defaults(text: &str) -> String {
        let mut commented = String::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                commented.push('\n');
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                commented.push_str(line);
                commented.push('\n');
                continue;
            }
            let mut out_line = line.to_string();
            if let Some((lhs, rhs)) = line.split_once('=') {
                let rhs_trim = rhs.trim();
                if rhs_trim.contains('.') && !rhs_trim.contains('"') {
                    if let Ok(val) = rhs_trim.parse::<f32>() {
                        let mut formatted = Self::format_f32_compact(val);
                        if !formatted.contains('.') {
                            formatted.push_str(".0");
                        }
                        out_line = format!("{} = {}", lhs.trim(), formatted);
                    }
                }
            }
            commented.push_str("# ");
            commented.push_str(&out_line);
            commented.push('\n');
        }
        commented
    }

    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write defaults and return them.
        let default_cfg = Self::default().rounded();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path_obj, Self::commented_defaults(&text)) {
                    warn!("Failed to write default config to {path}: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize default config ({err}); continuing with defaults"),
        }
        default_cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "rica_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn load_or_default_writes_defaults_cleanly() {
        let path = unique_path("defaults.toml");
        let path_str = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let cfg = AppConfig::load_or_default(&path_str);
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg.files.metrics_suffix, "desc-tedana_metrics.tsv");
        assert_eq!(cfg.addressing.token_prefix, "ica");
        assert_eq!(cfg.addressing.token_width, 3);
        assert_eq!(cfg.map.vmax_fraction, 0.1);
        assert!(!cfg.spectrum.use_header_tr);

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(
            contents.contains("# vmax_fraction = 0.1"),
            "should write commented vmax_fraction: {contents}"
        );
        assert!(
            contents.contains("# plot_height = 220.0"),
            "should write commented plot_height: {contents}"
        );
        assert!(contents.contains("[addressing]"));
        assert!(contents.contains("# token_prefix = \"ica\""));

        // Commented file parses back to the defaults.
        let reread = AppConfig::load_or_default(&path_str);
        assert_eq!(reread, AppConfig::default());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let text = r#"
[map]
vmax_fraction = 0.25

[addressing]
token_prefix = "comp"
"#;
        let cfg: AppConfig = toml::from_str(text).unwrap();
        assert_eq!(cfg.map.vmax_fraction, 0.25);
        assert_eq!(cfg.map.slices, 12);
        assert_eq!(cfg.addressing.token_format().encode(4), "comp_004");
        assert_eq!(cfg.addressing.column_format().encode(4), "ICA_04");
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let path = unique_path("broken.toml");
        fs::write(&path, "[map\nvmax_fraction = ").unwrap();
        let cfg = AppConfig::load_or_default(&path.to_string_lossy());
        assert_eq!(cfg, AppConfig::default());
        let _ = fs::remove_file(&path);
    }
}
