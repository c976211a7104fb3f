use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Interactive browser for ICA decomposition components")]
pub struct Args {
    /// tedana output folder to load on start
    #[arg(value_name = "FOLDER")]
    pub folder: Option<String>,

    /// Path to config TOML
    #[arg(long, default_value = "rica.toml")]
    pub config: String,

    /// Initial shareable query, e.g. `selected=ica_002`
    #[arg(long, value_name = "QUERY")]
    pub selected: Option<String>,

    /// Debug-level logging for rica targets
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// `--selected ica_002` and `--selected selected=ica_002` both work.
    pub fn initial_query(&self) -> Option<String> {
        let raw = self.selected.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if raw.contains('=') {
            Some(raw.to_string())
        } else {
            Some(format!("selected={raw}"))
        }
    }
}
