use egui::TextureHandle;

/// Widget state that lives across frames but is not part of the session.
#[derive(Default)]
pub struct UiState {
    pub folder_input: String,
    pub url_input: String,
    /// Query last copied into `url_input`; the field is only overwritten
    /// when the session publishes a different one.
    pub url_synced: String,
    pub show_db: bool,
    pub map_texture: Option<MapTexture>,
}

/// Uploaded spatial map, keyed by what it was built from.
pub struct MapTexture {
    pub dataset_version: u64,
    pub id: i64,
    pub texture: TextureHandle,
}

impl UiState {
    pub fn new(folder: Option<String>, show_db: bool) -> Self {
        Self {
            folder_input: folder.unwrap_or_default(),
            show_db,
            ..Self::default()
        }
    }

    /// Mirrors a newly published query into the editable field.
    pub fn sync_url(&mut self, published: &str) {
        if self.url_synced != published {
            self.url_synced = published.to_string();
            self.url_input = published.to_string();
        }
    }
}
