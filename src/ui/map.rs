use egui::{ColorImage, TextureOptions, Vec2};

use crate::core::render::SpatialMap;
use crate::ui::viewdata::{MapTexture, UiState};

pub fn color_image(map: &SpatialMap) -> ColorImage {
    let bytes: Vec<u8> = map.rgba().into_iter().flatten().collect();
    ColorImage::from_rgba_unmultiplied([map.width, map.height], &bytes)
}

/// Draws the mosaic scaled to the available width. The texture is uploaded
/// once per `(dataset_version, id)`.
pub fn spatial_map(
    ui: &mut egui::Ui,
    state: &mut UiState,
    map: &SpatialMap,
    dataset_version: u64,
    id: i64,
) {
    if map.width == 0 || map.height == 0 {
        ui.label("empty volume");
        return;
    }
    let stale = state
        .map_texture
        .as_ref()
        .is_none_or(|t| t.dataset_version != dataset_version || t.id != id);
    if stale {
        let texture = ui
            .ctx()
            .load_texture("spatial_map", color_image(map), TextureOptions::NEAREST);
        state.map_texture = Some(MapTexture {
            dataset_version,
            id,
            texture,
        });
    }
    let Some(uploaded) = state.map_texture.as_ref() else {
        return;
    };
    let scale = ui.available_width() / map.width as f32;
    let size = Vec2::new(map.width as f32, map.height as f32) * scale;
    ui.image((uploaded.texture.id(), size));
    ui.label(format!("slices {:?}, |v| ≤ {:.3}", map.slices, map.vmax));
}
