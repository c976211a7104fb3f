use egui::{Grid, RichText, ScrollArea};

use crate::core::entity::EntityTable;
use crate::core::token::TokenFormat;
use crate::ui::plots::class_color;

/// Component grid. A click on a row selects it; clicking the selected row
/// clears the selection. Returns the requested selection, if any.
pub fn component_table(
    ui: &mut egui::Ui,
    table: &EntityTable,
    columns: &TokenFormat,
    selected: Option<i64>,
    height: f32,
) -> Option<Option<i64>> {
    let mut request = None;
    ScrollArea::vertical()
        .id_salt("component_table")
        .max_height(height)
        .show(ui, |ui| {
            Grid::new("component_grid")
                .striped(true)
                .num_columns(6)
                .show(ui, |ui| {
                    for header in ["component", "classification", "kappa", "rho", "variance", "ranks"] {
                        ui.label(RichText::new(header).strong());
                    }
                    ui.end_row();

                    for entity in table.entities() {
                        let is_selected = selected == Some(entity.id);
                        if ui
                            .selectable_label(is_selected, columns.encode(entity.id))
                            .clicked()
                        {
                            request = Some(if is_selected { None } else { Some(entity.id) });
                        }
                        ui.colored_label(
                            class_color(entity.classification),
                            entity.classification.as_str(),
                        );
                        ui.label(format!("{:.2}", entity.kappa));
                        ui.label(format!("{:.2}", entity.rho));
                        ui.label(format!("{:.2}", entity.variance_explained));
                        ui.label(format!("κ{} ρ{}", entity.kappa_rank, entity.rho_rank));
                        ui.end_row();
                    }
                });
        });
    request
}
