use std::path::PathBuf;

use egui::{CentralPanel, Color32, SidePanel, TopBottomPanel};

use crate::config::AppConfig;
use crate::core::bridge::EmbeddedView;
use crate::session::{Frame, SessionEvent, SessionState};
use crate::ui::map::spatial_map;
use crate::ui::plots::{kappa_rho_scatter, rank_plot, time_series_and_spectrum, variance_bars};
use crate::ui::table::component_table;
use crate::ui::viewdata::UiState;

/// Draws one frame and returns the events the user produced.
///
/// Scatter clicks go through `embedded`, which notifies the session over the
/// bridge; every other widget produces events directly.
pub fn main_window(
    ctx: &egui::Context,
    frame: &Frame,
    state: &mut UiState,
    embedded: &mut EmbeddedView,
    config: &AppConfig,
) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    let columns = config.addressing.column_format();
    let plot_height = config.ui.plot_height;
    state.sync_url(&frame.url_query);

    TopBottomPanel::top("top").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Rica");
            ui.label("folder");
            let field = ui.text_edit_singleline(&mut state.folder_input);
            let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Load").clicked() || submitted {
                events.push(SessionEvent::LoadFolder(PathBuf::from(state.folder_input.trim())));
            }
        });
        ui.horizontal(|ui| {
            ui.label("?");
            let field = ui.text_edit_singleline(&mut state.url_input);
            let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Go").clicked() || submitted {
                events.push(SessionEvent::UrlChanged(state.url_input.clone()));
            }
            ui.checkbox(&mut state.show_db, "spectrum in dB");
        });
        ui.horizontal(|ui| {
            let status = match frame.state {
                SessionState::Idle => "no dataset".to_string(),
                // Loads finish inside `run_cycle`; a frame never carries this.
                SessionState::Loading => String::new(),
                SessionState::Ready => frame
                    .dataset
                    .as_ref()
                    .map(|d| {
                        let counts: Vec<String> = d
                            .entities
                            .counts_by_classification()
                            .iter()
                            .map(|(c, n)| format!("{n} {}", c.as_str()))
                            .collect();
                        format!(
                            "{} ({} components: {})",
                            d.folder.display(),
                            d.n_comps(),
                            counts.join(", ")
                        )
                    })
                    .unwrap_or_default(),
            };
            ui.label(status);
            ui.separator();
            match frame.banner(&columns) {
                Some(banner) => ui.strong(format!("selected: {banner}")),
                None => ui.label("no component selected"),
            };
        });
        if let Some(err) = &frame.error {
            ui.colored_label(Color32::LIGHT_RED, err);
        }
    });

    let (Some(dataset), Some(scatter)) = (frame.dataset.as_ref(), frame.scatter.as_ref()) else {
        CentralPanel::default().show(ctx, |ui| {
            ui.label("Enter a tedana output folder and press Load.");
        });
        return events;
    };
    let selected = frame.selection.selected_id;

    SidePanel::left("overview")
        .resizable(true)
        .default_width(560.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label("kappa / rho");
                let highlighted = embedded.selected_rows();
                if let Some(row) = kappa_rho_scatter(ui, scatter, &highlighted, plot_height) {
                    embedded.user_select(&[row]);
                }
                ui.label("variance explained by classification");
                variance_bars(ui, scatter, plot_height * 0.6);
                ui.columns(2, |cols| {
                    let kappa = rank_plot(
                        &mut cols[0],
                        "kappa",
                        &scatter.kappa_sorted,
                        scatter.elbows.kappa,
                        scatter,
                        selected,
                        plot_height * 0.8,
                    );
                    let rho = rank_plot(
                        &mut cols[1],
                        "rho",
                        &scatter.rho_sorted,
                        scatter.elbows.rho,
                        scatter,
                        selected,
                        plot_height * 0.8,
                    );
                    if let Some(id) = kappa.or(rho) {
                        events.push(SessionEvent::TableSelect(Some(id)));
                    }
                });
                ui.separator();
                if let Some(request) =
                    component_table(ui, &dataset.entities, &columns, selected, plot_height * 1.5)
                {
                    events.push(SessionEvent::TableSelect(request));
                }
            });
        });

    CentralPanel::default().show(ctx, |ui| {
        let Some(id) = selected else {
            ui.label("Select a component in the plots or the table.");
            return;
        };
        egui::ScrollArea::vertical().show(ui, |ui| {
            match &frame.spatial_map {
                Some(Ok(map)) => spatial_map(ui, state, map, frame.dataset_version, id),
                Some(Err(err)) => {
                    ui.colored_label(Color32::LIGHT_RED, format!("spatial map: {err}"));
                }
                None => {}
            }
            ui.separator();
            match &frame.time_series {
                Some(Ok(figure)) => {
                    let dt = dataset.sample_interval(config.spectrum.use_header_tr);
                    time_series_and_spectrum(ui, figure, dt, state.show_db, plot_height);
                }
                Some(Err(err)) => {
                    ui.colored_label(Color32::LIGHT_RED, format!("time series: {err}"));
                }
                None => {}
            }
        });
    });

    events
}
