use egui::{Color32, Pos2};
use egui_plot::{Bar, BarChart, HLine, Legend, Line, MarkerShape, Plot, PlotPoint, PlotPoints, Points, VLine};

use crate::core::entity::Classification;
use crate::core::render::{ScatterData, TimeSeriesFigure};
use crate::core::spectrum::power_to_db;

/// Clicks further than this from every marker select nothing.
const PICK_RADIUS: f32 = 12.0;

pub fn class_color(class: Classification) -> Color32 {
    let [r, g, b] = class.rgb();
    Color32::from_rgb(r, g, b)
}

/// Index of the screen position closest to `pointer`, within `max_dist`.
pub fn nearest_index(
    positions: impl IntoIterator<Item = Pos2>,
    pointer: Pos2,
    max_dist: f32,
) -> Option<usize> {
    positions
        .into_iter()
        .enumerate()
        .map(|(i, p)| (i, p.distance(pointer)))
        .filter(|(_, d)| *d <= max_dist)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Kappa vs rho, one marker per component sized by variance explained.
/// Returns the clicked row (point order), if any.
pub fn kappa_rho_scatter(
    ui: &mut egui::Ui,
    data: &ScatterData,
    highlighted: &[usize],
    height: f32,
) -> Option<usize> {
    let response = Plot::new("kappa_rho_scatter")
        .height(height)
        .legend(Legend::default())
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_label("kappa")
        .y_axis_label("rho")
        .show(ui, |plot_ui| {
            for class in Classification::ALL {
                for p in data.points.iter().filter(|p| p.classification == class) {
                    plot_ui.points(
                        Points::new(class.as_str(), vec![[p.kappa, p.rho]])
                            .radius(p.radius())
                            .shape(MarkerShape::Circle)
                            .filled(true)
                            .color(class_color(class)),
                    );
                }
            }
            for &row in highlighted {
                if let Some(p) = data.points.get(row) {
                    plot_ui.points(
                        Points::new("selected", vec![[p.kappa, p.rho]])
                            .radius(p.radius() + 3.0)
                            .filled(false)
                            .color(Color32::WHITE),
                    );
                }
            }
        });

    if !response.response.clicked() {
        return None;
    }
    let pointer = response.response.interact_pointer_pos()?;
    nearest_index(
        data.points
            .iter()
            .map(|p| response.transform.position_from_point(&PlotPoint::new(p.kappa, p.rho))),
        pointer,
        PICK_RADIUS,
    )
}

/// Metric value by rank with its elbow as a horizontal line. Returns the id
/// behind a clicked marker.
pub fn rank_plot(
    ui: &mut egui::Ui,
    title: &str,
    sorted: &[(u32, f64, i64)],
    elbow: Option<f64>,
    data: &ScatterData,
    selected: Option<i64>,
    height: f32,
) -> Option<i64> {
    let response = Plot::new(title)
        .height(height)
        .allow_drag(false)
        .allow_scroll(false)
        .x_axis_label("rank")
        .y_axis_label(title)
        .show(ui, |plot_ui| {
            let line: PlotPoints = sorted.iter().map(|&(rank, v, _)| [rank as f64, v]).collect();
            plot_ui.line(Line::new(title, line).color(Color32::GRAY));
            for &(rank, value, id) in sorted {
                let class = data.point(id).map(|p| p.classification).unwrap_or_default();
                let radius = if Some(id) == selected { 6.0 } else { 3.5 };
                plot_ui.points(
                    Points::new(class.as_str(), vec![[rank as f64, value]])
                        .radius(radius)
                        .filled(true)
                        .color(class_color(class)),
                );
            }
            if let Some(y) = elbow {
                plot_ui.hline(HLine::new("elbow", y).color(Color32::LIGHT_RED));
            }
        });

    if !response.response.clicked() {
        return None;
    }
    let pointer = response.response.interact_pointer_pos()?;
    let row = nearest_index(
        sorted.iter().map(|&(rank, v, _)| {
            response
                .transform
                .position_from_point(&PlotPoint::new(rank as f64, v))
        }),
        pointer,
        PICK_RADIUS,
    )?;
    sorted.get(row).map(|&(_, _, id)| id)
}

pub fn variance_bars(ui: &mut egui::Ui, data: &ScatterData, height: f32) {
    let bars: Vec<Bar> = data
        .variance_by_class
        .iter()
        .enumerate()
        .map(|(i, &(class, total))| {
            Bar::new(i as f64, total)
                .name(class.as_str())
                .fill(class_color(class))
        })
        .collect();
    let labels: Vec<&'static str> = data.variance_by_class.iter().map(|(c, _)| c.as_str()).collect();
    Plot::new("variance_by_class")
        .height(height)
        .allow_drag(false)
        .allow_scroll(false)
        .y_axis_label("variance explained (%)")
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() < 1e-6 && i >= 0.0 {
                labels.get(i as usize).map(|s| s.to_string()).unwrap_or_default()
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new("variance", bars).width(0.6));
        });
}

/// Mixing time series above its one-sided spectrum.
pub fn time_series_and_spectrum(
    ui: &mut egui::Ui,
    figure: &TimeSeriesFigure,
    dt: f64,
    show_db: bool,
    height: f32,
) {
    let color = Color32::from_rgb(figure.color[0], figure.color[1], figure.color[2]);
    ui.label(&figure.title);
    let samples: PlotPoints = figure
        .samples
        .iter()
        .enumerate()
        .map(|(i, &v)| [i as f64 * dt, v])
        .collect();
    Plot::new("time_series")
        .height(height * 0.6)
        .allow_scroll(false)
        .x_axis_label(if dt == 1.0 { "volume" } else { "time (s)" })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new("time series", samples).color(color));
        });

    let ys = if show_db {
        power_to_db(&figure.spectrum.power, None)
    } else {
        figure.spectrum.amplitude.clone()
    };
    let peak = figure.spectrum.peak_bin();
    let points: PlotPoints = figure
        .spectrum
        .freqs
        .iter()
        .zip(ys)
        .map(|(&f, y)| [f, y])
        .collect();
    Plot::new("spectrum")
        .height(height * 0.6)
        .allow_scroll(false)
        .x_axis_label(if dt == 1.0 { "cycles / volume" } else { "Hz" })
        .y_axis_label(if show_db { "power (dB)" } else { "amplitude" })
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new("spectrum", points).color(color));
            if let Some(k) = peak {
                plot_ui.vline(VLine::new("peak", figure.spectrum.freqs[k]).color(Color32::DARK_GRAY));
            }
        });
}
