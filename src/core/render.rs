//! Artifact producers: toolkit-independent data that the egui panels draw.
//!
//! Everything here is a pure function of its inputs so that two requests for
//! the same artifact in the same dataset version are bit-identical.

use crate::config::MapConfig;
use crate::core::entity::{Classification, Elbows, EntityTable, RankMetric};
use crate::core::spectrum::{Spectrum, one_sided_spectrum};
use crate::error::RenderError;
use crate::io::nifti::Volume;

/// Axial slices of one component laid out in a grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialMap {
    pub width: usize,
    pub height: usize,
    /// Row-major, top row first. `NaN` marks padding between tiles.
    pub values: Vec<f32>,
    /// Symmetric colour limit.
    pub vmax: f32,
    pub slices: Vec<usize>,
}

impl SpatialMap {
    /// Diverging cold/hot colours; values inside `vmax * 0.05` stay dark.
    pub fn rgba(&self) -> Vec<[u8; 4]> {
        self.values
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    return [0, 0, 0, 0];
                }
                let t = (v / self.vmax).clamp(-1.0, 1.0);
                if t.abs() < 0.05 {
                    return [20, 20, 20, 255];
                }
                let m = t.abs();
                let ramp = |x: f32| (x.clamp(0.0, 1.0) * 255.0) as u8;
                if t > 0.0 {
                    [ramp(0.4 + m * 1.2), ramp(m * 2.0 - 0.6), ramp(m * 3.0 - 2.0), 255]
                } else {
                    [ramp(m * 3.0 - 2.0), ramp(m * 2.0 - 0.6), ramp(0.4 + m * 1.2), 255]
                }
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeriesFigure {
    pub title: String,
    pub samples: Vec<f64>,
    pub spectrum: Spectrum,
    pub color: [u8; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterPoint {
    pub id: i64,
    pub kappa: f64,
    pub rho: f64,
    pub kappa_rank: u32,
    pub rho_rank: u32,
    pub variance_explained: f64,
    pub classification: Classification,
}

impl ScatterPoint {
    /// Marker radius grows with variance explained.
    pub fn radius(&self) -> f32 {
        3.0 + (self.variance_explained.max(0.0).sqrt() as f32) * 1.5
    }
}

/// Plot-ready copy of the entity table, independent of the highlight.
#[derive(Clone, Debug, PartialEq)]
pub struct ScatterData {
    pub points: Vec<ScatterPoint>,
    pub elbows: Elbows,
    /// `(rank, value, id)` sorted by rank.
    pub kappa_sorted: Vec<(u32, f64, i64)>,
    pub rho_sorted: Vec<(u32, f64, i64)>,
    pub variance_by_class: Vec<(Classification, f64)>,
}

impl ScatterData {
    pub fn point(&self, id: i64) -> Option<&ScatterPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Row addressing used by the embedded plots: point order.
    pub fn row_ids(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.id).collect()
    }
}

/// The three producers behind the panels.
pub trait Renderer {
    fn render_scatter(&self, table: &EntityTable) -> ScatterData;

    fn render_spatial_map(&self, volume: &Volume, index: usize) -> Result<SpatialMap, RenderError>;

    fn render_time_series_and_spectrum(
        &self,
        title: &str,
        series: &[f64],
        dt: f64,
        classification: Classification,
    ) -> Result<TimeSeriesFigure, RenderError>;
}

#[derive(Clone, Debug, Default)]
pub struct MosaicRenderer {
    map: MapConfig,
}

impl MosaicRenderer {
    pub fn new(map: MapConfig) -> Self {
        Self { map }
    }
}

/// `count` slice indices spread evenly over `0..nz`, ends included.
fn spread_slices(nz: usize, count: usize) -> Vec<usize> {
    let count = count.clamp(1, nz.max(1));
    if count == 1 {
        return vec![nz / 2];
    }
    (0..count)
        .map(|i| (i * (nz - 1) + (count - 1) / 2) / (count - 1))
        .collect()
}

impl Renderer for MosaicRenderer {
    fn render_scatter(&self, table: &EntityTable) -> ScatterData {
        let points = table
            .entities()
            .iter()
            .map(|e| ScatterPoint {
                id: e.id,
                kappa: e.kappa,
                rho: e.rho,
                kappa_rank: e.kappa_rank,
                rho_rank: e.rho_rank,
                variance_explained: e.variance_explained,
                classification: e.classification,
            })
            .collect();
        let sorted = |metric: RankMetric| -> Vec<(u32, f64, i64)> {
            table
                .sorted_by_rank(metric)
                .into_iter()
                .map(|e| match metric {
                    RankMetric::Kappa => (e.kappa_rank, e.kappa, e.id),
                    RankMetric::Rho => (e.rho_rank, e.rho, e.id),
                })
                .collect()
        };
        ScatterData {
            points,
            elbows: table.elbows(),
            kappa_sorted: sorted(RankMetric::Kappa),
            rho_sorted: sorted(RankMetric::Rho),
            variance_by_class: table.variance_by_classification(),
        }
    }

    fn render_spatial_map(&self, volume: &Volume, index: usize) -> Result<SpatialMap, RenderError> {
        let frame = volume.frame(index).ok_or(RenderError::FrameOutOfBounds {
            index,
            n_frames: volume.n_frames(),
        })?;
        let [nx, ny, nz, _] = volume.dims();
        let slices = spread_slices(nz, self.map.slices);
        let columns = self.map.columns.clamp(1, slices.len());
        let rows = slices.len().div_ceil(columns);
        let width = columns * nx;
        let height = rows * ny;

        let mut values = vec![f32::NAN; width * height];
        for (tile, &z) in slices.iter().enumerate() {
            let (tx, ty) = (tile % columns, tile / columns);
            for y in 0..ny {
                // Image rows run top-down; volume y runs posterior to anterior.
                let py = ty * ny + (ny - 1 - y);
                let src = nx * (y + ny * z);
                let dst = py * width + tx * nx;
                values[dst..dst + nx].copy_from_slice(&frame[src..src + nx]);
            }
        }

        let peak = frame
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0f32, |acc, v| acc.max(v.abs()));
        let vmax = if peak > 0.0 {
            peak * self.map.vmax_fraction.max(f32::EPSILON)
        } else {
            1.0
        };

        Ok(SpatialMap {
            width,
            height,
            values,
            vmax,
            slices,
        })
    }

    fn render_time_series_and_spectrum(
        &self,
        title: &str,
        series: &[f64],
        dt: f64,
        classification: Classification,
    ) -> Result<TimeSeriesFigure, RenderError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(RenderError::Other(format!("invalid sampling interval {dt}")));
        }
        Ok(TimeSeriesFigure {
            title: title.to_string(),
            samples: series.to_vec(),
            spectrum: one_sided_spectrum(series, dt),
            color: classification.rgb(),
        })
    }
}
