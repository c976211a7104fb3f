#![allow(dead_code)]

use std::f64::consts::PI;
use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use rica::config::AppConfig;
use rica::core::bridge::EmbeddedView;
use rica::io::FsSource;
use rica::session::SessionController;

pub const PREFIX: &str = "sub-01_";

#[derive(Clone, Debug)]
pub struct DatasetSpec {
    /// Length of the volume's 4th axis.
    pub n_comps: usize,
    /// Rows of the metrics table; ids run `0..metrics_rows`.
    pub metrics_rows: usize,
    /// Columns of the mixing table (`ICA_00`, ...).
    pub mixing_cols: usize,
    /// Time points in the mixing table.
    pub n_vols: usize,
    pub tr: f32,
    pub gzip: bool,
    pub document: String,
}

impl DatasetSpec {
    pub fn new(n_comps: usize) -> Self {
        Self {
            n_comps,
            metrics_rows: n_comps,
            mixing_cols: n_comps,
            n_vols: 40,
            tr: 2.0,
            gzip: true,
            document: r#"{"kappa_elbow": 40.0, "rho_elbow": 15.0, "n_echos": 3}"#.to_string(),
        }
    }
}

/// Even ids accepted, odd ids rejected.
pub fn classification(id: usize) -> &'static str {
    if id % 2 == 0 { "accepted" } else { "rejected" }
}

pub fn write_dataset(dir: &Path, spec: &DatasetSpec) {
    fs::create_dir_all(dir).unwrap();

    let mut metrics = String::from("Component\tclassification\tkappa\trho\tvariance explained\n");
    for id in 0..spec.metrics_rows {
        metrics.push_str(&format!(
            "ICA_{id:02}\t{}\t{}\t{}\t{}\n",
            classification(id),
            80.0 - 7.0 * id as f64,
            10.0 + 3.0 * id as f64,
            20.0 / (id + 1) as f64
        ));
    }
    fs::write(dir.join(format!("{PREFIX}desc-tedana_metrics.tsv")), metrics).unwrap();

    let header: Vec<String> = (0..spec.mixing_cols).map(|c| format!("ICA_{c:02}")).collect();
    let mut mixing = header.join("\t");
    mixing.push('\n');
    for t in 0..spec.n_vols {
        let row: Vec<String> = (0..spec.mixing_cols)
            .map(|c| {
                let phase = 2.0 * PI * (c + 1) as f64 * t as f64 / spec.n_vols as f64;
                format!("{:.6}", phase.sin())
            })
            .collect();
        mixing.push_str(&row.join("\t"));
        mixing.push('\n');
    }
    fs::write(dir.join(format!("{PREFIX}desc-ICA_mixing.tsv")), mixing).unwrap();

    let nifti = nifti_bytes([4, 4, 3, spec.n_comps], spec.tr);
    let volume_path = dir.join(format!("{PREFIX}desc-ICA_components.nii.gz"));
    if spec.gzip {
        let mut enc = GzEncoder::new(Vec::new(), Compression::fast());
        enc.write_all(&nifti).unwrap();
        fs::write(volume_path, enc.finish().unwrap()).unwrap();
    } else {
        fs::write(volume_path, nifti).unwrap();
    }

    fs::write(
        dir.join(format!("{PREFIX}desc-ICACrossComponent_metrics.json")),
        &spec.document,
    )
    .unwrap();
}

/// Little-endian float32 NIfTI-1 with `pixdim[4] = tr`. Frame `f`, voxel `i`
/// holds `(f + 1) * ((i % 7) - 3)`.
pub fn nifti_bytes(dims: [usize; 4], tr: f32) -> Vec<u8> {
    let mut h = vec![0u8; 352];
    h[0..4].copy_from_slice(&348i32.to_le_bytes());
    h[40..42].copy_from_slice(&4i16.to_le_bytes());
    for (i, d) in dims.iter().enumerate() {
        h[42 + 2 * i..44 + 2 * i].copy_from_slice(&(*d as i16).to_le_bytes());
    }
    h[70..72].copy_from_slice(&16i16.to_le_bytes());
    h[72..74].copy_from_slice(&32i16.to_le_bytes());
    for (i, v) in [1.0f32, 2.0, 2.0, 2.0, tr].iter().enumerate() {
        h[76 + 4 * i..80 + 4 * i].copy_from_slice(&v.to_le_bytes());
    }
    h[108..112].copy_from_slice(&352.0f32.to_le_bytes());
    h[344..348].copy_from_slice(b"n+1\0");

    let frame_len = dims[0] * dims[1] * dims[2];
    for f in 0..dims[3] {
        for i in 0..frame_len {
            let v = (f + 1) as f32 * ((i % 7) as f32 - 3.0);
            h.extend_from_slice(&v.to_le_bytes());
        }
    }
    h
}

pub fn controller() -> (SessionController, EmbeddedView) {
    SessionController::new(FsSource::default(), AppConfig::default())
}

/// Controller with `dir` already loaded and one cycle run.
pub fn loaded(dir: &Path) -> (SessionController, EmbeddedView) {
    let (mut ctl, mut view) = controller();
    ctl.load_folder(dir).unwrap();
    let frame = ctl.run_cycle();
    if let Some(scatter) = &frame.scatter {
        view.set_rows(scatter.row_ids());
    }
    view.receive_host();
    (ctl, view)
}
