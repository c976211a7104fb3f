use rustfft::{FftPlanner, num_complex::Complex64};

/// One-sided spectrum of a real series (`n/2 + 1` bins, no zero padding).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Spectrum {
    /// Bin centres, `k / (n * dt)`.
    pub freqs: Vec<f64>,
    /// `|X[k]|`
    pub amplitude: Vec<f64>,
    /// `|X[k]|²`
    pub power: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// Index of the strongest non-DC bin.
    pub fn peak_bin(&self) -> Option<usize> {
        self.power
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
    }
}

/// Sample frequencies of an `n`-point real FFT with sample spacing `dt`.
pub fn rfft_freqs(n: usize, dt: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let scale = 1.0 / (n as f64 * dt);
    (0..=n / 2).map(|k| k as f64 * scale).collect()
}

/// Forward real FFT keeping the non-negative frequencies.
pub fn one_sided_spectrum(series: &[f64], dt: f64) -> Spectrum {
    let n = series.len();
    if n == 0 {
        return Spectrum::default();
    }
    let mut buf: Vec<Complex64> = series.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buf);

    let half = &buf[..=n / 2];
    Spectrum {
        freqs: rfft_freqs(n, dt),
        amplitude: half.iter().map(|z| z.norm()).collect(),
        power: half.iter().map(|z| z.norm_sqr()).collect(),
    }
}

/// Power in dB relative to `reference` (or the maximum), floored at -100 dB.
pub fn power_to_db(power: &[f64], reference: Option<f64>) -> Vec<f64> {
    let reference = reference.unwrap_or_else(|| power.iter().copied().fold(0.0, f64::max));
    if reference <= 0.0 {
        return vec![0.0; power.len()];
    }
    power
        .iter()
        .map(|&p| {
            if p <= 0.0 {
                -100.0
            } else {
                (10.0 * (p / reference).log10()).max(-100.0)
            }
        })
        .collect()
}
