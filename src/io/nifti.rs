//! Minimal NIfTI-1 reader for 4-D component maps.
//!
//! Only the single-file (`n+1`) layout is supported. Data is converted to
//! `f32` with `scl_slope`/`scl_inter` applied and kept in file order
//! (x fastest, then y, z, t).

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::LoadError;

const NIFTI1_HEADER_SIZE: i32 = 348;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    dims: [usize; 4],
    pixdim: [f32; 4],
    data: Vec<f32>,
}

impl Volume {
    /// Builds a volume from raw samples; `data.len()` must equal the product
    /// of `dims`.
    pub fn new(dims: [usize; 4], data: Vec<f32>) -> Option<Self> {
        (dims.iter().product::<usize>() == data.len()).then_some(Self {
            dims,
            pixdim: [1.0; 4],
            data,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let raw = fs::read(path).map_err(|err| LoadError::io(path, err))?;
        let bytes = if raw.starts_with(&GZIP_MAGIC) {
            let mut out = Vec::new();
            GzDecoder::new(raw.as_slice())
                .read_to_end(&mut out)
                .map_err(|err| LoadError::io(path, err))?;
            out
        } else {
            raw
        };
        Self::decode(&bytes).map_err(|reason| LoadError::parse(path, reason))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < NIFTI1_HEADER_SIZE as usize {
            return Err(format!("header truncated ({} bytes)", bytes.len()));
        }
        let reader = if i32::from_le_bytes(word(bytes, 0)) == NIFTI1_HEADER_SIZE {
            ByteReader::Little
        } else if i32::from_be_bytes(word(bytes, 0)) == NIFTI1_HEADER_SIZE {
            ByteReader::Big
        } else {
            return Err("not a NIfTI-1 file (sizeof_hdr != 348)".to_string());
        };

        let ndim = reader.i16(bytes, 40);
        if !(1..=7).contains(&ndim) {
            return Err(format!("invalid dim[0] = {ndim}"));
        }
        let mut dims = [1usize; 4];
        for (axis, dim) in dims.iter_mut().enumerate().take(ndim.min(4) as usize) {
            let n = reader.i16(bytes, 42 + 2 * axis);
            if n < 1 {
                return Err(format!("invalid dim[{}] = {n}", axis + 1));
            }
            *dim = n as usize;
        }
        let datatype = reader.i16(bytes, 70);
        let mut pixdim = [1.0f32; 4];
        for (axis, p) in pixdim.iter_mut().enumerate() {
            *p = reader.f32(bytes, 80 + 4 * axis);
        }
        let vox_offset = reader.f32(bytes, 108);
        if !vox_offset.is_finite() || vox_offset > bytes.len() as f32 {
            return Err(format!("invalid vox_offset {vox_offset}"));
        }
        let vox_offset = vox_offset.max(NIFTI1_HEADER_SIZE as f32) as usize;
        let slope = reader.f32(bytes, 112);
        let inter = reader.f32(bytes, 116);

        let n_voxels = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| format!("voxel count overflows for dims {dims:?}"))?;
        let width = match datatype {
            2 | 256 => 1,
            4 | 512 => 2,
            8 | 16 => 4,
            64 => 8,
            other => return Err(format!("unsupported datatype code {other}")),
        };
        let needed = n_voxels
            .checked_mul(width)
            .and_then(|payload| payload.checked_add(vox_offset))
            .ok_or_else(|| format!("payload size overflows ({n_voxels} voxels)"))?;
        if bytes.len() < needed {
            return Err(format!(
                "data truncated: need {needed} bytes, have {}",
                bytes.len()
            ));
        }

        let payload = &bytes[vox_offset..needed];
        let mut data: Vec<f32> = payload
            .chunks_exact(width)
            .map(|chunk| reader.sample(chunk, datatype))
            .collect();

        if slope.is_finite() && slope != 0.0 && (slope != 1.0 || inter != 0.0) {
            for v in &mut data {
                *v = *v * slope + inter;
            }
        }

        Ok(Self { dims, pixdim, data })
    }

    pub fn dims(&self) -> [usize; 4] {
        self.dims
    }

    /// Length of the 4th axis (one frame per component).
    pub fn n_frames(&self) -> usize {
        self.dims[3]
    }

    pub fn frame_len(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        let len = self.frame_len();
        (index < self.n_frames()).then(|| &self.data[index * len..(index + 1) * len])
    }

    /// Repetition time from `pixdim[4]`, if the header carries a usable one.
    pub fn tr(&self) -> Option<f32> {
        let tr = self.pixdim[3];
        (tr.is_finite() && tr > 0.0).then_some(tr)
    }
}

#[derive(Clone, Copy)]
enum ByteReader {
    Little,
    Big,
}

fn word(bytes: &[u8], at: usize) -> [u8; 4] {
    [bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]
}

impl ByteReader {
    fn i16(self, bytes: &[u8], at: usize) -> i16 {
        let b = [bytes[at], bytes[at + 1]];
        match self {
            Self::Little => i16::from_le_bytes(b),
            Self::Big => i16::from_be_bytes(b),
        }
    }

    fn f32(self, bytes: &[u8], at: usize) -> f32 {
        let b = word(bytes, at);
        match self {
            Self::Little => f32::from_le_bytes(b),
            Self::Big => f32::from_be_bytes(b),
        }
    }

    fn sample(self, chunk: &[u8], datatype: i16) -> f32 {
        macro_rules! read {
            ($ty:ty) => {{
                let arr: [u8; std::mem::size_of::<$ty>()] =
                    chunk.try_into().unwrap_or_default();
                match self {
                    Self::Little => <$ty>::from_le_bytes(arr),
                    Self::Big => <$ty>::from_be_bytes(arr),
                }
            }};
        }
        match datatype {
            2 => chunk[0] as f32,
            256 => chunk[0] as i8 as f32,
            4 => read!(i16) as f32,
            512 => read!(u16) as f32,
            8 => read!(i32) as f32,
            16 => read!(f32),
            64 => read!(f64) as f32,
            _ => f32::NAN,
        }
    }
}
