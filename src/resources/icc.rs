//! ICC colour profiles: the built-in sRGB and Gray profiles, and user supplied ones.

use crate::error::ResourceError;
use std::{path::PathBuf, sync::Arc};

/// Where a colour profile comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProfileSpec {
    Srgb,
    Gray,
    Bytes(Arc<[u8]>),
    File(PathBuf),
}

/// A validated ICC profile
#[derive(Debug, Clone, PartialEq)]
pub struct ColorProfile {
    data: Arc<[u8]>,
    components: u8,
}

impl ColorProfile {
    pub fn load(spec: &ProfileSpec) -> Result<ColorProfile, ResourceError> {
        let data: Arc<[u8]> = match spec {
            ProfileSpec::Srgb => srgb().into(),
            ProfileSpec::Gray => gray().into(),
            ProfileSpec::Bytes(bytes) => bytes.clone(),
            ProfileSpec::File(path) => std::fs::read(path)
                .map_err(|e| ResourceError::Profile(format!("{}: {e}", path.display())))?
                .into(),
        };
        ColorProfile::from_data(data)
    }

    fn from_data(data: Arc<[u8]>) -> Result<ColorProfile, ResourceError> {
        if data.len() < 132 {
            return Err(ResourceError::Profile("shorter than an ICC header".into()));
        }
        if &data[36..40] != b"acsp" {
            return Err(ResourceError::Profile("missing 'acsp' signature".into()));
        }
        let declared = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if declared > data.len() {
            return Err(ResourceError::Profile(format!(
                "declares {declared} bytes but only {} are present",
                data.len()
            )));
        }
        let components = match &data[16..20] {
            b"GRAY" => 1,
            b"RGB " => 3,
            b"CMYK" => 4,
            other => {
                return Err(ResourceError::Profile(format!(
                    "unsupported colour space '{}'",
                    String::from_utf8_lossy(other)
                )))
            }
        };
        Ok(ColorProfile { data, components })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `/N` of the ICCBased stream
    pub fn components(&self) -> u8 {
        self.components
    }

    /// Device space readers use when they cannot apply the profile
    pub fn alternate(&self) -> &'static str {
        match self.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        }
    }
}

fn s15f16(v: f32) -> [u8; 4] {
    ((v * 65536.0).round() as i32).to_be_bytes()
}

fn xyz(x: f32, y: f32, z: f32) -> Vec<u8> {
    let mut tag = b"XYZ \0\0\0\0".to_vec();
    tag.extend_from_slice(&s15f16(x));
    tag.extend_from_slice(&s15f16(y));
    tag.extend_from_slice(&s15f16(z));
    tag
}

// gamma 2.2 as u8Fixed8
fn gamma_curve() -> Vec<u8> {
    let mut tag = b"curv\0\0\0\0".to_vec();
    tag.extend_from_slice(&1u32.to_be_bytes());
    tag.extend_from_slice(&0x0233u16.to_be_bytes());
    tag
}

fn text_description(text: &str) -> Vec<u8> {
    let mut tag = b"desc\0\0\0\0".to_vec();
    tag.extend_from_slice(&(text.len() as u32 + 1).to_be_bytes());
    tag.extend_from_slice(text.as_bytes());
    tag.push(0);
    // empty unicode and scriptcode records
    tag.extend_from_slice(&[0u8; 8]);
    tag.extend_from_slice(&[0u8; 3]);
    tag.extend_from_slice(&[0u8; 67]);
    tag
}

fn text(text: &str) -> Vec<u8> {
    let mut tag = b"text\0\0\0\0".to_vec();
    tag.extend_from_slice(text.as_bytes());
    tag.push(0);
    tag
}

const D50: (f32, f32, f32) = (0.9642, 1.0, 0.8249);

/// Lay out a version 2 display profile. Tags that share data share an offset.
fn build(colour_space: &[u8; 4], tags: Vec<(&[u8; 4], usize)>, data: Vec<Vec<u8>>) -> Vec<u8> {
    let table_len = 4 + 12 * tags.len();
    let mut offsets = Vec::with_capacity(data.len());
    let mut body = Vec::new();
    for block in data.iter() {
        offsets.push(128 + table_len + body.len());
        body.extend_from_slice(block);
        while body.len() % 4 != 0 {
            body.push(0);
        }
    }
    let size = 128 + table_len + body.len();

    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(&(size as u32).to_be_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&0x0210_0000u32.to_be_bytes());
    out.extend_from_slice(b"mntr");
    out.extend_from_slice(colour_space);
    out.extend_from_slice(b"XYZ ");
    for v in [2000u16, 1, 1, 0, 0, 0] {
        out.extend_from_slice(&v.to_be_bytes());
    }
    out.extend_from_slice(b"acsp");
    out.resize(68, 0);
    out.extend_from_slice(&s15f16(D50.0));
    out.extend_from_slice(&s15f16(D50.1));
    out.extend_from_slice(&s15f16(D50.2));
    out.resize(128, 0);

    out.extend_from_slice(&(tags.len() as u32).to_be_bytes());
    for (signature, block) in tags {
        out.extend_from_slice(signature);
        out.extend_from_slice(&(offsets[block] as u32).to_be_bytes());
        out.extend_from_slice(&(data[block].len() as u32).to_be_bytes());
    }
    out.extend(body);
    out
}

/// sRGB with the primaries adapted to D50 and a plain 2.2 gamma
pub fn srgb() -> Vec<u8> {
    build(
        b"RGB ",
        vec![
            (b"desc", 0),
            (b"cprt", 1),
            (b"wtpt", 2),
            (b"rXYZ", 3),
            (b"gXYZ", 4),
            (b"bXYZ", 5),
            (b"rTRC", 6),
            (b"gTRC", 6),
            (b"bTRC", 6),
        ],
        vec![
            text_description("sRGB"),
            text("No copyright, use freely"),
            xyz(D50.0, D50.1, D50.2),
            xyz(0.4361, 0.2225, 0.0139),
            xyz(0.3851, 0.7169, 0.0971),
            xyz(0.1431, 0.0606, 0.7141),
            gamma_curve(),
        ],
    )
}

pub fn gray() -> Vec<u8> {
    build(
        b"GRAY",
        vec![(b"desc", 0), (b"cprt", 1), (b"wtpt", 2), (b"kTRC", 3)],
        vec![
            text_description("Gray 2.2"),
            text("No copyright, use freely"),
            xyz(D50.0, D50.1, D50.2),
            gamma_curve(),
        ],
    )
}
