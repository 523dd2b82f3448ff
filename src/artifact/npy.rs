//! Minimal numpy `.npy` codec for single embedding vectors.
//!
//! Layout: 6-byte magic `\x93NUMPY`, major/minor version bytes, header length
//! (`u16` LE for 1.x, `u32` LE for 2.x/3.x), an ASCII python dict literal such as
//! `{'descr': '<f4', 'fortran_order': False, 'shape': (1, 768), }`, then raw data.

use half::f16;
use thiserror::Error;

const MAGIC: &[u8] = b"\x93NUMPY";
const HEADER_ALIGNMENT: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NpyError {
    #[error("missing numpy magic prefix")]
    BadMagic,

    #[error("unsupported npy format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("npy header is malformed: {reason}")]
    MalformedHeader { reason: String },

    #[error("unsupported dtype '{descr}' (expected f2, f4 or f8)")]
    UnsupportedDtype { descr: String },

    #[error("array of shape {shape:?} is not a single vector")]
    NotAVector { shape: Vec<usize> },

    #[error("data section has {actual} bytes, expected {expected}")]
    Truncated { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F16,
    F32,
    F64,
}

impl Dtype {
    fn item_size(self) -> usize {
        match self {
            Dtype::F16 => 2,
            Dtype::F32 => 4,
            Dtype::F64 => 8,
        }
    }
}

/// Decodes a one-vector `.npy` payload into `f32` components.
pub fn decode_npy(bytes: &[u8]) -> Result<Vec<f32>, NpyError> {
    if !bytes.starts_with(MAGIC) {
        return Err(NpyError::BadMagic);
    }
    if bytes.len() < MAGIC.len() + 2 {
        return Err(NpyError::MalformedHeader {
            reason: "missing version".to_string(),
        });
    }

    let (major, minor) = (bytes[6], bytes[7]);
    let (header_len, header_start): (usize, usize) = match major {
        1 => {
            let raw = bytes.get(8..10).ok_or_else(|| truncated_header("length"))?;
            (u16::from_le_bytes([raw[0], raw[1]]) as usize, 10)
        }
        2 | 3 => {
            let raw = bytes.get(8..12).ok_or_else(|| truncated_header("length"))?;
            (
                u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize,
                12,
            )
        }
        _ => return Err(NpyError::UnsupportedVersion { major, minor }),
    };

    let header_end = header_start
        .checked_add(header_len)
        .ok_or_else(|| truncated_header("length"))?;
    let header_bytes = bytes
        .get(header_start..header_end)
        .ok_or_else(|| truncated_header("dictionary"))?;
    let header = std::str::from_utf8(header_bytes).map_err(|e| NpyError::MalformedHeader {
        reason: e.to_string(),
    })?;

    let descr = dict_value(header, "descr")?;
    let descr = descr.trim().trim_matches(|c| c == '\'' || c == '"');
    let (endian, dtype) = parse_descr(descr)?;

    let shape = parse_shape(dict_value(header, "shape")?)?;
    let len = vector_len(&shape)?;

    let data = &bytes[header_end..];
    let expected = len
        .checked_mul(dtype.item_size())
        .ok_or_else(|| NpyError::MalformedHeader {
            reason: format!("shape {:?} exceeds addressable size", shape),
        })?;
    if data.len() != expected {
        return Err(NpyError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    Ok(decode_values(data, endian, dtype))
}

/// Encodes `values` as a version 1.0 `<f4` array of shape `(1, len)`.
pub fn encode_npy(values: &[f32]) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': (1, {}), }}",
        values.len()
    );

    let preamble = MAGIC.len() + 2 + 2;
    let unpadded = preamble + header.len() + 1;
    let padding = (HEADER_ALIGNMENT - unpadded % HEADER_ALIGNMENT) % HEADER_ALIGNMENT;
    header.extend(std::iter::repeat_n(' ', padding));
    header.push('\n');

    let mut out = Vec::with_capacity(preamble + header.len() + values.len() * 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn truncated_header(part: &str) -> NpyError {
    NpyError::MalformedHeader {
        reason: format!("truncated header {}", part),
    }
}

/// Returns the raw text after `'key':` up to the next top-level comma or closing brace.
fn dict_value<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let needle_single = format!("'{}'", key);
    let needle_double = format!("\"{}\"", key);
    let key_pos = header
        .find(&needle_single)
        .map(|p| p + needle_single.len())
        .or_else(|| header.find(&needle_double).map(|p| p + needle_double.len()))
        .ok_or_else(|| NpyError::MalformedHeader {
            reason: format!("missing key '{}'", key),
        })?;

    let rest = header[key_pos..]
        .trim_start()
        .strip_prefix(':')
        .ok_or_else(|| NpyError::MalformedHeader {
            reason: format!("missing ':' after '{}'", key),
        })?;

    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' | '}' if depth == 0 => return Ok(rest[..i].trim()),
            _ => {}
        }
    }

    Err(NpyError::MalformedHeader {
        reason: format!("unterminated value for '{}'", key),
    })
}

fn parse_descr(descr: &str) -> Result<(Endian, Dtype), NpyError> {
    let unsupported = || NpyError::UnsupportedDtype {
        descr: descr.to_string(),
    };

    let mut chars = descr.chars();
    let endian = match chars.next() {
        Some('<') | Some('=') => Endian::Little,
        Some('>') => Endian::Big,
        _ => return Err(unsupported()),
    };

    let dtype = match chars.as_str() {
        "f2" => Dtype::F16,
        "f4" => Dtype::F32,
        "f8" => Dtype::F64,
        _ => return Err(unsupported()),
    };

    Ok((endian, dtype))
}

fn parse_shape(raw: &str) -> Result<Vec<usize>, NpyError> {
    let inner = raw
        .trim()
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| NpyError::MalformedHeader {
            reason: format!("shape '{}' is not a tuple", raw),
        })?;

    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>().map_err(|e| NpyError::MalformedHeader {
                reason: format!("shape entry '{}': {}", s, e),
            })
        })
        .collect()
}

/// Accepts shapes with at most one axis longer than 1 (`(D,)`, `(1, D)`, `(D, 1)`).
fn vector_len(shape: &[usize]) -> Result<usize, NpyError> {
    let long_axes = shape.iter().filter(|&&d| d != 1).count();
    if shape.is_empty() || long_axes > 1 {
        return Err(NpyError::NotAVector {
            shape: shape.to_vec(),
        });
    }
    Ok(shape.iter().product())
}

fn decode_values(data: &[u8], endian: Endian, dtype: Dtype) -> Vec<f32> {
    match (dtype, endian) {
        (Dtype::F32, Endian::Little) => data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        (Dtype::F32, Endian::Big) => data
            .chunks_exact(4)
            .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        (Dtype::F64, Endian::Little) => data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
        (Dtype::F64, Endian::Big) => data
            .chunks_exact(8)
            .map(|c| f64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32)
            .collect(),
        (Dtype::F16, Endian::Little) => data
            .chunks_exact(2)
            .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        (Dtype::F16, Endian::Big) => data
            .chunks_exact(2)
            .map(|c| f16::from_be_bytes([c[0], c[1]]).to_f32())
            .collect(),
    }
}
