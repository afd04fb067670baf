//! Typed property values attached to nodes.
//!
//! Binary files carry exact types; ASCII files only distinguish integers,
//! floats and strings. Accessors are therefore lenient: any numeric variant
//! converts to any numeric target and a scalar reads as a one-element array.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;

use crate::util::{Error, Result};

/// Single property value of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Raw(Vec<u8>),
    BoolArray(Vec<bool>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
}

macro_rules! array_accessor {
    ($name:ident, $t:ty) => {
        /// Copy the value(s) out as a vector, converting numerics.
        pub fn $name(&self) -> Vec<$t> {
            match self {
                Property::BoolArray(v) => v.iter().map(|&b| b as u8 as $t).collect(),
                Property::I32Array(v) => v.iter().map(|&x| x as $t).collect(),
                Property::I64Array(v) => v.iter().map(|&x| x as $t).collect(),
                Property::F32Array(v) => v.iter().map(|&x| x as $t).collect(),
                Property::F64Array(v) => v.iter().map(|&x| x as $t).collect(),
                Property::Raw(v) => v.iter().map(|&x| x as $t).collect(),
                Property::String(_) => Vec::new(),
                scalar => scalar.as_f64().map(|x| vec![x as $t]).unwrap_or_default(),
            }
        }
    };
}

impl Property {
    /// FBX binary type code of this value.
    pub fn type_code(&self) -> u8 {
        match self {
            Property::Bool(_) => b'C',
            Property::I16(_) => b'Y',
            Property::I32(_) => b'I',
            Property::I64(_) => b'L',
            Property::F32(_) => b'F',
            Property::F64(_) => b'D',
            Property::String(_) => b'S',
            Property::Raw(_) => b'R',
            Property::BoolArray(_) => b'b',
            Property::I32Array(_) => b'i',
            Property::I64Array(_) => b'l',
            Property::F32Array(_) => b'f',
            Property::F64Array(_) => b'd',
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            Property::BoolArray(_)
                | Property::I32Array(_)
                | Property::I64Array(_)
                | Property::F32Array(_)
                | Property::F64Array(_)
        )
    }

    /// Element count for arrays, byte count for raw data, 1 otherwise.
    pub fn len(&self) -> usize {
        match self {
            Property::BoolArray(v) => v.len(),
            Property::I32Array(v) => v.len(),
            Property::I64Array(v) => v.len(),
            Property::F32Array(v) => v.len(),
            Property::F64Array(v) => v.len(),
            Property::Raw(v) => v.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Property::Bool(b) => Some(b as u8 as f64),
            Property::I16(v) => Some(v as f64),
            Property::I32(v) => Some(v as f64),
            Property::I64(v) => Some(v as f64),
            Property::F32(v) => Some(v as f64),
            Property::F64(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f32(&self) -> Option<f32> {
        self.as_f64().map(|v| v as f32)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Property::Bool(b) => Some(b as i64),
            Property::I16(v) => Some(v as i64),
            Property::I32(v) => Some(v as i64),
            Property::I64(v) => Some(v),
            Property::F32(v) => Some(v as i64),
            Property::F64(v) => Some(v as i64),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().map(|v| v as i32)
    }

    /// Numbers are true when non-zero; ASCII files may also spell `Y`/`T`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Property::Bool(b) => Some(*b),
            Property::String(s) => match s.as_str() {
                "Y" | "T" | "1" | "true" => Some(true),
                "N" | "F" | "0" | "false" => Some(false),
                _ => None,
            },
            other => other.as_i64().map(|v| v != 0),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Property::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Property::Raw(v) => Some(v),
            Property::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    array_accessor!(to_f32_vec, f32);
    array_accessor!(to_f64_vec, f64);
    array_accessor!(to_i32_vec, i32);
    array_accessor!(to_i64_vec, i64);

    /// Decode a binary array property payload.
    ///
    /// `encoding` 0 is raw little-endian data, 1 is zlib-deflated. `count`
    /// is the element count stored in the array header.
    pub fn decode_array(type_code: u8, count: usize, encoding: u32, payload: &[u8]) -> Result<Self> {
        let element_size = match type_code {
            b'b' => 1,
            b'i' | b'f' => 4,
            b'l' | b'd' => 8,
            other => {
                return Err(Error::property(format!(
                    "unknown array type code {:?}",
                    other as char
                )))
            }
        };
        let expected = count * element_size;

        let inflated;
        let bytes: &[u8] = match encoding {
            0 => payload,
            1 => {
                let mut decoder = ZlibDecoder::new(payload);
                let mut out = Vec::with_capacity(expected);
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::Decompress(e.to_string()))?;
                inflated = out;
                &inflated
            }
            other => return Err(Error::property(format!("unknown array encoding {}", other))),
        };

        if bytes.len() < expected {
            return Err(Error::property(format!(
                "array payload too short: {} bytes for {} elements",
                bytes.len(),
                count
            )));
        }

        let mut cursor = &bytes[..expected];
        let prop = match type_code {
            b'b' => Property::BoolArray(cursor.iter().map(|&b| b & 1 == 1).collect()),
            b'i' => {
                let mut v = vec![0i32; count];
                cursor.read_i32_into::<LittleEndian>(&mut v)?;
                Property::I32Array(v)
            }
            b'l' => {
                let mut v = vec![0i64; count];
                cursor.read_i64_into::<LittleEndian>(&mut v)?;
                Property::I64Array(v)
            }
            b'f' => {
                let mut v = vec![0f32; count];
                cursor.read_f32_into::<LittleEndian>(&mut v)?;
                Property::F32Array(v)
            }
            _ => {
                let mut v = vec![0f64; count];
                cursor.read_f64_into::<LittleEndian>(&mut v)?;
                Property::F64Array(v)
            }
        };
        Ok(prop)
    }
}

impl From<bool> for Property {
    fn from(v: bool) -> Self {
        Property::Bool(v)
    }
}

impl From<i32> for Property {
    fn from(v: i32) -> Self {
        Property::I32(v)
    }
}

impl From<i64> for Property {
    fn from(v: i64) -> Self {
        Property::I64(v)
    }
}

impl From<f32> for Property {
    fn from(v: f32) -> Self {
        Property::F32(v)
    }
}

impl From<f64> for Property {
    fn from(v: f64) -> Self {
        Property::F64(v)
    }
}

impl From<&str> for Property {
    fn from(v: &str) -> Self {
        Property::String(v.to_string())
    }
}

impl From<String> for Property {
    fn from(v: String) -> Self {
        Property::String(v)
    }
}

impl From<Vec<i32>> for Property {
    fn from(v: Vec<i32>) -> Self {
        Property::I32Array(v)
    }
}

impl From<Vec<i64>> for Property {
    fn from(v: Vec<i64>) -> Self {
        Property::I64Array(v)
    }
}

impl From<Vec<f32>> for Property {
    fn from(v: Vec<f32>) -> Self {
        Property::F32Array(v)
    }
}

impl From<Vec<f64>> for Property {
    fn from(v: Vec<f64>) -> Self {
        Property::F64Array(v)
    }
}
