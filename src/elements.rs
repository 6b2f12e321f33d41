//! Element types that can appear in `.npy` payloads.

use crate::header::Dtype;
use byteorder::{ByteOrder, LittleEndian};
use std::error::Error;
use std::fmt;
use std::io;

/// An error decoding payload bytes into typed elements.
#[derive(Debug)]
pub enum ReadDataError {
    /// The payload holds fewer bytes than the shape and dtype imply.
    MissingBytes(usize),
    /// The payload holds more bytes than the shape and dtype imply.
    ExtraBytes(usize),
    /// A byte run was the right length but not a valid encoding of the
    /// element type (e.g. a `bool` byte other than `0x00`/`0x01`).
    ParseData(Box<dyn Error + Send + Sync + 'static>),
}

impl Error for ReadDataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadDataError::MissingBytes(_) => None,
            ReadDataError::ExtraBytes(_) => None,
            ReadDataError::ParseData(err) => Some(&**err),
        }
    }
}

impl fmt::Display for ReadDataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadDataError::MissingBytes(n) => write!(f, "payload is missing {} bytes", n),
            ReadDataError::ExtraBytes(n) => write!(f, "payload has {} extra bytes", n),
            ReadDataError::ParseData(err) => write!(f, "error parsing data: {}", err),
        }
    }
}

/// Returns `Ok(_)` iff `bytes_len` is the correct payload length for `len`
/// elements of `dtype`.
///
/// **Panics** if `len * item_size` overflows.
fn check_bytes_len(dtype: Dtype, bytes_len: usize, len: usize) -> Result<(), ReadDataError> {
    use std::cmp::Ordering;
    let needed_bytes = len
        .checked_mul(dtype.item_size())
        .expect("required number of bytes should not overflow");
    match bytes_len.cmp(&needed_bytes) {
        Ordering::Less => Err(ReadDataError::MissingBytes(needed_bytes - bytes_len)),
        Ordering::Equal => Ok(()),
        Ordering::Greater => Err(ReadDataError::ExtraBytes(bytes_len - needed_bytes)),
    }
}

/// An element type with a fixed dtype and a little-endian wire encoding.
///
/// Numeric semantics are "truncate, don't clamp": callers narrowing wider
/// values into an element type get primitive-cast bit truncation, and this
/// crate never range-checks on their behalf.
pub trait Element: Sized {
    /// Dtype written to and accepted from headers for this element type.
    const DTYPE: Dtype;

    /// Serializes `slice` in order as raw payload bytes.
    fn write_slice<W: io::Write>(slice: &[Self], writer: W) -> io::Result<()>;

    /// Decodes exactly `len` elements from `bytes`.
    fn read_slice(bytes: &[u8], len: usize) -> Result<Vec<Self>, ReadDataError>;
}

macro_rules! impl_element_multi_byte {
    ($elem:ty, $dtype:expr, $zero:expr, $read_into:ident, $write_into:ident) => {
        impl Element for $elem {
            const DTYPE: Dtype = $dtype;

            fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
                let mut buf = vec![0; slice.len() * Self::DTYPE.item_size()];
                LittleEndian::$write_into(slice, &mut buf);
                writer.write_all(&buf)
            }

            fn read_slice(bytes: &[u8], len: usize) -> Result<Vec<Self>, ReadDataError> {
                check_bytes_len(Self::DTYPE, bytes.len(), len)?;
                let mut out = vec![$zero; len];
                LittleEndian::$read_into(bytes, &mut out);
                Ok(out)
            }
        }
    };
}

impl_element_multi_byte!(i16, Dtype::Int16, 0, read_i16_into, write_i16_into);
impl_element_multi_byte!(u16, Dtype::UInt16, 0, read_u16_into, write_u16_into);
impl_element_multi_byte!(i32, Dtype::Int32, 0, read_i32_into, write_i32_into);
impl_element_multi_byte!(i64, Dtype::Int64, 0, read_i64_into, write_i64_into);
impl_element_multi_byte!(f32, Dtype::Float32, 0., read_f32_into, write_f32_into);
impl_element_multi_byte!(f64, Dtype::Float64, 0., read_f64_into, write_f64_into);

impl Element for u8 {
    const DTYPE: Dtype = Dtype::UInt8;

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        writer.write_all(slice)
    }

    fn read_slice(bytes: &[u8], len: usize) -> Result<Vec<Self>, ReadDataError> {
        check_bytes_len(Self::DTYPE, bytes.len(), len)?;
        Ok(bytes.to_vec())
    }
}

impl Element for i8 {
    const DTYPE: Dtype = Dtype::Int8;

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        let buf: Vec<u8> = slice.iter().map(|&v| v as u8).collect();
        writer.write_all(&buf)
    }

    fn read_slice(bytes: &[u8], len: usize) -> Result<Vec<Self>, ReadDataError> {
        check_bytes_len(Self::DTYPE, bytes.len(), len)?;
        Ok(bytes.iter().map(|&b| b as i8).collect())
    }
}

/// An error parsing a `bool` from a byte.
#[derive(Debug)]
struct ParseBoolError {
    bad_value: u8,
}

impl Error for ParseBoolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for ParseBoolError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "error parsing value {:#04x} as a bool", self.bad_value)
    }
}

impl From<ParseBoolError> for ReadDataError {
    fn from(err: ParseBoolError) -> ReadDataError {
        ReadDataError::ParseData(Box::new(err))
    }
}

impl Element for bool {
    const DTYPE: Dtype = Dtype::Bool;

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        let buf: Vec<u8> = slice.iter().map(|&b| b as u8).collect();
        writer.write_all(&buf)
    }

    fn read_slice(bytes: &[u8], len: usize) -> Result<Vec<Self>, ReadDataError> {
        check_bytes_len(Self::DTYPE, bytes.len(), len)?;
        // Only 0x00 and 0x01 are accepted, so that every decoded value
        // round-trips to the byte it came from.
        for &byte in bytes {
            if byte > 1 {
                return Err(ParseBoolError { bad_value: byte }.into());
            }
        }
        Ok(bytes.iter().map(|&b| b == 1).collect())
    }
}

/// An error parsing a `char` from a UTF-16 code unit.
#[derive(Debug)]
struct ParseCharError {
    bad_value: u16,
}

impl Error for ParseCharError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl fmt::Display for ParseCharError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "error parsing code unit {:#06x} as a char",
            self.bad_value
        )
    }
}

impl From<ParseCharError> for ReadDataError {
    fn from(err: ParseCharError) -> ReadDataError {
        ReadDataError::ParseData(Box::new(err))
    }
}

/// `<U2` stores one 16-bit code unit per element. Scalar values above the
/// BMP are truncated to 16 bits on write, and surrogate code units are
/// rejected on read.
impl Element for char {
    const DTYPE: Dtype = Dtype::Char16;

    fn write_slice<W: io::Write>(slice: &[Self], mut writer: W) -> io::Result<()> {
        let units: Vec<u16> = slice.iter().map(|&c| c as u16).collect();
        let mut buf = vec![0; units.len() * Self::DTYPE.item_size()];
        LittleEndian::write_u16_into(&units, &mut buf);
        writer.write_all(&buf)
    }

    fn read_slice(bytes: &[u8], len: usize) -> Result<Vec<Self>, ReadDataError> {
        check_bytes_len(Self::DTYPE, bytes.len(), len)?;
        let mut units = vec![0u16; len];
        LittleEndian::read_u16_into(bytes, &mut units);
        units
            .into_iter()
            .map(|unit| {
                char::from_u32(u32::from(unit)).ok_or_else(|| {
                    ReadDataError::from(ParseCharError { bad_value: unit })
                })
            })
            .collect()
    }
}
