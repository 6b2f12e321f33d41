//! The fixed-size `.npy` header: magic string, version, and metadata dict.

use byteorder::{ByteOrder, LittleEndian};
use num_traits::ToPrimitive;
use py_literal::{
    FormatError as PyValueFormatError, ParseError as PyValueParseError, Value as PyValue,
};
use std::error::Error;
use std::fmt;
use std::io;

/// Magic string to indicate npy format.
const MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// Total length of the emitted header: magic string, version, header-length
/// field, and padded metadata dict.
pub const HEADER_TOTAL_LEN: usize = 128;

/// Bytes before the metadata dict: magic string, 2 version bytes, and the
/// 2-byte little-endian header length.
const PREFIX_LEN: usize = MAGIC_STRING.len() + 2 + 2;

/// Element type of an array payload.
///
/// Each variant maps to exactly one dtype tag, and each recognized tag maps
/// back to exactly one variant. Multi-byte payloads are always little-endian,
/// including for the tags whose byte-order mark is `|`; that quirk is part of
/// the wire format this crate interchanges with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dtype {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    Int64,
    Float32,
    Float64,
    /// A 16-bit UTF-16 code unit (`<U2`). Not Unicode-safe; values outside
    /// the BMP are truncated on write.
    Char16,
}

impl Dtype {
    /// The descriptor tag written to and accepted from headers.
    pub fn tag(self) -> &'static str {
        match self {
            Dtype::Bool => "|b1",
            Dtype::Int8 => "|i1",
            Dtype::UInt8 => "|u1",
            Dtype::Int16 => "|i2",
            Dtype::UInt16 => "<u2",
            Dtype::Int32 => "|i4",
            Dtype::Int64 => "|i8",
            Dtype::Float32 => "<f4",
            Dtype::Float64 => "<f8",
            Dtype::Char16 => "<U2",
        }
    }

    /// Inverse of [`tag`](Dtype::tag).
    pub fn from_tag(tag: &str) -> Option<Dtype> {
        match tag {
            "|b1" => Some(Dtype::Bool),
            "|i1" => Some(Dtype::Int8),
            "|u1" => Some(Dtype::UInt8),
            "|i2" => Some(Dtype::Int16),
            "<u2" => Some(Dtype::UInt16),
            "|i4" => Some(Dtype::Int32),
            "|i8" => Some(Dtype::Int64),
            "<f4" => Some(Dtype::Float32),
            "<f8" => Some(Dtype::Float64),
            "<U2" => Some(Dtype::Char16),
            _ => None,
        }
    }

    /// Number of payload bytes per element.
    pub fn item_size(self) -> usize {
        match self {
            Dtype::Bool | Dtype::Int8 | Dtype::UInt8 => 1,
            Dtype::Int16 | Dtype::UInt16 | Dtype::Char16 => 2,
            Dtype::Int32 | Dtype::Float32 => 4,
            Dtype::Int64 | Dtype::Float64 => 8,
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug)]
pub enum ParseHeaderError {
    MagicString,
    Version {
        major: u8,
        minor: u8,
    },
    /// Indicates that the metadata dict contains non-ASCII characters, which
    /// .npy format version 1.0 does not allow.
    NonAscii,
    UnknownKey(PyValue),
    MissingKey(String),
    IllegalValue {
        key: String,
        value: PyValue,
    },
    DictParse(PyValueParseError),
    MetaNotDict(PyValue),
    MissingNewline,
    /// The `descr` tag is not in the dtype table.
    UnknownDtype(String),
    /// The shape tuple has an unsupported number of dimensions.
    Dimensions(usize),
}

impl Error for ParseHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use ParseHeaderError::*;
        match self {
            DictParse(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ParseHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ParseHeaderError::*;
        match self {
            MagicString => write!(f, "start does not match magic string; not an npy stream"),
            Version { major, minor } => write!(f, "unsupported version number: {}.{}", major, minor),
            NonAscii => write!(f, "non-ascii in metadata dict"),
            UnknownKey(key) => write!(f, "unknown key: {}", key),
            MissingKey(key) => write!(f, "missing key: {}", key),
            IllegalValue { key, value } => write!(f, "illegal value for key {}: {}", key, value),
            DictParse(err) => write!(f, "error parsing metadata dict: {}", err),
            MetaNotDict(value) => write!(f, "metadata is not a dict: {}", value),
            MissingNewline => write!(f, "newline missing at end of header"),
            UnknownDtype(tag) => write!(f, "unsupported dtype tag: {}", tag),
            Dimensions(ndim) => write!(f, "unsupported number of dimensions: {}", ndim),
        }
    }
}

impl From<PyValueParseError> for ParseHeaderError {
    fn from(err: PyValueParseError) -> ParseHeaderError {
        ParseHeaderError::DictParse(err)
    }
}

#[derive(Debug)]
pub enum ReadHeaderError {
    Io(io::Error),
    Parse(ParseHeaderError),
}

impl Error for ReadHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadHeaderError::Io(err) => Some(err),
            ReadHeaderError::Parse(err) => Some(err),
        }
    }
}

impl fmt::Display for ReadHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadHeaderError::Io(err) => write!(f, "I/O error: {}", err),
            ReadHeaderError::Parse(err) => write!(f, "error parsing header: {}", err),
        }
    }
}

impl From<io::Error> for ReadHeaderError {
    fn from(err: io::Error) -> ReadHeaderError {
        ReadHeaderError::Io(err)
    }
}

impl From<ParseHeaderError> for ReadHeaderError {
    fn from(err: ParseHeaderError) -> ReadHeaderError {
        ReadHeaderError::Parse(err)
    }
}

#[derive(Debug)]
pub enum FormatHeaderError {
    PyValue(PyValueFormatError),
    /// The metadata dict does not fit in the fixed-size header.
    TooLong(usize),
}

impl Error for FormatHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FormatHeaderError::PyValue(err) => Some(err),
            FormatHeaderError::TooLong(_) => None,
        }
    }
}

impl fmt::Display for FormatHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatHeaderError::PyValue(err) => write!(f, "error formatting Python value: {}", err),
            FormatHeaderError::TooLong(len) => write!(
                f,
                "metadata dict of {} bytes does not fit in a {}-byte header",
                len, HEADER_TOTAL_LEN
            ),
        }
    }
}

impl From<PyValueFormatError> for FormatHeaderError {
    fn from(err: PyValueFormatError) -> FormatHeaderError {
        FormatHeaderError::PyValue(err)
    }
}

#[derive(Debug)]
pub enum WriteHeaderError {
    Io(io::Error),
    Format(FormatHeaderError),
}

impl Error for WriteHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WriteHeaderError::Io(err) => Some(err),
            WriteHeaderError::Format(err) => Some(err),
        }
    }
}

impl fmt::Display for WriteHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WriteHeaderError::Io(err) => write!(f, "I/O error: {}", err),
            WriteHeaderError::Format(err) => write!(f, "error formatting header: {}", err),
        }
    }
}

impl From<io::Error> for WriteHeaderError {
    fn from(err: io::Error) -> WriteHeaderError {
        WriteHeaderError::Io(err)
    }
}

impl From<FormatHeaderError> for WriteHeaderError {
    fn from(err: FormatHeaderError) -> WriteHeaderError {
        WriteHeaderError::Format(err)
    }
}

/// The parsed or to-be-written metadata of an `.npy` stream.
///
/// `fortran_order` is not represented: this crate always writes
/// `fortran_order: False` and rejects `True` on read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub dtype: Dtype,
    pub shape: Vec<usize>,
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self.to_py_value())
    }
}

impl Header {
    fn from_py_value(value: PyValue) -> Result<Self, ParseHeaderError> {
        let dict = match value {
            PyValue::Dict(dict) => dict,
            other => return Err(ParseHeaderError::MetaNotDict(other)),
        };
        let mut dtype: Option<Dtype> = None;
        let mut fortran_order = false;
        let mut shape: Option<Vec<usize>> = None;
        for (key, value) in dict {
            match key {
                PyValue::String(ref k) if k == "descr" => {
                    if let PyValue::String(ref tag) = value {
                        match Dtype::from_tag(tag) {
                            Some(d) => dtype = Some(d),
                            None => return Err(ParseHeaderError::UnknownDtype(tag.clone())),
                        }
                    } else {
                        return Err(ParseHeaderError::IllegalValue {
                            key: "descr".to_owned(),
                            value,
                        });
                    }
                }
                PyValue::String(ref k) if k == "fortran_order" => {
                    if value != PyValue::Boolean(false) {
                        return Err(ParseHeaderError::IllegalValue {
                            key: "fortran_order".to_owned(),
                            value,
                        });
                    }
                    fortran_order = true;
                }
                PyValue::String(ref k) if k == "shape" => {
                    fn parse_shape(value: &PyValue) -> Option<Vec<usize>> {
                        value
                            .as_tuple()?
                            .iter()
                            .map(|elem| elem.as_integer()?.to_usize())
                            .collect()
                    }
                    if let Some(s) = parse_shape(&value) {
                        shape = Some(s);
                    } else {
                        return Err(ParseHeaderError::IllegalValue {
                            key: "shape".to_owned(),
                            value,
                        });
                    }
                }
                k => return Err(ParseHeaderError::UnknownKey(k)),
            }
        }
        match (dtype, fortran_order, shape) {
            (Some(dtype), true, Some(shape)) => {
                if shape.is_empty() || shape.len() > 3 {
                    return Err(ParseHeaderError::Dimensions(shape.len()));
                }
                Ok(Header { dtype, shape })
            }
            (None, _, _) => Err(ParseHeaderError::MissingKey("descr".to_owned())),
            (_, false, _) => Err(ParseHeaderError::MissingKey("fortran_order".to_owned())),
            (_, _, None) => Err(ParseHeaderError::MissingKey("shape".to_owned())),
        }
    }

    pub fn from_reader<R: io::Read>(mut reader: R) -> Result<Self, ReadHeaderError> {
        // Check for magic string.
        let mut buf = vec![0; MAGIC_STRING.len()];
        reader.read_exact(&mut buf)?;
        if buf != MAGIC_STRING {
            return Err(ParseHeaderError::MagicString.into());
        }

        // Only version 1.0 is interchanged.
        let mut buf = [0; 2];
        reader.read_exact(&mut buf)?;
        if buf != [0x01, 0x00] {
            return Err(ParseHeaderError::Version {
                major: buf[0],
                minor: buf[1],
            }
            .into());
        }

        // The declared length is validated against the actual dict text: we
        // read exactly that many bytes and require the terminal newline.
        let mut buf = [0; 2];
        reader.read_exact(&mut buf)?;
        let header_len = LittleEndian::read_u16(&buf) as usize;

        let mut buf = vec![0; header_len];
        reader.read_exact(&mut buf)?;
        let without_newline = match buf.split_last() {
            Some((&b'\n', rest)) => rest,
            Some(_) | None => return Err(ParseHeaderError::MissingNewline.into()),
        };
        if !without_newline.is_ascii() {
            return Err(ParseHeaderError::NonAscii.into());
        }
        // ASCII strings are always valid UTF-8.
        let header_str = unsafe { std::str::from_utf8_unchecked(without_newline) };
        let header_dict: PyValue = header_str.trim().parse().map_err(ParseHeaderError::from)?;
        Ok(Header::from_py_value(header_dict)?)
    }

    fn to_py_value(&self) -> PyValue {
        PyValue::Dict(vec![
            (
                PyValue::String("descr".into()),
                PyValue::String(self.dtype.tag().into()),
            ),
            (
                PyValue::String("fortran_order".into()),
                PyValue::Boolean(false),
            ),
            (
                PyValue::String("shape".into()),
                PyValue::Tuple(
                    self.shape
                        .iter()
                        .map(|&elem| PyValue::Integer(elem.into()))
                        .collect(),
                ),
            ),
        ])
    }

    /// Formats the header as exactly [`HEADER_TOTAL_LEN`] bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatHeaderError> {
        // Metadata describing the array's format as an ASCII string.
        let mut arr_format = Vec::new();
        self.to_py_value().write_ascii(&mut arr_format)?;

        // Length of a '\n' char in bytes.
        const NEWLINE_LEN: usize = 1;

        if PREFIX_LEN + arr_format.len() + NEWLINE_LEN > HEADER_TOTAL_LEN {
            return Err(FormatHeaderError::TooLong(arr_format.len()));
        }

        // Pad with spaces so the terminal newline lands at the last byte.
        while PREFIX_LEN + arr_format.len() + NEWLINE_LEN < HEADER_TOTAL_LEN {
            arr_format.push(b' ');
        }
        arr_format.push(b'\n');

        let header_len = arr_format.len();
        let mut len_field = [0; 2];
        LittleEndian::write_u16(&mut len_field, header_len as u16);

        let mut out = Vec::with_capacity(HEADER_TOTAL_LEN);
        out.extend_from_slice(MAGIC_STRING);
        out.push(0x01);
        out.push(0x00);
        out.extend_from_slice(&len_field);
        out.extend_from_slice(&arr_format);

        debug_assert_eq!(out.len(), HEADER_TOTAL_LEN);

        Ok(out)
    }

    pub fn write<W: io::Write>(&self, mut writer: W) -> Result<(), WriteHeaderError> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        Ok(())
    }
}
