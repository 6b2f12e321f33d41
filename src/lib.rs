//! Interchange of multi-band raster images and flat primitive arrays as
//! [`.npy`] version 1.0 streams.
//!
//! [`.npy`]: https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html
//!
//! This crate implements the fixed-128-byte-header `.npy` convention used by
//! bioimage tooling to hand pixel data to external numerical consumers: a
//! short ASCII metadata dict (dtype tag, `fortran_order: False`, shape
//! tuple) followed by raw little-endian payload bytes. It is a pure codec:
//! it operates on in-memory buffers and caller-supplied [`Read`]/[`Write`]
//! handles, holds no state, and never opens files or sockets itself.
//!
//! [`Read`]: std::io::Read
//! [`Write`]: std::io::Write
//!
//! See [`write_array`]/[`read_array`] for 1-D primitive arrays and
//! [`write_raster`]/[`read_raster`]/[`read_nested`] for rasters.
//!
//! Multi-band payloads have two memory orders for the same declared shape
//! tuple: interleaved (bands fastest) and band-sequential. The [`Layout`]
//! parameter makes that choice explicit on both the encode and decode side;
//! the two sides must agree.
//!
//! # Example
//!
//! ```
//! use raster_npy::{read_raster, write_raster, Layout, Raster, RasterView, SampleType};
//!
//! let mut raster = Raster::new(SampleType::UInt8, 2, 2, 1);
//! raster.set_sample(0, 0, 0, 10.);
//! raster.set_sample(1, 0, 0, 20.);
//! raster.set_sample(0, 1, 0, 30.);
//! raster.set_sample(1, 1, 0, 40.);
//!
//! let mut npy = Vec::<u8>::new();
//! write_raster(&raster, Layout::Planar, &mut npy).unwrap();
//! let back = read_raster(&npy[..], Layout::Planar).unwrap();
//! assert_eq!(back.sample(1, 1, 0), 40.);
//! ```

mod array;
mod elements;
mod header;
mod raster;

pub use crate::array::{read_array, write_array};
pub use crate::elements::{Element, ReadDataError};
pub use crate::header::{
    Dtype, FormatHeaderError, Header, ParseHeaderError, ReadHeaderError, WriteHeaderError,
    HEADER_TOTAL_LEN,
};
pub use crate::raster::{
    read_nested, read_raster, write_raster, Layout, Raster, RasterView, SampleType,
};

use std::error::Error;
use std::fmt;
use std::io;

/// An error reading an `.npy` stream.
#[derive(Debug)]
pub enum ReadNpyError {
    Io(io::Error),
    ParseHeader(ParseHeaderError),
    /// The payload bytes were not a valid encoding of the dtype's element
    /// type.
    ParseData(Box<dyn Error + Send + Sync + 'static>),
    /// The stream's dtype does not match the requested element type.
    WrongDtype { expected: Dtype, found: Dtype },
    /// The stream's dtype is valid but not supported by the requested
    /// operation (e.g. `|b1` on the raster path).
    UnsupportedDtype(Dtype),
    /// The declared shape has a dimension count the requested operation does
    /// not support.
    Dimensions(usize),
    /// The payload holds fewer bytes than the shape and dtype imply.
    MissingBytes(usize),
    /// The payload holds more bytes than the shape and dtype imply.
    ExtraBytes(usize),
}

impl Error for ReadNpyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadNpyError::Io(err) => Some(err),
            ReadNpyError::ParseHeader(err) => Some(err),
            ReadNpyError::ParseData(err) => Some(&**err),
            ReadNpyError::WrongDtype { .. } => None,
            ReadNpyError::UnsupportedDtype(_) => None,
            ReadNpyError::Dimensions(_) => None,
            ReadNpyError::MissingBytes(_) => None,
            ReadNpyError::ExtraBytes(_) => None,
        }
    }
}

impl fmt::Display for ReadNpyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadNpyError::Io(err) => write!(f, "I/O error: {}", err),
            ReadNpyError::ParseHeader(err) => write!(f, "error parsing header: {}", err),
            ReadNpyError::ParseData(err) => write!(f, "error parsing data: {}", err),
            ReadNpyError::WrongDtype { expected, found } => {
                write!(f, "expected dtype {}, found {}", expected, found)
            }
            ReadNpyError::UnsupportedDtype(dtype) => {
                write!(f, "dtype {} is not supported by this operation", dtype)
            }
            ReadNpyError::Dimensions(ndim) => {
                write!(f, "unsupported number of dimensions: {}", ndim)
            }
            ReadNpyError::MissingBytes(n) => write!(f, "payload is missing {} bytes", n),
            ReadNpyError::ExtraBytes(n) => write!(f, "payload has {} extra bytes", n),
        }
    }
}

impl From<io::Error> for ReadNpyError {
    fn from(err: io::Error) -> ReadNpyError {
        ReadNpyError::Io(err)
    }
}

impl From<ReadHeaderError> for ReadNpyError {
    fn from(err: ReadHeaderError) -> ReadNpyError {
        match err {
            ReadHeaderError::Io(err) => ReadNpyError::Io(err),
            ReadHeaderError::Parse(err) => ReadNpyError::ParseHeader(err),
        }
    }
}

impl From<ReadDataError> for ReadNpyError {
    fn from(err: ReadDataError) -> ReadNpyError {
        match err {
            ReadDataError::MissingBytes(n) => ReadNpyError::MissingBytes(n),
            ReadDataError::ExtraBytes(n) => ReadNpyError::ExtraBytes(n),
            ReadDataError::ParseData(err) => ReadNpyError::ParseData(err),
        }
    }
}

/// An error writing an `.npy` stream.
#[derive(Debug)]
pub enum WriteNpyError {
    Io(io::Error),
    FormatHeader(FormatHeaderError),
}

impl Error for WriteNpyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WriteNpyError::Io(err) => Some(err),
            WriteNpyError::FormatHeader(err) => Some(err),
        }
    }
}

impl fmt::Display for WriteNpyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WriteNpyError::Io(err) => write!(f, "I/O error: {}", err),
            WriteNpyError::FormatHeader(err) => write!(f, "error formatting header: {}", err),
        }
    }
}

impl From<io::Error> for WriteNpyError {
    fn from(err: io::Error) -> WriteNpyError {
        WriteNpyError::Io(err)
    }
}

impl From<FormatHeaderError> for WriteNpyError {
    fn from(err: FormatHeaderError) -> WriteNpyError {
        WriteNpyError::FormatHeader(err)
    }
}

impl From<WriteHeaderError> for WriteNpyError {
    fn from(err: WriteHeaderError) -> WriteNpyError {
        match err {
            WriteHeaderError::Io(err) => WriteNpyError::Io(err),
            WriteHeaderError::Format(err) => WriteNpyError::FormatHeader(err),
        }
    }
}
