//! Reading and writing 1-D primitive arrays.

use crate::elements::Element;
use crate::header::Header;
use crate::{ReadNpyError, WriteNpyError};
use std::io;

/// Writes `data` to `writer` as a 1-D `.npy` stream with shape `(len,)`.
///
/// # Example
///
/// ```
/// use raster_npy::write_array;
///
/// let mut npy = Vec::<u8>::new();
/// write_array(&mut npy, &[1i32, 2, 3]).unwrap();
/// ```
pub fn write_array<W, T>(mut writer: W, data: &[T]) -> Result<(), WriteNpyError>
where
    W: io::Write,
    T: Element,
{
    let header = Header {
        dtype: T::DTYPE,
        shape: vec![data.len()],
    };
    header.write(&mut writer)?;
    T::write_slice(data, &mut writer)?;
    Ok(())
}

/// Reads a 1-D `.npy` stream from `reader`.
///
/// Fails with [`ReadNpyError::WrongDtype`] if the stream's dtype is not
/// `T::DTYPE` and with [`ReadNpyError::Dimensions`] if the declared shape is
/// not one-dimensional. The payload length is validated against the declared
/// shape.
pub fn read_array<R, T>(mut reader: R) -> Result<Vec<T>, ReadNpyError>
where
    R: io::Read,
    T: Element,
{
    let header = Header::from_reader(&mut reader)?;
    if header.dtype != T::DTYPE {
        return Err(ReadNpyError::WrongDtype {
            expected: T::DTYPE,
            found: header.dtype,
        });
    }
    if header.shape.len() != 1 {
        return Err(ReadNpyError::Dimensions(header.shape.len()));
    }
    let len = header.shape[0];
    let mut bytes = Vec::with_capacity(len * header.dtype.item_size());
    reader.read_to_end(&mut bytes)?;
    Ok(T::read_slice(&bytes, len)?)
}
