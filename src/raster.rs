//! Bridging multi-band rasters to and from flat `.npy` payloads.

use crate::elements::Element;
use crate::header::{Dtype, Header};
use crate::{ReadNpyError, WriteNpyError};
use ndarray::Array3;
use std::io;

/// Per-band storage type of a raster's samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    Int32,
    Float32,
    Float64,
    /// Packed 8-bit RGB. Stored as three `u8` bands; its natural payload
    /// layout is interleaved (R, G, B) triplets rather than band-sequential.
    Rgb8,
}

impl SampleType {
    /// The dtype emitted for payloads of this sample type.
    pub fn dtype(self) -> Dtype {
        match self {
            SampleType::UInt8 | SampleType::Rgb8 => Dtype::UInt8,
            SampleType::Int8 => Dtype::Int8,
            SampleType::UInt16 => Dtype::UInt16,
            SampleType::Int16 => Dtype::Int16,
            SampleType::Int32 => Dtype::Int32,
            SampleType::Float32 => Dtype::Float32,
            SampleType::Float64 => Dtype::Float64,
        }
    }

    /// The sample type a decoded raster gets for `dtype`, if any.
    ///
    /// `Rgb8` is never produced here: the read path does not special-case
    /// RGB, so `|u1` streams decode as plain `UInt8` bands and RGB
    /// reconstruction is a caller-side conversion.
    pub fn from_dtype(dtype: Dtype) -> Option<SampleType> {
        match dtype {
            Dtype::UInt8 => Some(SampleType::UInt8),
            Dtype::Int8 => Some(SampleType::Int8),
            Dtype::UInt16 => Some(SampleType::UInt16),
            Dtype::Int16 => Some(SampleType::Int16),
            Dtype::Int32 => Some(SampleType::Int32),
            Dtype::Float32 => Some(SampleType::Float32),
            Dtype::Float64 => Some(SampleType::Float64),
            Dtype::Bool | Dtype::Int64 | Dtype::Char16 => None,
        }
    }
}

/// Memory order of a multi-band payload.
///
/// Both encode and decode take the layout explicitly; the two sides must
/// agree on it, since the emitted shape tuple `(width, height, bands)` is the
/// same either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Bands fastest: all bands of one pixel, then the next pixel, pixels in
    /// row-major order.
    Interleaved,
    /// Band-sequential: all samples of band 0 in row-major order, then all
    /// of band 1, and so on.
    Planar,
}

/// Read-only view of a width x height grid of per-band samples.
///
/// The codec touches pixels only through this trait and makes no assumption
/// about the underlying packing. `f64` represents every supported sample
/// type exactly.
pub trait RasterView {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn bands(&self) -> usize;
    fn sample_type(&self) -> SampleType;
    fn sample(&self, x: usize, y: usize, band: usize) -> f64;
}

#[derive(Clone, Debug, PartialEq)]
enum Samples {
    UInt8(Vec<u8>),
    Int8(Vec<i8>),
    UInt16(Vec<u16>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// An owned raster with band-planar sample storage.
///
/// This is what [`read_raster`] produces; it is also a convenient
/// [`RasterView`] for callers that do not have their own raster type.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    sample_type: SampleType,
    width: usize,
    height: usize,
    bands: usize,
    data: Samples,
}

impl Raster {
    /// Creates a zero-filled raster.
    ///
    /// **Panics** if `sample_type` is [`SampleType::Rgb8`] and `bands` is
    /// not 3.
    pub fn new(sample_type: SampleType, width: usize, height: usize, bands: usize) -> Raster {
        if sample_type == SampleType::Rgb8 {
            assert_eq!(bands, 3, "packed RGB rasters have exactly 3 bands");
        }
        let n = width * height * bands;
        let data = match sample_type {
            SampleType::UInt8 | SampleType::Rgb8 => Samples::UInt8(vec![0; n]),
            SampleType::Int8 => Samples::Int8(vec![0; n]),
            SampleType::UInt16 => Samples::UInt16(vec![0; n]),
            SampleType::Int16 => Samples::Int16(vec![0; n]),
            SampleType::Int32 => Samples::Int32(vec![0; n]),
            SampleType::Float32 => Samples::Float32(vec![0.; n]),
            SampleType::Float64 => Samples::Float64(vec![0.; n]),
        };
        Raster {
            sample_type,
            width,
            height,
            bands,
            data,
        }
    }

    /// The layout the original application pairs with each sample type:
    /// interleaved for packed RGB, band-sequential for everything else.
    pub fn natural_layout(&self) -> Layout {
        match self.sample_type {
            SampleType::Rgb8 => Layout::Interleaved,
            _ => Layout::Planar,
        }
    }

    fn index(&self, x: usize, y: usize, band: usize) -> usize {
        assert!(x < self.width && y < self.height && band < self.bands);
        band * self.width * self.height + y * self.width + x
    }

    /// Stores a sample, truncating integer values to the sample type's width.
    pub fn set_sample(&mut self, x: usize, y: usize, band: usize, value: f64) {
        let i = self.index(x, y, band);
        match &mut self.data {
            Samples::UInt8(v) => v[i] = value as i64 as u8,
            Samples::Int8(v) => v[i] = value as i64 as i8,
            Samples::UInt16(v) => v[i] = value as i64 as u16,
            Samples::Int16(v) => v[i] = value as i64 as i16,
            Samples::Int32(v) => v[i] = value as i64 as i32,
            Samples::Float32(v) => v[i] = value as f32,
            Samples::Float64(v) => v[i] = value,
        }
    }

    fn from_parts(
        sample_type: SampleType,
        width: usize,
        height: usize,
        bands: usize,
        data: Samples,
    ) -> Raster {
        Raster {
            sample_type,
            width,
            height,
            bands,
            data,
        }
    }
}

impl RasterView for Raster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn bands(&self) -> usize {
        self.bands
    }

    fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    fn sample(&self, x: usize, y: usize, band: usize) -> f64 {
        let i = self.index(x, y, band);
        match &self.data {
            Samples::UInt8(v) => f64::from(v[i]),
            Samples::Int8(v) => f64::from(v[i]),
            Samples::UInt16(v) => f64::from(v[i]),
            Samples::Int16(v) => f64::from(v[i]),
            Samples::Int32(v) => f64::from(v[i]),
            Samples::Float32(v) => f64::from(v[i]),
            Samples::Float64(v) => v[i],
        }
    }
}

/// Iterates samples of `raster` in the order `layout` dictates.
fn samples_in_order<'a, V: RasterView + ?Sized>(
    raster: &'a V,
    layout: Layout,
) -> impl Iterator<Item = f64> + 'a {
    let (w, h, bands) = (raster.width(), raster.height(), raster.bands());
    let total = w * h * bands;
    (0..total).map(move |i| match layout {
        Layout::Interleaved => {
            let band = i % bands;
            let pixel = i / bands;
            raster.sample(pixel % w, pixel / w, band)
        }
        Layout::Planar => {
            let band = i / (w * h);
            let pixel = i % (w * h);
            raster.sample(pixel % w, pixel / w, band)
        }
    })
}

fn write_samples<W, V, T, F>(
    raster: &V,
    layout: Layout,
    writer: W,
    convert: F,
) -> Result<(), WriteNpyError>
where
    W: io::Write,
    V: RasterView + ?Sized,
    T: Element,
    F: Fn(f64) -> T,
{
    let samples: Vec<T> = samples_in_order(raster, layout).map(convert).collect();
    T::write_slice(&samples, writer)?;
    Ok(())
}

/// Writes `raster` to `writer` as an `.npy` stream with shape
/// `(width, height, bands)`.
///
/// `layout` selects the payload memory order; the shape tuple is the same
/// either way, so the decoding side must use the same layout. Integer sample
/// values wider than the sample type are truncated to its byte width, not
/// clamped.
pub fn write_raster<W, V>(raster: &V, layout: Layout, mut writer: W) -> Result<(), WriteNpyError>
where
    W: io::Write,
    V: RasterView + ?Sized,
{
    let header = Header {
        dtype: raster.sample_type().dtype(),
        shape: vec![raster.width(), raster.height(), raster.bands()],
    };
    header.write(&mut writer)?;
    match raster.sample_type() {
        SampleType::UInt8 | SampleType::Rgb8 => {
            write_samples(raster, layout, writer, |v| v as i64 as u8)
        }
        SampleType::Int8 => write_samples(raster, layout, writer, |v| v as i64 as i8),
        SampleType::UInt16 => write_samples(raster, layout, writer, |v| v as i64 as u16),
        SampleType::Int16 => write_samples(raster, layout, writer, |v| v as i64 as i16),
        SampleType::Int32 => write_samples(raster, layout, writer, |v| v as i64 as i32),
        SampleType::Float32 => write_samples(raster, layout, writer, |v| v as f32),
        SampleType::Float64 => write_samples(raster, layout, writer, |v| v),
    }
}

/// Validates a raster shape tuple: 2 or 3 dimensions, `bands` defaulting to
/// 1 for 2-D shapes.
fn raster_shape(shape: &[usize]) -> Result<(usize, usize, usize), ReadNpyError> {
    match *shape {
        [width, height] => Ok((width, height, 1)),
        [width, height, bands] => Ok((width, height, bands)),
        _ => Err(ReadNpyError::Dimensions(shape.len())),
    }
}

/// Re-orders an interleaved sample vector into band-planar order.
fn interleaved_to_planar<T: Copy>(src: &[T], w: usize, h: usize, bands: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(src.len());
    for band in 0..bands {
        for pixel in 0..w * h {
            out.push(src[pixel * bands + band]);
        }
    }
    out
}

fn read_band_vec<T: Element + Copy>(
    bytes: &[u8],
    len: usize,
    layout: Layout,
    w: usize,
    h: usize,
    bands: usize,
) -> Result<Vec<T>, ReadNpyError> {
    let data = T::read_slice(bytes, len)?;
    Ok(match layout {
        Layout::Planar => data,
        Layout::Interleaved => interleaved_to_planar(&data, w, h, bands),
    })
}

/// Reads an `.npy` stream from `reader` into an owned [`Raster`].
///
/// The declared shape must have 2 or 3 dimensions (`bands` defaults to 1 for
/// 2-D shapes), the dtype must map to a raster sample type, and the payload
/// length must match the shape exactly. `layout` states the memory order the
/// payload was written in.
pub fn read_raster<R>(mut reader: R, layout: Layout) -> Result<Raster, ReadNpyError>
where
    R: io::Read,
{
    let header = Header::from_reader(&mut reader)?;
    let (w, h, bands) = raster_shape(&header.shape)?;
    let sample_type = SampleType::from_dtype(header.dtype)
        .ok_or(ReadNpyError::UnsupportedDtype(header.dtype))?;
    let len = w * h * bands;
    let mut bytes = Vec::with_capacity(len * header.dtype.item_size());
    reader.read_to_end(&mut bytes)?;
    let data = match sample_type {
        SampleType::UInt8 => Samples::UInt8(read_band_vec(&bytes, len, layout, w, h, bands)?),
        SampleType::Int8 => Samples::Int8(read_band_vec(&bytes, len, layout, w, h, bands)?),
        SampleType::UInt16 => Samples::UInt16(read_band_vec(&bytes, len, layout, w, h, bands)?),
        SampleType::Int16 => Samples::Int16(read_band_vec(&bytes, len, layout, w, h, bands)?),
        SampleType::Int32 => Samples::Int32(read_band_vec(&bytes, len, layout, w, h, bands)?),
        SampleType::Float32 => Samples::Float32(read_band_vec(&bytes, len, layout, w, h, bands)?),
        SampleType::Float64 => Samples::Float64(read_band_vec(&bytes, len, layout, w, h, bands)?),
        SampleType::Rgb8 => unreachable!("from_dtype never yields Rgb8"),
    };
    Ok(Raster::from_parts(sample_type, w, h, bands, data))
}

/// Reads an 8-bit `.npy` stream into a `(width, height, bands)` grid of
/// integer sample values.
///
/// Only `|u1` (zero-extended) and `|i1` (sign-extended) payloads are
/// accepted. The result is indexed `[x, y, band]`, matching the declared
/// shape tuple.
pub fn read_nested<R>(mut reader: R, layout: Layout) -> Result<Array3<i32>, ReadNpyError>
where
    R: io::Read,
{
    let header = Header::from_reader(&mut reader)?;
    let (w, h, bands) = raster_shape(&header.shape)?;
    let len = w * h * bands;
    let mut bytes = Vec::with_capacity(len);
    reader.read_to_end(&mut bytes)?;
    let values: Vec<i32> = match header.dtype {
        Dtype::UInt8 => u8::read_slice(&bytes, len)?
            .into_iter()
            .map(i32::from)
            .collect(),
        Dtype::Int8 => i8::read_slice(&bytes, len)?
            .into_iter()
            .map(i32::from)
            .collect(),
        other => return Err(ReadNpyError::UnsupportedDtype(other)),
    };
    let mut out = Array3::zeros((w, h, bands));
    for band in 0..bands {
        for y in 0..h {
            for x in 0..w {
                let i = match layout {
                    Layout::Planar => band * w * h + y * w + x,
                    Layout::Interleaved => (y * w + x) * bands + band,
                };
                out[[x, y, band]] = values[i];
            }
        }
    }
    Ok(out)
}
