use raster_npy::Header;

mod arrays;

/// Builds a complete `.npy` stream from a header and raw payload bytes.
pub fn npy_stream(header: &Header, payload: &[u8]) -> Vec<u8> {
    let mut out = header.to_bytes().unwrap();
    out.extend_from_slice(payload);
    out
}
