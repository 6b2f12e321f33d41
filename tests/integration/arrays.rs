//! Round trips and rejection paths for 1-D primitive arrays.

use crate::npy_stream;
use raster_npy::{
    read_array, write_array, Dtype, Element, Header, ParseHeaderError, ReadNpyError,
    HEADER_TOTAL_LEN,
};
use std::fmt::Debug;

/// Writes the values as an `.npy` stream and reads them back; the result
/// must be identical.
fn test_round_trip<T>(before: &[T])
where
    T: Debug + PartialEq + Element + Clone,
{
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, before).unwrap();
    let after: Vec<T> = read_array(&npy[..]).unwrap();
    assert_eq!(before, &after[..]);
}

#[test]
fn round_trip_i8() {
    test_round_trip(&[i8::MIN, -1, 0, 1, i8::MAX]);
}

#[test]
fn round_trip_u8() {
    test_round_trip(&[0u8, 1, 127, 128, u8::MAX]);
}

#[test]
fn round_trip_i16() {
    test_round_trip(&[i16::MIN, -257, 0, 256, i16::MAX]);
}

#[test]
fn round_trip_u16() {
    test_round_trip(&[0u16, 255, 256, u16::MAX]);
}

#[test]
fn round_trip_i32() {
    test_round_trip(&[i32::MIN, -980780878, 0, 2849874, i32::MAX]);
}

#[test]
fn round_trip_i64() {
    test_round_trip(&[i64::MIN, -1, 0, 1, i64::MAX]);
}

#[test]
fn round_trip_f32_bit_for_bit() {
    let before = [
        0f32,
        -0.0,
        1.5,
        -159.25,
        f32::MIN,
        f32::MAX,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::NAN,
    ];
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, &before).unwrap();
    let after: Vec<f32> = read_array(&npy[..]).unwrap();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.to_bits(), a.to_bits());
    }
}

#[test]
fn round_trip_f64_bit_for_bit() {
    let before = [
        0f64,
        -0.0,
        2.7,
        -40.4,
        f64::MIN,
        f64::MAX,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NAN,
    ];
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, &before).unwrap();
    let after: Vec<f64> = read_array(&npy[..]).unwrap();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.to_bits(), a.to_bits());
    }
}

#[test]
fn round_trip_bool() {
    test_round_trip(&[true, false, false, true]);
}

#[test]
fn round_trip_char() {
    test_round_trip(&['a', 'Z', '0', '\u{df}', '\u{221a}']);
}

#[test]
fn round_trip_empty() {
    test_round_trip(&[] as &[i32]);
}

#[test]
fn int32_concrete_bytes() {
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, &[1i32, 2, 3]).unwrap();
    assert_eq!(npy.len(), HEADER_TOTAL_LEN + 12);

    let text = std::str::from_utf8(&npy[10..HEADER_TOTAL_LEN]).unwrap();
    assert!(text.contains("'|i4'"));
    assert!(text.contains("(3,)"));

    assert_eq!(
        &npy[HEADER_TOTAL_LEN..],
        &[
            0x01, 0x00, 0x00, 0x00, //
            0x02, 0x00, 0x00, 0x00, //
            0x03, 0x00, 0x00, 0x00,
        ]
    );

    let back: Vec<i32> = read_array(&npy[..]).unwrap();
    assert_eq!(back, vec![1, 2, 3]);
}

#[test]
fn bool_encodes_as_single_bytes() {
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, &[true, false, true]).unwrap();
    assert_eq!(&npy[HEADER_TOTAL_LEN..], &[0x01, 0x00, 0x01]);
}

#[test]
fn char_encodes_as_le_code_units() {
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, &['A', '\u{df}']).unwrap();
    assert_eq!(&npy[HEADER_TOTAL_LEN..], &[0x41, 0x00, 0xdf, 0x00]);
}

#[test]
fn rejects_missing_magic() {
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, &[1u8, 2]).unwrap();
    npy[0] = 0x00;
    match read_array::<_, u8>(&npy[..]) {
        Err(ReadNpyError::ParseHeader(ParseHeaderError::MagicString)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn rejects_wrong_dtype() {
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, &[1.5f32, 2.5]).unwrap();
    match read_array::<_, i32>(&npy[..]) {
        Err(ReadNpyError::WrongDtype { expected, found }) => {
            assert_eq!(expected, Dtype::Int32);
            assert_eq!(found, Dtype::Float32);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn rejects_truncated_payload() {
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, &[1i32, 2, 3]).unwrap();
    npy.truncate(npy.len() - 5);
    match read_array::<_, i32>(&npy[..]) {
        Err(ReadNpyError::MissingBytes(5)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn rejects_extra_payload() {
    let mut npy = Vec::<u8>::new();
    write_array(&mut npy, &[1i32, 2, 3]).unwrap();
    npy.extend_from_slice(&[0; 4]);
    match read_array::<_, i32>(&npy[..]) {
        Err(ReadNpyError::ExtraBytes(4)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn rejects_multi_dimensional_shape() {
    let npy = npy_stream(
        &Header {
            dtype: Dtype::UInt8,
            shape: vec![2, 2],
        },
        &[1, 2, 3, 4],
    );
    match read_array::<_, u8>(&npy[..]) {
        Err(ReadNpyError::Dimensions(2)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn rejects_bad_bool_byte() {
    let npy = npy_stream(
        &Header {
            dtype: Dtype::Bool,
            shape: vec![3],
        },
        &[0x00, 0x05, 0x01],
    );
    match read_array::<_, bool>(&npy[..]) {
        Err(ReadNpyError::ParseData(err)) => {
            assert_eq!(format!("{}", err), "error parsing value 0x05 as a bool");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn rejects_surrogate_code_unit() {
    let npy = npy_stream(
        &Header {
            dtype: Dtype::Char16,
            shape: vec![1],
        },
        &[0x00, 0xd8], // 0xd800, a lone surrogate
    );
    match read_array::<_, char>(&npy[..]) {
        Err(ReadNpyError::ParseData(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("values.npy");

    let values = [3i64, -7, 1 << 40];
    let file = std::fs::File::create(&path).unwrap();
    write_array(&file, &values).unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let back: Vec<i64> = read_array(&file).unwrap();
    assert_eq!(back, values);
}
