//! Array wire codec tests.

use bytes::Bytes;
use dx_common::{DxError, ElementType, NDArray};
use dx_protocol::array::{decode, decode_with_headers, encode, ArrayMetadata};

/// Deterministic, non-uniform bytes so a reordering would be caught.
fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 37 % 251) as u8).collect()
}

#[test]
fn test_roundtrip_preserves_bytes_for_all_types() {
    let shapes: [&[usize]; 4] = [&[7], &[3, 1], &[2, 1, 5], &[1, 2, 3, 2]];

    for ty in ElementType::ALL {
        for shape in shapes {
            let len = shape.iter().product::<usize>() * ty.size();
            let raw = patterned_bytes(len);
            let original = NDArray::new(ty, shape.to_vec(), Bytes::from(raw.clone())).unwrap();

            let encoded = encode(&original);
            let (dims, tag) = encoded.metadata.header_values();
            let decoded = decode_with_headers(&dims, &tag, encoded.payload).unwrap();

            assert_eq!(decoded.element_type(), ty);
            assert_eq!(decoded.shape(), shape);
            assert_eq!(decoded.data().as_ref(), raw.as_slice());
        }
    }
}

#[test]
fn test_float_bits_survive() {
    let values = vec![f64::NAN, -0.0, f64::INFINITY, 1e-310, 273.15, -1.0];
    let original = NDArray::from_vec(vec![2, 3], values.clone()).unwrap();

    let encoded = encode(&original);
    let decoded = decode(encoded.metadata, encoded.payload).unwrap();
    let back = decoded.to_vec::<f64>().unwrap();

    for (a, b) in values.iter().zip(&back) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn test_encode_does_not_copy_payload() {
    let original = NDArray::from_vec(vec![4], vec![1u32, 2, 3, 4]).unwrap();
    let encoded = encode(&original);
    assert_eq!(encoded.payload.as_ptr(), original.data().as_ptr());
}

#[test]
fn test_metadata_payload_disagreement() {
    let meta = ArrayMetadata {
        dims: vec![8, 12],
        element_type: ElementType::F32,
    };
    let result = decode(meta, Bytes::from(vec![0u8; 8 * 12 * 8]));
    assert!(matches!(result, Err(DxError::MalformedArray(_))));
}

#[test]
fn test_whitespace_in_headers() {
    let arr = decode_with_headers(" 2, 2 ", " 4 ", Bytes::from(vec![0u8; 8])).unwrap();
    assert_eq!(arr.shape(), &[2, 2]);
    assert_eq!(arr.element_type(), ElementType::U16);
}
