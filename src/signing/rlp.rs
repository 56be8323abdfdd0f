//! Minimal RLP encoding for typed EVM transactions

/// Encode an unsigned integer given as big-endian bytes (leading zeros stripped)
pub fn encode_uint_bytes(bytes: &[u8]) -> Vec<u8> {
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    encode_bytes(&bytes[leading_zeros..])
}

pub fn encode_u64(val: u64) -> Vec<u8> {
    encode_uint_bytes(&val.to_be_bytes())
}

pub fn encode_u128(val: u128) -> Vec<u8> {
    encode_uint_bytes(&val.to_be_bytes())
}

pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        return data.to_vec();
    }

    if data.len() < 56 {
        let mut result = vec![0x80 + data.len() as u8];
        result.extend_from_slice(data);
        result
    } else {
        let len_bytes = encode_length(data.len());
        let mut result = vec![0xb7 + len_bytes.len() as u8];
        result.extend_from_slice(&len_bytes);
        result.extend_from_slice(data);
        result
    }
}

pub fn encode_address(addr: Option<[u8; 20]>) -> Vec<u8> {
    match addr {
        Some(a) => encode_bytes(&a),
        None => vec![0x80],
    }
}

pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = items.concat();

    if payload.len() < 56 {
        let mut result = vec![0xc0 + payload.len() as u8];
        result.extend_from_slice(&payload);
        result
    } else {
        let len_bytes = encode_length(payload.len());
        let mut result = vec![0xf7 + len_bytes.len() as u8];
        result.extend_from_slice(&len_bytes);
        result.extend_from_slice(&payload);
        result
    }
}

fn encode_length(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    bytes[leading_zeros..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_u64() {
        assert_eq!(encode_u64(0), vec![0x80]);
        assert_eq!(encode_u64(127), vec![127]);
        assert_eq!(encode_u64(128), vec![0x81, 128]);
        assert_eq!(encode_u64(256), vec![0x82, 1, 0]);
    }

    #[test]
    fn test_encode_bytes() {
        assert_eq!(encode_bytes(&[]), vec![0x80]);
        assert_eq!(encode_bytes(&[0x7f]), vec![0x7f]);
        assert_eq!(encode_bytes(&[0x80]), vec![0x81, 0x80]);
        assert_eq!(encode_bytes(&[1, 2, 3]), vec![0x83, 1, 2, 3]);
    }

    #[test]
    fn test_uint_bytes_strip_zeros() {
        assert_eq!(encode_uint_bytes(&[0, 0, 5]), vec![5]);
        assert_eq!(encode_uint_bytes(&[0, 0]), vec![0x80]);
        assert_eq!(encode_uint_bytes(&[]), vec![0x80]);
    }

    #[test]
    fn test_long_string_and_list() {
        let data = vec![0xaa; 60];
        let encoded = encode_bytes(&data);
        assert_eq!(&encoded[..2], &[0xb8, 60]);
        assert_eq!(encoded.len(), 62);

        let list = encode_list(&[encoded]);
        assert_eq!(&list[..2], &[0xf8, 62]);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(encode_list(&[]), vec![0xc0]);
    }
}
