use crate::topology::Identity;

/// Counts the bytes of `payload` whose whole value equals `value`.
///
/// This is a byte-value match, not a bit-plane count: for identity `1` only
/// `0x01` bytes are counted, and bytes such as `0x03` count toward no identity.
pub fn count_matching_bytes(payload: &[u8], value: u8) -> u64 {
    payload.iter().filter(|&&b| b == value).count() as u64
}

/// The vote an identity casts for a payload.
pub fn count_for(payload: &[u8], identity: Identity) -> u64 {
    count_matching_bytes(payload, identity.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_whole_byte_values() {
        let payload = b"\x01\x01\x01\x01\x00\x00";
        assert_eq!(count_matching_bytes(payload, 0), 2);
        assert_eq!(count_matching_bytes(payload, 1), 4);
    }

    #[test]
    fn test_other_byte_values_count_toward_nothing() {
        // 0x03 has two bits set, 0xff eight, neither is a 0 or 1 byte
        let payload = [0x03, 0xff, 0x10, 0x00, 0x01];
        assert_eq!(count_matching_bytes(&payload, 0), 1);
        assert_eq!(count_matching_bytes(&payload, 1), 1);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(count_matching_bytes(&[], 0), 0);
        assert_eq!(count_matching_bytes(&[], 1), 0);
    }

    #[test]
    fn test_sum_bounded_by_length() {
        let payloads: Vec<Vec<u8>> = vec![
            (0..=255u8).collect(),
            vec![0, 1, 0, 1, 1],
            vec![7; 32],
            b"hello world".to_vec(),
        ];
        for p in payloads {
            let zeros = count_matching_bytes(&p, 0);
            let ones = count_matching_bytes(&p, 1);
            assert!(zeros + ones <= p.len() as u64);
            let only_bits = p.iter().all(|&b| b <= 1);
            assert_eq!(zeros + ones == p.len() as u64, only_bits);
        }
    }

    #[test]
    fn test_count_for_identity() {
        let payload = [2, 2, 2, 0];
        assert_eq!(count_for(&payload, Identity::new(2)), 3);
        assert_eq!(count_for(&payload, Identity::new(0)), 1);
    }
}
