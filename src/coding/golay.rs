//! Encoding and decoding of the (23, 12, 7) standard and (24, 12, 8) extended
//! Golay codes.
//!
//! The standard code protects the second class of AMBE voice bits and the
//! extended code protects the first class and the FACCH1 payload. Both
//! correct up to 3 errors and report the number of corrected bits.

pub use cai_golay::{extended, standard};

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_standard() {
        let w = 0b101010101010;
        let e = standard::encode(w);

        assert_eq!(standard::decode(e), Some((w, 0)));
        assert_eq!(standard::decode(e ^ 0b100), Some((w, 1)));
        assert_eq!(standard::decode(e ^ 0b101), Some((w, 2)));
        assert_eq!(standard::decode(e ^ 0b10000000000000000000101), Some((w, 3)));
    }

    #[test]
    fn test_extended() {
        let w = 0b110011001100;
        let e = extended::encode(w);

        assert_eq!(extended::decode(e), Some((w, 0)));
        assert_eq!(extended::decode(e ^ 0b1000), Some((w, 1)));
        assert_eq!(extended::decode(e ^ 0b1001), Some((w, 2)));
        assert_eq!(extended::decode(e ^ 0b100000000000000000001001), Some((w, 3)));
    }

    #[test]
    fn test_round_trip() {
        for w in (0..1 << 12).step_by(37) {
            assert_eq!(standard::decode(standard::encode(w)), Some((w, 0)));
            assert_eq!(extended::decode(extended::encode(w)), Some((w, 0)));
        }
    }
}
