//! Encoding and decoding of the (15, 11, 3) Hamming code that protects the
//! SACCH payload, correcting up to 1 error.

use binfield_matrix::{matrix_mul, matrix_mul_systematic};

/// Encode the given 11 data bits into a 15-bit codeword.
pub fn encode(data: u16) -> u16 {
    assert!(data >> 11 == 0);
    matrix_mul_systematic(data, GEN)
}

/// Try to decode the given 15-bit word to the nearest codeword, correcting up
/// to 1 error.
///
/// If decoding was successful, return `Some((data, err))`, where `data` is
/// the 11 data bits and `err` is the number of corrected bits. Otherwise,
/// return `None` to indicate an unrecoverable error.
pub fn decode(word: u16) -> Option<(u16, usize)> {
    assert!(word >> 15 == 0);

    let syndrome: usize = matrix_mul(word, PAR);

    if syndrome == 0 {
        return Some((word >> 4, 0));
    }

    LOCATIONS
        .get(syndrome)
        .map(|&loc| ((word ^ loc) >> 4, 1))
}

/// Generator matrix, without the identity part.
const GEN: &[u16] = &[
    0b11111110000,
    0b11110001110,
    0b11001101101,
    0b10101011011,
];

/// Parity-check matrix derived from the generator.
const PAR: &[u16] = &[
    0b111111100001000,
    0b111100011100100,
    0b110011011010010,
    0b101010110110001,
];

/// Maps 4-bit syndrome values to bit error locations.
const LOCATIONS: &[u16] = &[
    0,
    0b000000000000001,
    0b000000000000010,
    0b000000000010000,
    0b000000000000100,
    0b000000000100000,
    0b000000001000000,
    0b000000010000000,
    0b000000000001000,
    0b000000100000000,
    0b000001000000000,
    0b000010000000000,
    0b000100000000000,
    0b001000000000000,
    0b010000000000000,
    0b100000000000000,
];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_corrections() {
        let w = 0b10101010101;
        let e = encode(w);

        for i in 0..15 {
            assert_eq!(decode(e ^ (1 << i)), Some((w, 1)));
        }
    }

    #[test]
    fn test_round_trip() {
        for i in 0..1 << 11 {
            assert_eq!(decode(encode(i)), Some((i, 0)));
        }
    }
}
