//! Slow Associated Control Channel codec.
//!
//! The SACCH payload is 26 bits: the 6-bit radio access number, the 2-bit
//! superframe structure field, and an 18-bit Layer-3 fragment (or idle
//! filler). A CRC-6 is appended and the result is carried as four
//! Hamming(15,11) codewords.

use crate::bits;
use crate::coding::{crc, hamming};
use crate::consts::SACCH_OFFSET;

/// Structure value written on non-superblock frames.
pub const SR_SINGLE: u8 = 0;

/// Width of the fragment data field in bits.
pub const DATA_BITS: usize = 18;

/// Decoded SACCH contents.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Sacch {
    ran: u8,
    structure: u8,
    data: [u8; 3],
}

impl Sacch {
    /// Construct a SACCH from its fields. The data buffer holds 18 bits,
    /// MSB-aligned.
    pub fn new(ran: u8, structure: u8, data: [u8; 3]) -> Sacch {
        assert!(ran >> 6 == 0);
        assert!(structure >> 2 == 0);
        assert!(data[2] & 0x3F == 0);

        Sacch {
            ran,
            structure,
            data,
        }
    }

    /// An idle SACCH carrying no fragment.
    pub fn idle(ran: u8) -> Sacch {
        Sacch::new(ran, SR_SINGLE, [0; 3])
    }

    /// Radio access number of the transmitting site.
    pub fn ran(&self) -> u8 {
        self.ran
    }

    /// Raw 2-bit structure field. On superblock frames this is the
    /// superframe countdown; on non-superblock frames it is `SR_SINGLE`.
    pub fn structure(&self) -> u8 {
        self.structure
    }

    /// The 18-bit fragment data, MSB-aligned.
    pub fn data(&self) -> [u8; 3] {
        self.data
    }

    /// Restamp the radio access number.
    pub fn set_ran(&mut self, ran: u8) {
        assert!(ran >> 6 == 0);
        self.ran = ran;
    }

    /// Try to decode the SACCH of the given air frame, returning the fields
    /// and the number of corrected bits.
    pub fn decode(frame: &[u8]) -> Option<(Sacch, usize)> {
        let mut payload = [0u8; 6];
        let mut errs = 0;

        for i in 0..4 {
            let word = bits::get_bits(frame, SACCH_OFFSET + 15 * i, 15) as u16;
            let (data, e) = hamming::decode(word)?;
            errs += e;
            bits::set_bits(&mut payload, 11 * i, 11, data as u32);
        }

        if bits::get_bits(&payload, 26, 6) as u8 != crc::crc6(&payload, 0, 26) {
            return None;
        }

        let mut data = [0u8; 3];
        bits::copy_bits(&mut data, 0, &payload, 8, DATA_BITS);

        let sacch = Sacch {
            ran: bits::get_bits(&payload, 0, 6) as u8,
            structure: bits::get_bits(&payload, 6, 2) as u8,
            data,
        };

        Some((sacch, errs))
    }

    /// Write the SACCH into the given air frame.
    pub fn encode(&self, frame: &mut [u8]) {
        let mut payload = [0u8; 6];

        bits::set_bits(&mut payload, 0, 6, self.ran as u32);
        bits::set_bits(&mut payload, 6, 2, self.structure as u32);
        bits::copy_bits(&mut payload, 8, &self.data, 0, DATA_BITS);

        let crc = crc::crc6(&payload, 0, 26);
        bits::set_bits(&mut payload, 26, 6, crc as u32);

        for i in 0..4 {
            let data = bits::get_bits(&payload, 11 * i, 11) as u16;
            let word = hamming::encode(data);
            bits::set_bits(frame, SACCH_OFFSET + 15 * i, 15, word as u32);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::consts::FRAME_BYTES;

    #[test]
    fn test_round_trip() {
        let mut frame = [0u8; FRAME_BYTES];

        let sacch = Sacch::new(42, 3, [0xDE, 0xAD, 0x80]);
        sacch.encode(&mut frame);

        let (dec, errs) = Sacch::decode(&frame).unwrap();
        assert_eq!(dec, sacch);
        assert_eq!(dec.ran(), 42);
        assert_eq!(dec.structure(), 3);
        assert_eq!(dec.data(), [0xDE, 0xAD, 0x80]);
        assert_eq!(errs, 0);
    }

    #[test]
    fn test_idle() {
        let mut frame = [0u8; FRAME_BYTES];

        Sacch::idle(1).encode(&mut frame);

        let (dec, _) = Sacch::decode(&frame).unwrap();
        assert_eq!(dec.ran(), 1);
        assert_eq!(dec.structure(), SR_SINGLE);
        assert_eq!(dec.data(), [0; 3]);
    }

    #[test]
    fn test_corrections_counted() {
        let mut frame = [0u8; FRAME_BYTES];

        Sacch::new(7, 2, [0x12, 0x34, 0x40]).encode(&mut frame);

        // One flipped bit per Hamming codeword is corrected and counted.
        for i in 0..4 {
            let idx = SACCH_OFFSET + 15 * i + 4;
            let bit = crate::bits::get_bit(&frame, idx);
            crate::bits::set_bit(&mut frame, idx, !bit);
        }

        let (dec, errs) = Sacch::decode(&frame).unwrap();
        assert_eq!(dec.ran(), 7);
        assert_eq!(errs, 4);
    }

    #[test]
    fn test_restamp_ran() {
        let mut frame = [0u8; FRAME_BYTES];

        Sacch::new(12, 1, [0xAA, 0x55, 0xC0]).encode(&mut frame);

        let (mut dec, _) = Sacch::decode(&frame).unwrap();
        dec.set_ran(33);
        dec.encode(&mut frame);

        let (dec, _) = Sacch::decode(&frame).unwrap();
        assert_eq!(dec.ran(), 33);
        assert_eq!(dec.structure(), 1);
        assert_eq!(dec.data(), [0xAA, 0x55, 0xC0]);
    }

    #[test]
    fn test_uncorrectable() {
        let mut frame = [0u8; FRAME_BYTES];

        Sacch::new(1, 0, [0; 3]).encode(&mut frame);

        // Two errors in one codeword: the single-error correction lands on
        // the wrong codeword and the CRC rejects it.
        for idx in [SACCH_OFFSET, SACCH_OFFSET + 1] {
            let bit = crate::bits::get_bit(&frame, idx);
            crate::bits::set_bit(&mut frame, idx, !bit);
        }

        assert_eq!(Sacch::decode(&frame), None);
    }
}
