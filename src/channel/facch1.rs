//! Fast Associated Control Channel codec.
//!
//! A FACCH1 steals half of the voice payload to carry one whole 72-bit
//! Layer-3 message as six extended Golay(24,12) codewords. A frame has two
//! FACCH1 slots; callers pass the bit offset of the slot to work on.

use crate::bits;
use crate::consts::LAYER3_BYTES;

use crate::coding::golay::extended;

/// Decoded FACCH1 payload.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Facch1 {
    data: [u8; LAYER3_BYTES],
}

impl Facch1 {
    /// Construct a FACCH1 carrying the given payload.
    pub fn new(data: [u8; LAYER3_BYTES]) -> Facch1 {
        Facch1 { data }
    }

    /// Payload bytes.
    pub fn data(&self) -> &[u8; LAYER3_BYTES] {
        &self.data
    }

    /// Try to decode the FACCH1 slot at the given bit offset, returning the
    /// payload and the number of corrected bits.
    ///
    /// All six codewords must decode; more than 3 errors in any one of them
    /// invalidates the slot.
    pub fn decode(frame: &[u8], offset: usize) -> Option<(Facch1, usize)> {
        let mut data = [0u8; LAYER3_BYTES];
        let mut errs = 0;

        for i in 0..6 {
            let word = bits::get_bits(frame, offset + 24 * i, 24);
            let (bits12, e) = extended::decode(word)?;
            errs += e;
            bits::set_bits(&mut data, 12 * i, 12, bits12 as u32);
        }

        Some((Facch1 { data }, errs))
    }

    /// Write the FACCH1 into the slot at the given bit offset.
    pub fn encode(&self, frame: &mut [u8], offset: usize) {
        for i in 0..6 {
            let bits12 = bits::get_bits(&self.data, 12 * i, 12) as u16;
            bits::set_bits(frame, offset + 24 * i, 24, extended::encode(bits12));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::consts::{FACCH1_FIRST_OFFSET, FACCH1_SECOND_OFFSET, FRAME_BYTES};

    #[test]
    fn test_round_trip() {
        let mut frame = [0u8; FRAME_BYTES];

        let payload = [0x01, 0x80, 0x00, 0x64, 0x00, 0xC8, 0x00, 0x00, 0x00];
        let facch = Facch1::new(payload);

        facch.encode(&mut frame, FACCH1_FIRST_OFFSET);
        facch.encode(&mut frame, FACCH1_SECOND_OFFSET);

        let (dec, errs) = Facch1::decode(&frame, FACCH1_FIRST_OFFSET).unwrap();
        assert_eq!(dec.data(), &payload);
        assert_eq!(errs, 0);

        let (dec, _) = Facch1::decode(&frame, FACCH1_SECOND_OFFSET).unwrap();
        assert_eq!(dec.data(), &payload);
    }

    #[test]
    fn test_slots_independent() {
        let mut frame = [0u8; FRAME_BYTES];

        let first = Facch1::new([0x11; LAYER3_BYTES]);
        let second = Facch1::new([0x22; LAYER3_BYTES]);
        first.encode(&mut frame, FACCH1_FIRST_OFFSET);
        second.encode(&mut frame, FACCH1_SECOND_OFFSET);

        assert_eq!(
            Facch1::decode(&frame, FACCH1_FIRST_OFFSET).unwrap().0,
            first
        );
        assert_eq!(
            Facch1::decode(&frame, FACCH1_SECOND_OFFSET).unwrap().0,
            second
        );
    }

    #[test]
    fn test_corrections_counted() {
        let mut frame = [0u8; FRAME_BYTES];

        Facch1::new([0xA5; LAYER3_BYTES]).encode(&mut frame, FACCH1_FIRST_OFFSET);

        // Three errors in one codeword are corrected and counted.
        for idx in [0, 5, 19] {
            let bit = bits::get_bit(&frame, FACCH1_FIRST_OFFSET + idx);
            bits::set_bit(&mut frame, FACCH1_FIRST_OFFSET + idx, !bit);
        }

        let (dec, errs) = Facch1::decode(&frame, FACCH1_FIRST_OFFSET).unwrap();
        assert_eq!(dec.data(), &[0xA5; LAYER3_BYTES]);
        assert_eq!(errs, 3);
    }

    #[test]
    fn test_unrecoverable() {
        let mut frame = [0u8; FRAME_BYTES];

        Facch1::new([0x5A; LAYER3_BYTES]).encode(&mut frame, FACCH1_FIRST_OFFSET);

        // Four errors in one codeword exceed the correction capacity.
        for idx in [0, 5, 11, 19] {
            let bit = bits::get_bit(&frame, FACCH1_FIRST_OFFSET + idx);
            bits::set_bit(&mut frame, FACCH1_FIRST_OFFSET + idx, !bit);
        }

        assert_eq!(Facch1::decode(&frame, FACCH1_FIRST_OFFSET), None);
    }
}
