//! Layer-3 call signalling codec.
//!
//! A Layer-3 message is 72 bits. It travels whole inside a FACCH1, or split
//! into four 18-bit fragments across the SACCH slots of a superframe; the
//! message buffer here accumulates either form.
//!
//! Field layout:
//!
//! | bits | field |
//! |---|---|
//! | 0-1 | reserved |
//! | 2-7 | message type |
//! | 8 | group call flag |
//! | 9-15 | call options |
//! | 16-31 | source ID |
//! | 32-47 | destination ID |
//! | 48-49 | cipher type |
//! | 50-55 | key ID |
//! | 56-71 | reserved |

use crate::bits;
use crate::consts::{LAYER3_BITS, LAYER3_BYTES};

/// Layer-3 message types used by the call machinery.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MessageType {
    /// Voice call setup announcement.
    Vcall,
    /// Voice call setup carrying a cipher initialisation vector.
    VcallIv,
    /// Transmission release.
    TxRelease,
    /// Data call header.
    DcallHeader,
    /// Data call payload block.
    DcallData,
    /// Idle filler.
    Idle,
}

impl MessageType {
    /// Try to parse a message type from the given 6 bits.
    pub fn from_bits(bits: u8) -> Option<MessageType> {
        use self::MessageType::*;

        match bits {
            0x01 => Some(Vcall),
            0x03 => Some(VcallIv),
            0x08 => Some(TxRelease),
            0x09 => Some(DcallHeader),
            0x0B => Some(DcallData),
            0x10 => Some(Idle),
            _ => None,
        }
    }

    /// Get the 6-bit field for the message type.
    pub fn bits(self) -> u8 {
        use self::MessageType::*;

        match self {
            Vcall => 0x01,
            VcallIv => 0x03,
            TxRelease => 0x08,
            DcallHeader => 0x09,
            DcallData => 0x0B,
            Idle => 0x10,
        }
    }
}

/// A Layer-3 message, possibly under accumulation from fragments.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Layer3 {
    data: [u8; LAYER3_BYTES],
}

impl Layer3 {
    /// Construct an empty message.
    pub fn new() -> Layer3 {
        Layer3 {
            data: [0; LAYER3_BYTES],
        }
    }

    /// Interpret the given bytes as a whole message.
    pub fn from_bytes(data: [u8; LAYER3_BYTES]) -> Layer3 {
        Layer3 { data }
    }

    /// Forget any accumulated contents.
    pub fn reset(&mut self) {
        self.data = [0; LAYER3_BYTES];
    }

    /// Merge `count` bits of `src` into the message at the given bit offset.
    ///
    /// Fragments may arrive in any order; each lands at its own offset.
    pub fn decode(&mut self, src: &[u8], count: usize, offset: usize) {
        assert!(offset + count <= LAYER3_BITS);
        bits::copy_bits(&mut self.data, offset, src, 0, count);
    }

    /// The full message bytes, for FACCH1 transmission.
    pub fn bytes(&self) -> [u8; LAYER3_BYTES] {
        self.data
    }

    /// Message type, if the type field holds a known value.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_bits(self.data[0] & 0x3F)
    }

    /// Source radio ID.
    pub fn src_id(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Destination radio or talk-group ID.
    pub fn dst_id(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    /// Whether the destination is a talk-group.
    pub fn group(&self) -> bool {
        self.data[1] & 0x80 != 0
    }

    /// Cipher type for encrypted voice, zero when clear.
    pub fn cipher_type(&self) -> u8 {
        self.data[6] >> 6
    }

    /// Traffic encryption key ID.
    pub fn key_id(&self) -> u8 {
        self.data[6] & 0x3F
    }

    pub fn set_message_type(&mut self, msg: MessageType) {
        self.data[0] = self.data[0] & 0xC0 | msg.bits();
    }

    pub fn set_src_id(&mut self, id: u16) {
        self.data[2..4].copy_from_slice(&id.to_be_bytes());
    }

    pub fn set_dst_id(&mut self, id: u16) {
        self.data[4..6].copy_from_slice(&id.to_be_bytes());
    }

    pub fn set_group(&mut self, group: bool) {
        if group {
            self.data[1] |= 0x80;
        } else {
            self.data[1] &= !0x80;
        }
    }

    pub fn set_cipher(&mut self, cipher_type: u8, key_id: u8) {
        assert!(cipher_type >> 2 == 0);
        assert!(key_id >> 6 == 0);
        self.data[6] = cipher_type << 6 | key_id;
    }
}

impl Default for Layer3 {
    fn default() -> Layer3 {
        Layer3::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::consts::FRAGMENT_BITS;

    fn vcall(src: u16, dst: u16, group: bool) -> Layer3 {
        let mut l3 = Layer3::new();
        l3.set_message_type(MessageType::Vcall);
        l3.set_src_id(src);
        l3.set_dst_id(dst);
        l3.set_group(group);
        l3
    }

    #[test]
    fn test_fields() {
        let mut l3 = vcall(1234, 5678, true);
        l3.set_cipher(2, 5);

        assert_eq!(l3.message_type(), Some(MessageType::Vcall));
        assert_eq!(l3.src_id(), 1234);
        assert_eq!(l3.dst_id(), 5678);
        assert!(l3.group());
        assert_eq!(l3.cipher_type(), 2);
        assert_eq!(l3.key_id(), 5);

        l3.set_group(false);
        assert!(!l3.group());

        l3.reset();
        assert_eq!(l3.message_type(), None);
        assert_eq!(l3.src_id(), 0);
    }

    #[test]
    fn test_types() {
        for msg in [
            MessageType::Vcall,
            MessageType::VcallIv,
            MessageType::TxRelease,
            MessageType::DcallHeader,
            MessageType::DcallData,
            MessageType::Idle,
        ] {
            assert_eq!(MessageType::from_bits(msg.bits()), Some(msg));
        }

        assert_eq!(MessageType::from_bits(0x3F), None);
    }

    #[test]
    fn test_fragment_accumulation() {
        let whole = vcall(100, 200, true);
        let bytes = whole.bytes();

        // Slice the message into four 18-bit fragments.
        let mut frags = [[0u8; 3]; 4];
        for (i, frag) in frags.iter_mut().enumerate() {
            bits::copy_bits(frag, 0, &bytes, i * FRAGMENT_BITS, FRAGMENT_BITS);
        }

        // Deliver them out of order.
        let mut acc = Layer3::new();
        for i in [2, 0, 3, 1] {
            acc.decode(&frags[i], FRAGMENT_BITS, i * FRAGMENT_BITS);
        }

        assert_eq!(acc, whole);
        assert_eq!(acc.src_id(), 100);
        assert_eq!(acc.dst_id(), 200);
        assert!(acc.group());
    }

    #[test]
    fn test_first_fragment_carries_type() {
        let whole = vcall(4095, 1, false);
        let bytes = whole.bytes();

        let mut frag = [0u8; 3];
        bits::copy_bits(&mut frag, 0, &bytes, 0, FRAGMENT_BITS);

        let mut acc = Layer3::new();
        acc.decode(&frag, FRAGMENT_BITS, 0);
        assert_eq!(acc.message_type(), Some(MessageType::Vcall));
    }
}
