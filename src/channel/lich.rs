//! Link Information Channel codec.
//!
//! The LICH is a single byte describing the class of the current frame,
//! transmitted with each bit followed by its complement. It is the first
//! thing examined on every inbound frame and the basis for dispatch.

use crate::bits;
use crate::consts::LICH_OFFSET;

/// RF channel type carried in the LICH.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChannelType {
    /// Control channel.
    Rcch,
    /// Trunked traffic channel.
    Rtch,
    /// Repeater (conventional) data/voice channel.
    Rdch,
    /// Composite trunked traffic channel.
    RtchC,
}

impl ChannelType {
    /// Interpret the given 2 bits as a channel type.
    pub fn from_bits(bits: u8) -> ChannelType {
        use self::ChannelType::*;

        match bits & 0x3 {
            0b00 => Rcch,
            0b01 => Rtch,
            0b10 => Rdch,
            _ => RtchC,
        }
    }

    /// Get the 2-bit field for the channel type.
    pub fn bits(self) -> u8 {
        use self::ChannelType::*;

        match self {
            Rcch => 0b00,
            Rtch => 0b01,
            Rdch => 0b10,
            RtchC => 0b11,
        }
    }
}

/// Frame service class: a non-superblock signalling frame, a user data
/// frame, or one of the two superblock variants.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Usc {
    /// Non-superblock SACCH: idle signalling with the whole Layer-3 in the
    /// FACCH1 slots.
    SacchNs,
    /// User data channel.
    Udch,
    /// Single superblock SACCH (voice traffic).
    SacchSsSingle,
    /// Multi superblock SACCH (voice traffic).
    SacchSsMulti,
}

impl Usc {
    /// Interpret the given 2 bits as a service class.
    pub fn from_bits(bits: u8) -> Usc {
        use self::Usc::*;

        match bits & 0x3 {
            0b00 => SacchNs,
            0b01 => Udch,
            0b10 => SacchSsSingle,
            _ => SacchSsMulti,
        }
    }

    /// Get the 2-bit field for the service class.
    pub fn bits(self) -> u8 {
        use self::Usc::*;

        match self {
            SacchNs => 0b00,
            Udch => 0b01,
            SacchSsSingle => 0b10,
            SacchSsMulti => 0b11,
        }
    }
}

/// FACCH stealing flags. Bit 1 marks the first half of the voice payload as
/// voice and bit 0 the second half; a clear bit means that half carries a
/// stolen FACCH1.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Steal {
    /// Both halves stolen for FACCH1.
    FacchBoth,
    /// First half stolen, second half voice.
    Facch1First,
    /// Second half stolen, first half voice.
    Facch1Second,
    /// All four voice groups present.
    None,
}

impl Steal {
    /// Interpret the given 2 bits as stealing flags.
    pub fn from_bits(bits: u8) -> Steal {
        use self::Steal::*;

        match bits & 0x3 {
            0b00 => FacchBoth,
            0b01 => Facch1First,
            0b10 => Facch1Second,
            _ => None,
        }
    }

    /// Get the 2-bit field for the stealing flags.
    pub fn bits(self) -> u8 {
        use self::Steal::*;

        match self {
            FacchBoth => 0b00,
            Facch1First => 0b01,
            Facch1Second => 0b10,
            None => 0b11,
        }
    }
}

/// Direction of travel for the current frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Mobile to repeater.
    Inbound,
    /// Repeater to mobile.
    Outbound,
}

/// Decoded LICH contents.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Lich {
    pub rfct: ChannelType,
    pub usc: Usc,
    pub option: Steal,
    pub direction: Direction,
}

impl Lich {
    /// Try to parse the LICH of the given air frame.
    ///
    /// A transmitted pair that is not complementary, or a parity failure,
    /// invalidates the channel.
    pub fn decode(frame: &[u8]) -> Option<Lich> {
        let mut byte = 0u8;

        for i in 0..8 {
            let bit = bits::get_bit(frame, LICH_OFFSET + 2 * i);
            let inv = bits::get_bit(frame, LICH_OFFSET + 2 * i + 1);

            if bit == inv {
                return None;
            }

            byte = byte << 1 | bit as u8;
        }

        if byte.count_ones() % 2 != 0 {
            return None;
        }

        Some(Lich {
            rfct: ChannelType::from_bits(byte >> 6),
            usc: Usc::from_bits(byte >> 4),
            option: Steal::from_bits(byte >> 2),
            direction: if byte & 0x02 == 0 {
                Direction::Inbound
            } else {
                Direction::Outbound
            },
        })
    }

    /// Write the LICH into the given air frame.
    pub fn encode(&self, frame: &mut [u8]) {
        let mut byte = self.rfct.bits() << 6
            | self.usc.bits() << 4
            | self.option.bits() << 2
            | match self.direction {
                Direction::Inbound => 0,
                Direction::Outbound => 0x02,
            };

        // Even parity in the LSB.
        byte |= byte.count_ones() as u8 & 1;

        for i in 0..8 {
            let bit = byte & 0x80 >> i != 0;
            bits::set_bit(frame, LICH_OFFSET + 2 * i, bit);
            bits::set_bit(frame, LICH_OFFSET + 2 * i + 1, !bit);
        }
    }
}
