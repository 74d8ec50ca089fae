//! Modem frame tags.

/// First byte of the 2-byte local prefix ahead of every air frame exchanged
/// with the modem and the peer network. The second prefix byte is reserved
/// and always zero.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Tag {
    /// A call header frame.
    Header,
    /// An in-call frame.
    Data,
    /// The final frame of a transmission.
    Eot,
    /// Carrier lost before the transmission ended.
    Lost,
}

impl Tag {
    /// Try to parse a tag from the given byte.
    pub fn from_bits(bits: u8) -> Option<Tag> {
        use self::Tag::*;

        match bits {
            0x00 => Some(Header),
            0x01 => Some(Data),
            0x02 => Some(Eot),
            0x03 => Some(Lost),
            _ => None,
        }
    }

    /// Get the wire byte for the tag.
    pub fn bits(self) -> u8 {
        use self::Tag::*;

        match self {
            Header => 0x00,
            Data => 0x01,
            Eot => 0x02,
            Lost => 0x03,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tags() {
        for bits in 0..4 {
            assert_eq!(Tag::from_bits(bits).unwrap().bits(), bits);
        }

        assert_eq!(Tag::from_bits(0x01), Some(Tag::Data));
        assert_eq!(Tag::from_bits(0x02), Some(Tag::Eot));
        assert_eq!(Tag::from_bits(0x04), None);
    }
}
