//! Peer network framing.
//!
//! Frames mirrored to peer sites are the modem-format frames themselves
//! (tag prefix included), wrapped in a small datagram header: a protocol
//! tag and a sequence number. Transport is the host's concern.

/// Protocol tag leading every peer datagram.
pub const PROTOCOL_TAG: &[u8; 4] = b"NXDN";

/// Datagram header bytes ahead of the payload.
pub const HEADER_BYTES: usize = 6;

/// Sink for frames mirrored to the peer network.
pub trait PeerLink {
    /// Ship one modem-format frame to the peers.
    fn write_frame(&mut self, data: &[u8]);
}

/// Wraps modem-format frames into peer datagrams.
#[derive(Clone, Debug, Default)]
pub struct Framer {
    seq: u16,
}

impl Framer {
    /// Construct a `Framer` with the sequence starting at zero.
    pub fn new() -> Framer {
        Framer::default()
    }

    /// Wrap a frame: protocol tag, big-endian sequence number, payload.
    pub fn wrap(&mut self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_BYTES + payload.len());

        out.extend_from_slice(PROTOCOL_TAG);
        out.extend_from_slice(&self.seq.to_be_bytes());
        out.extend_from_slice(payload);

        self.seq = self.seq.wrapping_add(1);

        out
    }

    /// Try to unwrap a peer datagram into its sequence number and payload.
    pub fn unwrap(data: &[u8]) -> Option<(u16, &[u8])> {
        if data.len() < HEADER_BYTES || &data[..4] != PROTOCOL_TAG {
            return None;
        }

        Some((
            u16::from_be_bytes([data[4], data[5]]),
            &data[HEADER_BYTES..],
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut framer = Framer::new();

        let wrapped = framer.wrap(&[0x01, 0x00, 0xCD, 0xF5]);
        let (seq, payload) = Framer::unwrap(&wrapped).unwrap();
        assert_eq!(seq, 0);
        assert_eq!(payload, &[0x01, 0x00, 0xCD, 0xF5]);

        let wrapped = framer.wrap(&[0x02]);
        let (seq, payload) = Framer::unwrap(&wrapped).unwrap();
        assert_eq!(seq, 1);
        assert_eq!(payload, &[0x02]);
    }

    #[test]
    fn test_seq_wraps() {
        let mut framer = Framer { seq: 0xFFFF };

        let wrapped = framer.wrap(&[]);
        assert_eq!(Framer::unwrap(&wrapped).unwrap().0, 0xFFFF);
        assert_eq!(framer.seq, 0);
    }

    #[test]
    fn test_rejects_foreign() {
        assert_eq!(Framer::unwrap(b"P25\x00\x00\x01xx"), None);
        assert_eq!(Framer::unwrap(b"NXDN\x00"), None);
        assert_eq!(Framer::unwrap(b""), None);
    }
}
