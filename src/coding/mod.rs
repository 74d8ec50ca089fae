//! Error detection and correction codes used by the channel codecs and the
//! voice FEC regenerator.

pub mod crc;
pub mod golay;
pub mod hamming;
