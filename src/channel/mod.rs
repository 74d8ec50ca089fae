//! Physical-layer control channel codecs.

pub mod facch1;
pub mod lich;
pub mod sacch;
