//! Frame sync word handling.

use crate::bits;
use crate::consts::{FSW, FSW_BITS};

/// Overwrite the frame sync word at the head of an air frame.
pub fn insert_fsw(frame: &mut [u8]) {
    bits::set_bits(frame, 0, FSW_BITS, FSW);
}

/// Check whether an air frame begins with the frame sync word.
pub fn check_fsw(frame: &[u8]) -> bool {
    bits::get_bits(frame, 0, FSW_BITS) == FSW
}
