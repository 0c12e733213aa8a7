//! Bounds checking and framing for the battery-backed RAM.
//!
//! The RAM starts at [`RegAddr::Ram`] and its size comes from the
//! [`DeviceVariant`]. Every access is checked here before the driver touches
//! the bus.

use crate::registers::{DeviceVariant, RegAddr, RAM_SIZE_MAX};

/// Register address byte plus the largest RAM payload.
pub(crate) const FRAME_LEN: usize = 1 + RAM_SIZE_MAX as usize;

/// Returns the first register of `offset..offset + len`, or `None` if the
/// range does not fit inside the variant's RAM.
pub(crate) fn start_register(variant: &DeviceVariant, offset: usize, len: usize) -> Option<u8> {
    let end = offset.checked_add(len)?;
    if end > variant.nvram_capacity() {
        return None;
    }
    let offset = u8::try_from(offset).ok()?;
    (RegAddr::Ram as u8).checked_add(offset)
}

/// Builds a register write frame: the start register followed by `data`.
///
/// Returns the frame and the number of bytes in use. `data` must already have
/// passed [`start_register`], which bounds it by [`RAM_SIZE_MAX`].
pub(crate) fn write_frame(start: u8, data: &[u8]) -> ([u8; FRAME_LEN], usize) {
    let mut frame = [0u8; FRAME_LEN];
    let len = data.len().min(FRAME_LEN - 1);
    frame[0] = start;
    frame[1..=len].copy_from_slice(&data[..len]);
    (frame, len + 1)
}
