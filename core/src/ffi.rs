//! C ABI for scripting hosts that bind native helpers by symbol.
//!
//! The host owns the buffer and must keep it readable for `len` bytes for
//! the duration of the call. Nothing is retained afterwards.

#![allow(clippy::not_unsafe_ptr_arg_deref)]

use crate::math::stats::compute_rms_power;
use log::warn;
use std::slice;

/// RMS power of `len` bytes of packed 16-bit samples at `ptr`.
///
/// C callers cannot receive a `Result`, so a null pointer or a buffer with
/// no complete sample returns `0.0` rather than NaN.
#[no_mangle]
pub extern "C" fn pcmpower_calculate_power(ptr: *const u8, len: usize) -> f64 {
    if ptr.is_null() {
        warn!("calculate_power called with a null buffer");
        return 0.0;
    }

    let buffer = unsafe { slice::from_raw_parts(ptr, len) };
    match compute_rms_power(buffer) {
        Ok(rms) => rms,
        Err(err) => {
            warn!("calculate_power: {}", err);
            0.0
        }
    }
}
