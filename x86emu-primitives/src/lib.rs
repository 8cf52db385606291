//! Declarative helpers shared by the register and decode crates.
//!
//! [`bitfield!`] declares a transparent wrapper around a native integer with typed accessors for
//! each field, and [`fake_enum!`] declares an "open" enum: a newtype over an integer with named
//! constants, which can still carry values that do not correspond to any named variant (as raw
//! instruction encodings routinely do).

pub mod bitfield;
pub mod fake_enum;

/// Returns the all-ones mask covering the low `width` bits of a 64-bit value.
#[inline]
pub const fn low_mask(width: u32) -> u64 {
    if width >= u64::BITS {
        !0
    } else {
        (1u64 << width) - 1
    }
}
