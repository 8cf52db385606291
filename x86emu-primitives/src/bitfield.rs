#[doc(hidden)]
pub mod __exports {
    pub use bytemuck::{Pod, Zeroable};
    pub use paste::paste;
}

#[doc(hidden)]
#[macro_export]
macro_rules! __bitfield_placement {
    ($start:literal) => {
        ($start as u32)
    };
    ($start:literal .. $end:literal) => {
        ($start as u32)..($end as u32)
    };
}

/// Declares a transparent wrapper around a native integer with one accessor per field.
///
/// A field is placed either at a single bit (`name @ 9: bool`) or over a half-open bit range
/// (`name @ 12..14: u8`). For every field `foo` the macro generates `foo()`, `set_foo()`,
/// `insert_foo()` and `with_foo()`.
#[macro_export]
macro_rules! bitfield{
    {
        $(#[$meta:meta])*
        $vis:vis struct $bitfield_ty:ident : $base_ty:ty{
            $($(#[$meta2:meta])* $vis2:vis $field_name:ident @ $placement_start:literal $(.. $placement_end:literal)? : $ty:ty ),*
            $(,)?
        }
    } => {

        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, Default, Debug, $crate::bitfield::__exports::Zeroable, $crate::bitfield::__exports::Pod)]
        #[repr(transparent)]
        $vis struct $bitfield_ty($base_ty);

        const _: () = {
            fn test() -> impl $crate::bitfield::BitfieldTy{
                <$base_ty>::default()
            }
        };

        impl $bitfield_ty{

            $vis const fn from_bits(val: $base_ty) -> Self{
                Self(val)
            }

            $vis const fn bits(self) -> $base_ty{
                self.0
            }

            $vis const fn empty() -> Self{
                Self(0)
            }

            $(
                #[inline]
                $(#[$meta2])*
                $vis2 fn $field_name(&self) -> $ty{
                    let placement = $crate::__bitfield_placement!($placement_start $(.. $placement_end)?);
                    let bits = $crate::bitfield::BitfieldPosition::<$base_ty>::extract(&placement, self.0);

                    $crate::bitfield::FromBitfield::<$base_ty>::from_bits(bits)
                }

                $crate::bitfield::__exports::paste!{
                    #[inline]
                    $(#[$meta2])*
                    $vis2 fn [<with_ $field_name>](val: $ty) -> Self{
                        Self::empty().[<insert_ $field_name>](val)
                    }

                    #[inline]
                    $(#[$meta2])*
                    $vis2 fn [<insert_ $field_name>](mut self, val: $ty) -> Self{
                        self.[<set_ $field_name>](val);
                        self
                    }

                    #[inline]
                    $(#[$meta2])*
                    $vis2 fn [<set_ $field_name>](&mut self, val: $ty){
                        let placement = $crate::__bitfield_placement!($placement_start $(.. $placement_end)?);

                        let bits = $crate::bitfield::FromBitfield::<$base_ty>::to_bits(val);

                        self.0 = $crate::bitfield::BitfieldPosition::<$base_ty>::insert(&placement, self.0, bits);
                    }
                }
            )*
        }

        impl ::core::ops::BitAnd for $bitfield_ty{
            type Output = Self;
            #[inline]
            fn bitand(self, rhs: Self) -> Self{
                Self(self.0 & rhs.0)
            }
        }

        impl ::core::ops::BitOr for $bitfield_ty{
            type Output = Self;
            #[inline]
            fn bitor(self, rhs: Self) -> Self{
                Self(self.0 | rhs.0)
            }
        }

        impl ::core::ops::Not for $bitfield_ty{
            type Output = Self;

            #[inline]
            fn not(self) -> Self{
                Self(!self.0)
            }
        }

        impl ::core::fmt::Display for $bitfield_ty{
            #[allow(unused_variables, unused_mut, unused_assignments)]
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result{
                let mut sep = "";
                $(
                    {
                        let field = self.$field_name();
                        if $crate::bitfield::DisplayBitfield::present(&field){
                            f.write_str(sep)?;
                            sep = " | ";
                            $crate::bitfield::DisplayBitfield::display(&field, ::core::stringify!($field_name), f)?;
                        }
                    }
                )*

                Ok(())
            }
        }
    }
}

use std::ops::{BitAnd, BitOr, Not, Range, Shl, Shr};

pub use bitfield;

mod private {
    pub trait Sealed {}
}

use bytemuck::Pod;
use private::Sealed;

impl Sealed for u8 {}
impl Sealed for u16 {}
impl Sealed for u32 {}
impl Sealed for u64 {}
impl Sealed for Range<u32> {}

pub trait BitfieldTy:
    Sealed
    + Sized
    + Pod
    + Default
    + PartialEq
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    const ZERO: Self;

    /// The low `width` bits set, saturating at the width of `Self`.
    fn low_mask(width: u32) -> Self;
}

macro_rules! impl_bitfield_ty{
    ($($tys:ty),*) => {
        $(
            impl BitfieldTy for $tys{
                const ZERO: Self = 0;

                #[inline]
                fn low_mask(width: u32) -> Self{
                    crate::low_mask(width) as $tys
                }
            }
        )*
    }
}

impl_bitfield_ty!(u8, u16, u32, u64);

pub trait BitfieldPosition<T: BitfieldTy>: Sealed {
    fn extract(&self, bits: T) -> T;
    fn insert(&self, val: T, bits: T) -> T;
}

impl<T: BitfieldTy> BitfieldPosition<T> for u32 {
    #[inline]
    fn extract(&self, bits: T) -> T {
        (bits >> *self) & T::low_mask(1)
    }

    #[inline]
    fn insert(&self, val: T, bits: T) -> T {
        let mask = T::low_mask(1) << *self;
        (val & !mask) | ((bits << *self) & mask)
    }
}

impl<T: BitfieldTy> BitfieldPosition<T> for Range<u32> {
    #[inline]
    fn extract(&self, bits: T) -> T {
        (bits >> self.start) & T::low_mask(self.end - self.start)
    }

    #[inline]
    fn insert(&self, val: T, bits: T) -> T {
        let mask = T::low_mask(self.end - self.start) << self.start;
        (val & !mask) | ((bits << self.start) & mask)
    }
}

pub trait FromBitfield<T: BitfieldTy>: Sized {
    fn from_bits(bits: T) -> Self;
    fn to_bits(self) -> T;
}

impl<T: BitfieldTy> FromBitfield<T> for bool {
    #[inline]
    fn from_bits(bits: T) -> Self {
        bits != T::ZERO
    }

    #[inline]
    fn to_bits(self) -> T {
        if self {
            T::low_mask(1)
        } else {
            T::ZERO
        }
    }
}

macro_rules! impl_from_bitfield_truncate{
    {
        $($bitfield_ty:ident: $($as_ty:ident),*;)*
    } => {
        $(
            $(
                impl FromBitfield<$bitfield_ty> for $as_ty{
                    #[inline]
                    #[allow(clippy::unnecessary_cast)]
                    fn from_bits(bits: $bitfield_ty) -> Self{
                        bits as $as_ty
                    }

                    #[inline]
                    #[allow(clippy::unnecessary_cast)]
                    fn to_bits(self) -> $bitfield_ty{
                        self as $bitfield_ty
                    }
                }
            )*
        )*
    }
}

impl_from_bitfield_truncate! {
    u8: u8, u16, u32, u64;
    u16: u8, u16, u32, u64;
    u32: u8, u16, u32, u64;
    u64: u8, u16, u32, u64;
}

pub trait DisplayBitfield {
    fn present(&self) -> bool;
    fn display(&self, name: &str, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result;
}

impl DisplayBitfield for bool {
    fn present(&self) -> bool {
        *self
    }

    fn display(&self, name: &str, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(name)
    }
}

macro_rules! impl_display_bitfield_integer {
    ($($ty:ty),*) => {
        $(
            impl DisplayBitfield for $ty {
                fn present(&self) -> bool {
                    *self != 0
                }
                fn display(&self, name: &str, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    f.write_str(name)?;
                    f.write_str("(")?;
                    f.write_fmt(format_args!("{:#X}", self))?;
                    f.write_str(")")
                }
            }
        )*
    };
}

impl_display_bitfield_integer!(u8, u16, u32, u64);

#[cfg(test)]
mod test {
    crate::bitfield! {
        pub struct Sample : u16{
            pub low @ 0: bool,
            pub mid @ 4..7: u8,
            pub top @ 15: bool,
        }
    }

    #[test]
    fn test_single_bit_roundtrip() {
        let mut s = Sample::empty();
        s.set_top(true);
        assert_eq!(s.bits(), 0x8000);
        assert!(s.top());
        assert!(!s.low());
        s.set_top(false);
        assert_eq!(s.bits(), 0);
    }

    #[test]
    fn test_range_insert_preserves_neighbours() {
        let s = Sample::from_bits(0xFFFF).insert_mid(0b010);
        assert_eq!(s.mid(), 0b010);
        assert_eq!(s.bits(), 0xFFAF);
    }

    #[test]
    fn test_range_truncates_wide_values() {
        let s = Sample::with_mid(0xFF);
        assert_eq!(s.mid(), 0b111);
        assert_eq!(s.bits(), 0x0070);
    }

    #[test]
    fn test_display_lists_present_fields() {
        let s = Sample::with_low(true) | Sample::with_mid(3);
        assert_eq!(s.to_string(), "low | mid(0x3)");
    }
}
