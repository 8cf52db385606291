/// Declares an open enum: a transparent newtype over an integer with one associated constant per
/// named variant.
///
/// Unlike a Rust `enum`, every bit pattern of the underlying integer is a valid value, so raw
/// encoding fields can be converted without a fallible step. `validate()` reports whether the value
/// is one of the named variants.
#[macro_export]
macro_rules! fake_enum{
    {
        #[repr($repr:ident)]
        $(#[$meta:meta])*
        $vis:vis enum $name:ident{
            $( $(#[$meta2:meta])* $var:ident = $discrim:literal),*
            $(,)?
        }
    } => {

        #[repr(transparent)]
        #[derive(Copy, Clone, Hash, PartialEq, Eq)]
        $(#[$meta])*
        $vis struct $name(pub $repr);

        #[allow(non_upper_case_globals)]
        impl $name{
            $(
                $(#[$meta2])* pub const $var: Self = Self($discrim);
            )*

            #[allow(unreachable_patterns)]
            pub const fn validate(self) -> bool{
                match self.0{
                    $($discrim => true,)*
                    _ => false
                }
            }

            pub const fn get(self) -> $repr{
                self.0
            }
        }

        impl ::core::fmt::Display for $name{
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result{
                match *self{
                    $(Self::$var => f.write_str(::core::stringify!($var)),)*
                    _ => {
                        f.write_str(::core::stringify!($name))?;
                        f.write_str("(")?;
                        ::core::fmt::Display::fmt(&self.0, f)?;
                        f.write_str(")")
                    }
                }
            }
        }

        impl ::core::fmt::Debug for $name{
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result{
                ::core::fmt::Display::fmt(self, f)
            }
        }

        impl<T: $crate::bitfield::BitfieldTy> $crate::bitfield::FromBitfield<T> for $name where $repr: $crate::bitfield::FromBitfield<T>{
            fn from_bits(bits: T) -> Self{
                Self($crate::bitfield::FromBitfield::<T>::from_bits(bits))
            }
            fn to_bits(self) -> T{
                $crate::bitfield::FromBitfield::<T>::to_bits(self.0)
            }
        }

        impl $crate::bitfield::DisplayBitfield for $name{
            fn present(&self) -> bool{
                true
            }

            fn display(&self, name: &str, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result{
                f.write_str(name)?;
                f.write_str("(")?;
                ::core::fmt::Display::fmt(self, f)?;
                f.write_str(")")
            }
        }
    }
}
