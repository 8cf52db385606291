use x86emu_primitives::fake_enum;

use bytemuck::{Pod, Zeroable};

/// A physical (post-translation) address on the 32-bit bus.
pub type PhysAddr = u32;

/// The processor model the core is initialized as.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Default)]
pub enum CpuType {
    I8086,
    I186,
    #[default]
    I286,
    I386,
}

fake_enum! {
    #[repr(u8)]
    #[derive(Pod, Zeroable, PartialOrd, Ord)]
    pub enum SegReg{
        Es = 0,
        Cs = 1,
        Ss = 2,
        Ds = 3,
        Fs = 4,
        Gs = 5,
    }
}

impl SegReg {
    pub const COUNT: usize = 6;

    pub const ALL: [SegReg; Self::COUNT] = [
        SegReg::Es,
        SegReg::Cs,
        SegReg::Ss,
        SegReg::Ds,
        SegReg::Fs,
        SegReg::Gs,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

fake_enum! {
    #[repr(u8)]
    pub enum TranslateKind{
        Exec = 0,
        Read = 1,
        Write = 2,
    }
}

fake_enum! {
    #[repr(u8)]
    pub enum SizeControl{
        Word = 0,
        Dword = 1,
    }
}

impl SizeControl {
    /// Maps the default-size (D/B) bit of a code segment to the size it selects.
    #[inline]
    pub const fn from_default_bit(db: bool) -> Self {
        if db {
            SizeControl::Dword
        } else {
            SizeControl::Word
        }
    }

    #[inline]
    pub const fn as_bytes(self) -> u32 {
        2 << self.0
    }

    #[inline]
    pub const fn as_bits(self) -> u32 {
        self.as_bytes() * 8
    }
}

macro_rules! x86_registers{
    {
        $(#[$meta:meta])*
        pub struct $reg_ty:ident {
            $($name:ident => $val:literal),* $(,)?
        }
    } => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Hash, PartialEq, Eq, Pod, Zeroable)]
        pub struct $reg_ty(pub u8);

        #[allow(non_upper_case_globals)]
        impl $reg_ty{
            $(pub const $name: Self = Self($val);)*

            /// Builds a register from the 3-bit encoding used in opcodes and ModRM fields.
            #[inline]
            pub const fn from_encoding(bits: u8) -> Self{
                Self(bits & 7)
            }

            #[inline]
            pub const fn get(self) -> u8{
                self.0
            }
        }

        impl ::core::fmt::Display for $reg_ty{
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result{
                match self.0{
                    $($val => f.write_str(::core::stringify!($name)),)*
                    val => f.write_fmt(::core::format_args!("{}({})", ::core::stringify!($reg_ty), val))
                }
            }
        }

        impl ::core::fmt::Debug for $reg_ty{
            fn fmt(&self, f: &mut core::fmt::Formatter) -> ::core::fmt::Result{
                ::core::fmt::Display::fmt(self, f)
            }
        }
    }
}

x86_registers! {
    /// A 16-bit general purpose register, numbered by its instruction encoding.
    pub struct Reg16 {
        ax => 0,
        cx => 1,
        dx => 2,
        bx => 3,
        sp => 4,
        bp => 5,
        si => 6,
        di => 7,
    }
}

x86_registers! {
    /// An 8-bit register half. Encodings 0-3 are the low halves of ax/cx/dx/bx, 4-7 the high halves.
    pub struct Reg8 {
        al => 0,
        cl => 1,
        dl => 2,
        bl => 3,
        ah => 4,
        ch => 5,
        dh => 6,
        bh => 7,
    }
}

impl Reg8 {
    /// The 16-bit register that contains this half.
    #[inline]
    pub const fn parent(self) -> Reg16 {
        Reg16(self.0 & 3)
    }

    #[inline]
    pub const fn is_high(self) -> bool {
        (self.0 & 4) != 0
    }
}
