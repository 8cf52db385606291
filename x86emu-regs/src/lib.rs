use bytemuck::{Pod, Zeroable};

use x86emu_primitives::bitfield;
use x86emu_types::{Reg16, Reg8, SegReg, SizeControl};

bitfield! {
    pub struct Flags : u32{
        pub carry @ 0 : bool,
        pub reserved1 @ 1 : bool,
        pub parity @ 2 : bool,
        pub aux_carry @ 4 : bool,
        pub zero @ 6 : bool,
        pub sign @ 7 : bool,
        pub trap @ 8 : bool,
        pub intr @ 9 : bool,
        pub direction @ 10 : bool,
        pub overflow @ 11 : bool,
        pub iopl @ 12..14 : u8,
        pub nested_task @ 14 : bool,
    }
}

impl Flags {
    /// Only the always-set reserved bit.
    pub const RESET: Flags = Flags::from_bits(0x0000_0002);
}

bitfield! {
    pub struct Cr0 : u32{
        pub pe @ 0 : bool,
        pub mp @ 1 : bool,
        pub em @ 2 : bool,
        pub ts @ 3 : bool,
        pub et @ 4 : bool,
        pub ne @ 5 : bool,
        pub wp @ 16 : bool,
        pub am @ 18 : bool,
        pub nw @ 29 : bool,
        pub cd @ 30 : bool,
        pub pg @ 31 : bool,
    }
}

impl Cr0 {
    /// The machine status word as it reads after reset: upper MSW bits set, real mode.
    pub const RESET: Cr0 = Cr0::from_bits(0x0000_FFF0);

    #[inline]
    pub fn protected_mode(&self) -> bool {
        self.pe()
    }
}

bitfield! {
    pub struct SegmentAccess : u16{
        pub accessed @ 0 : bool,
        pub readable_writable @ 1 : bool,
        pub direction_conforming @ 2 : bool,
        pub executable @ 3 : bool,
        pub descriptor_type @ 4 : bool,
        pub dpl @ 5..7 : u8,
        pub present @ 7 : bool,
        pub available @ 12 : bool,
        pub long_mode @ 13 : bool,
        pub default_size @ 14 : bool,
        pub granularity @ 15 : bool,
    }
}

impl SegmentAccess {
    /// Present, writable, accessed data segment.
    pub const DATA_DEFAULT: SegmentAccess = SegmentAccess::from_bits(0x0093);
    /// Present, readable, accessed code segment.
    pub const CODE_DEFAULT: SegmentAccess = SegmentAccess::from_bits(0x009b);
}

/// The hidden (cached) part of a segment register alongside its visible selector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct SegmentDescriptor {
    pub selector: u16,
    pub limit: u16,
    pub base: u32,
    pub access: SegmentAccess,
    #[doc(hidden)]
    pub __reserved: u16,
}

impl SegmentDescriptor {
    pub const fn reset(access: SegmentAccess) -> Self {
        Self {
            selector: 0,
            limit: 0xFFFF,
            base: 0,
            access,
            __reserved: 0,
        }
    }

    /// The operand and address size selected by this segment when it is the code segment.
    #[inline]
    pub fn default_size(&self) -> SizeControl {
        SizeControl::from_default_bit(self.access.default_size())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(transparent)]
pub struct Segments([SegmentDescriptor; SegReg::COUNT]);

impl Segments {
    pub const fn reset() -> Self {
        let mut segs = [SegmentDescriptor::reset(SegmentAccess::DATA_DEFAULT); SegReg::COUNT];

        segs[SegReg::Cs.index()] = SegmentDescriptor {
            selector: 0xF000,
            base: 0x00FF_0000,
            ..SegmentDescriptor::reset(SegmentAccess::CODE_DEFAULT)
        };

        Self(segs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegReg, &SegmentDescriptor)> {
        SegReg::ALL.into_iter().zip(self.0.iter())
    }

    /// The descriptor for `seg`, or `None` for a value outside the named segment registers.
    pub fn get(&self, seg: SegReg) -> Option<&SegmentDescriptor> {
        self.0.get(seg.index())
    }

    pub fn get_mut(&mut self, seg: SegReg) -> Option<&mut SegmentDescriptor> {
        self.0.get_mut(seg.index())
    }
}

/// Panics if `index` is not one of the named segment registers. Use [`Segments::get`] for
/// unchecked values.
impl core::ops::Index<SegReg> for Segments {
    type Output = SegmentDescriptor;
    fn index(&self, index: SegReg) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl core::ops::IndexMut<SegReg> for Segments {
    fn index_mut(&mut self, index: SegReg) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}

/// The eight general purpose registers.
///
/// The four accumulator-style registers additionally expose their low and high bytes as [`Reg8`]
/// halves; writing a half only touches those eight bits.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(transparent)]
pub struct Gprs([u16; 8]);

impl Gprs {
    pub const fn new() -> Self {
        Self([0; 8])
    }

    #[inline]
    pub fn get8(&self, reg: Reg8) -> u8 {
        let word = self[reg.parent()];
        if reg.is_high() {
            (word >> 8) as u8
        } else {
            word as u8
        }
    }

    #[inline]
    pub fn set8(&mut self, reg: Reg8, val: u8) {
        let word = &mut self[reg.parent()];
        if reg.is_high() {
            *word = (*word & 0x00FF) | ((val as u16) << 8);
        } else {
            *word = (*word & 0xFF00) | (val as u16);
        }
    }
}

impl core::ops::Index<Reg16> for Gprs {
    type Output = u16;
    fn index(&self, index: Reg16) -> &Self::Output {
        &self.0[(index.get() & 7) as usize]
    }
}

impl core::ops::IndexMut<Reg16> for Gprs {
    fn index_mut(&mut self, index: Reg16) -> &mut Self::Output {
        &mut self.0[(index.get() & 7) as usize]
    }
}

/// Architecturally visible processor state that persists across instructions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Regs {
    pub gprs: Gprs,
    pub segs: Segments,
    pub ip: u32,
    pub flags: Flags,
    pub cr0: Cr0,
}

impl Regs {
    /// The power-on reset state.
    pub const fn new() -> Self {
        Self {
            gprs: Gprs::new(),
            segs: Segments::reset(),
            ip: 0x0000_FFF0,
            flags: Flags::RESET,
            cr0: Cr0::RESET,
        }
    }
}

impl Default for Regs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_reset_segments() {
        let segs = Segments::reset();
        let cs = segs[SegReg::Cs];
        assert_eq!(cs.selector, 0xF000);
        assert_eq!(cs.base, 0xFF0000);
        assert_eq!(cs.access, SegmentAccess::CODE_DEFAULT);
        for (seg, desc) in segs.iter() {
            assert_eq!(desc.limit, 0xFFFF, "{seg}");
            if seg != SegReg::Cs {
                assert_eq!(desc.access, SegmentAccess::DATA_DEFAULT, "{seg}");
                assert_eq!(desc.base, 0, "{seg}");
            }
        }
    }

    #[test]
    fn test_checked_segment_access() {
        let mut segs = Segments::reset();
        assert_eq!(segs.get(SegReg::Cs).map(|d| d.selector), Some(0xF000));
        assert!(segs.get(SegReg(6)).is_none());
        assert!(segs.get_mut(SegReg(0xFF)).is_none());
    }

    #[test]
    fn test_reset_control_state() {
        let regs = Regs::new();
        assert_eq!(regs.ip, 0xFFF0);
        assert_eq!(regs.flags.bits(), 2);
        assert!(!regs.flags.intr());
        assert_eq!(regs.cr0.bits(), 0xFFF0);
        assert!(!regs.cr0.protected_mode());
        assert_eq!(regs.segs[SegReg::Cs].default_size(), SizeControl::Word);
    }

    #[test]
    fn test_access_flag_fields() {
        let code = SegmentAccess::CODE_DEFAULT;
        assert!(code.executable());
        assert!(code.present());
        assert!(code.readable_writable());
        assert!(!code.default_size());
        assert!(!SegmentAccess::DATA_DEFAULT.executable());
    }

    #[test]
    fn test_halves_combine() {
        let mut gprs = Gprs::new();
        gprs.set8(Reg8::ah, 0x12);
        gprs.set8(Reg8::al, 0x34);
        assert_eq!(gprs[Reg16::ax], 0x1234);
        assert_eq!(gprs.get8(Reg8::ah), 0x12);
        gprs[Reg16::cx] = 0xBEEF;
        gprs.set8(Reg8::ch, 0x00);
        assert_eq!(gprs[Reg16::cx], 0x00EF);
    }

    #[test]
    fn test_flags_interrupt_bit() {
        let mut flags = Flags::RESET;
        flags.set_intr(true);
        assert_eq!(flags.bits(), 0x0202);
        assert_eq!(flags.to_string(), "reserved1 | intr");
    }
}
