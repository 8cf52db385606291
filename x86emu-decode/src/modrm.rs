use x86emu_errors::{CPUResult, Unimplemented};
use x86emu_primitives::bitfield;
use x86emu_regs::Gprs;
use x86emu_types::{Reg16, SegReg};

use crate::stream::{FromInstructionStream, InstructionStream};

bitfield! {
    pub struct ModRm : u8 {
        pub rm @ 0..3 : u8,
        pub reg @ 3..6 : u8,
        pub mode @ 6..8 : u8,
    }
}

impl ModRm {
    #[inline]
    pub fn is_register_direct(&self) -> bool {
        self.mode() == 3
    }
}

impl<Ctx> FromInstructionStream<Ctx> for ModRm {
    fn decode<I: InstructionStream>(stream: &mut I, _: Ctx) -> CPUResult<Self> {
        stream.next_byte().map(ModRm::from_bits)
    }
}

/// A resolved memory operand: the registers summed into it, the displacement and the segment it
/// defaults to when no override prefix is active.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EffectiveAddress {
    pub base: &'static [Reg16],
    pub disp: u32,
    pub seg: SegReg,
    pub offset: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModRmOperand {
    /// Register-direct form (`mode == 3`), carrying the 3-bit register encoding.
    Register(u8),
    Memory(EffectiveAddress),
}

/// Computes the memory operand of a ModRM byte whose mode is not register-direct.
///
/// Implementations consume any displacement bytes that follow the ModRM byte.
pub trait AddressingPolicy {
    fn effective_address<I: InstructionStream>(
        &self,
        modrm: ModRm,
        stream: &mut I,
    ) -> CPUResult<EffectiveAddress>;
}

const BX_SI: &[Reg16] = &[Reg16::bx, Reg16::si];
const BX_DI: &[Reg16] = &[Reg16::bx, Reg16::di];
const BP_SI: &[Reg16] = &[Reg16::bp, Reg16::si];
const BP_DI: &[Reg16] = &[Reg16::bp, Reg16::di];
const SI: &[Reg16] = &[Reg16::si];
const DI: &[Reg16] = &[Reg16::di];
const BP: &[Reg16] = &[Reg16::bp];
const BX: &[Reg16] = &[Reg16::bx];

/// The 16-bit addressing table, evaluated against a snapshot of the general purpose registers.
#[derive(Copy, Clone, Debug)]
pub struct Addressing16 {
    gprs: Gprs,
}

impl Addressing16 {
    pub const fn new(gprs: Gprs) -> Self {
        Self { gprs }
    }

    const fn base(rm: u8) -> (&'static [Reg16], SegReg) {
        match rm & 7 {
            0 => (BX_SI, SegReg::Ds),
            1 => (BX_DI, SegReg::Ds),
            2 => (BP_SI, SegReg::Ss),
            3 => (BP_DI, SegReg::Ss),
            4 => (SI, SegReg::Ds),
            5 => (DI, SegReg::Ds),
            6 => (BP, SegReg::Ss),
            _ => (BX, SegReg::Ds),
        }
    }
}

impl AddressingPolicy for Addressing16 {
    fn effective_address<I: InstructionStream>(
        &self,
        modrm: ModRm,
        stream: &mut I,
    ) -> CPUResult<EffectiveAddress> {
        // [disp16]: mode 0 with rm 6 has no base register.
        if modrm.mode() == 0 && modrm.rm() == 6 {
            let disp = stream.next_word()? as u32;
            return Ok(EffectiveAddress {
                base: &[],
                disp,
                seg: SegReg::Ds,
                offset: disp,
            });
        }

        let disp = match modrm.mode() {
            0 => 0,
            1 => (stream.next_byte()? as i8 as i16 as u16) as u32,
            _ => stream.next_word()? as u32,
        };

        let (base, seg) = Self::base(modrm.rm());
        let offset = base
            .iter()
            .fold(disp as u16, |acc, &r| acc.wrapping_add(self.gprs[r]));

        Ok(EffectiveAddress {
            base,
            disp,
            seg,
            offset: offset as u32,
        })
    }
}

/// SIB-based 32-bit addressing. Not built yet; every memory form reports itself unimplemented.
#[derive(Copy, Clone, Debug, Default)]
pub struct Addressing32;

impl AddressingPolicy for Addressing32 {
    fn effective_address<I: InstructionStream>(
        &self,
        _: ModRm,
        _: &mut I,
    ) -> CPUResult<EffectiveAddress> {
        Err(Unimplemented("32-bit addressing").into())
    }
}

/// A ModRM byte together with the operand it selects.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodedModRm {
    pub modrm: ModRm,
    pub operand: ModRmOperand,
}

impl<'p, P: AddressingPolicy> FromInstructionStream<&'p P> for DecodedModRm {
    fn decode<I: InstructionStream>(stream: &mut I, policy: &'p P) -> CPUResult<Self> {
        let modrm: ModRm = stream.fetch()?;

        let operand = if modrm.is_register_direct() {
            ModRmOperand::Register(modrm.rm())
        } else {
            ModRmOperand::Memory(policy.effective_address(modrm, stream)?)
        };

        Ok(Self { modrm, operand })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::stream::ByteStream;
    use x86emu_errors::CPUError;

    fn gprs() -> Gprs {
        let mut g = Gprs::new();
        g[Reg16::bx] = 0x1000;
        g[Reg16::si] = 0x0200;
        g[Reg16::di] = 0x0030;
        g[Reg16::bp] = 0xFFF0;
        g
    }

    fn decode(bytes: &[u8]) -> (DecodedModRm, usize) {
        let mut s = ByteStream::new(bytes);
        let d = s
            .fetch_with::<_, DecodedModRm>(&Addressing16::new(gprs()))
            .unwrap();
        (d, s.position())
    }

    #[test]
    fn test_register_direct() {
        let (d, len) = decode(&[0b11_010_011]);
        assert_eq!(d.modrm.reg(), 2);
        assert_eq!(d.operand, ModRmOperand::Register(3));
        assert_eq!(len, 1);
    }

    #[test]
    fn test_bx_si_no_disp() {
        let (d, len) = decode(&[0b00_000_000]);
        let ModRmOperand::Memory(ea) = d.operand else {
            panic!("expected memory operand")
        };
        assert_eq!(ea.base, BX_SI);
        assert_eq!(ea.seg, SegReg::Ds);
        assert_eq!(ea.offset, 0x1200);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_disp8_is_sign_extended() {
        let (d, len) = decode(&[0b01_000_111, 0xFF]);
        let ModRmOperand::Memory(ea) = d.operand else {
            panic!("expected memory operand")
        };
        assert_eq!(ea.base, BX);
        assert_eq!(ea.offset, 0x0FFF);
        assert_eq!(len, 2);
    }

    #[test]
    fn test_bp_forms_default_to_stack_segment() {
        let (d, len) = decode(&[0b10_000_110, 0x20, 0x00]);
        let ModRmOperand::Memory(ea) = d.operand else {
            panic!("expected memory operand")
        };
        assert_eq!(ea.base, BP);
        assert_eq!(ea.seg, SegReg::Ss);
        // 0xFFF0 + 0x20 wraps within the 16-bit offset space
        assert_eq!(ea.offset, 0x0010);
        assert_eq!(len, 3);
    }

    #[test]
    fn test_direct_address_form() {
        let (d, len) = decode(&[0b00_101_110, 0x34, 0x12]);
        let ModRmOperand::Memory(ea) = d.operand else {
            panic!("expected memory operand")
        };
        assert!(ea.base.is_empty());
        assert_eq!(ea.seg, SegReg::Ds);
        assert_eq!(ea.offset, 0x1234);
        assert_eq!(d.modrm.reg(), 5);
        assert_eq!(len, 3);
    }

    #[test]
    fn test_addressing32_is_unimplemented() {
        let mut s = ByteStream::new(&[0x00]);
        let err = s.fetch_with::<_, DecodedModRm>(&Addressing32).unwrap_err();
        assert!(matches!(err, CPUError::Unimplemented(_)));

        let mut s = ByteStream::new(&[0xC1]);
        let d = s.fetch_with::<_, DecodedModRm>(&Addressing32).unwrap();
        assert_eq!(d.operand, ModRmOperand::Register(1));
    }
}
