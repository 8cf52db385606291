use x86emu_errors::{CPUException, CPUResult};
use x86emu_types::{SegReg, SizeControl};

use crate::modrm::{DecodedModRm, ModRmOperand};

/// Accumulated prefix and opcode bytes at which decoding is abandoned with #GP(0).
pub const MAX_INSTRUCTION_LEN: usize = 10;

/// Per-instruction decode state. Reset at the start of every instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DecodeContext {
    instruction: [u8; MAX_INSTRUCTION_LEN],
    length: usize,
    pub seg_prefix: Option<SegReg>,
    pub operand_size: SizeControl,
    pub address_size: SizeControl,
    pub mod_reg: u8,
    pub mod_seg: SegReg,
    pub mod_addr: u32,
    pub mod_reg_mem: Option<u8>,
}

impl DecodeContext {
    pub const fn new() -> Self {
        Self {
            instruction: [0; MAX_INSTRUCTION_LEN],
            length: 0,
            seg_prefix: None,
            operand_size: SizeControl::Word,
            address_size: SizeControl::Word,
            mod_reg: 0,
            mod_seg: SegReg::Ds,
            mod_addr: 0,
            mod_reg_mem: None,
        }
    }

    pub fn reset(&mut self, size: SizeControl) {
        *self = Self {
            operand_size: size,
            address_size: size,
            ..Self::new()
        };
    }

    /// Appends a prefix or opcode byte.
    ///
    /// Fails with #GP(0) once the accumulated length reaches [`MAX_INSTRUCTION_LEN`]. The byte that
    /// triggers the fault is still recorded.
    pub fn push_byte(&mut self, byte: u8) -> CPUResult<()> {
        let Some(slot) = self.instruction.get_mut(self.length) else {
            return Err(CPUException::general_protection(0).into());
        };
        *slot = byte;
        self.length += 1;
        if self.length == MAX_INSTRUCTION_LEN {
            return Err(CPUException::general_protection(0).into());
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &self.instruction[..self.length]
    }

    /// The segment a memory operand uses: the active override, or `default` without one.
    #[inline]
    pub fn segment_for(&self, default: SegReg) -> SegReg {
        self.seg_prefix.unwrap_or(default)
    }

    pub fn record_modrm(&mut self, decoded: &DecodedModRm) {
        self.mod_reg = decoded.modrm.reg();
        match decoded.operand {
            ModRmOperand::Register(r) => {
                self.mod_reg_mem = Some(r);
                self.mod_addr = 0;
            }
            ModRmOperand::Memory(ea) => {
                self.mod_reg_mem = None;
                self.mod_seg = self.segment_for(ea.seg);
                self.mod_addr = ea.offset;
            }
        }
    }
}

impl Default for DecodeContext {
    fn default() -> Self {
        Self::new()
    }
}
