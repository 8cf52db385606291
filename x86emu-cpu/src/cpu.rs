use tracing::{debug, error, trace, warn};

use x86emu_decode::{
    context::DecodeContext,
    modrm::{Addressing16, Addressing32, DecodedModRm, ModRmOperand},
    opcode::{DispatchTable, Entry},
    stream::{FromInstructionStream, InstructionStream},
};
use x86emu_errors::{CPUException, CPUResult, Unimplemented};
use x86emu_mem::bus::Bus;
use x86emu_regs::{Regs, SegmentAccess};
use x86emu_types::{CpuType, PhysAddr, Reg16, Reg8, SegReg, SizeControl, TranslateKind};

use crate::ops::{Handler, OPCODE_TABLE};

pub struct Cpu {
    pub(crate) regs: Regs,
    pub(crate) ctx: DecodeContext,
    pub(crate) delayed_interrupt_enable: bool,
    cpu_type: CpuType,
    table: Box<DispatchTable<Handler>>,
}

/// Instruction bytes at `cs:ip`, advancing `ip` as they are consumed.
pub struct Stream<'a> {
    cpu: &'a mut Cpu,
    bus: &'a mut dyn Bus,
}

impl<'a> InstructionStream for Stream<'a> {
    fn next_byte(&mut self) -> CPUResult<u8> {
        let ip = self.cpu.regs.ip;
        let val = self.cpu.fetch_byte(self.bus, ip)?;
        self.cpu.regs.ip = ip.wrapping_add(1);
        Ok(val)
    }

    fn next_word(&mut self) -> CPUResult<u16> {
        let ip = self.cpu.regs.ip;
        let val = self.cpu.fetch_word(self.bus, ip)?;
        self.cpu.regs.ip = ip.wrapping_add(2);
        Ok(val)
    }

    fn next_dword(&mut self) -> CPUResult<u32> {
        let ip = self.cpu.regs.ip;
        let val = self.cpu.fetch_dword(self.bus, ip)?;
        self.cpu.regs.ip = ip.wrapping_add(4);
        Ok(val)
    }
}

impl Cpu {
    pub fn new(cpu_type: CpuType) -> Cpu {
        Cpu {
            regs: Regs::new(),
            ctx: DecodeContext::new(),
            delayed_interrupt_enable: false,
            cpu_type,
            table: Box::new(DispatchTable::build(OPCODE_TABLE)),
        }
    }

    /// Puts the processor into its power-on state as `cpu_type` and rebuilds the dispatch table.
    pub fn init(&mut self, cpu_type: CpuType) {
        *self = Cpu::new(cpu_type);
    }

    pub fn cpu_type(&self) -> CpuType {
        self.cpu_type
    }

    pub fn regs(&self) -> &Regs {
        &self.regs
    }

    pub fn regs_mut(&mut self) -> &mut Regs {
        &mut self.regs
    }

    pub fn decode_context(&self) -> &DecodeContext {
        &self.ctx
    }

    pub fn dispatch_table(&self) -> &DispatchTable<Handler> {
        &self.table
    }

    /// Whether an interrupt enable is waiting to take effect at the start of the next instruction.
    pub fn interrupt_enable_pending(&self) -> bool {
        self.delayed_interrupt_enable
    }

    pub fn load_segment(&mut self, seg: SegReg, selector: u16) -> CPUResult<()> {
        if self.regs.cr0.protected_mode() {
            let e = Unimplemented("protected mode segment loads");
            error!(%seg, selector, "{e}");
            return Err(e.into());
        }

        let desc = self
            .regs
            .segs
            .get_mut(seg)
            .ok_or(CPUException::invalid_opcode())?;
        desc.selector = selector;
        desc.base = (selector as u32) << 4;
        if seg == SegReg::Cs {
            desc.access = SegmentAccess::CODE_DEFAULT;
        }
        debug!("segment load {seg} <- {selector:#06x}, base {:#x}", desc.base);
        Ok(())
    }

    /// Maps `seg:offset` to a physical address.
    ///
    /// `kind` does not change the result in real mode. A `seg` outside the named segment
    /// registers raises #UD.
    pub fn translate(&self, seg: SegReg, offset: u32, kind: TranslateKind) -> CPUResult<PhysAddr> {
        if self.regs.cr0.protected_mode() {
            let e = Unimplemented("protected mode address translation");
            error!(%seg, offset, %kind, "{e}");
            return Err(e.into());
        }

        let desc = self
            .regs
            .segs
            .get(seg)
            .ok_or(CPUException::invalid_opcode())?;
        Ok(desc.base.wrapping_add(offset))
    }

    /// Translates an access of `width` bytes through its last byte, then steps back to the first.
    fn translate_access(
        &self,
        seg: SegReg,
        offset: u32,
        width: u32,
        kind: TranslateKind,
    ) -> CPUResult<PhysAddr> {
        let last = width - 1;
        Ok(self
            .translate(seg, offset.wrapping_add(last), kind)?
            .wrapping_sub(last))
    }

    pub fn fetch_byte(&self, bus: &mut dyn Bus, offset: u32) -> CPUResult<u8> {
        let addr = self.translate_access(SegReg::Cs, offset, 1, TranslateKind::Exec)?;
        Ok(bus.read_byte(addr))
    }

    pub fn fetch_word(&self, bus: &mut dyn Bus, offset: u32) -> CPUResult<u16> {
        let addr = self.translate_access(SegReg::Cs, offset, 2, TranslateKind::Exec)?;
        Ok(bus.read_word(addr))
    }

    pub fn fetch_dword(&self, bus: &mut dyn Bus, offset: u32) -> CPUResult<u32> {
        let addr = self.translate_access(SegReg::Cs, offset, 4, TranslateKind::Exec)?;
        Ok(bus.read_dword(addr))
    }

    pub fn read_byte(&self, bus: &mut dyn Bus, seg: SegReg, offset: u32) -> CPUResult<u8> {
        let addr = self.translate_access(seg, offset, 1, TranslateKind::Read)?;
        Ok(bus.read_byte(addr))
    }

    pub fn read_word(&self, bus: &mut dyn Bus, seg: SegReg, offset: u32) -> CPUResult<u16> {
        let addr = self.translate_access(seg, offset, 2, TranslateKind::Read)?;
        Ok(bus.read_word(addr))
    }

    pub fn read_dword(&self, bus: &mut dyn Bus, seg: SegReg, offset: u32) -> CPUResult<u32> {
        let addr = self.translate_access(seg, offset, 4, TranslateKind::Read)?;
        Ok(bus.read_dword(addr))
    }

    pub fn write_byte(&self, bus: &mut dyn Bus, seg: SegReg, offset: u32, val: u8) -> CPUResult<()> {
        let addr = self.translate_access(seg, offset, 1, TranslateKind::Write)?;
        bus.write_byte(addr, val);
        Ok(())
    }

    pub fn write_word(
        &self,
        bus: &mut dyn Bus,
        seg: SegReg,
        offset: u32,
        val: u16,
    ) -> CPUResult<()> {
        let addr = self.translate_access(seg, offset, 2, TranslateKind::Write)?;
        bus.write_word(addr, val);
        Ok(())
    }

    pub fn write_dword(
        &self,
        bus: &mut dyn Bus,
        seg: SegReg,
        offset: u32,
        val: u32,
    ) -> CPUResult<()> {
        let addr = self.translate_access(seg, offset, 4, TranslateKind::Write)?;
        bus.write_dword(addr, val);
        Ok(())
    }

    pub fn as_instruction_stream<'a>(&'a mut self, bus: &'a mut dyn Bus) -> Stream<'a> {
        Stream { cpu: self, bus }
    }

    /// Decodes a `T` from the bytes at `cs:ip`.
    pub fn fetch<T: FromInstructionStream<()>>(&mut self, bus: &mut dyn Bus) -> CPUResult<T> {
        self.as_instruction_stream(bus).fetch()
    }

    /// Fetches one prefix or opcode byte, counts it against the length limit and dispatches it.
    pub fn decode_opcode(&mut self, bus: &mut dyn Bus) -> CPUResult<()> {
        let ip = self.regs.ip;
        let opcode: u8 = self.fetch(bus)?;
        self.ctx.push_byte(opcode)?;

        trace!(
            target: "x86emu::decode",
            "{:04x}:{:04x} opcode {opcode:02x}",
            self.regs.segs[SegReg::Cs].selector,
            ip
        );

        match self.table.lookup(self.ctx.operand_size, opcode) {
            Entry::Handler(h) => h(self, bus),
            Entry::Escape => self.decode_escaped(bus),
            Entry::Unhandled => {
                warn!(
                    target: "x86emu::decode",
                    "unhandled opcode {opcode:02x} at {:04x}:{:04x}",
                    self.regs.segs[SegReg::Cs].selector,
                    ip
                );
                Ok(())
            }
            Entry::Unrouted => Err(CPUException::invalid_opcode().into()),
        }
    }

    fn decode_escaped(&mut self, bus: &mut dyn Bus) -> CPUResult<()> {
        let ip = self.regs.ip;
        let opcode: u8 = self.fetch(bus)?;
        self.ctx.push_byte(opcode)?;
        let cs = self.regs.segs[SegReg::Cs].selector;

        trace!(target: "x86emu::decode", "{cs:04x}:{ip:04x} opcode 0f {opcode:02x}");

        match self.table.lookup_escaped(self.ctx.operand_size, opcode) {
            Entry::Handler(h) => h(self, bus),
            Entry::Unhandled => {
                warn!(target: "x86emu::decode", "unhandled opcode 0f {opcode:02x} at {cs:04x}:{ip:04x}");
                Ok(())
            }
            Entry::Escape | Entry::Unrouted => {
                warn!(target: "x86emu::decode", "unrouted opcode 0f {opcode:02x} at {cs:04x}:{ip:04x}");
                Err(CPUException::invalid_opcode().into())
            }
        }
    }

    /// Reads a ModRM byte plus displacement at `cs:ip` under the current address size and records
    /// the result in the decode context.
    pub fn decode_modrm(&mut self, bus: &mut dyn Bus) -> CPUResult<DecodedModRm> {
        let decoded: DecodedModRm = match self.ctx.address_size {
            SizeControl::Word => {
                let policy = Addressing16::new(self.regs.gprs);
                self.as_instruction_stream(bus).fetch_with(&policy)?
            }
            _ => self.as_instruction_stream(bus).fetch_with(&Addressing32)?,
        };
        self.ctx.record_modrm(&decoded);
        Ok(decoded)
    }

    /// The segment a memory operand addresses after applying any override prefix.
    pub fn operand_segment(&self, default: SegReg) -> SegReg {
        self.ctx.segment_for(default)
    }

    pub fn read_rm8(&self, bus: &mut dyn Bus, op: ModRmOperand) -> CPUResult<u8> {
        match op {
            ModRmOperand::Register(r) => Ok(self.regs.gprs.get8(Reg8::from_encoding(r))),
            ModRmOperand::Memory(ea) => self.read_byte(bus, self.operand_segment(ea.seg), ea.offset),
        }
    }

    pub fn read_rm16(&self, bus: &mut dyn Bus, op: ModRmOperand) -> CPUResult<u16> {
        match op {
            ModRmOperand::Register(r) => Ok(self.regs.gprs[Reg16::from_encoding(r)]),
            ModRmOperand::Memory(ea) => self.read_word(bus, self.operand_segment(ea.seg), ea.offset),
        }
    }

    pub fn write_rm8(&mut self, bus: &mut dyn Bus, op: ModRmOperand, val: u8) -> CPUResult<()> {
        match op {
            ModRmOperand::Register(r) => {
                self.regs.gprs.set8(Reg8::from_encoding(r), val);
                Ok(())
            }
            ModRmOperand::Memory(ea) => {
                self.write_byte(bus, self.operand_segment(ea.seg), ea.offset, val)
            }
        }
    }

    pub fn write_rm16(&mut self, bus: &mut dyn Bus, op: ModRmOperand, val: u16) -> CPUResult<()> {
        match op {
            ModRmOperand::Register(r) => {
                self.regs.gprs[Reg16::from_encoding(r)] = val;
                Ok(())
            }
            ModRmOperand::Memory(ea) => {
                self.write_word(bus, self.operand_segment(ea.seg), ea.offset, val)
            }
        }
    }

    /// Maps the reg field of a segment-register move to a segment register this model has.
    pub fn sreg_from_field(&self, field: u8) -> CPUResult<SegReg> {
        let count = match self.cpu_type {
            CpuType::I386 => SegReg::COUNT,
            _ => 4,
        };
        if (field as usize) < count {
            Ok(SegReg(field))
        } else {
            Err(CPUException::invalid_opcode().into())
        }
    }
}
