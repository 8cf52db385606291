use x86emu_errors::{CPUException, CPUResult};
use x86emu_mem::bus::Bus;
use x86emu_types::{Reg16, Reg8, SegReg, SizeControl};

use crate::cpu::Cpu;

pub fn mov_r8_imm8<const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let val = cpu.fetch::<u8>(bus)?;
    cpu.regs.gprs.set8(Reg8::from_encoding(R), val);
    Ok(())
}

pub fn mov_r16_imm16<const R: u8>(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let val = cpu.fetch::<u16>(bus)?;
    cpu.regs.gprs[Reg16::from_encoding(R)] = val;
    Ok(())
}

pub fn mov_rm8_r8(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let d = cpu.decode_modrm(bus)?;
    let val = cpu.regs.gprs.get8(Reg8::from_encoding(d.modrm.reg()));
    cpu.write_rm8(bus, d.operand, val)
}

pub fn mov_rm16_r16(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let d = cpu.decode_modrm(bus)?;
    let val = cpu.regs.gprs[Reg16::from_encoding(d.modrm.reg())];
    cpu.write_rm16(bus, d.operand, val)
}

pub fn mov_r8_rm8(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let d = cpu.decode_modrm(bus)?;
    let val = cpu.read_rm8(bus, d.operand)?;
    cpu.regs.gprs.set8(Reg8::from_encoding(d.modrm.reg()), val);
    Ok(())
}

pub fn mov_r16_rm16(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let d = cpu.decode_modrm(bus)?;
    let val = cpu.read_rm16(bus, d.operand)?;
    cpu.regs.gprs[Reg16::from_encoding(d.modrm.reg())] = val;
    Ok(())
}

pub fn mov_rm16_sreg(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let d = cpu.decode_modrm(bus)?;
    let seg = cpu.sreg_from_field(d.modrm.reg())?;
    let val = cpu.regs.segs[seg].selector;
    cpu.write_rm16(bus, d.operand, val)
}

/// CS cannot be the destination; far transfers load it instead.
pub fn mov_sreg_rm16(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let d = cpu.decode_modrm(bus)?;
    let seg = cpu.sreg_from_field(d.modrm.reg())?;
    if seg == SegReg::Cs {
        return Err(CPUException::invalid_opcode().into());
    }
    let selector = cpu.read_rm16(bus, d.operand)?;
    cpu.load_segment(seg, selector)
}

/// The direct offset of the `A0`-`A3` forms, sized by the address size.
fn moffs(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<u32> {
    match cpu.ctx.address_size {
        SizeControl::Word => cpu.fetch::<u16>(bus).map(u32::from),
        _ => cpu.fetch::<u32>(bus),
    }
}

pub fn mov_al_moffs(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let offset = moffs(cpu, bus)?;
    let val = cpu.read_byte(bus, cpu.operand_segment(SegReg::Ds), offset)?;
    cpu.regs.gprs.set8(Reg8::al, val);
    Ok(())
}

pub fn mov_ax_moffs(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let offset = moffs(cpu, bus)?;
    let val = cpu.read_word(bus, cpu.operand_segment(SegReg::Ds), offset)?;
    cpu.regs.gprs[Reg16::ax] = val;
    Ok(())
}

pub fn mov_moffs_al(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let offset = moffs(cpu, bus)?;
    let val = cpu.regs.gprs.get8(Reg8::al);
    cpu.write_byte(bus, cpu.operand_segment(SegReg::Ds), offset, val)
}

pub fn mov_moffs_ax(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let offset = moffs(cpu, bus)?;
    let val = cpu.regs.gprs[Reg16::ax];
    cpu.write_word(bus, cpu.operand_segment(SegReg::Ds), offset, val)
}

pub fn mov_rm8_imm8(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let d = cpu.decode_modrm(bus)?;
    if d.modrm.reg() != 0 {
        return Err(CPUException::invalid_opcode().into());
    }
    let val = cpu.fetch::<u8>(bus)?;
    cpu.write_rm8(bus, d.operand, val)
}

pub fn mov_rm16_imm16(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let d = cpu.decode_modrm(bus)?;
    if d.modrm.reg() != 0 {
        return Err(CPUException::invalid_opcode().into());
    }
    let val = cpu.fetch::<u16>(bus)?;
    cpu.write_rm16(bus, d.operand, val)
}
