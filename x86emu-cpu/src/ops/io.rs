use x86emu_errors::CPUResult;
use x86emu_mem::bus::Bus;
use x86emu_types::{Reg16, Reg8};

use crate::cpu::Cpu;

fn imm_port(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<u16> {
    cpu.fetch::<u8>(bus).map(u16::from)
}

pub fn in_al_imm8(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let port = imm_port(cpu, bus)?;
    let val = bus.port_read_byte(port);
    cpu.regs.gprs.set8(Reg8::al, val);
    Ok(())
}

pub fn in_ax_imm8(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let port = imm_port(cpu, bus)?;
    cpu.regs.gprs[Reg16::ax] = bus.port_read_word(port);
    Ok(())
}

pub fn out_imm8_al(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let port = imm_port(cpu, bus)?;
    bus.port_write_byte(port, cpu.regs.gprs.get8(Reg8::al));
    Ok(())
}

pub fn out_imm8_ax(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let port = imm_port(cpu, bus)?;
    bus.port_write_word(port, cpu.regs.gprs[Reg16::ax]);
    Ok(())
}

pub fn in_al_dx(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let val = bus.port_read_byte(cpu.regs.gprs[Reg16::dx]);
    cpu.regs.gprs.set8(Reg8::al, val);
    Ok(())
}

pub fn in_ax_dx(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    cpu.regs.gprs[Reg16::ax] = bus.port_read_word(cpu.regs.gprs[Reg16::dx]);
    Ok(())
}

pub fn out_dx_al(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    bus.port_write_byte(cpu.regs.gprs[Reg16::dx], cpu.regs.gprs.get8(Reg8::al));
    Ok(())
}

pub fn out_dx_ax(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    bus.port_write_word(cpu.regs.gprs[Reg16::dx], cpu.regs.gprs[Reg16::ax]);
    Ok(())
}
