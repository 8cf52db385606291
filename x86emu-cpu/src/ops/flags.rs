use x86emu_errors::CPUResult;
use x86emu_mem::bus::Bus;

use crate::cpu::Cpu;

pub fn nop(_: &mut Cpu, _: &mut dyn Bus) -> CPUResult<()> {
    Ok(())
}

pub fn complement_carry(cpu: &mut Cpu, _: &mut dyn Bus) -> CPUResult<()> {
    let carry = cpu.regs.flags.carry();
    cpu.regs.flags.set_carry(!carry);
    Ok(())
}

pub fn clear_carry(cpu: &mut Cpu, _: &mut dyn Bus) -> CPUResult<()> {
    cpu.regs.flags.set_carry(false);
    Ok(())
}

pub fn set_carry(cpu: &mut Cpu, _: &mut dyn Bus) -> CPUResult<()> {
    cpu.regs.flags.set_carry(true);
    Ok(())
}

pub fn clear_interrupt(cpu: &mut Cpu, _: &mut dyn Bus) -> CPUResult<()> {
    cpu.regs.flags.set_intr(false);
    cpu.delayed_interrupt_enable = false;
    Ok(())
}

/// Interrupts become enabled after the instruction that follows.
pub fn set_interrupt(cpu: &mut Cpu, _: &mut dyn Bus) -> CPUResult<()> {
    if !cpu.regs.flags.intr() {
        cpu.delayed_interrupt_enable = true;
    }
    Ok(())
}

pub fn clear_direction(cpu: &mut Cpu, _: &mut dyn Bus) -> CPUResult<()> {
    cpu.regs.flags.set_direction(false);
    Ok(())
}

pub fn set_direction(cpu: &mut Cpu, _: &mut dyn Bus) -> CPUResult<()> {
    cpu.regs.flags.set_direction(true);
    Ok(())
}
