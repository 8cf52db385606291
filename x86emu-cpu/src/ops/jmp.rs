use x86emu_errors::CPUResult;
use x86emu_mem::bus::Bus;
use x86emu_types::SegReg;

use crate::cpu::Cpu;

/// `ip` is relative to the end of the instruction and stays within the 16-bit offset space.
fn jump_relative(cpu: &mut Cpu, disp: u16) {
    cpu.regs.ip = (cpu.regs.ip as u16).wrapping_add(disp) as u32;
}

pub fn jmp_rel8(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let disp = cpu.fetch::<i8>(bus)?;
    jump_relative(cpu, disp as i16 as u16);
    Ok(())
}

pub fn jmp_rel16(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let disp = cpu.fetch::<u16>(bus)?;
    jump_relative(cpu, disp);
    Ok(())
}

/// `jmp ptr16:16`: offset first, then selector.
pub fn jmp_far(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    let offset = cpu.fetch::<u16>(bus)?;
    let selector = cpu.fetch::<u16>(bus)?;
    cpu.load_segment(SegReg::Cs, selector)?;
    cpu.regs.ip = offset as u32;
    Ok(())
}
