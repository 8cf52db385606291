use x86emu_errors::CPUResult;
use x86emu_mem::bus::Bus;
use x86emu_types::SegReg;

use crate::cpu::Cpu;

/// Segment override prefix for the segment register numbered `S`. Decoding continues with the
/// next byte of the same instruction.
pub fn seg_override<const S: u8>(cpu: &mut Cpu, bus: &mut dyn Bus) -> CPUResult<()> {
    cpu.ctx.seg_prefix = Some(SegReg(S));
    cpu.decode_opcode(bus)
}
