#![allow(dead_code)]

use x86emu_cpu::{Cpu, CpuExecutor};
use x86emu_mem::PcBus;
use x86emu_types::{CpuType, SegReg};

pub const CODE_SEG: u16 = 0x1000;
pub const CODE_IP: u16 = 0x0100;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// A processor with `code` placed at `CODE_SEG:CODE_IP` and `cs:ip` pointing at it.
pub fn machine(code: &[u8]) -> CpuExecutor<PcBus> {
    machine_as(CpuType::I286, code)
}

pub fn machine_as(cpu_type: CpuType, code: &[u8]) -> CpuExecutor<PcBus> {
    init_tracing();
    let mut exec = CpuExecutor::new(cpu_type, PcBus::new());
    exec.cpu_mut()
        .load_segment(SegReg::Cs, CODE_SEG)
        .expect("real mode load");
    exec.cpu_mut().regs_mut().ip = CODE_IP as u32;
    exec.bus_mut()
        .memory
        .load(linear(CODE_SEG, CODE_IP), code)
        .expect("code fits in memory");
    exec
}

pub fn linear(seg: u16, off: u16) -> u32 {
    ((seg as u32) << 4) + off as u32
}

pub fn ip(cpu: &Cpu) -> u32 {
    cpu.regs().ip
}
