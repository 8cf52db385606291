use tracing::{debug, error, warn};

use x86emu_errors::{CPUError, CPUException, CPUResult, Unimplemented};
use x86emu_mem::bus::Bus;
use x86emu_types::{CpuType, SegReg};

use crate::cpu::Cpu;

/// How a single instruction ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// A fault was raised and reported. State is whatever the instruction left behind.
    Faulted(CPUException),
}

fn process_exceptions(
    cpu: &mut Cpu,
    f: impl FnOnce(&mut Cpu) -> CPUResult<()>,
) -> Result<StepOutcome, Unimplemented> {
    match f(cpu) {
        Ok(()) => Ok(StepOutcome::Completed),
        Err(CPUError::Exception(e)) => {
            warn!(
                vector = %e.vector,
                error_code = e.error_code,
                cs = cpu.regs.segs[SegReg::Cs].selector,
                ip = cpu.regs.ip,
                "fault: {e}"
            );
            Ok(StepOutcome::Faulted(e))
        }
        Err(CPUError::Unimplemented(u)) => {
            error!("{u}");
            Err(u)
        }
    }
}

impl Cpu {
    /// Executes one instruction.
    ///
    /// Faults are caught and returned as [`StepOutcome::Faulted`]. Only unimplemented features
    /// escape as an error.
    pub fn tick(&mut self, bus: &mut dyn Bus) -> Result<StepOutcome, Unimplemented> {
        let size = self.regs.segs[SegReg::Cs].default_size();
        self.ctx.reset(size);

        if core::mem::take(&mut self.delayed_interrupt_enable) {
            self.regs.flags.set_intr(true);
            debug!("interrupts enabled");
        }

        process_exceptions(self, |cpu| cpu.decode_opcode(bus))
    }

    /// Executes `n` instructions, continuing past faults.
    pub fn run(&mut self, bus: &mut dyn Bus, n: u64) -> Result<(), Unimplemented> {
        for _ in 0..n {
            self.tick(bus)?;
        }
        Ok(())
    }
}

/// A processor together with the bus it runs against.
pub struct CpuExecutor<B> {
    cpu: Cpu,
    bus: B,
}

impl<B: Bus> CpuExecutor<B> {
    pub fn new(cpu_type: CpuType, bus: B) -> Self {
        Self {
            cpu: Cpu::new(cpu_type),
            bus,
        }
    }

    pub fn init(&mut self, cpu_type: CpuType) {
        self.cpu.init(cpu_type);
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn tick(&mut self) -> Result<StepOutcome, Unimplemented> {
        self.cpu.tick(&mut self.bus)
    }

    pub fn run(&mut self, n: u64) -> Result<(), Unimplemented> {
        self.cpu.run(&mut self.bus, n)
    }

    pub fn into_parts(self) -> (Cpu, B) {
        (self.cpu, self.bus)
    }
}
