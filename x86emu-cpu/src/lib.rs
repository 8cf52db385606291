pub mod cpu;
pub mod executor;
pub mod ops;

pub use cpu::Cpu;
pub use executor::{CpuExecutor, StepOutcome};
