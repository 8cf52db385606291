use thiserror::Error;

use x86emu_primitives::fake_enum;

fake_enum! {
    #[repr(u8)]
    pub enum Vector{
        DivideError = 0,
        Debug = 1,
        NonMaskableInterrupt = 2,
        Breakpoint = 3,
        Overflow = 4,
        BoundRangeExceeded = 5,
        InvalidOpcode = 6,
        DeviceNotAvailable = 7,
        DoubleFault = 8,
        InvalidTss = 10,
        SegmentNotPresent = 11,
        StackFault = 12,
        GeneralProtection = 13,
        PageFault = 14,
        X87Fpu = 16,
        AlignmentCheck = 17,
    }
}

impl Vector {
    /// Whether the processor pushes an error code when delivering this vector.
    pub const fn pushes_error_code(self) -> bool {
        matches!(
            self,
            Vector::DoubleFault
                | Vector::InvalidTss
                | Vector::SegmentNotPresent
                | Vector::StackFault
                | Vector::GeneralProtection
                | Vector::PageFault
                | Vector::AlignmentCheck
        )
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Vector::DivideError => "#DE",
            Vector::Debug => "#DB",
            Vector::NonMaskableInterrupt => "NMI",
            Vector::Breakpoint => "#BP",
            Vector::Overflow => "#OF",
            Vector::BoundRangeExceeded => "#BR",
            Vector::InvalidOpcode => "#UD",
            Vector::DeviceNotAvailable => "#NM",
            Vector::DoubleFault => "#DF",
            Vector::InvalidTss => "#TS",
            Vector::SegmentNotPresent => "#NP",
            Vector::StackFault => "#SS",
            Vector::GeneralProtection => "#GP",
            Vector::PageFault => "#PF",
            Vector::X87Fpu => "#MF",
            Vector::AlignmentCheck => "#AC",
            _ => "#??",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExceptionType {
    Fault,
    Trap,
    Abort,
}

/// A structured processor exception, raised where it is detected and caught once per instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("{kind:?} {} (vector {}, error code {error_code:#06x})", .vector.mnemonic(), .vector.get())]
pub struct CPUException {
    pub kind: ExceptionType,
    pub vector: Vector,
    pub error_code: u16,
    /// `false` for software-only diagnostics that reuse the exception plumbing.
    pub cpu_fault: bool,
}

impl CPUException {
    pub const fn new(kind: ExceptionType, vector: Vector, error_code: u16, cpu_fault: bool) -> Self {
        Self {
            kind,
            vector,
            error_code,
            cpu_fault,
        }
    }

    pub const fn general_protection(error_code: u16) -> Self {
        Self::new(
            ExceptionType::Fault,
            Vector::GeneralProtection,
            error_code,
            true,
        )
    }

    pub const fn invalid_opcode() -> Self {
        Self::new(ExceptionType::Fault, Vector::InvalidOpcode, 0, true)
    }

    pub fn fault_code(&self) -> Option<u16> {
        self.vector.pushes_error_code().then_some(self.error_code)
    }
}

/// A feature this core deliberately does not implement yet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("{0} is not implemented")]
pub struct Unimplemented(pub &'static str);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum CPUError {
    #[error(transparent)]
    Exception(#[from] CPUException),
    #[error(transparent)]
    Unimplemented(#[from] Unimplemented),
}

pub type CPUResult<T> = std::result::Result<T, CPUError>;
