//! The physical bus contract consumed by the processor core, and a small reference machine that
//! implements it.

pub mod bus;
pub mod io;
pub mod phys;

use x86emu_types::PhysAddr;

use crate::bus::Bus;
use crate::io::{IoBus, PortWidth};
use crate::phys::SysMemory;

/// Pages needed to back a full 24-bit physical address space.
pub const PC_PAGE_LIMIT: u32 = (1 << 24) >> phys::Page::SHIFT;

/// Sparse RAM plus a port bus: enough machine to run the core against.
#[derive(Debug)]
pub struct PcBus {
    pub memory: SysMemory,
    pub io: IoBus,
}

impl PcBus {
    pub fn new() -> Self {
        Self::with_memory(SysMemory::new(PC_PAGE_LIMIT))
    }

    pub fn with_memory(memory: SysMemory) -> Self {
        Self {
            memory,
            io: IoBus::new(),
        }
    }
}

impl Default for PcBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for PcBus {
    fn read_byte(&mut self, addr: PhysAddr) -> u8 {
        self.memory.read_byte(addr)
    }

    fn write_byte(&mut self, addr: PhysAddr, val: u8) {
        if let Err(e) = self.memory.write_byte(addr, val) {
            tracing::trace!(%e, "dropped write");
        }
    }

    fn port_read_byte(&mut self, port: u16) -> u8 {
        self.io.port_in(port, PortWidth::Byte) as u8
    }

    fn port_write_byte(&mut self, port: u16, val: u8) {
        self.io.port_out(port, val as u32, PortWidth::Byte)
    }

    fn port_read_word(&mut self, port: u16) -> u16 {
        self.io.port_in(port, PortWidth::Word) as u16
    }

    fn port_read_dword(&mut self, port: u16) -> u32 {
        self.io.port_in(port, PortWidth::Dword)
    }

    fn port_write_word(&mut self, port: u16, val: u16) {
        self.io.port_out(port, val as u32, PortWidth::Word)
    }

    fn port_write_dword(&mut self, port: u16, val: u32) {
        self.io.port_out(port, val, PortWidth::Dword)
    }
}
