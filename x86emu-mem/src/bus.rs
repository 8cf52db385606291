use x86emu_types::PhysAddr;

/// The capability surface the processor core needs from the machine it is plugged into.
///
/// The core never owns or inspects the device behind this trait; it only calls through it. Only
/// byte-wide accesses are required: the wider accesses default to little-endian compositions of
/// byte accesses, and devices that can do better override them.
pub trait Bus {
    fn read_byte(&mut self, addr: PhysAddr) -> u8;
    fn write_byte(&mut self, addr: PhysAddr, val: u8);

    fn port_read_byte(&mut self, port: u16) -> u8;
    fn port_write_byte(&mut self, port: u16, val: u8);

    fn read_word(&mut self, addr: PhysAddr) -> u16 {
        u16::from_le_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }

    fn read_dword(&mut self, addr: PhysAddr) -> u32 {
        let lo = self.read_word(addr) as u32;
        let hi = self.read_word(addr.wrapping_add(2)) as u32;
        lo | (hi << 16)
    }

    fn write_word(&mut self, addr: PhysAddr, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write_byte(addr, lo);
        self.write_byte(addr.wrapping_add(1), hi);
    }

    fn write_dword(&mut self, addr: PhysAddr, val: u32) {
        self.write_word(addr, val as u16);
        self.write_word(addr.wrapping_add(2), (val >> 16) as u16);
    }

    fn port_read_word(&mut self, port: u16) -> u16 {
        u16::from_le_bytes([
            self.port_read_byte(port),
            self.port_read_byte(port.wrapping_add(1)),
        ])
    }

    fn port_read_dword(&mut self, port: u16) -> u32 {
        let lo = self.port_read_word(port) as u32;
        let hi = self.port_read_word(port.wrapping_add(2)) as u32;
        lo | (hi << 16)
    }

    fn port_write_word(&mut self, port: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.port_write_byte(port, lo);
        self.port_write_byte(port.wrapping_add(1), hi);
    }

    fn port_write_dword(&mut self, port: u16, val: u32) {
        self.port_write_word(port, val as u16);
        self.port_write_word(port.wrapping_add(2), (val >> 16) as u16);
    }
}

impl<'a, B: Bus + ?Sized> Bus for &'a mut B {
    fn read_byte(&mut self, addr: PhysAddr) -> u8 {
        B::read_byte(self, addr)
    }
    fn write_byte(&mut self, addr: PhysAddr, val: u8) {
        B::write_byte(self, addr, val)
    }
    fn port_read_byte(&mut self, port: u16) -> u8 {
        B::port_read_byte(self, port)
    }
    fn port_write_byte(&mut self, port: u16, val: u8) {
        B::port_write_byte(self, port, val)
    }
    fn read_word(&mut self, addr: PhysAddr) -> u16 {
        B::read_word(self, addr)
    }
    fn read_dword(&mut self, addr: PhysAddr) -> u32 {
        B::read_dword(self, addr)
    }
    fn write_word(&mut self, addr: PhysAddr, val: u16) {
        B::write_word(self, addr, val)
    }
    fn write_dword(&mut self, addr: PhysAddr, val: u32) {
        B::write_dword(self, addr, val)
    }
    fn port_read_word(&mut self, port: u16) -> u16 {
        B::port_read_word(self, port)
    }
    fn port_read_dword(&mut self, port: u16) -> u32 {
        B::port_read_dword(self, port)
    }
    fn port_write_word(&mut self, port: u16, val: u16) {
        B::port_write_word(self, port, val)
    }
    fn port_write_dword(&mut self, port: u16, val: u32) {
        B::port_write_dword(self, port, val)
    }
}
