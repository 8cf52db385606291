#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum PortWidth {
    Byte,
    Word,
    Dword,
}

impl PortWidth {
    #[inline]
    pub const fn mask(self) -> u32 {
        match self {
            PortWidth::Byte => 0xFF,
            PortWidth::Word => 0xFFFF,
            PortWidth::Dword => 0xFFFF_FFFF,
        }
    }
}

pub trait IoPort {
    fn responds_to_port_addr(&self, port: u16) -> bool;
    fn port_out(&mut self, port: u16, data: u32, width: PortWidth);
    fn port_in(&mut self, port: u16, width: PortWidth) -> u32;
}

/// Routes port accesses to the first attached device that claims the port.
///
/// Reads of unclaimed ports return all ones for the access width, and writes to them are ignored.
#[derive(Default)]
pub struct IoBus {
    ports: Vec<Box<dyn IoPort>>,
}

impl IoBus {
    pub const fn new() -> Self {
        Self { ports: Vec::new() }
    }

    pub fn attach_port<T: IoPort + 'static>(&mut self, port: T) {
        self.attach_boxed_port(Box::new(port))
    }

    pub fn attach_boxed_port(&mut self, port: Box<dyn IoPort>) {
        self.ports.push(port)
    }

    pub fn port_out(&mut self, port: u16, data: u32, width: PortWidth) {
        for dev in &mut self.ports {
            if dev.responds_to_port_addr(port) {
                dev.port_out(port, data & width.mask(), width);
                return;
            }
        }
        tracing::trace!(port, data, ?width, "write to unclaimed port");
    }

    pub fn port_in(&mut self, port: u16, width: PortWidth) -> u32 {
        for dev in &mut self.ports {
            if dev.responds_to_port_addr(port) {
                return dev.port_in(port, width) & width.mask();
            }
        }
        tracing::trace!(port, ?width, "read from unclaimed port");
        width.mask()
    }
}

impl core::fmt::Debug for IoBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IoBus")
            .field("ports", &self.ports.len())
            .finish()
    }
}
