use x86emu_primitives::bitfield;
use x86emu_types::SizeControl;

bitfield! {
    pub struct OpcodeFlags : u8 {
        /// The descriptor's `opcode` is the byte following the `0F` escape.
        pub two_byte @ 0 : bool,
    }
}

impl OpcodeFlags {
    pub const NONE: OpcodeFlags = OpcodeFlags::from_bits(0);
    pub const TWO_BYTE: OpcodeFlags = OpcodeFlags::from_bits(1);

    pub const fn union(self, other: Self) -> Self {
        Self::from_bits(self.bits() | other.bits())
    }
}

/// One entry of a static opcode descriptor list.
#[derive(Copy, Clone, Debug)]
pub struct OpcodeInfo<H> {
    pub opcode: u8,
    pub flags: OpcodeFlags,
    pub handler16: H,
    /// Replaces `handler16` under a 32-bit operand size. Without one, `handler16` serves both.
    pub handler32: Option<H>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Entry<H> {
    Handler(H),
    /// No handler yet. Decoding reports the opcode and carries on.
    Unhandled,
    /// The two-byte escape: the next byte indexes the secondary map.
    Escape,
    /// A two-byte opcode nothing has been routed to. Raises #UD.
    Unrouted,
}

impl<H> Entry<H> {
    pub const fn is_handler(&self) -> bool {
        matches!(self, Entry::Handler(_))
    }
}

#[derive(Copy, Clone, Debug)]
pub struct OpcodeMap<H>([Entry<H>; 256]);

impl<H: Copy> OpcodeMap<H> {
    pub const fn filled(entry: Entry<H>) -> Self {
        Self([entry; 256])
    }

    #[inline]
    pub fn get(&self, opcode: u8) -> Entry<H> {
        self.0[opcode as usize]
    }

    pub fn set(&mut self, opcode: u8, entry: Entry<H>) {
        self.0[opcode as usize] = entry;
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, Entry<H>)> + '_ {
        (0..=255u8).zip(self.0.iter().copied())
    }
}

/// Opcode routing for both operand sizes, built once from a descriptor list.
#[derive(Clone, Debug)]
pub struct DispatchTable<H> {
    primary: [OpcodeMap<H>; 2],
    secondary: [OpcodeMap<H>; 2],
}

impl<H: Copy> DispatchTable<H> {
    pub const ESCAPE: u8 = 0x0F;

    pub fn build(descriptors: &[OpcodeInfo<H>]) -> Self {
        let mut primary = OpcodeMap::filled(Entry::Unhandled);
        primary.set(Self::ESCAPE, Entry::Escape);
        let mut table = Self {
            primary: [primary; 2],
            secondary: [OpcodeMap::filled(Entry::Unrouted); 2],
        };

        for info in descriptors {
            let maps = if info.flags.two_byte() {
                &mut table.secondary
            } else if info.opcode == Self::ESCAPE {
                tracing::warn!(
                    opcode = info.opcode,
                    "one-byte descriptor for the escape opcode ignored"
                );
                continue;
            } else {
                &mut table.primary
            };

            let handler32 = info.handler32.unwrap_or(info.handler16);
            maps[Self::index(SizeControl::Word)].set(info.opcode, Entry::Handler(info.handler16));
            maps[Self::index(SizeControl::Dword)].set(info.opcode, Entry::Handler(handler32));
        }

        table
    }

    fn index(size: SizeControl) -> usize {
        (size.get() & 1) as usize
    }

    #[inline]
    pub fn lookup(&self, size: SizeControl, opcode: u8) -> Entry<H> {
        self.primary[Self::index(size)].get(opcode)
    }

    #[inline]
    pub fn lookup_escaped(&self, size: SizeControl, opcode: u8) -> Entry<H> {
        self.secondary[Self::index(size)].get(opcode)
    }

    pub fn primary(&self, size: SizeControl) -> &OpcodeMap<H> {
        &self.primary[Self::index(size)]
    }

    pub fn secondary(&self, size: SizeControl) -> &OpcodeMap<H> {
        &self.secondary[Self::index(size)]
    }
}
