use x86emu_errors::CPUResult;

/// A source of instruction bytes that advances a read cursor as it is consumed.
///
/// Only `next_byte` is required. Streams that fetch wider units through a different path (for
/// example translating the last byte of the unit first) override `next_word`/`next_dword`.
pub trait InstructionStream {
    fn next_byte(&mut self) -> CPUResult<u8>;

    fn next_word(&mut self) -> CPUResult<u16> {
        let lo = self.next_byte()?;
        let hi = self.next_byte()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn next_dword(&mut self) -> CPUResult<u32> {
        let lo = self.next_word()? as u32;
        let hi = self.next_word()? as u32;
        Ok(lo | (hi << 16))
    }

    fn fetch<T: FromInstructionStream<()>>(&mut self) -> CPUResult<T>
    where
        Self: Sized,
    {
        T::decode(self, ())
    }

    fn fetch_with<Ctx, T: FromInstructionStream<Ctx>>(&mut self, ctx: Ctx) -> CPUResult<T>
    where
        Self: Sized,
    {
        T::decode(self, ctx)
    }
}

impl<'a, I: InstructionStream + ?Sized> InstructionStream for &'a mut I {
    fn next_byte(&mut self) -> CPUResult<u8> {
        I::next_byte(self)
    }

    fn next_word(&mut self) -> CPUResult<u16> {
        I::next_word(self)
    }

    fn next_dword(&mut self) -> CPUResult<u32> {
        I::next_dword(self)
    }
}

pub trait FromInstructionStream<Ctx>: Sized {
    fn decode<I: InstructionStream>(stream: &mut I, ctx: Ctx) -> CPUResult<Self>;
}

macro_rules! impl_from_stream_int {
    ($($ty:ty => $next:ident),* $(,)?) => {
        $(
            impl<Ctx> FromInstructionStream<Ctx> for $ty {
                #[inline]
                #[allow(clippy::unnecessary_cast)]
                fn decode<I: InstructionStream>(stream: &mut I, _: Ctx) -> CPUResult<Self> {
                    stream.$next().map(|v| v as $ty)
                }
            }
        )*
    };
}

impl_from_stream_int! {
    u8 => next_byte,
    i8 => next_byte,
    u16 => next_word,
    i16 => next_word,
    u32 => next_dword,
}

/// A slice-backed stream, used to decode bytes that are already in hand.
#[derive(Clone, Debug)]
pub struct ByteStream<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteStream<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub const fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> InstructionStream for ByteStream<'a> {
    /// Running off the end of the buffer raises #UD, as for a truncated encoding.
    fn next_byte(&mut self) -> CPUResult<u8> {
        let b = self
            .bytes
            .get(self.pos)
            .copied()
            .ok_or(x86emu_errors::CPUException::invalid_opcode())?;
        self.pos += 1;
        Ok(b)
    }
}
