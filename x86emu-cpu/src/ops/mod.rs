//! Opcode handlers and the descriptor list the dispatch table is built from.

use x86emu_decode::opcode::{OpcodeFlags, OpcodeInfo};
use x86emu_errors::CPUResult;
use x86emu_mem::bus::Bus;

use crate::cpu::Cpu;

pub mod flags;
pub mod io;
pub mod jmp;
pub mod mov;
pub mod prefix;

pub type Handler = fn(&mut Cpu, &mut dyn Bus) -> CPUResult<()>;

macro_rules! opcodes {
    ($($opcode:literal $(| $flag:ident)* => $handler:expr),* $(,)?) => {
        &[
            $(OpcodeInfo {
                opcode: $opcode,
                flags: OpcodeFlags::NONE $(.union(OpcodeFlags::$flag))*,
                handler16: $handler as Handler,
                handler32: None,
            }),*
        ]
    };
}

pub static OPCODE_TABLE: &[OpcodeInfo<Handler>] = opcodes! {
    0x26 => prefix::seg_override::<0>,
    0x2E => prefix::seg_override::<1>,
    0x36 => prefix::seg_override::<2>,
    0x3E => prefix::seg_override::<3>,

    0x88 => mov::mov_rm8_r8,
    0x89 => mov::mov_rm16_r16,
    0x8A => mov::mov_r8_rm8,
    0x8B => mov::mov_r16_rm16,
    0x8C => mov::mov_rm16_sreg,
    0x8E => mov::mov_sreg_rm16,

    0x90 => flags::nop,

    0xA0 => mov::mov_al_moffs,
    0xA1 => mov::mov_ax_moffs,
    0xA2 => mov::mov_moffs_al,
    0xA3 => mov::mov_moffs_ax,

    0xB0 => mov::mov_r8_imm8::<0>,
    0xB1 => mov::mov_r8_imm8::<1>,
    0xB2 => mov::mov_r8_imm8::<2>,
    0xB3 => mov::mov_r8_imm8::<3>,
    0xB4 => mov::mov_r8_imm8::<4>,
    0xB5 => mov::mov_r8_imm8::<5>,
    0xB6 => mov::mov_r8_imm8::<6>,
    0xB7 => mov::mov_r8_imm8::<7>,
    0xB8 => mov::mov_r16_imm16::<0>,
    0xB9 => mov::mov_r16_imm16::<1>,
    0xBA => mov::mov_r16_imm16::<2>,
    0xBB => mov::mov_r16_imm16::<3>,
    0xBC => mov::mov_r16_imm16::<4>,
    0xBD => mov::mov_r16_imm16::<5>,
    0xBE => mov::mov_r16_imm16::<6>,
    0xBF => mov::mov_r16_imm16::<7>,

    0xC6 => mov::mov_rm8_imm8,
    0xC7 => mov::mov_rm16_imm16,

    0xE4 => io::in_al_imm8,
    0xE5 => io::in_ax_imm8,
    0xE6 => io::out_imm8_al,
    0xE7 => io::out_imm8_ax,
    0xE9 => jmp::jmp_rel16,
    0xEA => jmp::jmp_far,
    0xEB => jmp::jmp_rel8,
    0xEC => io::in_al_dx,
    0xED => io::in_ax_dx,
    0xEE => io::out_dx_al,
    0xEF => io::out_dx_ax,

    0xF5 => flags::complement_carry,
    0xF8 => flags::clear_carry,
    0xF9 => flags::set_carry,
    0xFA => flags::clear_interrupt,
    0xFB => flags::set_interrupt,
    0xFC => flags::clear_direction,
    0xFD => flags::set_direction,
};
