mod common;

use common::{ip, linear, machine, CODE_IP};
use proptest::prelude::*;

use x86emu_cpu::StepOutcome;
use x86emu_errors::{ExceptionType, Vector};
use x86emu_regs::Regs;
use x86emu_types::{Reg8, SegReg, SizeControl};

#[test]
fn test_ten_prefixes_fault_at_tenth_byte() {
    let mut exec = machine(&[0x26; 12]);
    let outcome = exec.tick().unwrap();

    let StepOutcome::Faulted(e) = outcome else {
        panic!("expected a fault, got {outcome:?}")
    };
    assert_eq!(e.kind, ExceptionType::Fault);
    assert_eq!(e.vector, Vector::GeneralProtection);
    assert_eq!(e.error_code, 0);
    assert!(e.cpu_fault);
    assert_eq!(ip(exec.cpu()), CODE_IP as u32 + 10);
    assert_eq!(exec.cpu().decode_context().bytes(), &[0x26; 10]);
}

#[test]
fn test_prefix_run_faults_under_32_bit_code_segment() {
    let mut exec = machine(&[0x26; 12]);
    exec.cpu_mut().regs_mut().segs[SegReg::Cs]
        .access
        .set_default_size(true);
    let outcome = exec.tick().unwrap();

    let StepOutcome::Faulted(e) = outcome else {
        panic!("expected a fault, got {outcome:?}")
    };
    assert_eq!(e.vector, Vector::GeneralProtection);
    assert_eq!(e.error_code, 0);
    assert_eq!(exec.cpu().decode_context().operand_size, SizeControl::Dword);
    assert_eq!(ip(exec.cpu()), CODE_IP as u32 + 10);
}

#[test]
fn test_escape_counts_toward_length_limit() {
    // The byte after 0F is the tenth, so the length fault wins over #UD.
    let mut code = vec![0x2E; 8];
    code.extend_from_slice(&[0x0F, 0x0B]);
    let mut exec = machine(&code);
    let StepOutcome::Faulted(e) = exec.tick().unwrap() else {
        panic!("expected #GP")
    };
    assert_eq!(e.vector, Vector::GeneralProtection);
    assert_eq!(ip(exec.cpu()), CODE_IP as u32 + 10);
    assert_eq!(exec.cpu().decode_context().bytes().last(), Some(&0x0B));

    // The escape byte itself as the tenth.
    let mut code = vec![0x2E; 9];
    code.extend_from_slice(&[0x0F, 0x0B]);
    let mut exec = machine(&code);
    let StepOutcome::Faulted(e) = exec.tick().unwrap() else {
        panic!("expected #GP")
    };
    assert_eq!(e.vector, Vector::GeneralProtection);
    assert_eq!(ip(exec.cpu()), CODE_IP as u32 + 10);

    // One byte shorter decodes fully and reaches the unrouted escape.
    let mut code = vec![0x2E; 7];
    code.extend_from_slice(&[0x0F, 0x0B]);
    let mut exec = machine(&code);
    let StepOutcome::Faulted(e) = exec.tick().unwrap() else {
        panic!("expected #UD")
    };
    assert_eq!(e.vector, Vector::InvalidOpcode);
    assert_eq!(ip(exec.cpu()), CODE_IP as u32 + 9);
}

#[test]
fn test_opcode_counts_toward_length_limit() {
    let mut code = vec![0x3E; 9];
    code.extend_from_slice(&[0xB0, 0x42]);
    let mut exec = machine(&code);
    assert!(matches!(exec.tick().unwrap(), StepOutcome::Faulted(_)));
    assert_eq!(exec.cpu().regs().gprs.get8(Reg8::al), 0);

    let mut code = vec![0x3E; 8];
    code.extend_from_slice(&[0xB0, 0x42]);
    let mut exec = machine(&code);
    assert_eq!(exec.tick().unwrap(), StepOutcome::Completed);
    assert_eq!(exec.cpu().regs().gprs.get8(Reg8::al), 0x42);
    assert_eq!(ip(exec.cpu()), CODE_IP as u32 + 10);
}

#[test]
fn test_immediate_load_touches_only_al_and_ip() {
    let mut exec = machine(&[0xB0, 0x42]);
    let before: Regs = *exec.cpu().regs();

    assert_eq!(exec.tick().unwrap(), StepOutcome::Completed);

    let mut expected = before;
    expected.gprs.set8(Reg8::al, 0x42);
    expected.ip += 2;
    assert_eq!(*exec.cpu().regs(), expected);
}

#[test]
fn test_unhandled_opcode_is_inert() {
    let mut exec = machine(&[0x00, 0xC0]);
    let before: Regs = *exec.cpu().regs();

    assert_eq!(exec.tick().unwrap(), StepOutcome::Completed);

    let mut expected = before;
    expected.ip += 1;
    assert_eq!(*exec.cpu().regs(), expected);
}

#[test]
fn test_unrouted_escape_raises_invalid_opcode() {
    let mut exec = machine(&[0x0F, 0x0B]);
    let StepOutcome::Faulted(e) = exec.tick().unwrap() else {
        panic!("expected #UD")
    };
    assert_eq!(e.vector, Vector::InvalidOpcode);
    assert_eq!(e.fault_code(), None);
    assert_eq!(ip(exec.cpu()), CODE_IP as u32 + 2);
}

#[test]
fn test_segment_override_redirects_memory_operand() {
    // es: mov al, [1234]
    let mut exec = machine(&[0x26, 0xA0, 0x34, 0x12]);
    exec.cpu_mut().load_segment(SegReg::Es, 0x2000).unwrap();
    exec.bus_mut().memory.load(linear(0x2000, 0x1234), &[0x5A]).unwrap();
    exec.bus_mut().memory.load(linear(0x0000, 0x1234), &[0xA5]).unwrap();

    assert_eq!(exec.tick().unwrap(), StepOutcome::Completed);
    assert_eq!(exec.cpu().regs().gprs.get8(Reg8::al), 0x5A);
    assert_eq!(exec.cpu().decode_context().seg_prefix, Some(SegReg::Es));
}

#[test]
fn test_prefix_state_does_not_leak_into_next_instruction() {
    // es: nop ; mov al, [1234]
    let mut exec = machine(&[0x26, 0x90, 0xA0, 0x34, 0x12]);
    exec.cpu_mut().load_segment(SegReg::Es, 0x2000).unwrap();
    exec.bus_mut().memory.load(linear(0x2000, 0x1234), &[0x5A]).unwrap();
    exec.bus_mut().memory.load(linear(0x0000, 0x1234), &[0xA5]).unwrap();

    exec.run(2).unwrap();
    assert_eq!(exec.cpu().regs().gprs.get8(Reg8::al), 0xA5);
    assert_eq!(exec.cpu().decode_context().seg_prefix, None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn immediate_load_of_any_value(val in any::<u8>(), enc in 0u8..8) {
        let mut exec = machine(&[0xB0 + enc, val]);
        let before: Regs = *exec.cpu().regs();
        prop_assert_eq!(exec.tick().unwrap(), StepOutcome::Completed);

        let mut expected = before;
        expected.gprs.set8(Reg8::from_encoding(enc), val);
        expected.ip += 2;
        prop_assert_eq!(*exec.cpu().regs(), expected);
    }
}
