use quartz_core::cpu::Flag;
mod common;
use common::{exec, test_cpu, TestBus};

// --- 8-bit ADD/ADC ---

#[test]
fn test_add_a_r() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x44;
    cpu.b = 0x11;
    bus.load(0, &[0x80]); // ADD A, B

    let cycles = exec(&mut cpu, &mut bus);
    assert_eq!(cycles, 4);
    assert_eq!(cpu.a, 0x55);
    assert!(!cpu.flag(Flag::C));
    assert!(!cpu.flag(Flag::N));
}

#[test]
fn test_add_a_overflow() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x7f;
    bus.load(0, &[0xC6, 0x01]); // ADD A, 0x01

    let cycles = exec(&mut cpu, &mut bus);
    assert_eq!(cycles, 7);
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.flag(Flag::PV), "0x7f + 1 overflows");
    assert!(cpu.flag(Flag::H));
    assert!(cpu.flag(Flag::S));
    assert!(!cpu.flag(Flag::C));
}

#[test]
fn test_add_a_carry_out() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0xff;
    bus.load(0, &[0xC6, 0x01]);

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flag(Flag::C));
    assert!(cpu.flag(Flag::Z));
    assert!(!cpu.flag(Flag::PV), "0xff + 1 does not overflow signed");
}

#[test]
fn test_adc_a_uses_carry() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x10;
    cpu.set_flag(Flag::C, true);
    cpu.b = 0x0f;
    bus.load(0, &[0x88]); // ADC A, B

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x20);
    assert!(cpu.flag(Flag::H), "carry into bit 4");
    assert!(!cpu.flag(Flag::C));
}

#[test]
fn test_add_a_hl_indirect() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x20;
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0x22;
    bus.load(0, &[0x86]); // ADD A, (HL)

    let cycles = exec(&mut cpu, &mut bus);
    assert_eq!(cycles, 7);
    assert_eq!(cpu.a, 0x42);
}

// --- 8-bit SUB/SBC/CP ---

#[test]
fn test_sub_a_r() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x10;
    cpu.c = 0x20;
    bus.load(0, &[0x91]); // SUB C

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0xf0);
    assert!(cpu.flag(Flag::C), "borrow");
    assert!(cpu.flag(Flag::N));
    assert!(cpu.flag(Flag::S));
}

#[test]
fn test_sub_a_overflow() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x80;
    bus.load(0, &[0xD6, 0x01]); // SUB 0x01

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x7f);
    assert!(cpu.flag(Flag::PV));
    assert!(cpu.flag(Flag::H));
}

#[test]
fn test_sbc_a_borrows_carry() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x10;
    cpu.set_flag(Flag::C, true);
    bus.load(0, &[0xDE, 0x0f]); // SBC A, 0x0f

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flag(Flag::Z));
}

#[test]
fn test_cp_preserves_a_takes_53_from_operand() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x40;
    bus.load(0, &[0xFE, 0x28]); // CP 0x28

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x40, "CP leaves A alone");
    assert!(cpu.flag(Flag::Y), "bit 5 from the operand");
    assert!(cpu.flag(Flag::X), "bit 3 from the operand");
    assert!(cpu.flag(Flag::N));
}

#[test]
fn test_cp_equal_sets_zero() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x55;
    cpu.d = 0x55;
    bus.load(0, &[0xBA]); // CP D

    exec(&mut cpu, &mut bus);
    assert!(cpu.flag(Flag::Z));
    assert!(!cpu.flag(Flag::C));
}

// --- Logic ops ---

#[test]
fn test_and_a_sets_half_carry() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0xf0;
    cpu.e = 0x0f;
    bus.load(0, &[0xA3]); // AND E

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flag(Flag::Z));
    assert!(cpu.flag(Flag::H), "AND always sets H");
    assert!(cpu.flag(Flag::PV), "parity of zero is even");
    assert!(!cpu.flag(Flag::C));
}

#[test]
fn test_xor_a_clears_everything() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0xa5;
    cpu.set_flag(Flag::C, true);
    bus.load(0, &[0xAF]); // XOR A

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0);
    assert!(cpu.flag(Flag::Z));
    assert!(!cpu.flag(Flag::C));
    assert!(!cpu.flag(Flag::H));
}

#[test]
fn test_or_a_parity() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.a = 0x01;
    cpu.l = 0x02;
    bus.load(0, &[0xB5]); // OR L

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x03);
    assert!(cpu.flag(Flag::PV), "two bits set, even parity");
}

// --- INC/DEC ---

#[test]
fn test_inc_r_preserves_carry() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.b = 0x7f;
    cpu.set_flag(Flag::C, true);
    bus.load(0, &[0x04]); // INC B

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.b, 0x80);
    assert!(cpu.flag(Flag::PV), "0x7f -> 0x80 overflows");
    assert!(cpu.flag(Flag::H));
    assert!(cpu.flag(Flag::C), "carry untouched");
}

#[test]
fn test_dec_r_flags() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.d = 0x80;
    bus.load(0, &[0x15]); // DEC D

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.d, 0x7f);
    assert!(cpu.flag(Flag::PV));
    assert!(cpu.flag(Flag::H));
    assert!(cpu.flag(Flag::N));
}

#[test]
fn test_inc_hl_indirect() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.set_hl(0x4000);
    bus.memory[0x4000] = 0x41;
    bus.load(0, &[0x34]); // INC (HL)

    let cycles = exec(&mut cpu, &mut bus);
    assert_eq!(cycles, 11);
    assert_eq!(bus.memory[0x4000], 0x42);
}

// --- ADD HL, rr ---

#[test]
fn test_add_hl_bc() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.set_hl(0x1000);
    cpu.set_bc(0x2000);
    bus.load(0, &[0x09]); // ADD HL, BC

    let cycles = exec(&mut cpu, &mut bus);
    assert_eq!(cycles, 11, "ADD HL,rr should be 11 T-states");
    assert_eq!(cpu.get_hl(), 0x3000);
    assert!(!cpu.flag(Flag::C));
    assert!(!cpu.flag(Flag::N));
    assert_eq!(cpu.memptr, 0x1001, "MEMPTR is old HL + 1");
}

#[test]
fn test_add_hl_de_carry() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.set_hl(0x8000);
    cpu.set_de(0x8000);
    bus.load(0, &[0x19]); // ADD HL, DE

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.get_hl(), 0x0000);
    assert!(cpu.flag(Flag::C));
}

#[test]
fn test_add_hl_half_carry_from_bit_11() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.set_hl(0x0fff);
    cpu.set_bc(0x0001);
    bus.load(0, &[0x09]);

    exec(&mut cpu, &mut bus);
    assert_eq!(cpu.get_hl(), 0x1000);
    assert!(cpu.flag(Flag::H));
}

#[test]
fn test_add_hl_preserves_sign_zero_parity() {
    let mut cpu = test_cpu();
    let mut bus = TestBus::new();
    cpu.set_flags(0xc4); // S, Z, PV
    cpu.set_hl(0x1100);
    cpu.sp = 0;
    bus.load(0, &[0x39]); // ADD HL, SP

    exec(&mut cpu, &mut bus);
    assert!(cpu.flag(Flag::S));
    assert!(cpu.flag(Flag::Z));
    assert!(cpu.flag(Flag::PV));
}

// --- Exhaustive properties ---

#[test]
fn test_inc_then_dec_restores_every_value() {
    for v in 0..=0xffu8 {
        let mut cpu = test_cpu();
        let mut bus = TestBus::new();
        cpu.a = v;
        bus.load(0, &[0x3C, 0x3D]); // INC A; DEC A

        exec(&mut cpu, &mut bus);
        exec(&mut cpu, &mut bus);
        assert_eq!(cpu.a, v, "INC/DEC round trip of {v:#04x}");
    }
}

#[test]
fn test_add_carry_identities_all_pairs() {
    for a in 0..=0xffu32 {
        for b in 0..=0xffu32 {
            let mut cpu = test_cpu();
            let mut bus = TestBus::new();
            cpu.a = a as u8;
            bus.load(0, &[0xC6, b as u8]); // ADD A, b

            exec(&mut cpu, &mut bus);
            assert_eq!(cpu.flag(Flag::C), a + b > 255, "carry for {a} + {b}");
            assert_eq!(
                cpu.flag(Flag::H),
                (a & 0x0f) + (b & 0x0f) > 15,
                "half carry for {a} + {b}"
            );
        }
    }
}

#[test]
fn test_logic_parity_all_values() {
    for v in 0..=0xffu8 {
        let mut cpu = test_cpu();
        let mut bus = TestBus::new();
        cpu.a = v;
        bus.load(0, &[0xB7]); // OR A

        exec(&mut cpu, &mut bus);
        assert_eq!(
            cpu.flag(Flag::PV),
            v.count_ones() % 2 == 0,
            "parity of {v:#04x}"
        );
    }
}
