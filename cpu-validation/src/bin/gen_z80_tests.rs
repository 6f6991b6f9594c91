use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use quartz_core::core::NullNotify;
use quartz_core::cpu::{CpuStateTrait, IntMode, Z80, Z80State};
use quartz_cpu_validation::{BusOp, TracingBus, Z80CpuState, Z80TestCase};
use rand::Rng;

const NUM_TESTS: usize = 1000;

fn random_state(rng: &mut impl Rng, max_pc: u16) -> Z80State {
    Z80State {
        a: rng.r#gen(),
        f: rng.r#gen(),
        b: rng.r#gen(),
        c: rng.r#gen(),
        d: rng.r#gen(),
        e: rng.r#gen(),
        h: rng.r#gen(),
        l: rng.r#gen(),
        a_prime: rng.r#gen(),
        f_prime: rng.r#gen(),
        b_prime: rng.r#gen(),
        c_prime: rng.r#gen(),
        d_prime: rng.r#gen(),
        e_prime: rng.r#gen(),
        h_prime: rng.r#gen(),
        l_prime: rng.r#gen(),
        ix: rng.r#gen(),
        iy: rng.r#gen(),
        sp: rng.r#gen(),
        pc: rng.gen_range(0..=max_pc),
        i: rng.r#gen(),
        r: rng.r#gen(),
        memptr: rng.r#gen(),
        iff1: rng.r#gen(),
        iff2: rng.r#gen(),
        im: match rng.gen_range(0..3u8) {
            1 => IntMode::Im1,
            2 => IntMode::Im2,
            _ => IntMode::Im0,
        },
        halted: false,
        int_line: false,
        pending_ei: false,
        nmi_pending: false,
        last_flag_q: rng.r#gen(),
    }
}

fn to_vector_state(s: &Z80State, ram: Vec<(u16, u8)>) -> Z80CpuState {
    Z80CpuState {
        pc: s.pc,
        sp: s.sp,
        a: s.a,
        b: s.b,
        c: s.c,
        d: s.d,
        e: s.e,
        f: s.f,
        h: s.h,
        l: s.l,
        i: s.i,
        r: s.r,
        ei: s.pending_ei as u8,
        wz: s.memptr,
        ix: s.ix,
        iy: s.iy,
        af_prime: ((s.a_prime as u16) << 8) | s.f_prime as u16,
        bc_prime: ((s.b_prime as u16) << 8) | s.c_prime as u16,
        de_prime: ((s.d_prime as u16) << 8) | s.e_prime as u16,
        hl_prime: ((s.h_prime as u16) << 8) | s.l_prime as u16,
        im: match s.im {
            IntMode::Im0 => 0,
            IntMode::Im1 => 1,
            IntMode::Im2 => 2,
        },
        p: 0,
        q: s.last_flag_q as u8,
        iff1: s.iff1 as u8,
        iff2: s.iff2 as u8,
        ram,
    }
}

fn build_ram(memory: &[u8; 0x10000], addresses: &BTreeSet<u16>) -> Vec<(u16, u8)> {
    addresses
        .iter()
        .map(|&addr| (addr, memory[addr as usize]))
        .collect()
}

/// Generate NUM_TESTS randomized vectors for one instruction template. The
/// template bytes are pinned at PC; everything past them comes from the
/// random memory fill, so prefixed families are exercised through their
/// whole sub-opcode range.
fn generate_template(rng: &mut impl Rng, template: &[u8]) -> Vec<Z80TestCase> {
    let mut tests = Vec::with_capacity(NUM_TESTS);
    let max_pc = (0x10000 - template.len()) as u16;

    while tests.len() < NUM_TESTS {
        let mut cpu = Z80::new();
        let mut bus = TracingBus::new();

        rng.fill(&mut bus.memory[..]);
        for _ in 0..4 {
            bus.port_queue.push(rng.r#gen());
        }

        let state = random_state(rng, max_pc);
        cpu.restore(&state);

        let pc = state.pc;
        for (i, &byte) in template.iter().enumerate() {
            bus.memory[pc as usize + i] = byte;
        }
        let pre_memory = bus.memory.clone();

        // Run to instruction completion. Random bytes behind a pinned DD or
        // FD can chain prefixes across steps; overly long chains are rare
        // and simply regenerated.
        let mut steps = 0;
        loop {
            cpu.step(&mut bus, &mut NullNotify);
            steps += 1;
            if cpu.prefix() == 0 {
                break;
            }
            if steps > 8 {
                break;
            }
        }
        if cpu.prefix() != 0 {
            continue;
        }

        let final_full = cpu.snapshot();

        // Every memory address the instruction touched, from the trace
        let addresses: BTreeSet<u16> = bus
            .cycles
            .iter()
            .filter(|c| {
                matches!(c.op, Some(BusOp::Fetch) | Some(BusOp::Read) | Some(BusOp::Write))
            })
            .filter_map(|c| c.addr)
            .collect();

        let initial = to_vector_state(&state, build_ram(&pre_memory, &addresses));
        let final_state = to_vector_state(&final_full, build_ram(&bus.memory, &addresses));

        let ports: Vec<(u16, u8, String)> = bus
            .port_log
            .iter()
            .map(|&(addr, data, op)| {
                let dir = if op == BusOp::PortRead { "r" } else { "w" };
                (addr, data, dir.to_string())
            })
            .collect();

        let name = template
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ");

        tests.push(Z80TestCase {
            name: format!("{} #{}", name, tests.len()),
            initial,
            final_state,
            cycles: bus.trace(),
            ports,
        });
    }

    tests
}

fn generate_and_write(rng: &mut impl Rng, template: &[u8], out_dir: &Path) {
    let tests = generate_template(rng, template);
    let stem = template
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ");
    let out_path = out_dir.join(format!("{}.json", stem));
    let json = serde_json::to_string(&tests).expect("Failed to serialize test cases");
    fs::write(&out_path, json).expect("Failed to write output file");
    println!(
        "Generated {} tests for {} -> {}",
        tests.len(),
        stem,
        out_path.display()
    );
}

fn parse_template(arg: &str) -> Vec<u8> {
    arg.split([' ', '_'])
        .filter(|s| !s.is_empty())
        .map(|s| {
            let s = s.trim_start_matches("0x").trim_start_matches("0X");
            u8::from_str_radix(s, 16).unwrap_or_else(|_| {
                eprintln!("Invalid hex byte: {}", s);
                std::process::exit(1);
            })
        })
        .collect()
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: gen_z80_tests <template | all>");
        eprintln!("Examples:");
        eprintln!("  gen_z80_tests 0x86          # one main-table opcode");
        eprintln!("  gen_z80_tests 'ed a0'       # prefixed instruction");
        eprintln!("  gen_z80_tests all           # full main table");
        std::process::exit(1);
    }

    let out_dir = Path::new("test_data/z80/v1");
    fs::create_dir_all(out_dir).expect("Failed to create output directory");

    let mut rng = rand::thread_rng();

    if args[1] == "all" {
        for opcode in 0x00..=0xFFu8 {
            generate_and_write(&mut rng, &[opcode], out_dir);
        }
        println!("Generated tests for 256 opcodes");
    } else {
        let template = parse_template(&args[1]);
        if template.is_empty() {
            eprintln!("Empty instruction template");
            std::process::exit(1);
        }
        generate_and_write(&mut rng, &template, out_dir);
    }
}
