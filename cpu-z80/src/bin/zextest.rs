//! CP/M harness for running the ZEXDOC/ZEXALL Z80 instruction exercisers.
//!
//! Usage:
//!   cargo run -p cpu-z80 --bin zextest --release -- path/to/zexall.com
//!
//! The exerciser's output goes to stdout in real time; progress and
//! statistics go to stderr. The program exits by returning to the CP/M
//! warm-boot address, which the system detects as termination.

use std::io::Write;
use std::time::Instant;
use std::{env, fs, io, process};

use cpu_z80::{System, SystemConfig};

/// CP/M COM files load at the start of the transient program area.
const TPA_START: usize = 0x0100;

fn main() {
    let path = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: zextest <program.com>");
        eprintln!("  program.com - CP/M binary to run (e.g. zexdoc.com, zexall.com)");
        process::exit(1);
    });

    let binary = fs::read(&path).unwrap_or_else(|err| {
        eprintln!("cannot read {path}: {err}");
        process::exit(1);
    });

    let mut system = System::with_config(&SystemConfig {
        cpm_stub: true,
        ..SystemConfig::default()
    });
    system
        .memory_mut()
        .set_range(TPA_START, binary.len(), &binary)
        .unwrap_or_else(|err| {
            eprintln!("cannot load {path}: {err}");
            process::exit(1);
        });

    eprintln!("Running {path}...\n");

    let start_time = Instant::now();
    let mut instructions: u64 = 0;

    let report_interval = 10_000_000u64;
    let mut next_report = report_interval;

    while system.running() {
        system.execute_instruction();
        instructions += 1;

        if instructions >= next_report {
            let elapsed = start_time.elapsed().as_secs_f64();
            let mips = instructions as f64 / elapsed / 1_000_000.0;
            eprint!(
                "\r[{:.1}s] {:>6.1}M instructions, {:.1} MIPS",
                elapsed,
                instructions as f64 / 1_000_000.0,
                mips
            );
            let _ = io::stderr().flush();
            next_report += report_interval;
        }
    }

    let elapsed = start_time.elapsed();
    eprintln!("\n\nCompleted in {:.2}s", elapsed.as_secs_f64());
    eprintln!(
        "Instructions: {} ({:.1}M)",
        instructions,
        instructions as f64 / 1_000_000.0
    );
    eprintln!(
        "Speed: {:.1} MIPS",
        instructions as f64 / elapsed.as_secs_f64() / 1_000_000.0
    );
}
