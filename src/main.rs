use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use intcode::amplifier::best_phase_setting;
use intcode::ascii::{decode_output, feed_line};
use intcode::disasm::disassemble;
use intcode::{Machine, State, parse_program};

#[derive(Parser)]
#[command(name = "intcode", about = "Intcode interpreter and tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program, feeding it input and printing its output.
    Run(RunArgs),
    /// Print a disassembly of a program.
    Disasm {
        /// Path to the comma-separated program image.
        path: PathBuf,
    },
    /// Find the phase setting that maximizes an amplifier chain's signal.
    Amplify {
        /// Path to the comma-separated program image.
        path: PathBuf,

        /// Phase values to permute, comma-separated.
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, default_value = "0,1,2,3,4")]
        phases: Vec<i64>,

        /// Wire the last amplifier back into the first.
        #[arg(long)]
        feedback: bool,
    },
    /// Run a program repeatedly from scratch and report throughput.
    Bench {
        /// Path to the comma-separated program image.
        path: PathBuf,

        /// Number of runs.
        #[arg(long, default_value_t = 1000)]
        iterations: usize,

        /// Input value fed before each run (repeatable).
        #[arg(long = "input", allow_negative_numbers = true)]
        inputs: Vec<i64>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to the comma-separated program image.
    path: PathBuf,

    /// Input value fed before the first run (repeatable).
    #[arg(long = "input", allow_negative_numbers = true)]
    inputs: Vec<i64>,

    /// Memory patch applied before running, as ADDR=VALUE (repeatable).
    #[arg(long = "set", value_parser = parse_patch)]
    patches: Vec<(usize, i64)>,

    /// Treat input lines and output values as ASCII text.
    #[arg(long)]
    ascii: bool,
}

/// Parse an "ADDR=VALUE" memory patch.
fn parse_patch(s: &str) -> Result<(usize, i64), String> {
    let (addr, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid patch '{s}', expected ADDR=VALUE (e.g. 1=12)"))?;
    let addr = addr.parse::<usize>().map_err(|e| format!("Invalid patch address: {e}"))?;
    let value = value.parse::<i64>().map_err(|e| format!("Invalid patch value: {e}"))?;
    Ok((addr, value))
}

fn read_program(path: &Path) -> Result<Vec<i64>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
    parse_program(&text).map_err(|e| format!("{}: {e}", path.display()))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(&args),
        Command::Disasm { path } => read_program(&path).map(|program| {
            print!("{}", disassemble(&program));
        }),
        Command::Amplify {
            path,
            phases,
            feedback,
        } => amplify(&path, &phases, feedback),
        Command::Bench {
            path,
            iterations,
            inputs,
        } => run_benchmark(&path, iterations, &inputs),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &RunArgs) -> Result<(), String> {
    let mut machine = Machine::new(read_program(&args.path)?).map_err(|e| e.to_string())?;
    for &(addr, value) in &args.patches {
        machine.write(addr, value);
    }
    machine.feed_all(args.inputs.iter().copied());

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let state = machine.run().map_err(|e| e.to_string())?;
        print_output(&machine.drain_output(), args.ascii);
        if state == State::Halted {
            return Ok(());
        }

        // Waiting for input: take the next line from stdin.
        let Some(line) = lines.next() else {
            return Err("Program is waiting for input but stdin is closed".to_string());
        };
        let line = line.map_err(|e| format!("Cannot read stdin: {e}"))?;
        if args.ascii {
            feed_line(&mut machine, &line);
        } else {
            for token in line.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                let value = token
                    .parse::<i64>()
                    .map_err(|e| format!("Invalid input value '{token}': {e}"))?;
                machine.feed(value);
            }
        }
    }
}

fn print_output(output: &[i64], ascii: bool) {
    if output.is_empty() {
        return;
    }
    if ascii {
        let decoded = decode_output(output);
        print!("{}", decoded.text);
        for value in decoded.values {
            println!("{value}");
        }
    } else {
        let joined = output.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        println!("{joined}");
    }
}

fn amplify(path: &Path, phases: &[i64], feedback: bool) -> Result<(), String> {
    let program = read_program(path)?;
    let (signal, best) = best_phase_setting(&program, phases, feedback).map_err(|e| e.to_string())?;
    let best = best.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
    println!("{signal}");
    eprintln!("Phases: {best}");
    Ok(())
}

fn run_benchmark(path: &Path, iterations: usize, inputs: &[i64]) -> Result<(), String> {
    let program = read_program(path)?;

    let start = std::time::Instant::now();
    let mut total_outputs = 0usize;
    let mut halted = 0usize;
    for _ in 0..iterations {
        let mut machine = Machine::new(program.clone()).map_err(|e| e.to_string())?;
        machine.feed_all(inputs.iter().copied());
        if machine.run().map_err(|e| e.to_string())? == State::Halted {
            halted += 1;
        }
        total_outputs += machine.drain_output().len();
    }
    let elapsed = start.elapsed();

    let runs_per_sec = iterations as f64 / elapsed.as_secs_f64();

    eprintln!("Benchmark results:");
    eprintln!("  Program size:      {}", program.len());
    eprintln!("  Runs:              {iterations}");
    eprintln!("  Halted:            {halted}");
    eprintln!("  Total outputs:     {total_outputs}");
    eprintln!("  Elapsed:           {elapsed:.2?}");
    eprintln!("  Runs/sec:          {runs_per_sec:.1}");
    Ok(())
}
