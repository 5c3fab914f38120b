use std::fmt::Write;

use crate::opcode::{Instruction, Mode};

/// Pretty-print a disassembly of a program image for human inspection.
///
/// Decoding is linear from address 0: each recognized instruction consumes
/// its full width, anything else (including an instruction cut off by the
/// end of the image) is shown as a single `data` word. Since code and data
/// share memory, data regions may happen to decode as instructions.
///
/// Operands render as `[a]` for position mode, `#a` for immediate mode and
/// `[rb+a]` for relative mode.
pub fn disassemble(program: &[i64]) -> String {
    let mut out = String::new();
    let mut addr = 0;
    while addr < program.len() {
        let word = program[addr];
        let decoded = Instruction::decode(word, addr)
            .ok()
            .filter(|ins| addr + ins.opcode.width() <= program.len());

        let Some(ins) = decoded else {
            let _ = writeln!(out, "{addr:05}: {word:<28} data");
            addr += 1;
            continue;
        };

        let width = ins.opcode.width();
        let raw = &program[addr..addr + width];
        let words = raw.iter().map(i64::to_string).collect::<Vec<_>>().join(" ");
        let operands = raw[1..]
            .iter()
            .zip(ins.modes)
            .map(|(&value, mode)| render_operand(value, mode))
            .collect::<Vec<_>>()
            .join(", ");
        let mnemonic = ins.opcode.mnemonic();
        if operands.is_empty() {
            let _ = writeln!(out, "{addr:05}: {words:<28} {mnemonic}");
        } else {
            let _ = writeln!(out, "{addr:05}: {words:<28} {mnemonic:<5}{operands}");
        }
        addr += width;
    }
    out
}

fn render_operand(value: i64, mode: Mode) -> String {
    match mode {
        Mode::Position => format!("[{value}]"),
        Mode::Immediate => format!("#{value}"),
        Mode::Relative => format!("[rb{value:+}]"),
    }
}
