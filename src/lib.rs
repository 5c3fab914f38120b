pub mod error;
pub mod memory;
pub mod opcode;
pub mod machine;
pub mod parse;
pub mod ascii;
pub mod amplifier;
pub mod disasm;

pub use error::{IntcodeError, Result};
pub use machine::{Machine, State};
pub use parse::parse_program;
