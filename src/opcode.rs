use crate::error::{IntcodeError, Result};

/// The ten Intcode operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Multiply,
    Input,
    Output,
    JumpIfTrue,
    JumpIfFalse,
    LessThan,
    Equals,
    AdjustRelativeBase,
    Halt,
}

impl Opcode {
    pub const ALL: [Opcode; 10] = [
        Opcode::Add,
        Opcode::Multiply,
        Opcode::Input,
        Opcode::Output,
        Opcode::JumpIfTrue,
        Opcode::JumpIfFalse,
        Opcode::LessThan,
        Opcode::Equals,
        Opcode::AdjustRelativeBase,
        Opcode::Halt,
    ];

    pub fn from_code(code: i64) -> Option<Opcode> {
        match code {
            1 => Some(Opcode::Add),
            2 => Some(Opcode::Multiply),
            3 => Some(Opcode::Input),
            4 => Some(Opcode::Output),
            5 => Some(Opcode::JumpIfTrue),
            6 => Some(Opcode::JumpIfFalse),
            7 => Some(Opcode::LessThan),
            8 => Some(Opcode::Equals),
            9 => Some(Opcode::AdjustRelativeBase),
            99 => Some(Opcode::Halt),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Opcode::Add => 1,
            Opcode::Multiply => 2,
            Opcode::Input => 3,
            Opcode::Output => 4,
            Opcode::JumpIfTrue => 5,
            Opcode::JumpIfFalse => 6,
            Opcode::LessThan => 7,
            Opcode::Equals => 8,
            Opcode::AdjustRelativeBase => 9,
            Opcode::Halt => 99,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Multiply => "mul",
            Opcode::Input => "in",
            Opcode::Output => "out",
            Opcode::JumpIfTrue => "jnz",
            Opcode::JumpIfFalse => "jz",
            Opcode::LessThan => "lt",
            Opcode::Equals => "eq",
            Opcode::AdjustRelativeBase => "arb",
            Opcode::Halt => "halt",
        }
    }

    pub fn operand_count(self) -> usize {
        match self {
            Opcode::Add | Opcode::Multiply | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustRelativeBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Words occupied by the instruction, opcode word included.
    pub fn width(self) -> usize {
        self.operand_count() + 1
    }

    /// Whether the final operand names a destination rather than a value.
    pub fn writes_last_operand(self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Multiply | Opcode::Input | Opcode::LessThan | Opcode::Equals
        )
    }
}

/// How an operand word maps to a value or an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// The operand is an address.
    #[default]
    Position,
    /// The operand is the value itself. Never legal for a destination.
    Immediate,
    /// The operand is an offset from the relative base.
    Relative,
}

impl Mode {
    pub fn from_digit(digit: i64) -> Option<Mode> {
        match digit {
            0 => Some(Mode::Position),
            1 => Some(Mode::Immediate),
            2 => Some(Mode::Relative),
            _ => None,
        }
    }
}

/// A decoded instruction word: the operation plus one mode per operand slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub modes: [Mode; 3],
}

impl Instruction {
    /// Split `word`, found at `address`, into opcode and mode digits.
    ///
    /// Only the mode digits of operands the opcode actually takes are
    /// validated; the rest stay `Position` and are never consulted.
    pub fn decode(word: i64, address: usize) -> Result<Instruction> {
        if word < 0 {
            return Err(IntcodeError::InvalidOpcode { opcode: word, address });
        }
        let code = word % 100;
        let opcode =
            Opcode::from_code(code).ok_or(IntcodeError::InvalidOpcode { opcode: code, address })?;

        let mut modes = [Mode::Position; 3];
        let mut divisor = 100;
        for (slot, mode) in modes.iter_mut().enumerate().take(opcode.operand_count()) {
            let digit = (word / divisor) % 10;
            *mode = Mode::from_digit(digit).ok_or(IntcodeError::InvalidMode { mode: digit, address })?;
            let is_destination = opcode.writes_last_operand() && slot + 1 == opcode.operand_count();
            if is_destination && *mode == Mode::Immediate {
                return Err(IntcodeError::ImmediateWrite { address });
            }
            divisor *= 10;
        }

        Ok(Instruction { opcode, modes })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn decode_never_panics(word in any::<i64>(), address in 0usize..1 << 20) {
            let _ = Instruction::decode(word, address);
        }

        #[test]
        fn decoded_modes_come_from_digits(
            op in prop::sample::select(Opcode::ALL.to_vec()),
            m1 in 0i64..3, m2 in 0i64..3, m3 in 0i64..3,
        ) {
            let word = op.code() + m1 * 100 + m2 * 1000 + m3 * 10000;
            match Instruction::decode(word, 0) {
                Ok(ins) => {
                    prop_assert_eq!(ins.opcode, op);
                    let digits = [m1, m2, m3];
                    for slot in 0..op.operand_count() {
                        prop_assert_eq!(Some(ins.modes[slot]), Mode::from_digit(digits[slot]));
                    }
                }
                Err(IntcodeError::ImmediateWrite { .. }) => {
                    prop_assert!(op.writes_last_operand());
                    prop_assert_eq!([m1, m2, m3][op.operand_count() - 1], 1);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }
}
