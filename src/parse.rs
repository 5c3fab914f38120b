use std::str::FromStr;

use crate::error::{IntcodeError, Result};
use crate::machine::Machine;

/// Parse a program image: comma-separated base-10 signed integers.
///
/// Only the first line of `text` is read, so a trailing newline (or a
/// Windows line ending) in the puzzle input is fine. Tokens are parsed
/// strictly: no inner whitespace, no empty fields.
pub fn parse_program(text: &str) -> Result<Vec<i64>> {
    let line = text.lines().next().unwrap_or("").trim_end_matches('\r');
    if line.is_empty() {
        return Err(IntcodeError::EmptyProgram);
    }
    line.split(',')
        .enumerate()
        .map(|(index, token)| {
            token.parse::<i64>().map_err(|_| IntcodeError::Parse {
                index,
                token: token.to_string(),
            })
        })
        .collect()
}

impl FromStr for Machine {
    type Err = IntcodeError;

    fn from_str(s: &str) -> Result<Self> {
        Machine::new(parse_program(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::State;

    #[test]
    fn parses_simple_program() {
        assert_eq!(parse_program("1,0,0,0,99").unwrap(), vec![1, 0, 0, 0, 99]);
    }

    #[test]
    fn parses_negative_and_large_values() {
        assert_eq!(
            parse_program("104,1125899906842624,-7,99").unwrap(),
            vec![104, 1125899906842624, -7, 99]
        );
    }

    #[test]
    fn ignores_trailing_newline() {
        assert_eq!(parse_program("3,0,4,0,99\n").unwrap(), vec![3, 0, 4, 0, 99]);
        assert_eq!(parse_program("3,0,4,0,99\r\n").unwrap(), vec![3, 0, 4, 0, 99]);
    }

    #[test]
    fn only_first_line_is_read() {
        assert_eq!(parse_program("99\nnot,a,program").unwrap(), vec![99]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(parse_program(""), Err(IntcodeError::EmptyProgram));
        assert_eq!(parse_program("\n"), Err(IntcodeError::EmptyProgram));
    }

    #[test]
    fn bad_tokens_are_located() {
        assert_eq!(
            parse_program("1,2,x,4"),
            Err(IntcodeError::Parse { index: 2, token: "x".into() })
        );
        assert_eq!(
            parse_program("1,,99"),
            Err(IntcodeError::Parse { index: 1, token: String::new() })
        );
        assert_eq!(
            parse_program("1, 2"),
            Err(IntcodeError::Parse { index: 1, token: " 2".into() })
        );
    }

    #[test]
    fn trailing_comma_is_rejected() {
        assert!(matches!(
            parse_program("99,"),
            Err(IntcodeError::Parse { index: 1, .. })
        ));
    }

    #[test]
    fn machine_from_str() {
        let mut m: Machine = "3,0,4,0,99".parse().unwrap();
        assert_eq!(m.run(), Ok(State::AwaitingInput));
        m.feed(12);
        assert_eq!(m.run_with_input([]).unwrap(), vec![12]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parse_never_panics(text in "[-0-9,\\n a-z]{0,64}") {
            let _ = parse_program(&text);
        }
    }
}
