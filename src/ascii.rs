//! The ASCII convention used by text-driven programs: input is fed one
//! character code at a time with each line terminated by 10, and output
//! codes 0..=127 are text. Anything outside that range is a plain number,
//! typically the final answer a program reports after its text.

use crate::machine::Machine;

/// Feed `line` followed by a newline.
pub fn feed_line(machine: &mut Machine, line: &str) {
    machine.feed_all(line.bytes().map(i64::from));
    machine.feed(i64::from(b'\n'));
}

/// Output split into its text and its non-ASCII values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsciiOutput {
    pub text: String,
    pub values: Vec<i64>,
}

pub fn decode_output(output: &[i64]) -> AsciiOutput {
    let mut decoded = AsciiOutput::default();
    for &value in output {
        match u8::try_from(value) {
            Ok(byte) if byte.is_ascii() => decoded.text.push(char::from(byte)),
            _ => decoded.values.push(value),
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_line_appends_newline() {
        // Echo program: read and write until the queue runs dry.
        let mut m = Machine::new(vec![3, 10, 4, 10, 1105, 1, 0, 99]).unwrap();
        feed_line(&mut m, "A,B");
        assert_eq!(m.pending_input(), 4);
        m.run().unwrap();
        assert_eq!(m.drain_output(), vec![65, 44, 66, 10]);
    }

    #[test]
    fn decode_splits_text_and_values() {
        let out = decode_output(&[46, 35, 10, 46, 1_000_000, -1]);
        assert_eq!(out.text, ".#\n.");
        assert_eq!(out.values, vec![1_000_000, -1]);
    }

    #[test]
    fn decode_of_empty_output() {
        assert_eq!(decode_output(&[]), AsciiOutput::default());
    }

    #[test]
    fn byte_values_above_ascii_are_numbers() {
        let out = decode_output(&[128, 255, 127]);
        assert_eq!(out.text, "\u{7f}");
        assert_eq!(out.values, vec![128, 255]);
    }
}
