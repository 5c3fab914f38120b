//! Chains of machines running the same program, each primed with a phase
//! setting, where one stage's output becomes the next stage's input.
//!
//! Stages are independent [`Machine`]s driven in turn on the calling
//! thread; nothing here runs two machines at once.

use log::debug;

use crate::error::{IntcodeError, Result};
use crate::machine::{Machine, State};

fn prime(program: &[i64], phases: &[i64]) -> Result<Vec<Machine>> {
    phases
        .iter()
        .enumerate()
        .map(|(stage, &phase)| {
            let mut amp = Machine::new(program.to_vec())?.with_id(stage);
            amp.feed(phase);
            Ok(amp)
        })
        .collect()
}

/// Run each stage to completion in order, passing one signal down the line.
///
/// Every stage gets `[phase, signal]` and must write exactly one value,
/// which becomes the next signal.
pub fn run_chain(program: &[i64], phases: &[i64], input: i64) -> Result<i64> {
    let mut signal = input;
    for (stage, mut amp) in prime(program, phases)?.into_iter().enumerate() {
        amp.feed(signal);
        let state = amp.run()?;
        let output = amp.drain_output();
        signal = match output.as_slice() {
            [value] => *value,
            [] if state == State::AwaitingInput => {
                return Err(IntcodeError::StalledChain { stage });
            }
            [] => return Err(IntcodeError::MissingOutput { stage }),
            many => {
                return Err(IntcodeError::ExtraOutput { stage, count: many.len() });
            }
        };
    }
    Ok(signal)
}

/// Run the stages round-robin with the last stage wired back to the first,
/// until the last stage halts. Returns the last signal it produced.
pub fn run_feedback_loop(program: &[i64], phases: &[i64], input: i64) -> Result<i64> {
    let mut amps = prime(program, phases)?;
    let Some(last) = amps.len().checked_sub(1) else {
        return Ok(input);
    };

    let mut signals = vec![input];
    let mut final_signal = None;
    let mut round = 0usize;
    loop {
        let mut produced = false;
        for (stage, amp) in amps.iter_mut().enumerate() {
            amp.feed_all(signals.drain(..));
            amp.run()?;
            signals = amp.drain_output();
            produced |= !signals.is_empty();
            if stage == last {
                if let Some(&value) = signals.last() {
                    final_signal = Some(value);
                }
            }
        }
        round += 1;

        if amps[last].is_halted() {
            debug!("feedback loop settled after {round} round(s)");
            return final_signal.ok_or(IntcodeError::MissingOutput { stage: last });
        }
        if !produced {
            let stage = amps
                .iter()
                .position(|amp| amp.state() == State::AwaitingInput)
                .unwrap_or(0);
            return Err(IntcodeError::StalledChain { stage });
        }
    }
}

/// Try every ordering of `phases` and return the largest final signal
/// together with the ordering that produced it.
pub fn best_phase_setting(program: &[i64], phases: &[i64], feedback: bool) -> Result<(i64, Vec<i64>)> {
    let mut best: Option<(i64, Vec<i64>)> = None;
    for candidate in permutations(phases) {
        let signal = if feedback {
            run_feedback_loop(program, &candidate, 0)?
        } else {
            run_chain(program, &candidate, 0)?
        };
        if best.as_ref().is_none_or(|(top, _)| signal > *top) {
            debug!("new best signal {signal} from phases {candidate:?}");
            best = Some((signal, candidate));
        }
    }
    // `permutations` always yields at least one ordering.
    Ok(best.unwrap_or((0, Vec::new())))
}

/// All orderings of `items`, generated with Heap's algorithm.
pub fn permutations(items: &[i64]) -> Vec<Vec<i64>> {
    let mut items = items.to_vec();
    let n = items.len();
    let mut result = vec![items.clone()];
    let mut counters = vec![0usize; n];
    let mut i = 1;
    while i < n {
        if counters[i] < i {
            if i % 2 == 0 {
                items.swap(0, i);
            } else {
                items.swap(counters[i], i);
            }
            result.push(items.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SERIAL_A: [i64; 17] = [3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0];
    const SERIAL_B: [i64; 25] = [
        3, 23, 3, 24, 1002, 24, 10, 24, 1002, 23, -1, 23, 101, 5, 23, 23, 1, 24, 23, 23, 4, 23,
        99, 0, 0,
    ];
    const LOOP_A: [i64; 29] = [
        3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28,
        1005, 28, 6, 99, 0, 0, 5,
    ];

    #[test]
    fn chain_digits() {
        assert_eq!(run_chain(&SERIAL_A, &[4, 3, 2, 1, 0], 0), Ok(43210));
        assert_eq!(run_chain(&SERIAL_B, &[0, 1, 2, 3, 4], 0), Ok(54321));
    }

    #[test]
    fn best_serial_setting() {
        let (signal, phases) = best_phase_setting(&SERIAL_A, &[0, 1, 2, 3, 4], false).unwrap();
        assert_eq!(signal, 43210);
        assert_eq!(phases, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn feedback_loop_signal() {
        assert_eq!(run_feedback_loop(&LOOP_A, &[9, 8, 7, 6, 5], 0), Ok(139629729));
    }

    #[test]
    fn best_feedback_setting() {
        let (signal, phases) = best_phase_setting(&LOOP_A, &[5, 6, 7, 8, 9], true).unwrap();
        assert_eq!(signal, 139629729);
        assert_eq!(phases, vec![9, 8, 7, 6, 5]);
    }

    #[test]
    fn empty_chain_passes_signal_through() {
        assert_eq!(run_chain(&SERIAL_A, &[], 17), Ok(17));
        assert_eq!(run_feedback_loop(&LOOP_A, &[], 17), Ok(17));
    }

    #[test]
    fn silent_stage_is_missing_output() {
        // Reads both inputs and halts without writing.
        let program = [3, 0, 3, 0, 99];
        assert_eq!(
            run_chain(&program, &[1, 2], 0),
            Err(IntcodeError::MissingOutput { stage: 0 })
        );
    }

    #[test]
    fn chatty_stage_is_rejected() {
        // Writes the signal twice before halting.
        let program = [3, 9, 3, 9, 4, 9, 4, 9, 99];
        assert_eq!(
            run_chain(&program, &[1, 2], 0),
            Err(IntcodeError::ExtraOutput { stage: 0, count: 2 })
        );
    }

    #[test]
    fn starving_stage_is_stalled() {
        // Wants three inputs but only ever gets two.
        let program = [3, 0, 3, 0, 3, 0, 4, 0, 99];
        assert_eq!(
            run_chain(&program, &[1], 0),
            Err(IntcodeError::StalledChain { stage: 0 })
        );
        assert_eq!(
            run_feedback_loop(&program, &[1, 2], 0),
            Err(IntcodeError::StalledChain { stage: 0 })
        );
    }

    #[test]
    fn faults_propagate() {
        let program = [3, 0, 3, 0, 42];
        assert_eq!(
            run_chain(&program, &[0], 0),
            Err(IntcodeError::InvalidOpcode { opcode: 42, address: 4 })
        );
    }

    #[test]
    fn permutations_are_complete_and_distinct() {
        let all = permutations(&[0, 1, 2, 3, 4]);
        assert_eq!(all.len(), 120);
        let unique: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(unique.len(), 120);
        assert!(all.iter().all(|p| {
            let mut sorted = p.clone();
            sorted.sort_unstable();
            sorted == vec![0, 1, 2, 3, 4]
        }));
    }

    #[test]
    fn permutations_of_small_inputs() {
        assert_eq!(permutations(&[]), vec![Vec::<i64>::new()]);
        assert_eq!(permutations(&[7]), vec![vec![7]]);
        assert_eq!(permutations(&[1, 2]).len(), 2);
    }
}
