use std::collections::VecDeque;

use log::{debug, trace, warn};

use crate::error::{IntcodeError, Result};
use crate::memory::Memory;
use crate::opcode::{Instruction, Mode, Opcode};

/// Where a machine stands between calls to [`Machine::run`].
///
/// Execution itself only ever happens inside `run`/`step`, so a machine
/// observed from the outside is always in one of these three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Freshly loaded, or paused between single steps.
    Ready,
    /// Stopped on an input instruction with an empty input queue. The same
    /// instruction is retried on the next run.
    AwaitingInput,
    /// A halt instruction executed. Terminal.
    Halted,
}

/// An Intcode interpreter: memory, instruction pointer, relative base and
/// the two I/O queues through which a host drives it.
///
/// A host feeds input, calls [`run`](Machine::run), drains output, and
/// repeats until the machine reports [`State::Halted`].
#[derive(Debug, Clone)]
pub struct Machine {
    id: usize,
    memory: Memory,
    ip: usize,
    relative_base: i64,
    state: State,
    input: VecDeque<i64>,
    output: VecDeque<i64>,
    fault: Option<IntcodeError>,
}

impl Machine {
    pub fn new(program: Vec<i64>) -> Result<Self> {
        let mut machine = Self {
            id: 0,
            memory: Memory::default(),
            ip: 0,
            relative_base: 0,
            state: State::Ready,
            input: VecDeque::new(),
            output: VecDeque::new(),
            fault: None,
        };
        machine.load(program)?;
        Ok(machine)
    }

    /// Label this machine in log output. Hosts driving several machines
    /// number them so traces can be told apart.
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Replace memory with `program` and reset registers, state and output.
    /// Queued input is kept.
    pub fn load(&mut self, program: Vec<i64>) -> Result<()> {
        if program.is_empty() {
            return Err(IntcodeError::EmptyProgram);
        }
        self.memory = Memory::new(program);
        self.ip = 0;
        self.relative_base = 0;
        self.state = State::Ready;
        self.output.clear();
        self.fault = None;
        Ok(())
    }

    pub fn feed(&mut self, value: i64) {
        self.input.push_back(value);
    }

    pub fn feed_all<I: IntoIterator<Item = i64>>(&mut self, values: I) {
        self.input.extend(values);
    }

    /// Number of input values not yet consumed.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// The fault that stopped this machine, if any.
    pub fn fault(&self) -> Option<&IntcodeError> {
        self.fault.as_ref()
    }

    /// Read a memory cell, growing memory if needed.
    pub fn read(&mut self, address: usize) -> i64 {
        self.memory.read(address)
    }

    /// Patch a memory cell. Hosts use this before running, e.g. to set the
    /// noun and verb at addresses 1 and 2.
    pub fn write(&mut self, address: usize, value: i64) {
        self.memory.write(address, value);
    }

    pub fn output(&self) -> &VecDeque<i64> {
        &self.output
    }

    /// Take all pending output, oldest first, leaving the queue empty.
    pub fn drain_output(&mut self) -> Vec<i64> {
        self.output.drain(..).collect()
    }

    pub fn pop_output(&mut self) -> Option<i64> {
        self.output.pop_front()
    }

    /// Run until the machine halts or needs input.
    ///
    /// A halted machine is left untouched. A machine that previously
    /// faulted reports the same fault again without executing anything.
    pub fn run(&mut self) -> Result<State> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        if self.state == State::Halted {
            return Ok(State::Halted);
        }

        debug!(
            "machine {} running from {} with {} input(s) queued",
            self.id,
            self.ip,
            self.input.len()
        );
        loop {
            match self.step()? {
                State::Ready => continue,
                State::AwaitingInput => {
                    debug!("machine {} needs input at {}", self.id, self.ip);
                    return Ok(State::AwaitingInput);
                }
                State::Halted => {
                    debug!("machine {} halted", self.id);
                    return Ok(State::Halted);
                }
            }
        }
    }

    /// Feed `values`, run, and return everything the machine wrote.
    pub fn run_with_input<I: IntoIterator<Item = i64>>(&mut self, values: I) -> Result<Vec<i64>> {
        self.feed_all(values);
        self.run()?;
        Ok(self.drain_output())
    }

    /// Execute at most one instruction.
    pub fn step(&mut self) -> Result<State> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        if self.state == State::Halted {
            return Ok(State::Halted);
        }

        match self.execute_one() {
            Ok(state) => {
                self.state = state;
                Ok(state)
            }
            Err(err) => {
                warn!("machine {} faulted: {err}", self.id);
                self.fault = Some(err.clone());
                Err(err)
            }
        }
    }

    fn execute_one(&mut self) -> Result<State> {
        let address = self.ip;
        let word = self.memory.read(address);
        let ins = Instruction::decode(word, address)?;
        trace!("machine {} [{address}] {word} {}", self.id, ins.opcode.mnemonic());

        match ins.opcode {
            Opcode::Add | Opcode::Multiply => {
                let a = self.fetch(&ins, 0)?;
                let b = self.fetch(&ins, 1)?;
                let result = if ins.opcode == Opcode::Add {
                    a.checked_add(b)
                } else {
                    a.checked_mul(b)
                };
                let result = result.ok_or(IntcodeError::Arithmetic { address })?;
                let dest = self.target(&ins, 2)?;
                self.memory.write(dest, result);
                self.ip += ins.opcode.width();
            }
            Opcode::Input => {
                let dest = self.target(&ins, 0)?;
                let Some(value) = self.input.pop_front() else {
                    return Ok(State::AwaitingInput);
                };
                trace!("machine {} read {value} into {dest}", self.id);
                self.memory.write(dest, value);
                self.ip += ins.opcode.width();
            }
            Opcode::Output => {
                let value = self.fetch(&ins, 0)?;
                trace!("machine {} wrote {value}", self.id);
                self.output.push_back(value);
                self.ip += ins.opcode.width();
            }
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => {
                let condition = self.fetch(&ins, 0)?;
                let destination = self.fetch(&ins, 1)?;
                let taken = (condition != 0) == (ins.opcode == Opcode::JumpIfTrue);
                if taken {
                    self.ip = self.address(destination)?;
                } else {
                    self.ip += ins.opcode.width();
                }
            }
            Opcode::LessThan | Opcode::Equals => {
                let a = self.fetch(&ins, 0)?;
                let b = self.fetch(&ins, 1)?;
                let holds = if ins.opcode == Opcode::LessThan { a < b } else { a == b };
                let dest = self.target(&ins, 2)?;
                self.memory.write(dest, i64::from(holds));
                self.ip += ins.opcode.width();
            }
            Opcode::AdjustRelativeBase => {
                let delta = self.fetch(&ins, 0)?;
                self.relative_base = self
                    .relative_base
                    .checked_add(delta)
                    .ok_or(IntcodeError::Arithmetic { address })?;
                self.ip += ins.opcode.width();
            }
            Opcode::Halt => return Ok(State::Halted),
        }

        Ok(State::Ready)
    }

    /// Raw operand word for `slot` of the current instruction.
    #[inline(always)]
    fn operand(&mut self, slot: usize) -> i64 {
        self.memory.read(self.ip + 1 + slot)
    }

    /// Effective value of a read operand.
    fn fetch(&mut self, ins: &Instruction, slot: usize) -> Result<i64> {
        let raw = self.operand(slot);
        match ins.modes[slot] {
            Mode::Immediate => Ok(raw),
            Mode::Position => {
                let address = self.address(raw)?;
                Ok(self.memory.read(address))
            }
            Mode::Relative => {
                let address = self.relative(raw)?;
                Ok(self.memory.read(address))
            }
        }
    }

    /// Effective address of a write operand.
    fn target(&mut self, ins: &Instruction, slot: usize) -> Result<usize> {
        let raw = self.operand(slot);
        match ins.modes[slot] {
            Mode::Position => self.address(raw),
            Mode::Relative => self.relative(raw),
            Mode::Immediate => Err(IntcodeError::ImmediateWrite { address: self.ip }),
        }
    }

    fn relative(&self, offset: i64) -> Result<usize> {
        let effective = self
            .relative_base
            .checked_add(offset)
            .ok_or(IntcodeError::Arithmetic { address: self.ip })?;
        self.address(effective)
    }

    fn address(&self, effective: i64) -> Result<usize> {
        usize::try_from(effective).map_err(|_| IntcodeError::NegativeAddress {
            address: self.ip,
            effective,
        })
    }
}
