use thiserror::Error;

pub type Result<T> = std::result::Result<T, IntcodeError>;

/// Everything that can go wrong while loading or executing an Intcode program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntcodeError {
    #[error("invalid opcode {opcode} at address {address}")]
    InvalidOpcode { opcode: i64, address: usize },

    #[error("invalid addressing mode {mode} at address {address}")]
    InvalidMode { mode: i64, address: usize },

    #[error("immediate mode used for a write target at address {address}")]
    ImmediateWrite { address: usize },

    /// `address` is the instruction that computed the negative effective address.
    #[error("negative effective address {effective} computed at address {address}")]
    NegativeAddress { address: usize, effective: i64 },

    #[error("arithmetic overflow at address {address}")]
    Arithmetic { address: usize },

    #[error("program image is empty")]
    EmptyProgram,

    #[error("bad program token {token:?} at index {index}")]
    Parse { index: usize, token: String },

    #[error("amplifier stage {stage} produced no output")]
    MissingOutput { stage: usize },

    #[error("amplifier stage {stage} produced {count} outputs, expected one")]
    ExtraOutput { stage: usize, count: usize },

    #[error("amplifier stage {stage} is waiting for input that never arrives")]
    StalledChain { stage: usize },
}

impl IntcodeError {
    /// True for the malformed-program conditions detected during execution.
    /// A machine that reports one of these cannot be driven any further.
    pub fn is_invalid_program(&self) -> bool {
        matches!(
            self,
            IntcodeError::InvalidOpcode { .. }
                | IntcodeError::InvalidMode { .. }
                | IntcodeError::ImmediateWrite { .. }
                | IntcodeError::NegativeAddress { .. }
                | IntcodeError::Arithmetic { .. }
        )
    }
}
