use thiserror::Error;

/// Inconsistencies found while pulling an operation out of an instruction.
///
/// None of these stop a disassembly run: the driver prints a placeholder for
/// the affected slot and carries on with the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("slot {slot} out of range, an instruction has 5 issue slots")]
    SlotOutOfRange { slot: usize },

    #[error("incomplete instruction: need {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    #[error("slot {slot} resolves to operation index {index}, at most 5 operations fit")]
    RealIndexOutOfRange { slot: usize, index: usize },
}
