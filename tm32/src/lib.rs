//! Decoding core for the TriMedia TM3260, a five issue-slot VLIW processor.
//!
//! Every instruction carries up to five independently compressed operations
//! (26, 34 or 42 bits, or an implicit NOP). The size of each operation is not
//! stored in the instruction itself but in the two format bytes that open the
//! *previous* instruction, so the stream can only be walked front to back,
//! starting at a branch target whose format is fixed.
//!
//! ```text
//!  bytes 0-1      cores (3 bytes each)   [2nd fmt byte]   extensions (0-2 bytes each)
//! ┌──────────┬──────┬──────┬──────┬─────┬──────┬──────┬─────────────────────────┐
//! │ next fmt │ op 0 │ op 1 │ op 2 │ fmt │ op 3 │ op 4 │ ext 0 .. ext 4          │
//! └──────────┴──────┴──────┴──────┴─────┴──────┴──────┴─────────────────────────┘
//! ```
//!
//! The pipeline is [`format`] → [`unpack`] → [`render`], driven instruction by
//! instruction by [`disassembler::Disassembler`] and printed by [`listing`].
//! Bootloader images are bit-striped and go through [`memimg::transpose`] first.

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
mod bitwise;

pub mod disassembler;
mod error;

#[allow(clippy::cast_possible_truncation)]
pub mod format;
mod layout;
pub mod listing;
pub mod memimg;
pub mod opcode;

#[allow(clippy::cast_possible_truncation)]
pub mod render;

#[allow(clippy::cast_possible_truncation)]
pub mod unpack;

pub use disassembler::{DecodedInstruction, DecodedSlot, Disassembler};
pub use error::DecodeError;
pub use format::{FormatField, SlotSize};
pub use layout::Encoding;
pub use listing::ListingFormat;
pub use opcode::{Lookup, OperandShape, Operation, ParamSign};
pub use render::{Immediate, SlotOperation, render};
pub use unpack::{SlotWord, unpack};
