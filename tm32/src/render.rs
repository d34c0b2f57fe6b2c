//! # Operation Rendering
//!
//! Turns an unpacked [`SlotWord`] into assembly text. The opcode is taken from
//! a size-dependent field of the word, looked up in [`crate::opcode`], and its
//! operands are pulled out at the positions the layout table gives for the
//! (encoding, shape) pair:
//!
//! ```text
//! IF r<guard> <mnemonic>[(<immediate>)] [r<source> ...] [-> r<destination>]
//! ```
//!
//! 42-bit slots additionally carry three pseudo-forms (`uimm`, `jmpi` and
//! `ijmpi`) with a 32-bit immediate scattered over the word.

use std::fmt;

use crate::format::SlotSize;
use crate::layout::{self, Encoding, FIELD_BITS, Guard};
use crate::opcode::{self, IJMPI, JMPI, Lookup, UIMM};
use crate::unpack::SlotWord;

/// Register that always reads as true, the guard of unguarded operations.
const ALWAYS_TRUE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate {
    /// A 7-bit parameter after scaling, printed in decimal.
    Scaled(i64),
    /// The 32-bit constant of a pseudo-form, printed in hex.
    Wide(u32),
}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scaled(value) => write!(f, "{value}"),
            Self::Wide(value) => write!(f, "0x{value:x}"),
        }
    }
}

/// A decoded slot, ready to be printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOperation {
    Nop,
    Operation {
        guard: u8,
        mnemonic: &'static str,
        immediate: Option<Immediate>,
        sources: Vec<u8>,
        destination: Option<u8>,
    },
    /// The opcode is unknown or its shape cannot be encoded in this slot.
    Illegal { encoding: Encoding, lookup: Lookup },
}

impl SlotOperation {
    /// Decodes `word`, unpacked from a slot of `size`. An all-zero word is a
    /// NOP whatever the slot size.
    #[must_use]
    pub fn decode(size: SlotSize, word: SlotWord) -> Self {
        if word.is_nop() {
            return Self::Nop;
        }

        let encoding = match size {
            SlotSize::Nop => return Self::Nop,
            SlotSize::Bits26 => Encoding::Short26,
            SlotSize::Bits34 if word.bit(33) => Encoding::Long34,
            SlotSize::Bits34 => Encoding::Short34,
            SlotSize::Bits42 if word.bit(33) => {
                return Self::wide(UIMM, ALWAYS_TRUE, Some(register(word, 14)), word);
            }
            SlotSize::Bits42 if !word.bit(32) => {
                let opcode = if word.bit(31) { IJMPI } else { JMPI };
                return Self::wide(opcode, register(word, 14), None, word);
            }
            SlotSize::Bits42 => Encoding::Long42,
        };

        let opcode = match encoding {
            Encoding::Short26 | Encoding::Short34 => word.field(21..=25),
            Encoding::Long34 | Encoding::Long42 => word.field(21..=28),
        } as u8;

        let lookup = opcode::lookup(opcode);
        let Lookup::Found(operation) = lookup else {
            tracing::debug!(opcode, %encoding, "unknown opcode");
            return Self::Illegal { encoding, lookup };
        };
        let Some(layout) = layout::layout(encoding, operation.shape) else {
            tracing::debug!(
                opcode,
                %encoding,
                shape = ?operation.shape,
                "operand shape not encodable in this slot"
            );
            return Self::Illegal { encoding, lookup };
        };

        Self::Operation {
            guard: match layout.guard {
                Guard::Always => ALWAYS_TRUE,
                Guard::Field(at) => register(word, at),
            },
            mnemonic: operation.mnemonic,
            immediate: layout.immediate.map(|at| {
                Immediate::Scaled(operation.immediate(word.field(at..=at + FIELD_BITS - 1)))
            }),
            sources: layout.sources.iter().map(|&at| register(word, at)).collect(),
            destination: layout.destination.map(|at| register(word, at)),
        }
    }

    fn wide(opcode: u8, guard: u8, destination: Option<u8>, word: SlotWord) -> Self {
        match opcode::lookup(opcode) {
            Lookup::Found(operation) => Self::Operation {
                guard,
                mnemonic: operation.mnemonic,
                immediate: Some(Immediate::Wide(param32(word))),
                sources: Vec::new(),
                destination,
            },
            lookup @ Lookup::Unknown(_) => Self::Illegal {
                encoding: Encoding::Long42,
                lookup,
            },
        }
    }
}

impl fmt::Display for SlotOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nop => write!(f, "IF r{ALWAYS_TRUE:<3} nop"),
            Self::Operation {
                guard,
                mnemonic,
                immediate,
                sources,
                destination,
            } => {
                write!(f, "IF r{guard:<3} {mnemonic}")?;
                if let Some(immediate) = immediate {
                    write!(f, "({immediate})")?;
                }
                for source in sources {
                    write!(f, " r{source}")?;
                }
                if let Some(destination) = destination {
                    write!(f, " -> r{destination}")?;
                }
                Ok(())
            }
            Self::Illegal { encoding, lookup } => {
                write!(f, "{encoding}: ILLEGAL OP! = ")?;
                match lookup {
                    Lookup::Found(operation) => f.write_str(operation.mnemonic),
                    Lookup::Unknown(opcode) => write!(f, "<opcode {opcode}>"),
                }
            }
        }
    }
}

/// Renders the operation unpacked from a slot of `size`.
#[must_use]
pub fn render(size: SlotSize, word: SlotWord) -> String {
    SlotOperation::decode(size, word).to_string()
}

fn register(word: SlotWord, at: u8) -> u8 {
    word.field(at..=at + FIELD_BITS - 1) as u8
}

/// Reassembles the 32-bit constant of the 42-bit pseudo-forms.
fn param32(word: SlotWord) -> u32 {
    let value = word.field(7..=13)
        | word.field(0..=6) << 7
        | word.field(21..=30) << 14
        | word.field(34..=41) << 24;
    value as u32
}
