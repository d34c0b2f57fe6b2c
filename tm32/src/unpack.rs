//! # Operation Unpacking
//!
//! An operation is scattered over up to three places in its instruction: a
//! 3-byte core, 0-2 extension bytes after all the cores, and two opcode bits
//! kept in a format byte. Unpacking glues them back into one word:
//!
//! ```text
//!  41        34 33        26 25 24 23                          0
//! ┌────────────┬────────────┬─────┬─────────────────────────────┐
//! │   ext 1    │   ext 0    │ opc │  core 2 │  core 1 │  core 0 │
//! └────────────┴────────────┴─────┴─────────────────────────────┘
//! ```
//!
//! The cores are stored least significant byte first. The word is assembled
//! in an 8-byte big-endian scratch: extension and core bytes are dropped into
//! the low six bytes, the window holding the extension bytes is shifted up by
//! two bits to open a gap at bits 25:24, the opcode bits are ORed into the gap
//! and the scratch is read back as one `u64`.
//!
//! Which format bits belong to an operation depends on how many real
//! operations precede it:
//!
//! | operations before | format byte | bits |
//! |-------------------|-------------|------|
//! | 0                 | 1           | 7:6  |
//! | 1                 | 1           | 5:4  |
//! | 2                 | 1           | 3:2  |
//! | 3                 | 11          | 7:6  |
//! | 4                 | 11          | 5:4  |

use crate::bitwise::Bits;
use crate::error::DecodeError;
use crate::format::{FORMAT_FIELD_BITS, FormatField, SECOND_FORMAT_BYTE, SLOT_COUNT, SlotSize};

/// One operation with its opcode bits spliced back in. At most the low 42
/// bits are meaningful; zero stands for NOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SlotWord(u64);

impl SlotWord {
    pub const NOP: Self = Self(0);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_nop(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn bit(self, bit_idx: u8) -> bool {
        self.0.get_bit(bit_idx)
    }

    #[must_use]
    pub fn field(self, bits_range: std::ops::RangeInclusive<u8>) -> u64 {
        self.0.get_bits(bits_range)
    }

    /// Hex dump of the word sized for `size`: the top two bits as a single
    /// digit, then the remaining bytes from most to least significant.
    #[must_use]
    pub fn hex(self, size: SlotSize) -> String {
        let bytes = (size.core_bits() / 8) as u8;
        if bytes == 0 {
            return String::new();
        }

        let mut hex = format!(" {:01x}", self.field(bytes * 8..=bytes * 8 + 1));
        for byte in (0..bytes).rev() {
            hex.push_str(&format!(" {:02x}", self.field(byte * 8..=byte * 8 + 7)));
        }
        hex
    }
}

/// Unpacks the operation issued in `slot` of `instruction`, which must start
/// with its (next-instruction) format bytes. `format` is the format the
/// instruction was announced with by its predecessor.
///
/// # Errors
///
/// Fails when `slot` is not an issue slot, when `instruction` is shorter than
/// `format` says, or when the slot's operation index has no opcode bits
/// assigned. NOP slots never fail.
pub fn unpack(
    instruction: &[u8],
    format: FormatField,
    slot: usize,
) -> Result<SlotWord, DecodeError> {
    if slot >= SLOT_COUNT {
        return Err(DecodeError::SlotOutOfRange { slot });
    }

    let size = format.slot_size(slot);
    if size.is_nop() {
        return Ok(SlotWord::NOP);
    }

    let needed = format.instruction_length_bytes();
    if instruction.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            have: instruction.len(),
        });
    }

    let body = usize::from(FORMAT_FIELD_BITS / 8);
    let core = body + usize::from(format.operand_core_offset(slot) / 8);
    let extension = body + usize::from(format.extension_offset(slot) / 8);

    tracing::trace!(
        slot,
        bits = size.operation_bits(),
        core,
        extension_bytes = size.extension_bits() / 8,
        extension,
        "unpacking operation"
    );

    let mut scratch = [0_u8; 8];
    match size {
        SlotSize::Bits42 => {
            scratch[3] = instruction[extension + 1];
            scratch[4] = instruction[extension];
        }
        SlotSize::Bits34 => scratch[4] = instruction[extension],
        SlotSize::Bits26 | SlotSize::Nop => {}
    }
    scratch[5] = instruction[core + 2];
    scratch[6] = instruction[core + 1];
    scratch[7] = instruction[core];
    tracing::trace!("op[63:0]          = {}", hex_bytes(&scratch));

    // Make room for opcode bits 25:24 below the extension bytes.
    let mut window = [0_u8; 4];
    window.copy_from_slice(&scratch[1..5]);
    let shifted = u32::from_be_bytes(window) << 2;
    scratch[1..5].copy_from_slice(&shifted.to_be_bytes());
    tracing::trace!("op[41:24] << 2    = {}", hex_bytes(&scratch[2..]));

    let index = format.real_slot_index(slot);
    let opcode_bits = spliced_opcode_bits(instruction, slot, index)?;
    scratch[4] |= opcode_bits;
    tracing::trace!(
        index,
        opcode_bits,
        "op |= opc << 24   = {}",
        hex_bytes(&scratch[2..])
    );

    Ok(SlotWord(u64::from_be_bytes(scratch)))
}

fn spliced_opcode_bits(instruction: &[u8], slot: usize, index: usize) -> Result<u8, DecodeError> {
    let (byte, low) = match index {
        0..=2 => (1, 6 - 2 * index),
        3 | 4 => (SECOND_FORMAT_BYTE, 6 - 2 * (index - 3)),
        _ => return Err(DecodeError::RealIndexOutOfRange { slot, index }),
    };
    let low = low as u8;
    Ok(instruction[byte].get_bits(low..=low + 1))
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
