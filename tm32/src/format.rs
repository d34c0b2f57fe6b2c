//! # Format Fields
//!
//! The first two bytes of every instruction hold the format of the *next*
//! instruction: a 2-bit size code per issue slot, read as a little-endian
//! `u16`. The upper six bits of the second byte are not format bits at all:
//! they carry two opcode bits for each of the first three operations of the
//! current instruction (see [`crate::unpack`]).
//!
//! ```text
//!         byte 1                      byte 0
//!  15 14 13 12 11 10  9  8   7  6  5  4  3  2  1  0
//! ┌─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┐
//! │ op0 │ op1 │ op2 │ s4  │ s3  │ s2  │ s1  │ s0  │
//! └─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┘
//!
//!  size code   00      01      10      11
//!  operation   26 bit  34 bit  42 bit  NOP
//! ```
//!
//! Each non-NOP operation stores 24 bits in a 3-byte *core*, the two spliced
//! opcode bits, and 0, 1 or 2 *extension* bytes. Cores come first, in slot
//! order; when more than three slots are in use a second format byte is
//! inserted after the third core. Extensions follow all the cores.

use std::fmt;

use crate::bitwise::Bits;

/// Issue slots per instruction.
pub const SLOT_COUNT: usize = 5;

/// Length of the format field that opens every instruction.
pub const FORMAT_FIELD_BITS: u16 = 16;

/// Length of an instruction with five uncompressed 42-bit operations.
pub const MAX_INSTRUCTION_BITS: u16 = 224;

pub const MAX_INSTRUCTION_BYTES: usize = MAX_INSTRUCTION_BITS as usize / 8;

/// Format bytes of a branch target instruction as they appear in code memory
/// (`AA 02`). A branch target opens every decision tree, so the first
/// instruction of a stream is always decoded with this format.
pub const BRANCH_TARGET_FORMAT: u16 = 0xaa02;

/// Byte holding the opcode bits of the fourth and fifth operations.
pub const SECOND_FORMAT_BYTE: usize = 11;

const CORE_BITS: u16 = 24;
const SECOND_FORMAT_BYTE_BITS: u16 = 8;

/// Compressed size of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SlotSize {
    Bits26,
    Bits34,
    Bits42,
    #[default]
    Nop,
}

impl SlotSize {
    /// Bits stored in the instruction body: the core plus its extension bytes.
    /// The two spliced opcode bits are not included.
    #[must_use]
    pub const fn core_bits(self) -> u16 {
        match self {
            Self::Bits26 => 24,
            Self::Bits34 => 32,
            Self::Bits42 => 40,
            Self::Nop => 0,
        }
    }

    /// Full width of the operation once its opcode bits are spliced back in.
    #[must_use]
    pub const fn operation_bits(self) -> u16 {
        match self {
            Self::Nop => 0,
            size => size.core_bits() + 2,
        }
    }

    #[must_use]
    pub const fn extension_bits(self) -> u16 {
        match self {
            Self::Nop => 0,
            size => size.core_bits() - CORE_BITS,
        }
    }

    #[must_use]
    pub const fn is_nop(self) -> bool {
        matches!(self, Self::Nop)
    }
}

impl From<u16> for SlotSize {
    fn from(code: u16) -> Self {
        match code & 0b11 {
            0b00 => Self::Bits26,
            0b01 => Self::Bits34,
            0b10 => Self::Bits42,
            _ => Self::Nop,
        }
    }
}

/// Format field of one instruction, as a little-endian `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatField(u16);

impl FormatField {
    /// Format of the branch target instruction that opens a decision tree.
    pub const BRANCH_TARGET: Self = Self::from_bytes(BRANCH_TARGET_FORMAT.to_be_bytes());

    #[must_use]
    pub const fn new(bits: u16) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }

    /// Reads the format field stored in the first two bytes of `instruction`.
    /// Missing bytes read as zero.
    #[must_use]
    pub fn read(instruction: &[u8]) -> Self {
        let byte = |idx: usize| instruction.get(idx).copied().unwrap_or_default();
        Self::from_bytes([byte(0), byte(1)])
    }

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// The two format bytes in code-memory order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    /// Size of the operation issued in `slot` (0..5).
    #[must_use]
    pub fn slot_size(self, slot: usize) -> SlotSize {
        debug_assert!(slot < SLOT_COUNT);
        let low = (2 * slot) as u8;
        self.0.get_bits(low..=low + 1).into()
    }

    pub fn slot_sizes(self) -> impl Iterator<Item = SlotSize> {
        (0..SLOT_COUNT).map(move |slot| self.slot_size(slot))
    }

    /// Number of slots holding a real operation.
    #[must_use]
    pub fn operation_count(self) -> usize {
        self.slot_sizes().filter(|size| !size.is_nop()).count()
    }

    #[must_use]
    pub fn has_second_format_byte(self) -> bool {
        self.operation_count() > 3
    }

    /// Total length of the instruction this field describes, always a whole
    /// number of bytes.
    #[must_use]
    pub fn instruction_length_bits(self) -> u16 {
        let operations: u16 = self.slot_sizes().map(SlotSize::core_bits).sum();
        let second_format = if self.has_second_format_byte() {
            SECOND_FORMAT_BYTE_BITS
        } else {
            0
        };
        FORMAT_FIELD_BITS + operations + second_format
    }

    #[must_use]
    pub fn instruction_length_bytes(self) -> usize {
        usize::from(self.instruction_length_bits() / 8)
    }

    /// Number of real (non-NOP) operations issued before `slot`. This is the
    /// operation's position among the cores and selects where its two
    /// spliced opcode bits live.
    #[must_use]
    pub fn real_slot_index(self, slot: usize) -> usize {
        self.slot_sizes()
            .take(slot)
            .filter(|size| !size.is_nop())
            .count()
    }

    /// Bit offset of the 24-bit core of `slot`, counted from the end of the
    /// format field. NOP slots have no core and report 0.
    #[must_use]
    pub fn operand_core_offset(self, slot: usize) -> u16 {
        if self.slot_size(slot).is_nop() {
            return 0;
        }

        let preceding = self.real_slot_index(slot) as u16;
        let second_format = if preceding > 2 {
            SECOND_FORMAT_BYTE_BITS
        } else {
            0
        };
        preceding * CORE_BITS + second_format
    }

    /// Bit offset of the extension bytes of `slot`, counted from the end of
    /// the format field. Operations without extension report 0.
    #[must_use]
    pub fn extension_offset(self, slot: usize) -> u16 {
        if self.slot_size(slot).extension_bits() == 0 {
            return 0;
        }

        let cores = self.operation_count() as u16 * CORE_BITS;
        let second_format = if self.has_second_format_byte() {
            SECOND_FORMAT_BYTE_BITS
        } else {
            0
        };
        let preceding: u16 = self
            .slot_sizes()
            .take(slot)
            .map(SlotSize::extension_bits)
            .sum();

        cores + second_format + preceding
    }
}

impl From<[u8; 2]> for FormatField {
    fn from(bytes: [u8; 2]) -> Self {
        Self::from_bytes(bytes)
    }
}

/// Size codes of the five slots, least significant bit first, each followed
/// by a space: `00` 26-bit, `10` 34-bit, `01` 42-bit, `11` NOP.
impl fmt::Display for FormatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for size in self.slot_sizes() {
            let code = match size {
                SlotSize::Bits26 => "00",
                SlotSize::Bits34 => "10",
                SlotSize::Bits42 => "01",
                SlotSize::Nop => "11",
            };
            write!(f, "{code} ")?;
        }
        Ok(())
    }
}
