//! Walks an instruction stream front to back.
//!
//! The size of an instruction is only known from the format bytes of its
//! predecessor, so decoding is strictly sequential. The very first
//! instruction is assumed to be a branch target, the start of a decision tree,
//! whose format is fixed (five uncompressed 42-bit operations).

use std::iter::FusedIterator;

use crate::format::{
    FormatField, MAX_INSTRUCTION_BITS, MAX_INSTRUCTION_BYTES, SLOT_COUNT, SlotSize,
};
use crate::render::render;
use crate::unpack::{SlotWord, unpack};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSlot {
    pub size: SlotSize,
    pub word: SlotWord,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// Position within the current decision tree.
    pub index: usize,
    /// Display address, the byte position plus the caller's adjustment.
    pub offset: u64,
    /// Format the instruction was decoded with.
    pub format: FormatField,
    /// Format announced for the following instruction.
    pub next_format: FormatField,
    /// The instruction bytes, zero-padded when `truncated`.
    pub bytes: Vec<u8>,
    /// The instruction runs past the end of the buffer.
    pub truncated: bool,
    pub slots: [DecodedSlot; SLOT_COUNT],
}

impl DecodedInstruction {
    #[must_use]
    pub fn length_bits(&self) -> u16 {
        self.format.instruction_length_bits()
    }

    /// Only fully uncompressed instructions open a decision tree.
    #[must_use]
    pub fn starts_decision_tree(&self) -> bool {
        self.length_bits() == MAX_INSTRUCTION_BITS
    }
}

/// Iterator over the instructions of a code buffer.
pub struct Disassembler<'a> {
    data: &'a [u8],
    cursor: usize,
    offset: u64,
    format: FormatField,
    index: usize,
}

impl<'a> Disassembler<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self::with_offset(data, 0)
    }

    /// Starts the display addresses at `offset` instead of 0.
    #[must_use]
    pub const fn with_offset(data: &'a [u8], offset: u64) -> Self {
        Self {
            data,
            cursor: 0,
            offset,
            format: FormatField::BRANCH_TARGET,
            index: 0,
        }
    }

    fn decode_slot(span: &[u8], format: FormatField, slot: usize) -> DecodedSlot {
        let size = format.slot_size(slot);
        match unpack(span, format, slot) {
            Ok(word) => DecodedSlot {
                size,
                word,
                text: render(size, word),
            },
            Err(err) => {
                tracing::warn!(slot, %err, "cannot unpack operation");
                DecodedSlot {
                    size,
                    word: SlotWord::NOP,
                    text: format!("encoding error ({err})"),
                }
            }
        }
    }
}

impl Iterator for Disassembler<'_> {
    type Item = DecodedInstruction;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.data.get(self.cursor..).filter(|rest| !rest.is_empty())?;

        let format = self.format;
        let length = format.instruction_length_bytes();
        let available = length.min(remaining.len());
        let truncated = available < length;

        let mut span = [0_u8; MAX_INSTRUCTION_BYTES];
        span[..available].copy_from_slice(&remaining[..available]);
        let span = &span[..length];
        if truncated {
            tracing::warn!(
                offset = self.offset,
                needed = length,
                have = available,
                "instruction runs past the end of the buffer"
            );
        }

        let next_format = FormatField::read(span);
        let index = if format.instruction_length_bits() == MAX_INSTRUCTION_BITS {
            0
        } else {
            self.index + 1
        };
        tracing::debug!(
            index,
            offset = self.offset,
            bits = format.instruction_length_bits(),
            format = %format,
            next_format = %next_format,
            "decoding instruction"
        );

        let slots = std::array::from_fn(|slot| Self::decode_slot(span, format, slot));
        let instruction = DecodedInstruction {
            index,
            offset: self.offset,
            format,
            next_format,
            bytes: span.to_vec(),
            truncated,
            slots,
        };

        self.cursor += length;
        self.offset = self.offset.wrapping_add(length as u64);
        self.format = next_format;
        self.index = index;

        Some(instruction)
    }
}

impl FusedIterator for Disassembler<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A branch target holding `iadd r2 r3 -> r4` in slot 0 whose format bytes
    /// announce an all-NOP instruction, followed by that 2-byte instruction.
    fn two_instructions() -> Vec<u8> {
        let mut data = vec![0; MAX_INSTRUCTION_BYTES];
        data[..5].copy_from_slice(&[0xff, 0x43, 0x82, 0x41, 0x80]);
        data[18..20].copy_from_slice(&[0x40, 0x08]);
        data.extend([0xff, 0x03]);
        data
    }

    fn texts(instruction: &DecodedInstruction) -> Vec<&str> {
        instruction.slots.iter().map(|slot| slot.text.as_str()).collect()
    }

    #[test]
    fn walks_branch_target_then_compressed() {
        let data = two_instructions();
        let instructions: Vec<_> = Disassembler::new(&data).collect();
        assert_eq!(instructions.len(), 2);

        let first = &instructions[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.offset, 0);
        assert_eq!(first.format, FormatField::BRANCH_TARGET);
        assert_eq!(first.next_format, FormatField::new(0x43ff));
        assert!(first.starts_decision_tree());
        assert!(!first.truncated);
        assert_eq!(first.bytes, data[..MAX_INSTRUCTION_BYTES]);
        assert_eq!(first.slots[0].word, SlotWord::new(0x21_0180_4182));
        assert_eq!(
            texts(first),
            vec![
                "IF r1   iadd r2 r3 -> r4",
                "IF r1   nop",
                "IF r1   nop",
                "IF r1   nop",
                "IF r1   nop"
            ]
        );

        let second = &instructions[1];
        assert_eq!(second.index, 1);
        assert_eq!(second.offset, 28);
        assert_eq!(second.length_bits(), 16);
        assert_eq!(second.bytes, vec![0xff, 0x03]);
        assert!(!second.starts_decision_tree());
        assert!(second.slots.iter().all(|slot| slot.size == SlotSize::Nop));
        assert_eq!(texts(second), vec!["IF r1   nop"; SLOT_COUNT]);
    }

    #[test]
    fn offsets_start_at_adjustment() {
        let data = two_instructions();
        let offsets: Vec<u64> = Disassembler::with_offset(&data, 0x1000)
            .map(|instruction| instruction.offset)
            .collect();
        assert_eq!(offsets, vec![0x1000, 0x101c]);
    }

    #[test]
    fn empty_buffer() {
        assert_eq!(Disassembler::new(&[]).next(), None);
    }

    #[test]
    fn truncated_instruction_is_padded() {
        let data = two_instructions();
        let mut disassembler = Disassembler::new(&data[..20]);

        let instruction = disassembler.next().unwrap();
        assert!(instruction.truncated);
        assert_eq!(instruction.bytes.len(), MAX_INSTRUCTION_BYTES);
        assert_eq!(instruction.bytes[20..], [0; 8]);
        assert_eq!(instruction.slots[0].text, "IF r1   iadd r2 r3 -> r4");

        assert_eq!(disassembler.next(), None);
        assert_eq!(disassembler.next(), None);
    }

    #[test]
    fn new_decision_tree_resets_index() {
        // An all-zero branch target announces five 26-bit operations; the
        // format bytes of that one announce another branch target.
        let mut data = vec![0; MAX_INSTRUCTION_BYTES];
        let mut compressed = vec![0; 18];
        compressed[..2].copy_from_slice(&[0xaa, 0x02]);
        data.extend(compressed);
        data.extend(vec![0; MAX_INSTRUCTION_BYTES]);

        let instructions: Vec<_> = Disassembler::new(&data).collect();
        let summary: Vec<(usize, u64, u16)> = instructions
            .iter()
            .map(|instruction| (instruction.index, instruction.offset, instruction.length_bits()))
            .collect();
        assert_eq!(summary, vec![(0, 0, 224), (1, 28, 144), (0, 46, 224)]);
        assert!(
            instructions
                .iter()
                .flat_map(|instruction| &instruction.slots)
                .all(|slot| slot.text == "IF r1   nop")
        );
    }

    #[test]
    fn unpack_failure_becomes_placeholder() {
        let slot = Disassembler::decode_slot(&[0xaa, 0x02, 0x00], FormatField::BRANCH_TARGET, 0);
        assert_eq!(slot.size, SlotSize::Bits42);
        assert_eq!(slot.word, SlotWord::NOP);
        assert_eq!(
            slot.text,
            "encoding error (incomplete instruction: need 28 bytes, have 3)"
        );

        let nop = Disassembler::decode_slot(&[], FormatField::new(0x03ff), 0);
        assert_eq!(nop.size, SlotSize::Nop);
        assert_eq!(nop.text, "IF r1   nop");
    }
}
