use std::io::{self, Write};

use crate::disassembler::{DecodedInstruction, Disassembler};
use crate::format::SLOT_COUNT;

/// Layout of the printed disassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingFormat {
    /// Several annotated lines per instruction: length, offset, raw bytes,
    /// format bytes and the operation word of every slot.
    #[default]
    Verbose,
    /// One line per instruction.
    Compact,
}

impl From<u32> for ListingFormat {
    fn from(selector: u32) -> Self {
        match selector {
            1 => Self::Compact,
            _ => Self::Verbose,
        }
    }
}

/// Disassembles `data` into `out`. Display offsets start at `adjust`.
///
/// # Errors
///
/// Only fails when writing to `out` fails.
pub fn write_listing<W: Write>(
    out: &mut W,
    data: &[u8],
    adjust: u64,
    format: ListingFormat,
) -> io::Result<()> {
    writeln!(out, "\ndisassembly")?;

    for instruction in Disassembler::with_offset(data, adjust) {
        if instruction.starts_decision_tree() {
            writeln!(out)?;
        }
        match format {
            ListingFormat::Verbose => write_verbose(out, &instruction)?,
            ListingFormat::Compact => write_compact(out, &instruction)?,
        }
    }

    writeln!(out, "\nend disassembly")
}

fn separator(slot: usize) -> char {
    if slot == SLOT_COUNT - 1 { ';' } else { ',' }
}

fn write_verbose<W: Write>(out: &mut W, instruction: &DecodedInstruction) -> io::Result<()> {
    let bits = instruction.length_bits();
    writeln!(
        out,
        "(* instruction {:<3} : {bits} bits ({} bytes) long *)",
        instruction.index,
        bits / 8
    )?;
    writeln!(out, "(* offset          : 0x{:08x} *)", instruction.offset)?;

    write!(out, "(* bytes           : ")?;
    for byte in &instruction.bytes {
        write!(out, "{byte:02x} ")?;
    }
    writeln!(out, "*)")?;

    let next_format = instruction.next_format;
    let [first, second] = next_format.to_bytes();
    writeln!(
        out,
        "(* format bytes    : 0x{first:02x}{second:02x} & 0xff03 = 0x{:04x}, format in little endian bit order: {next_format} *)",
        u16::from_be_bytes([first, second]) & 0xff03
    )?;

    for (idx, slot) in instruction.slots.iter().enumerate() {
        let text = format!("{}{}", slot.text, separator(idx));
        writeln!(
            out,
            "   {text:<33}           (* {:>2} bits:{} *)",
            slot.size.operation_bits(),
            slot.word.hex(slot.size)
        )?;
    }

    writeln!(out)
}

fn write_compact<W: Write>(out: &mut W, instruction: &DecodedInstruction) -> io::Result<()> {
    write!(out, "(* 0x{:08x} *) ", instruction.offset)?;
    for (idx, slot) in instruction.slots.iter().enumerate() {
        let text = format!("{}{}", slot.text, separator(idx));
        write!(out, "   {text:<36}")?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MAX_INSTRUCTION_BYTES;
    use pretty_assertions::assert_eq;

    fn two_instructions() -> Vec<u8> {
        let mut data = vec![0; MAX_INSTRUCTION_BYTES];
        data[..5].copy_from_slice(&[0xff, 0x43, 0x82, 0x41, 0x80]);
        data[18..20].copy_from_slice(&[0x40, 0x08]);
        data.extend([0xff, 0x03]);
        data
    }

    fn listing(data: &[u8], adjust: u64, format: ListingFormat) -> String {
        let mut out = Vec::new();
        write_listing(&mut out, data, adjust, format).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn format_selector() {
        assert_eq!(ListingFormat::from(0), ListingFormat::Verbose);
        assert_eq!(ListingFormat::from(1), ListingFormat::Compact);
        assert_eq!(ListingFormat::from(7), ListingFormat::Verbose);
        assert_eq!(ListingFormat::default(), ListingFormat::Verbose);
    }

    #[test]
    fn empty_listing() {
        assert_eq!(
            listing(&[], 0, ListingFormat::Verbose),
            "\ndisassembly\n\nend disassembly\n"
        );
    }

    #[test]
    fn compact_listing() {
        let slot = |text: &str| format!("   {text:<36}");
        let last = slot("IF r1   nop;");
        let first = slot("IF r1   iadd r2 r3 -> r4,") + &slot("IF r1   nop,").repeat(3) + &last;
        let second = slot("IF r1   nop,").repeat(4) + &last;

        let expected = format!(
            "\ndisassembly\n\n\
             (* 0x00008000 *) {first}\n\
             (* 0x0000801c *) {second}\n\
             \nend disassembly\n"
        );
        assert_eq!(listing(&two_instructions(), 0x8000, ListingFormat::Compact), expected);
    }

    #[test]
    fn verbose_listing() {
        let text = listing(&two_instructions(), 0, ListingFormat::Verbose);
        let lines: Vec<&str> = text.lines().collect();
        let slot_line = |text: &str, bits: &str| format!("   {text:<33}           (* {bits} *)");

        let mut bytes = String::from("(* bytes           : ff 43 82 41 80 ");
        for idx in 5..MAX_INSTRUCTION_BYTES {
            bytes.push_str(match idx {
                18 => "40 ",
                19 => "08 ",
                _ => "00 ",
            });
        }
        bytes.push_str("*)");

        let mut expected = vec![
            "(* instruction 0   : 224 bits (28 bytes) long *)".to_string(),
            "(* offset          : 0x00000000 *)".to_string(),
            bytes,
            "(* format bytes    : 0xff43 & 0xff03 = 0xff03, format in little endian bit order: 11 11 11 11 11  *)".to_string(),
            slot_line("IF r1   iadd r2 r3 -> r4,", "42 bits: 0 21 01 80 41 82"),
        ];
        for last in [',', ',', ',', ';'] {
            expected.push(slot_line(&format!("IF r1   nop{last}"), "42 bits: 0 00 00 00 00 00"));
        }
        expected.push(String::new());
        expected.extend([
            "(* instruction 1   : 16 bits (2 bytes) long *)".to_string(),
            "(* offset          : 0x0000001c *)".to_string(),
            "(* bytes           : ff 03 *)".to_string(),
            "(* format bytes    : 0xff03 & 0xff03 = 0xff03, format in little endian bit order: 11 11 11 11 11  *)".to_string(),
            slot_line("IF r1   nop,", " 0 bits:"),
        ]);

        assert_eq!(lines[..3], ["", "disassembly", ""]);
        assert_eq!(
            lines[3..3 + expected.len()].to_vec(),
            expected.iter().map(String::as_str).collect::<Vec<_>>()
        );
        assert_eq!(lines[lines.len() - 1], "end disassembly");
    }
}
