//! Where the registers and the 7-bit immediate of an operation sit in its
//! unpacked word, per encoding and operand shape.
//!
//! Register and immediate fields are all 7 bits wide and start at one of five
//! bit offsets. Which offset holds what depends on the encoding the operation
//! was found in; pairs missing from [`LAYOUTS`] cannot be encoded.

use std::fmt;

#[allow(clippy::enum_glob_use)]
use crate::opcode::OperandShape::{self, *};

/// Offsets of the 7-bit fields of an unpacked word.
const F0: u8 = 0;
const F7: u8 = 7;
const F14: u8 = 14;
const F26: u8 = 26;
const F35: u8 = 35;

/// Width of every register and immediate field.
pub const FIELD_BITS: u8 = 7;

/// The four operation encodings that go through the layout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// 26-bit slot, 5-bit opcode.
    Short26,
    /// 34-bit slot with bit 33 clear, 5-bit opcode.
    Short34,
    /// 34-bit slot with bit 33 set, 8-bit opcode.
    Long34,
    /// 42-bit slot with bit 32 set, 8-bit opcode.
    Long42,
}

impl Encoding {
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Short26 => "26",
            Self::Short34 => "34-0",
            Self::Long34 => "34-1",
            Self::Long42 => "42",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Not encoded, the operation always executes (`r1` reads as true).
    Always,
    Field(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub guard: Guard,
    pub immediate: Option<u8>,
    pub sources: &'static [u8],
    pub destination: Option<u8>,
}

struct Row {
    encoding: Encoding,
    shapes: &'static [OperandShape],
    layout: Layout,
}

macro_rules! row {
    ($encoding:ident, [$($shape:ident),+], $guard:expr, $immediate:expr, [$($source:expr),*], $destination:expr) => {
        Row {
            encoding: Encoding::$encoding,
            shapes: &[$($shape),+],
            layout: Layout {
                guard: $guard,
                immediate: $immediate,
                sources: &[$($source),*],
                destination: $destination,
            },
        }
    };
}

const G1: Guard = Guard::Always;
const G14: Guard = Guard::Field(F14);

#[rustfmt::skip]
static LAYOUTS: &[Row] = &[
    row!(Short26, [BinaryShort, BinaryUnguardedShort], G1, None, [F0, F7], Some(F14)),
    row!(Short26, [UnaryParam7Short, UnaryParam7UnguardedShort], G1, Some(F7), [F0], Some(F14)),
    row!(Short26, [BinaryParam7ResultlessShort, BinaryUnguardedParam7ResultlessShort], G1, Some(F14), [F0, F7], None),
    row!(Short26, [UnaryShort], G14, None, [F0], Some(F7)),

    row!(Short34, [BinaryShort, BinaryUnguardedShort], G14, None, [F0, F7], Some(F26)),
    row!(Short34, [UnaryShort], G14, None, [F0], Some(F26)),
    row!(Short34, [UnaryParam7Short, UnaryParam7UnguardedShort], G14, Some(F7), [F0], Some(F26)),
    row!(Short34, [BinaryParam7ResultlessShort, BinaryUnguardedParam7ResultlessShort], G14, Some(F26), [F0, F7], None),

    row!(Long34, [Binary, BinaryUnguarded], G1, None, [F0, F7], Some(F14)),
    row!(Long34, [BinaryResultless], G14, None, [F0, F7], None),
    // The guard field doubles as the destination.
    row!(Long34, [UnaryParam7], G14, Some(F7), [F0], Some(F14)),
    row!(Long34, [UnaryParam7Unguarded], G1, Some(F7), [F0], Some(F14)),
    row!(Long34, [Unary], G14, None, [F0], Some(F7)),
    row!(Long34, [UnaryParam7Resultless], G14, Some(F7), [F0], None),
    row!(Long34, [ZeroaryResultless], G14, None, [], None),

    row!(Long42, [BinaryUnguardedShort, BinaryUnguarded], G1, None, [F0, F7], Some(F35)),
    row!(Long42, [UnaryParam7UnguardedShort, UnaryParam7Unguarded], G1, Some(F7), [F0], Some(F35)),
    row!(Long42, [BinaryUnguardedParam7ResultlessShort], G1, Some(F35), [F0, F7], None),
    row!(Long42, [UnaryShort, Unary], G14, None, [F0], Some(F35)),
    row!(Long42, [BinaryShort, Binary], G14, None, [F0, F7], Some(F35)),
    row!(Long42, [UnaryParam7Short, UnaryParam7], G14, Some(F7), [F0], Some(F35)),
    row!(Long42, [BinaryParam7ResultlessShort, BinaryParam7Resultless], G14, Some(F35), [F0, F7], None),
    row!(Long42, [BinaryResultless], G14, None, [F0, F7], None),
    row!(Long42, [UnaryParam7Resultless], G14, Some(F7), [F0], None),
    row!(Long42, [Zeroary], G14, None, [], Some(F35)),
    row!(Long42, [ZeroaryResultless], G14, None, [], None),
    row!(Long42, [UnaryResultless], G14, None, [F0], None),
];

/// Layout of `shape` operations in `encoding`, `None` if the shape cannot be
/// encoded that way.
#[must_use]
pub fn layout(encoding: Encoding, shape: OperandShape) -> Option<&'static Layout> {
    LAYOUTS
        .iter()
        .find(|row| row.encoding == encoding && row.shapes.contains(&shape))
        .map(|row| &row.layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ENCODINGS: [Encoding; 4] = [
        Encoding::Short26,
        Encoding::Short34,
        Encoding::Long34,
        Encoding::Long42,
    ];

    #[test]
    fn each_pair_has_at_most_one_layout() {
        for encoding in ENCODINGS {
            for row in LAYOUTS.iter().filter(|row| row.encoding == encoding) {
                for shape in row.shapes {
                    let matching = LAYOUTS
                        .iter()
                        .filter(|other| other.encoding == encoding && other.shapes.contains(shape))
                        .count();
                    assert_eq!(matching, 1, "{encoding} {shape:?}");
                }
            }
        }
    }

    #[test]
    fn fields_stay_inside_the_word() {
        for row in LAYOUTS {
            let Layout {
                guard,
                immediate,
                sources,
                destination,
            } = row.layout;
            let top = match row.encoding {
                Encoding::Short26 => 20,
                Encoding::Short34 => 32,
                Encoding::Long34 | Encoding::Long42 => 41,
            };
            let guard = match guard {
                Guard::Always => None,
                Guard::Field(at) => Some(at),
            };
            for at in guard
                .into_iter()
                .chain(immediate)
                .chain(sources.iter().copied())
                .chain(destination)
            {
                assert!(at + FIELD_BITS - 1 <= top, "{} field at {at}", row.encoding);
            }
        }
    }

    #[test]
    fn short_binary_layouts() {
        assert_eq!(
            layout(Encoding::Short26, BinaryShort),
            Some(&Layout {
                guard: Guard::Always,
                immediate: None,
                sources: &[0, 7],
                destination: Some(14),
            })
        );
        assert_eq!(
            layout(Encoding::Long42, BinaryShort).map(|layout| layout.destination),
            Some(Some(35))
        );
    }

    #[test]
    fn unencodable_pairs() {
        assert_eq!(layout(Encoding::Short26, UnaryParam7), None);
        assert_eq!(layout(Encoding::Short34, Binary), None);
        assert_eq!(layout(Encoding::Long34, BinaryShort), None);
        assert_eq!(layout(Encoding::Long42, ZeroaryParam32Unguarded), None);
        for encoding in ENCODINGS {
            assert_eq!(layout(encoding, NoneMatched), None);
        }
    }

    #[test]
    fn encoding_tags() {
        let tags: Vec<_> = ENCODINGS.iter().map(ToString::to_string).collect();
        assert_eq!(tags, vec!["26", "34-0", "34-1", "42"]);
    }
}
