//! # TM3260 Operation Table
//!
//! Every operation is identified by an 8-bit opcode. Compressed 26-bit and
//! short 34-bit operations only have room for 5 opcode bits, so opcodes 0-31
//! double as the "short" set; everything else needs a long (34 or 42-bit) slot.
//!
//! Each entry records how its operands are laid out (the [`OperandShape`]),
//! whether its 7-bit immediate is signed, and the factor the immediate is
//! scaled by (load/store displacements are in units of the access size).
//!
//! Several assembler mnemonics are aliases of one opcode and are never
//! produced by the decoder:
//!
//! | opcode | aliases                    | opcode | aliases              |
//! |--------|----------------------------|--------|----------------------|
//! | 6      | ild16                      | 44     | iabs                 |
//! | 7      | ld32                       | 53     | zex16                |
//! | 8      | uld8                       | 55     | zex8                 |
//! | 11     | lsli                       | 56     | sex8                 |
//! | 12     | ident                      | 65     | dspiabs              |
//! | 13     | ineg                       | 72     | dspidualabs          |
//! | 14, 15 | ileq, iles                 | 76     | umin                 |
//! | 19     | lsl                        | 144-147| fles(flags), fleq(flags) |
//! | 29-31  | st8(d), st16(d), st32(d)   | 192    | ild8                 |
//! | 33     | borrow, ules               | 197    | uld16                |
//! | 35, 37, 39 | uleq, ueql, uneq       | 209, 213 | pref, alloc        |
//!
//! Opcode 191 is shared by `uimm` and `iimm`; the two differ only in how the
//! assembler treats the constant, and the table always answers `uimm`.

use std::sync::LazyLock;

use crate::bitwise::Bits;

/// Operand structure of an operation.
///
/// The names combine the arity (zeroary, unary, binary), an optional 7-bit or
/// 32-bit immediate parameter, whether a result register is written, whether a
/// guard register is encoded and whether the layout is the short one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandShape {
    BinaryUnguardedShort,
    UnaryParam7UnguardedShort,
    BinaryUnguardedParam7ResultlessShort,
    UnaryShort,
    BinaryShort,
    UnaryParam7Short,
    BinaryParam7ResultlessShort,
    BinaryUnguarded,
    BinaryResultless,
    UnaryParam7Unguarded,
    Unary,
    BinaryParam7Resultless,
    Binary,
    UnaryParam7,
    UnaryParam7Resultless,
    Zeroary,
    ZeroaryResultless,
    UnaryResultless,
    ZeroaryParam32Unguarded,
    ZeroaryParam32Resultless,
    /// No table entry matched the opcode.
    NoneMatched,
}

/// How the immediate parameter of an operation is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSign {
    Unsigned,
    Signed,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub shape: OperandShape,
    pub sign: ParamSign,
    pub scale: u8,
}

impl Operation {
    /// Scales a raw 7-bit immediate field, sign-extending it first when the
    /// operation takes a signed parameter.
    #[must_use]
    pub fn immediate(&self, field: u64) -> i64 {
        let field = field.get_bits(0..=6);
        #[allow(clippy::cast_possible_wrap)]
        let value = match self.sign {
            ParamSign::Signed => field.sign_extended(7),
            ParamSign::Unsigned | ParamSign::NotApplicable => field as i64,
        };
        i64::from(self.scale) * value
    }
}

/// Result of looking an opcode up in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(&'static Operation),
    Unknown(u8),
}

impl Lookup {
    #[must_use]
    pub const fn shape(&self) -> OperandShape {
        match self {
            Self::Found(operation) => operation.shape,
            Self::Unknown(_) => OperandShape::NoneMatched,
        }
    }
}

/// Looks `opcode` up in the operation table. Never fails: opcodes without an
/// entry come back as [`Lookup::Unknown`].
#[must_use]
pub fn lookup(opcode: u8) -> Lookup {
    OPCODE_INDEX[usize::from(opcode)].map_or(Lookup::Unknown(opcode), Lookup::Found)
}

static OPCODE_INDEX: LazyLock<[Option<&'static Operation>; 256]> = LazyLock::new(|| {
    let mut index = [None; 256];
    for operation in OPERATIONS {
        index[usize::from(operation.opcode)] = Some(operation);
    }
    index
});

macro_rules! op {
    ($opcode:literal, $mnemonic:literal, $shape:ident) => {
        op!($opcode, $mnemonic, $shape, NotApplicable, 0)
    };
    ($opcode:literal, $mnemonic:literal, $shape:ident, $sign:ident, $scale:literal) => {
        Operation {
            opcode: $opcode,
            mnemonic: $mnemonic,
            shape: OperandShape::$shape,
            sign: ParamSign::$sign,
            scale: $scale,
        }
    };
}

/// The TM3260 operation set, in opcode order.
pub static OPERATIONS: &[Operation] = &[
    op!(0, "igtri", UnaryParam7Short, Signed, 1),
    op!(1, "igeqi", UnaryParam7Short, Signed, 1),
    op!(2, "ilesi", UnaryParam7Short, Signed, 1),
    op!(3, "ineqi", UnaryParam7, Signed, 1),
    op!(4, "ieqli", UnaryParam7Short, Signed, 1),
    op!(5, "iaddi", UnaryParam7Short, Unsigned, 1),
    op!(6, "ild16d", UnaryParam7Short, Signed, 2),
    op!(7, "ld32d", UnaryParam7Short, Signed, 4),
    op!(8, "uld8d", UnaryParam7Short, Signed, 1),
    op!(9, "lsri", UnaryParam7Short, Unsigned, 1),
    op!(10, "asri", UnaryParam7Short, Unsigned, 1),
    op!(11, "asli", UnaryParam7Short, Unsigned, 1),
    op!(12, "iadd", BinaryShort, Unsigned, 1),
    op!(13, "isub", BinaryShort),
    op!(14, "igeq", BinaryShort),
    op!(15, "igtr", BinaryShort),
    op!(16, "bitand", BinaryShort),
    op!(17, "bitor", BinaryShort),
    op!(18, "asr", BinaryShort),
    op!(19, "asl", BinaryShort),
    op!(20, "ifloat", UnaryShort),
    op!(21, "ifixrz", UnaryShort),
    op!(22, "fadd", BinaryShort),
    op!(23, "imin", BinaryShort),
    op!(24, "imax", BinaryShort),
    op!(25, "iavgonep", BinaryShort),
    op!(26, "ume8uu", BinaryShort),
    op!(27, "imul", BinaryShort),
    op!(28, "fmul", BinaryShort),
    // Unguarded in the 26-bit format, guarded in the 34 and 42-bit ones.
    op!(29, "h_st8d", BinaryParam7ResultlessShort, Signed, 1),
    op!(30, "h_st16d", BinaryParam7ResultlessShort, Signed, 2),
    op!(31, "h_st32d", BinaryParam7ResultlessShort, Signed, 4),
    op!(32, "isubi", UnaryParam7, Unsigned, 1),
    op!(33, "ugtr", Binary),
    op!(34, "ugtri", UnaryParam7, Unsigned, 1),
    op!(35, "ugeq", Binary),
    op!(36, "ugeqi", UnaryParam7, Unsigned, 1),
    op!(37, "ieql", Binary),
    op!(38, "ueqli", UnaryParam7, Unsigned, 1),
    op!(39, "ineq", Binary),
    op!(40, "uneqi", UnaryParam7, Unsigned, 1),
    op!(41, "ulesi", UnaryParam7, Signed, 1),
    op!(42, "ileqi", UnaryParam7, Signed, 1),
    op!(43, "uleqi", UnaryParam7, Unsigned, 1),
    op!(44, "h_iabs", Binary),
    op!(45, "carry", Binary),
    op!(46, "izero", Binary),
    op!(47, "inonzero", Binary),
    op!(48, "bitxor", Binary),
    op!(49, "bitandinv", Binary),
    op!(50, "bitinv", Unary),
    op!(51, "sex16", Unary),
    op!(52, "packbytes", Binary),
    op!(53, "pack16lsb", Binary),
    op!(54, "pack16msb", Binary),
    op!(55, "ubytesel", Binary, Unsigned, 0),
    op!(56, "ibytesel", Binary, Unsigned, 0),
    op!(57, "mergelsb", Binary),
    op!(58, "mergemsb", Binary),
    op!(64, "ume8ii", Binary),
    op!(65, "h_dspiabs", Binary),
    op!(66, "dspiadd", Binary),
    op!(67, "dspuadd", Binary),
    op!(68, "dspisub", Binary),
    op!(69, "dspusub", Binary),
    op!(70, "dspidualadd", Binary),
    op!(71, "dspidualsub", Binary),
    op!(72, "h_dspidualabs", Binary),
    op!(73, "quadavg", Binary),
    op!(74, "iclipi", Binary),
    op!(75, "uclipi", Binary),
    op!(76, "uclipu", Binary),
    op!(77, "iflip", Binary),
    op!(78, "dspuquadaddui", Binary),
    op!(80, "quadumin", Binary),
    op!(81, "quadumax", Binary),
    op!(82, "dualiclipi", Binary),
    op!(83, "dualuclipi", Binary),
    op!(89, "quadumulmsb", Binary),
    op!(90, "ufir8uu", Binary),
    op!(91, "ifir8ui", Binary),
    op!(92, "ifir8ii", Binary),
    op!(93, "ifir16", Binary),
    op!(94, "ufir16", Binary),
    op!(95, "dspidualmul", Binary),
    op!(96, "lsr", Binary),
    op!(97, "rol", Binary),
    op!(98, "roli", UnaryParam7, Unsigned, 1),
    op!(99, "funshift1", Binary),
    op!(100, "funshift2", Binary),
    op!(101, "funshift3", Binary),
    op!(102, "dualasr", Binary),
    op!(103, "mergedual16lsb", Binary),
    op!(108, "fdiv", Binary),
    op!(109, "fdivflags", Binary),
    op!(110, "fsqrt", Unary),
    op!(111, "fsqrtflags", Unary),
    op!(112, "faddflags", Binary),
    op!(113, "fsub", Binary),
    op!(114, "fsubflags", Binary),
    op!(115, "fabsval", Unary),
    op!(116, "fabsvalflags", Unary),
    op!(117, "ifloatrz", Unary),
    op!(118, "ifloatrzflags", Unary),
    op!(119, "ufloatrz", Unary),
    op!(120, "ufloatrzflags", Unary),
    op!(121, "ifixieee", Unary),
    op!(122, "ifixieeeflags", Unary),
    op!(123, "ufixieee", Unary),
    op!(124, "ufixieeeflags", Unary),
    op!(125, "ufixrz", Unary),
    op!(126, "ufixrzflags", Unary),
    op!(127, "ufloat", Unary),
    op!(128, "ufloatflags", Unary),
    op!(129, "ifixrzflags", Unary),
    op!(130, "ifloatflags", Unary),
    op!(138, "umul", Binary),
    op!(139, "imulm", Binary),
    op!(140, "umulm", Binary),
    op!(141, "dspimul", Binary),
    op!(142, "dspumul", Binary),
    op!(143, "fmulflags", Binary),
    op!(144, "fgtr", Binary),
    op!(145, "fgtrflags", Binary),
    op!(146, "fgeq", Binary),
    op!(147, "fgeqflags", Binary),
    op!(148, "feql", Binary),
    op!(149, "feqlflags", Binary),
    op!(150, "fneq", Binary),
    op!(151, "fneqflags", Binary),
    op!(152, "fsign", Unary),
    op!(153, "fsignflags", Unary),
    op!(154, "cycles", Zeroary),
    op!(155, "hicycles", Zeroary),
    op!(156, "readdpc", Zeroary),
    op!(157, "readspc", Zeroary),
    op!(158, "readpcsw", Zeroary),
    op!(159, "writespc", UnaryResultless),
    op!(160, "writedpc", UnaryResultless),
    // Binary, not unary: TM3260 instruction set errata, rev. 1.02.
    op!(161, "writepcsw", BinaryResultless),
    op!(162, "curcycles", Zeroary),
    op!(176, "jmpt", BinaryResultless),
    op!(177, "ijmpt", BinaryResultless),
    op!(178, "jmpi", ZeroaryParam32Resultless, Unsigned, 1),
    op!(179, "ijmpi", ZeroaryParam32Resultless, Unsigned, 1),
    op!(180, "jmpf", Binary),
    op!(181, "ijmpf", BinaryResultless),
    op!(184, "iclr", ZeroaryResultless),
    op!(191, "uimm", ZeroaryParam32Unguarded, Unsigned, 1),
    op!(192, "ild8d", UnaryParam7, Signed, 1),
    op!(193, "ild8r", Binary),
    op!(194, "uld8r", Binary),
    op!(195, "ild16r", Binary),
    op!(196, "ild16x", Binary),
    op!(197, "uld16d", UnaryParam7, Signed, 2),
    op!(198, "uld16r", Binary),
    op!(199, "uld16x", Binary),
    op!(200, "ld32r", Binary),
    op!(201, "ld32x", Binary),
    op!(202, "rdtag", UnaryParam7, Signed, 4),
    op!(203, "rdstatus", UnaryParam7, Unsigned, 4),
    op!(205, "dcb", UnaryParam7Resultless, Signed, 4),
    op!(206, "dinvalid", UnaryParam7Resultless, Signed, 4),
    op!(209, "prefd", UnaryParam7Resultless, Signed, 4),
    op!(210, "prefr", Binary),
    op!(211, "pref16x", Binary),
    op!(212, "pref32x", Binary),
    op!(213, "allocd", UnaryParam7Resultless, Signed, 4),
    op!(214, "allocr", BinaryResultless),
    op!(215, "allocx", BinaryResultless),
    op!(233, "swapbytes", Unary),
    op!(234, "dspuquadabssubi", Binary),
    op!(235, "quadsub", Binary),
    op!(236, "quadadd", Binary),
    op!(237, "mergeodd", Binary),
    op!(238, "dualimulm", Binary),
    op!(239, "dualasl", Binary),
    op!(240, "dspuquadsub", Binary),
    op!(241, "dspuquadadd", Binary),
    op!(242, "dspiquadsub", Binary),
    op!(243, "dspiquadadd", Binary),
    op!(244, "addsub", Binary),
    op!(245, "quaduleq", Binary),
    op!(246, "quaduclipi", Binary),
    op!(247, "quadiclipi", Binary),
    op!(248, "quaduminbyte", Unary),
    op!(249, "quadumaxbyte", Unary),
    op!(250, "dspuquadabssub", Binary),
    op!(251, "bilinear2", Binary),
    op!(252, "bilinear1", Binary),
    op!(253, "quadavg0", Binary),
    op!(254, "uclip8iasr8add", Binary),
    op!(255, "nop", ZeroaryResultless),
];

/// Opcode of the `uimm` pseudo-operation decoded from 42-bit slots.
pub const UIMM: u8 = 191;
/// Opcode of `jmpi`, the immediate jump decoded from 42-bit slots.
pub const JMPI: u8 = 178;
/// Opcode of `ijmpi`, the interruptible immediate jump.
pub const IJMPI: u8 = 179;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn table_is_sorted_without_duplicates() {
        for pair in OPERATIONS.windows(2) {
            assert!(
                pair[0].opcode < pair[1].opcode,
                "{} listed after {}",
                pair[1].opcode,
                pair[0].opcode
            );
        }
    }

    #[test]
    fn short_opcodes_are_all_defined() {
        for opcode in 0..32 {
            assert!(matches!(lookup(opcode), Lookup::Found(_)), "opcode {opcode}");
        }
    }

    #[test]
    fn lookup_known_opcodes() {
        let Lookup::Found(iadd) = lookup(12) else {
            panic!("iadd missing");
        };
        assert_eq!(iadd.mnemonic, "iadd");
        assert_eq!(iadd.shape, OperandShape::BinaryShort);

        let Lookup::Found(nop) = lookup(255) else {
            panic!("nop missing");
        };
        assert_eq!(nop.mnemonic, "nop");
        assert_eq!(nop.shape, OperandShape::ZeroaryResultless);
    }

    #[test]
    fn shared_opcode_resolves_to_unsigned_immediate_load() {
        let Lookup::Found(operation) = lookup(UIMM) else {
            panic!("uimm missing");
        };
        assert_eq!(operation.mnemonic, "uimm");
        assert_eq!(operation.sign, ParamSign::Unsigned);
    }

    #[test]
    fn lookup_unknown_opcode() {
        for opcode in [59, 79, 104, 131, 163, 190, 204, 216, 232] {
            assert_eq!(lookup(opcode), Lookup::Unknown(opcode));
            assert_eq!(lookup(opcode).shape(), OperandShape::NoneMatched);
        }
    }

    #[test]
    fn immediate_scaling() {
        let Lookup::Found(ld32d) = lookup(7) else {
            panic!("ld32d missing");
        };
        assert_eq!(ld32d.immediate(0x01), 4);
        assert_eq!(ld32d.immediate(0x7f), -4);
        assert_eq!(ld32d.immediate(0x40), -256);

        let Lookup::Found(iaddi) = lookup(5) else {
            panic!("iaddi missing");
        };
        assert_eq!(iaddi.immediate(0x7f), 127);
    }
}
