use std::fmt::Debug;
use std::mem::size_of;
use std::ops::RangeInclusive;

/// Helpers for pulling fields out of packed operation words.
/// Bit indices count from the lsb (bit 0) towards the msb.
pub trait Bits
where
    Self: Copy + Into<u128> + TryFrom<u128>,
    <Self as TryFrom<u128>>::Error: Debug,
{
    fn get_bit(self, bit_idx: u8) -> bool {
        debug_assert!(bit_idx < (size_of::<Self>() * 8) as u8);
        let value: u128 = self.into();
        (value >> bit_idx) & 1 == 1
    }

    /// Extracts `bits_range` and moves it down to bit 0.
    fn get_bits(self, bits_range: RangeInclusive<u8>) -> Self {
        let start = *bits_range.start();
        let end = *bits_range.end();
        debug_assert!(start <= end && end < (size_of::<Self>() * 8) as u8);

        let length = u32::from(end - start + 1);
        let mask = if length == 128 {
            u128::MAX
        } else {
            (1_u128 << length) - 1
        };

        let value: u128 = self.into();
        Self::from_u128((value >> start) & mask)
    }

    /// Interprets the low `number_of_bits` bits as a two's complement number.
    fn sign_extended(self, number_of_bits: u8) -> i64 {
        debug_assert!((1..=64).contains(&number_of_bits));
        let value: u128 = self.into();
        let value = (value & ((1 << number_of_bits) - 1)) as i128;

        // Flipping the sign bit and subtracting it back borrows through every
        // upper bit when the sign bit was set.
        let mask = 1_i128 << (number_of_bits - 1);
        ((value ^ mask) - mask) as i64
    }

    fn from_u128(value: u128) -> Self {
        <Self as TryFrom<u128>>::try_from(value).unwrap_or_else(|_| {
            unreachable!("masked value wider than {} bytes", size_of::<Self>())
        })
    }
}

impl Bits for u64 {}
impl Bits for u32 {}
impl Bits for u16 {}
impl Bits for u8 {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::Rng;

    #[test]
    fn get_bit() {
        let b = 0b10_1100_1110_u32;
        assert!(!b.get_bit(0));
        assert!(b.get_bit(1));
        assert!(b.get_bit(2));
        assert!(!b.get_bit(31));
    }

    #[test]
    fn get_bits() {
        let b = 0b10_1100_1110_u32;
        assert_eq!(b.get_bits(0..=3), 0b1110);
        assert_eq!(b.get_bits(1..=1), 0b1);
        assert_eq!(b.get_bits(4..=7), 0b1100);
        assert_eq!(b.get_bits(8..=9), 0b10);
        assert_eq!(b.get_bits(0..=31), 0b10_1100_1110);
        assert_eq!(b.get_bits(28..=31), 0);
    }

    #[test]
    fn get_bits_of_wide_operation_word() {
        let word = 0x21_0180_4182_u64;
        assert_eq!(word.get_bits(0..=6), 2);
        assert_eq!(word.get_bits(7..=13), 3);
        assert_eq!(word.get_bits(14..=20), 1);
        assert_eq!(word.get_bits(21..=28), 12);
        assert_eq!(word.get_bits(35..=41), 4);
        assert_eq!(word.get_bits(0..=63), word);
    }

    #[test]
    fn sign_extended() {
        assert_eq!(0x3f_u64.sign_extended(7), 63);
        assert_eq!(0x40_u64.sign_extended(7), -64);
        assert_eq!(0x7f_u64.sign_extended(7), -1);
        assert_eq!(0xff_u64.sign_extended(7), -1);
        assert_eq!(0_u8.sign_extended(7), 0);
    }

    #[test]
    fn sign_extended_matches_native_cast() {
        let mut rng = rand::thread_rng();
        for _ in 0..256 {
            let value: u8 = rng.r#gen();
            assert_eq!(value.sign_extended(8), i64::from(value as i8));
        }
    }

    #[test]
    #[should_panic]
    fn invalid_index() {
        let b = 0u32;
        b.get_bit(32);
    }
}
