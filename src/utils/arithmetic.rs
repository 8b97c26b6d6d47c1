// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

const SIGN_BITMASK: u8 = 0b10000000;

/// Checks if an unsigned number would be negative if it was signed. This is
/// done by checking if the 7th bit is set.
#[inline(always)]
pub fn is_negative(arg: u8) -> bool {
    arg & SIGN_BITMASK == SIGN_BITMASK
}

/// Adds a relative displacement to an address. This is useful for operations
/// using relative addressing that allow branching forwards or backwards.
#[inline(always)]
pub fn add_relative(base_addr: u16, displacement: i8) -> u16 {
    if displacement < 0 {
        base_addr.wrapping_sub(displacement.unsigned_abs() as u16)
    } else {
        base_addr.wrapping_add(displacement as u16)
    }
}

/// Returns true if adding `lhs` and `rhs` produced `result` with a sign that
/// neither operand had, meaning the two's complement result is invalid (e.g.
/// 64 + 64 => -128).
///
/// Subtraction is covered by passing the one's complement of the subtrahend,
/// the same way the hardware feeds it through the adder.
#[inline(always)]
pub fn signed_overflow(lhs: u8, rhs: u8, result: u8) -> bool {
    is_negative((lhs ^ result) & (rhs ^ result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_bit_is_negative() {
        assert!(is_negative(0x80));
        assert!(is_negative(0xFF));
        assert!(!is_negative(0x7F));
        assert!(!is_negative(0x00));
    }

    #[test]
    fn relative_displacement_moves_both_ways() {
        assert_eq!(add_relative(0x8010, 0x10), 0x8020);
        assert_eq!(add_relative(0x8010, -0x10), 0x8000);
        assert_eq!(add_relative(0x8010, -128), 0x7F90);
        assert_eq!(add_relative(0x0005, -6), 0xFFFF);
        assert_eq!(add_relative(0xFFFF, 1), 0x0000);
    }

    #[test]
    fn overflow_only_when_sign_flips() {
        // 0x7F + 0x01 = 0x80: two positives make a negative.
        assert!(signed_overflow(0x7F, 0x01, 0x80));
        // 0x80 + 0xFF = 0x7F: two negatives make a positive.
        assert!(signed_overflow(0x80, 0xFF, 0x7F));
        // Mixed signs can never overflow.
        assert!(!signed_overflow(0x7F, 0x80, 0xFF));
        assert!(!signed_overflow(0x01, 0x01, 0x02));
    }
}
