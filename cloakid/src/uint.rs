//! # Arbitrary-Precision Unsigned Integers
//!
//! This module implements the arbitrary-width unsigned integer substrate
//! that the identifier codec is written against. A packed identifier spans
//! `1 + 6 + timestamp_bits + entropy_bits` bits (up to ~160 bits for the
//! widest legal configuration), which exceeds every native integer width,
//! so all field assembly and extraction runs on [`Uint`] instead.
//!
//! Values are non-negative by construction. Subtraction clamps at zero
//! rather than wrapping; the codec never subtracts a larger value from a
//! smaller one on a valid path, so the clamp is a defensive invariant.
//!
//! ## Representation
//!
//! Little-endian `u32` limb vector in canonical form: no trailing zero
//! limbs, and zero is the empty vector. Every operation normalizes its
//! result, so equality and ordering can compare limb vectors directly.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Mul, Shl, Shr};

/// Error returned when a division or modulo operation receives a zero
/// divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("division by zero")]
pub struct DivideByZero;

/// An arbitrary-width non-negative integer.
///
/// Supports the narrow operation set the identifier codec needs: addition,
/// clamped subtraction, multiplication, division with remainder, ordering,
/// exponentiation, shifts, bitwise combination, and radix conversion. All
/// operations match native unbounded-integer semantics on non-negative
/// operands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Uint {
    /// Little-endian limbs, canonical (no trailing zero limbs).
    limbs: Vec<u32>,
}

impl Uint {
    /// The value zero (the empty limb vector).
    pub const ZERO: Uint = Uint { limbs: Vec::new() };

    /// Returns the value one.
    pub fn one() -> Self {
        Uint { limbs: vec![1] }
    }

    /// Returns 2^`bits`.
    pub fn pow2(bits: u32) -> Self {
        let mut limbs = vec![0u32; bits as usize / 32];
        limbs.push(1 << (bits % 32));
        Uint { limbs }
    }

    /// Builds a value from big-endian bytes. Leading zero bytes are
    /// accepted and ignored.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let mut limbs = Vec::with_capacity(bytes.len().div_ceil(4));
        // rchunks yields the least significant group first; each group is
        // still in big-endian byte order.
        for chunk in bytes.rchunks(4) {
            let mut limb = 0u32;
            for &byte in chunk {
                limb = (limb << 8) | u32::from(byte);
            }
            limbs.push(limb);
        }
        let mut value = Uint { limbs };
        value.normalize();
        value
    }

    /// Whether this value is zero.
    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// Width of the minimal binary representation, in bits. Zero has a
    /// bit length of zero.
    pub fn bit_len(&self) -> u32 {
        match self.limbs.last() {
            None => 0,
            Some(top) => {
                let full = (self.limbs.len() as u32 - 1) * 32;
                full + (32 - top.leading_zeros())
            }
        }
    }

    /// Returns bit `index` (zero-based from the least significant end).
    /// Bits beyond the minimal width read as zero.
    pub fn bit(&self, index: u32) -> bool {
        match self.limbs.get(index as usize / 32) {
            Some(limb) => (limb >> (index % 32)) & 1 == 1,
            None => false,
        }
    }

    /// Converts to a `u64` if the value fits, `None` otherwise.
    pub fn to_u64(&self) -> Option<u64> {
        if self.bit_len() > 64 {
            return None;
        }
        let low = self.limbs.first().copied().unwrap_or(0) as u64;
        let high = self.limbs.get(1).copied().unwrap_or(0) as u64;
        Some(high << 32 | low)
    }

    /// Subtraction clamped at zero: returns `self - other`, or zero when
    /// `other > self`.
    pub fn saturating_sub(&self, other: &Uint) -> Uint {
        if other > self {
            return Uint::ZERO;
        }
        let mut limbs = Vec::with_capacity(self.limbs.len());
        let mut borrow = 0i64;
        for i in 0..self.limbs.len() {
            let rhs = other.limbs.get(i).copied().unwrap_or(0);
            let diff = i64::from(self.limbs[i]) - i64::from(rhs) - borrow;
            if diff < 0 {
                limbs.push((diff + (1i64 << 32)) as u32);
                borrow = 1;
            } else {
                limbs.push(diff as u32);
                borrow = 0;
            }
        }
        let mut value = Uint { limbs };
        value.normalize();
        value
    }

    /// Raises this value to a non-negative exponent via square-and-multiply.
    /// `0^0` is one, matching the usual integer-exponentiation convention.
    pub fn pow(&self, exp: u32) -> Uint {
        let mut result = Uint::one();
        let mut base = self.clone();
        let mut exp = exp;
        while exp > 0 {
            if exp & 1 == 1 {
                result = &result * &base;
            }
            exp >>= 1;
            if exp > 0 {
                base = &base * &base;
            }
        }
        result
    }

    /// Division with remainder: returns `(self / divisor, self % divisor)`.
    ///
    /// Implemented as binary shift-subtract long division; operand widths
    /// in this codec stay under a few hundred bits, so the simple routine
    /// is plenty. Radix conversion uses [`Uint::divmod_u32`] instead.
    pub fn divmod(&self, divisor: &Uint) -> Result<(Uint, Uint), DivideByZero> {
        if divisor.is_zero() {
            return Err(DivideByZero);
        }
        if self < divisor {
            return Ok((Uint::ZERO, self.clone()));
        }
        let shift = self.bit_len() - divisor.bit_len();
        let mut remainder = self.clone();
        let mut quotient = Uint::ZERO;
        for s in (0..=shift).rev() {
            let shifted = divisor << s;
            if shifted <= remainder {
                remainder = remainder.saturating_sub(&shifted);
                quotient.set_bit(s);
            }
        }
        Ok((quotient, remainder))
    }

    /// Short division by a `u32` divisor: returns `(quotient, remainder)`.
    pub fn divmod_u32(&self, divisor: u32) -> Result<(Uint, u32), DivideByZero> {
        if divisor == 0 {
            return Err(DivideByZero);
        }
        let mut limbs = vec![0u32; self.limbs.len()];
        let mut remainder = 0u64;
        for i in (0..self.limbs.len()).rev() {
            let accum = remainder << 32 | u64::from(self.limbs[i]);
            limbs[i] = (accum / u64::from(divisor)) as u32;
            remainder = accum % u64::from(divisor);
        }
        let mut quotient = Uint { limbs };
        quotient.normalize();
        Ok((quotient, remainder as u32))
    }

    /// Converts to digits in the given radix, most significant first.
    /// Zero converts to a single zero digit. The radix must be at least 2.
    pub fn to_radix_digits(&self, radix: u32) -> Vec<u32> {
        debug_assert!(radix >= 2);
        if self.is_zero() {
            return vec![0];
        }
        let mut digits = Vec::new();
        let mut value = self.clone();
        while !value.is_zero() {
            // The divisor is non-zero by the radix precondition.
            let (quotient, digit) = match value.divmod_u32(radix) {
                Ok(pair) => pair,
                Err(DivideByZero) => unreachable!("radix >= 2"),
            };
            digits.push(digit);
            value = quotient;
        }
        digits.reverse();
        digits
    }

    /// Accumulates digits in the given radix, most significant first.
    /// The radix must be at least 2 and every digit below the radix.
    pub fn from_radix_digits(digits: &[u32], radix: u32) -> Uint {
        debug_assert!(radix >= 2);
        let mut value = Uint::ZERO;
        for &digit in digits {
            debug_assert!(digit < radix);
            value.mul_add_small(radix, digit);
        }
        value
    }

    /// Renders the minimal binary representation (`"0"` for zero, no
    /// leading zero bits otherwise).
    pub fn to_binary_string(&self) -> String {
        let width = self.bit_len();
        if width == 0 {
            return "0".to_string();
        }
        (0..width)
            .rev()
            .map(|i| if self.bit(i) { '1' } else { '0' })
            .collect()
    }

    /// Drops trailing zero limbs to restore canonical form.
    fn normalize(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }

    /// Sets bit `index`, growing the limb vector as needed.
    fn set_bit(&mut self, index: u32) {
        let limb = index as usize / 32;
        if self.limbs.len() <= limb {
            self.limbs.resize(limb + 1, 0);
        }
        self.limbs[limb] |= 1 << (index % 32);
    }

    /// In-place `self = self * mul + add` for small operands; the
    /// workhorse behind radix accumulation.
    fn mul_add_small(&mut self, mul: u32, add: u32) {
        let mut carry = u64::from(add);
        for limb in &mut self.limbs {
            let accum = u64::from(*limb) * u64::from(mul) + carry;
            *limb = accum as u32;
            carry = accum >> 32;
        }
        if carry > 0 {
            self.limbs.push(carry as u32);
        }
        self.normalize();
    }
}

impl From<u64> for Uint {
    fn from(value: u64) -> Self {
        let mut result = Uint {
            limbs: vec![value as u32, (value >> 32) as u32],
        };
        result.normalize();
        result
    }
}

impl Ord for Uint {
    fn cmp(&self, other: &Self) -> Ordering {
        // Canonical form makes limb count the primary key.
        match self.limbs.len().cmp(&other.limbs.len()) {
            Ordering::Equal => self.limbs.iter().rev().cmp(other.limbs.iter().rev()),
            ordering => ordering,
        }
    }
}

impl PartialOrd for Uint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for &Uint {
    type Output = Uint;

    fn add(self, rhs: &Uint) -> Uint {
        let longest = self.limbs.len().max(rhs.limbs.len());
        let mut limbs = Vec::with_capacity(longest + 1);
        let mut carry = 0u64;
        for i in 0..longest {
            let a = self.limbs.get(i).copied().unwrap_or(0);
            let b = rhs.limbs.get(i).copied().unwrap_or(0);
            let sum = u64::from(a) + u64::from(b) + carry;
            limbs.push(sum as u32);
            carry = sum >> 32;
        }
        if carry > 0 {
            limbs.push(carry as u32);
        }
        let mut value = Uint { limbs };
        value.normalize();
        value
    }
}

impl Mul for &Uint {
    type Output = Uint;

    fn mul(self, rhs: &Uint) -> Uint {
        if self.is_zero() || rhs.is_zero() {
            return Uint::ZERO;
        }
        let mut limbs = vec![0u32; self.limbs.len() + rhs.limbs.len()];
        for (i, &a) in self.limbs.iter().enumerate() {
            let mut carry = 0u64;
            for (j, &b) in rhs.limbs.iter().enumerate() {
                let accum = u64::from(a) * u64::from(b) + u64::from(limbs[i + j]) + carry;
                limbs[i + j] = accum as u32;
                carry = accum >> 32;
            }
            limbs[i + rhs.limbs.len()] = carry as u32;
        }
        let mut value = Uint { limbs };
        value.normalize();
        value
    }
}

impl Shl<u32> for &Uint {
    type Output = Uint;

    fn shl(self, shift: u32) -> Uint {
        if self.is_zero() {
            return Uint::ZERO;
        }
        let limb_shift = shift as usize / 32;
        let bit_shift = shift % 32;
        let mut limbs = vec![0u32; limb_shift];
        if bit_shift == 0 {
            limbs.extend_from_slice(&self.limbs);
        } else {
            let mut carry = 0u32;
            for &limb in &self.limbs {
                limbs.push(limb << bit_shift | carry);
                carry = limb >> (32 - bit_shift);
            }
            if carry > 0 {
                limbs.push(carry);
            }
        }
        let mut value = Uint { limbs };
        value.normalize();
        value
    }
}

impl Shr<u32> for &Uint {
    type Output = Uint;

    fn shr(self, shift: u32) -> Uint {
        let limb_shift = shift as usize / 32;
        if limb_shift >= self.limbs.len() {
            return Uint::ZERO;
        }
        let bit_shift = shift % 32;
        let kept = &self.limbs[limb_shift..];
        let mut limbs = Vec::with_capacity(kept.len());
        if bit_shift == 0 {
            limbs.extend_from_slice(kept);
        } else {
            for (i, &limb) in kept.iter().enumerate() {
                let high = kept.get(i + 1).copied().unwrap_or(0);
                limbs.push(limb >> bit_shift | high << (32 - bit_shift));
            }
        }
        let mut value = Uint { limbs };
        value.normalize();
        value
    }
}

/// Combines two limb vectors position-wise, zero-extending the shorter
/// operand. Equivalent to padding both binary strings to equal width.
fn zip_limbs(a: &Uint, b: &Uint, op: impl Fn(u32, u32) -> u32) -> Uint {
    let longest = a.limbs.len().max(b.limbs.len());
    let mut limbs = Vec::with_capacity(longest);
    for i in 0..longest {
        let x = a.limbs.get(i).copied().unwrap_or(0);
        let y = b.limbs.get(i).copied().unwrap_or(0);
        limbs.push(op(x, y));
    }
    let mut value = Uint { limbs };
    value.normalize();
    value
}

impl BitAnd for &Uint {
    type Output = Uint;

    fn bitand(self, rhs: &Uint) -> Uint {
        zip_limbs(self, rhs, |a, b| a & b)
    }
}

impl BitOr for &Uint {
    type Output = Uint;

    fn bitor(self, rhs: &Uint) -> Uint {
        zip_limbs(self, rhs, |a, b| a | b)
    }
}

impl BitXor for &Uint {
    type Output = Uint;

    fn bitxor(self, rhs: &Uint) -> Uint {
        zip_limbs(self, rhs, |a, b| a ^ b)
    }
}

impl fmt::Display for Uint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for digit in self.to_radix_digits(10) {
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}
