//! Two's-complement integer circuits
//!
//! An [`Int`] is a fixed-width little-endian vector of circuit values. All
//! arithmetic wraps at the factory's bitwidth. Division truncates toward
//! zero; the remainder takes the dividend's sign; division by zero yields
//! quotient 0 and remainder equal to the dividend.

use super::{BoolValue, BooleanFactory};

/// A fixed-width two's-complement bit vector of circuit values.
#[derive(Debug, Clone)]
pub struct Int {
    bits: Vec<BoolValue>,
}

impl Int {
    /// Encodes a constant at the factory's bitwidth.
    pub fn constant(f: &BooleanFactory, value: i32) -> Int {
        let w = f.bitwidth();
        let bits = (0..w)
            .map(|i| f.constant((value >> i) & 1 == 1))
            .collect();
        Int { bits }
    }

    /// Encodes a single bit as the integer 0 or 1.
    pub fn from_bit(f: &BooleanFactory, bit: BoolValue) -> Int {
        let w = f.bitwidth() as usize;
        let mut bits = vec![BoolValue::False; w];
        bits[0] = bit;
        Int { bits }
    }

    /// Returns the width of this integer.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Returns the bit at position `i` (0 is least significant).
    pub fn bit(&self, i: usize) -> &BoolValue {
        &self.bits[i]
    }

    /// Returns the sign bit.
    pub fn sign(&self) -> &BoolValue {
        &self.bits[self.bits.len() - 1]
    }

    fn check_width(&self, other: &Int) {
        assert_eq!(self.width(), other.width(), "integer width mismatch");
    }

    /// Per-bit conditional: `condition ? then_int : else_int`.
    pub fn choose(f: &BooleanFactory, condition: BoolValue, then_int: &Int, else_int: &Int) -> Int {
        then_int.check_width(else_int);
        let bits = then_int
            .bits
            .iter()
            .zip(&else_int.bits)
            .map(|(t, e)| f.ite(condition.clone(), t.clone(), e.clone()))
            .collect();
        Int { bits }
    }

    /// True iff this integer is zero.
    pub fn is_zero(&self, f: &BooleanFactory) -> BoolValue {
        let any = f.or_multi(self.bits.clone());
        f.not(any)
    }

    /// Ripple-carry sum; wraps at the width.
    pub fn plus(&self, other: &Int, f: &BooleanFactory) -> Int {
        self.check_width(other);
        let mut carry = BoolValue::False;
        let mut bits = Vec::with_capacity(self.width());
        for (a, b) in self.bits.iter().zip(&other.bits) {
            bits.push(f.sum(a.clone(), b.clone(), carry.clone()));
            carry = f.carry(a.clone(), b.clone(), carry);
        }
        Int { bits }
    }

    /// Arithmetic negation: complement plus one.
    pub fn negate(&self, f: &BooleanFactory) -> Int {
        let complemented = Int {
            bits: self.bits.iter().map(|b| f.not(b.clone())).collect(),
        };
        let one = Int::constant(f, 1);
        complemented.plus(&one, f)
    }

    /// Difference; wraps at the width.
    pub fn minus(&self, other: &Int, f: &BooleanFactory) -> Int {
        let negated = other.negate(f);
        self.plus(&negated, f)
    }

    /// Absolute value.
    pub fn abs(&self, f: &BooleanFactory) -> Int {
        let negated = self.negate(f);
        Int::choose(f, self.sign().clone(), &negated, self)
    }

    /// Sign of this integer: -1, 0, or 1.
    pub fn signum(&self, f: &BooleanFactory) -> Int {
        let nonzero = f.or_multi(self.bits.clone());
        let sign = self.sign().clone();
        let mut bits = Vec::with_capacity(self.width());
        // negative -> all ones; positive -> only the low bit; zero -> zero
        bits.push(nonzero);
        for _ in 1..self.width() {
            bits.push(sign.clone());
        }
        Int { bits }
    }

    /// Shift-and-add product; wraps at the width.
    pub fn multiply(&self, other: &Int, f: &BooleanFactory) -> Int {
        self.check_width(other);
        let w = self.width();
        let mut acc = Int { bits: vec![BoolValue::False; w] };
        for i in 0..w {
            let gate = &other.bits[i];
            let mut addend = vec![BoolValue::False; w];
            for j in i..w {
                addend[j] = f.and(self.bits[j - i].clone(), gate.clone());
            }
            acc = acc.plus(&Int { bits: addend }, f);
        }
        acc
    }

    // Unsigned comparison of the full bit vectors; returns (lt, eq).
    fn ucompare(&self, other: &Int, f: &BooleanFactory) -> (BoolValue, BoolValue) {
        self.check_width(other);
        let mut lt = BoolValue::False;
        let mut eq = BoolValue::True;
        // scan from the most significant bit down
        for (a, b) in self.bits.iter().zip(&other.bits).rev() {
            let a_lt_b = f.and(f.not(a.clone()), b.clone());
            let bit_eq = f.iff(a.clone(), b.clone());
            lt = f.or(lt, f.and(eq.clone(), a_lt_b));
            eq = f.and(eq, bit_eq);
        }
        (lt, eq)
    }

    /// Restoring division of magnitudes with sign fix-up; returns
    /// (quotient, remainder).
    pub fn divmod(&self, other: &Int, f: &BooleanFactory) -> (Int, Int) {
        self.check_width(other);
        let w = self.width();
        let dividend = self.abs(f);
        let divisor = other.abs(f);

        let mut rem = Int { bits: vec![BoolValue::False; w] };
        let mut quo_bits = vec![BoolValue::False; w];
        for i in (0..w).rev() {
            // rem = (rem << 1) | dividend[i]
            let mut shifted = vec![dividend.bits[i].clone()];
            shifted.extend_from_slice(&rem.bits[..w - 1]);
            rem = Int { bits: shifted };

            let (lt, _) = rem.ucompare(&divisor, f);
            let fits = f.not(lt);
            let reduced = rem.minus(&divisor, f);
            rem = Int::choose(f, fits.clone(), &reduced, &rem);
            quo_bits[i] = fits;
        }
        let unsigned_quo = Int { bits: quo_bits };

        let negative_quo = f.xor(self.sign().clone(), other.sign().clone());
        let neg_quo = unsigned_quo.negate(f);
        let quo = Int::choose(f, negative_quo, &neg_quo, &unsigned_quo);
        let neg_rem = rem.negate(f);
        let signed_rem = Int::choose(f, self.sign().clone(), &neg_rem, &rem);

        let zero = Int { bits: vec![BoolValue::False; w] };
        let divisor_zero = other.is_zero(f);
        (
            Int::choose(f, divisor_zero.clone(), &zero, &quo),
            Int::choose(f, divisor_zero, self, &signed_rem),
        )
    }

    /// Truncating quotient.
    pub fn divide(&self, other: &Int, f: &BooleanFactory) -> Int {
        self.divmod(other, f).0
    }

    /// Remainder, with the dividend's sign.
    pub fn modulo(&self, other: &Int, f: &BooleanFactory) -> Int {
        self.divmod(other, f).1
    }

    fn pointwise(&self, other: &Int, f: &BooleanFactory, op: impl Fn(&BooleanFactory, BoolValue, BoolValue) -> BoolValue) -> Int {
        self.check_width(other);
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(a, b)| op(f, a.clone(), b.clone()))
            .collect();
        Int { bits }
    }

    /// Bitwise and.
    pub fn bit_and(&self, other: &Int, f: &BooleanFactory) -> Int {
        self.pointwise(other, f, BooleanFactory::and)
    }

    /// Bitwise or.
    pub fn bit_or(&self, other: &Int, f: &BooleanFactory) -> Int {
        self.pointwise(other, f, BooleanFactory::or)
    }

    /// Bitwise xor.
    pub fn bit_xor(&self, other: &Int, f: &BooleanFactory) -> Int {
        self.pointwise(other, f, BooleanFactory::xor)
    }

    // Barrel shifter. `fill` supplies the bit shifted in; `left` selects the
    // direction. Shift amounts at or above the width produce pure fill.
    fn shift(&self, amount: &Int, f: &BooleanFactory, left: bool, fill: BoolValue) -> Int {
        self.check_width(amount);
        let w = self.width();
        let mut bits = self.bits.clone();
        let mut stage = 0;
        while (1 << stage) < w {
            let step = 1 << stage;
            let shifted: Vec<BoolValue> = (0..w)
                .map(|j| {
                    if left {
                        if j >= step { bits[j - step].clone() } else { fill.clone() }
                    } else if j + step < w {
                        bits[j + step].clone()
                    } else {
                        fill.clone()
                    }
                })
                .collect();
            let select = amount.bits[stage].clone();
            bits = bits
                .iter()
                .zip(shifted)
                .map(|(keep, moved)| f.ite(select.clone(), moved, keep.clone()))
                .collect();
            stage += 1;
        }
        // any higher amount bit set shifts everything out
        let overflow = f.or_multi(amount.bits[stage..].to_vec());
        let bits = bits
            .into_iter()
            .map(|b| f.ite(overflow.clone(), fill.clone(), b))
            .collect();
        Int { bits }
    }

    /// Shift left; the amount is treated as unsigned.
    pub fn shl(&self, amount: &Int, f: &BooleanFactory) -> Int {
        self.shift(amount, f, true, BoolValue::False)
    }

    /// Logical shift right; the amount is treated as unsigned.
    pub fn shr(&self, amount: &Int, f: &BooleanFactory) -> Int {
        self.shift(amount, f, false, BoolValue::False)
    }

    /// Arithmetic shift right; the amount is treated as unsigned.
    pub fn sha(&self, amount: &Int, f: &BooleanFactory) -> Int {
        let fill = self.sign().clone();
        self.shift(amount, f, false, fill)
    }

    /// True iff this integer equals `other`.
    pub fn equals(&self, other: &Int, f: &BooleanFactory) -> BoolValue {
        self.check_width(other);
        let conjuncts: Vec<BoolValue> = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(a, b)| f.iff(a.clone(), b.clone()))
            .collect();
        f.and_multi(conjuncts)
    }

    /// True iff this integer is less than `other` (signed).
    pub fn lt(&self, other: &Int, f: &BooleanFactory) -> BoolValue {
        let (ult, _) = self.ucompare(other, f);
        let sa = self.sign().clone();
        let sb = other.sign().clone();
        // negative < nonnegative; otherwise the unsigned order agrees
        let neg_pos = f.and(sa.clone(), f.not(sb.clone()));
        let same_sign = f.iff(sa, sb);
        f.or(neg_pos, f.and(same_sign, ult))
    }

    /// True iff this integer is at most `other` (signed).
    pub fn lte(&self, other: &Int, f: &BooleanFactory) -> BoolValue {
        let lt = self.lt(other, f);
        let eq = self.equals(other, f);
        f.or(lt, eq)
    }

    /// True iff this integer is greater than `other` (signed).
    pub fn gt(&self, other: &Int, f: &BooleanFactory) -> BoolValue {
        other.lt(self, f)
    }

    /// True iff this integer is at least `other` (signed).
    pub fn gte(&self, other: &Int, f: &BooleanFactory) -> BoolValue {
        other.lte(self, f)
    }

    /// Sum of single-bit values: the cardinality circuit.
    pub fn count(f: &BooleanFactory, bits: Vec<BoolValue>) -> Int {
        let w = f.bitwidth() as usize;
        let mut acc = Int { bits: vec![BoolValue::False; w] };
        for bit in bits {
            let term = Int::from_bit(f, bit);
            acc = acc.plus(&term, f);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> BooleanFactory {
        BooleanFactory::new(4, true, 6)
    }

    /// Decodes an all-constant Int back to an i32.
    fn decode(int: &Int) -> i32 {
        let w = int.width();
        let mut unsigned: u32 = 0;
        for i in 0..w {
            match int.bit(i).as_constant() {
                Some(true) => unsigned |= 1 << i,
                Some(false) => {}
                None => panic!("non-constant bit"),
            }
        }
        // sign extend
        if unsigned & (1 << (w - 1)) != 0 {
            unsigned |= u32::MAX << w;
        }
        unsigned as i32
    }

    #[test]
    fn constants_round_trip() {
        let f = factory();
        for v in [-32, -5, -1, 0, 1, 7, 31] {
            assert_eq!(decode(&Int::constant(&f, v)), v);
        }
    }

    #[test]
    fn constant_arithmetic_folds() {
        let f = factory();
        let a = Int::constant(&f, 11);
        let b = Int::constant(&f, -4);

        assert_eq!(decode(&a.plus(&b, &f)), 7);
        assert_eq!(decode(&a.minus(&b, &f)), 15);
        // 11 * -4 = -44, which wraps to 20 at 6 bits
        assert_eq!(decode(&a.multiply(&b, &f)), 20);
        assert_eq!(decode(&b.negate(&f)), 4);
        assert_eq!(decode(&b.abs(&f)), 4);
        assert_eq!(decode(&a.signum(&f)), 1);
        assert_eq!(decode(&b.signum(&f)), -1);
        assert_eq!(decode(&Int::constant(&f, 0).signum(&f)), 0);
    }

    #[test]
    fn division_truncates_toward_zero() {
        let f = factory();
        let cases = [(7, 2), (-7, 2), (7, -2), (-7, -2), (6, 3), (5, 5), (0, 3)];
        for (a, b) in cases {
            let ia = Int::constant(&f, a);
            let ib = Int::constant(&f, b);
            let (q, r) = ia.divmod(&ib, &f);
            assert_eq!(decode(&q), a / b, "{} / {}", a, b);
            assert_eq!(decode(&r), a % b, "{} % {}", a, b);
        }
    }

    #[test]
    fn division_by_zero_is_defined() {
        let f = factory();
        let a = Int::constant(&f, 9);
        let zero = Int::constant(&f, 0);
        let (q, r) = a.divmod(&zero, &f);
        assert_eq!(decode(&q), 0);
        assert_eq!(decode(&r), 9);
    }

    #[test]
    fn bitwise_and_shifts() {
        let f = factory();
        let a = Int::constant(&f, 0b1101);
        let b = Int::constant(&f, 0b1011);
        assert_eq!(decode(&a.bit_and(&b, &f)), 0b1001);
        assert_eq!(decode(&a.bit_or(&b, &f)), 0b1111);
        assert_eq!(decode(&a.bit_xor(&b, &f)), 0b0110);

        let two = Int::constant(&f, 2);
        // 13 << 2 = 52, which wraps to -12 at 6 bits
        assert_eq!(decode(&a.shl(&two, &f)), -12);
        assert_eq!(decode(&a.shr(&two, &f)), 0b11);

        let minus8 = Int::constant(&f, -8);
        assert_eq!(decode(&minus8.shr(&two, &f)), 0b1110);
        assert_eq!(decode(&minus8.sha(&two, &f)), -2);

        let large = Int::constant(&f, 9);
        assert_eq!(decode(&a.shl(&large, &f)), 0);
    }

    #[test]
    fn comparisons() {
        let f = factory();
        let cases = [(-5, 3), (3, -5), (4, 4), (-2, -7), (0, 0), (31, -32)];
        for (a, b) in cases {
            let ia = Int::constant(&f, a);
            let ib = Int::constant(&f, b);
            assert_eq!(ia.equals(&ib, &f).as_constant(), Some(a == b));
            assert_eq!(ia.lt(&ib, &f).as_constant(), Some(a < b), "{} < {}", a, b);
            assert_eq!(ia.lte(&ib, &f).as_constant(), Some(a <= b));
            assert_eq!(ia.gt(&ib, &f).as_constant(), Some(a > b));
            assert_eq!(ia.gte(&ib, &f).as_constant(), Some(a >= b));
        }
    }

    #[test]
    fn count_sums_bits() {
        let f = factory();
        let bits = vec![
            BoolValue::True,
            BoolValue::False,
            BoolValue::True,
            BoolValue::True,
        ];
        assert_eq!(decode(&Int::count(&f, bits)), 3);
    }

    #[test]
    fn count_of_variables_is_symbolic() {
        let f = factory();
        let counted = Int::count(&f, vec![f.variable(1), f.variable(2)]);
        let two = Int::constant(&f, 2);
        let both = counted.equals(&two, &f);
        assert!(!both.is_constant());
    }
}
