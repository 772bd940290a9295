use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Ledger amounts and efficiency multipliers use this type so that sums are
/// exact and independent of the order contributions were added in.
pub type Fixed64 = I32F32;

/// Settings and data-file values enter the ledger through here.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// For display and persisted settings only.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `None` on a zero divisor or overflow.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

/// Round towards positive infinity and return the integer part.
#[inline]
pub fn ceil_to_u32(v: Fixed64) -> u32 {
    let c: i64 = v.ceil().to_num();
    c.clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_output_converts_back_exactly() {
        // 20/h at a 1.5 multiplier.
        let amount = Fixed64::from_num(20) * f64_to_fixed64(1.5);
        assert_eq!(fixed64_to_f64(amount), 30.0);
    }

    #[test]
    fn zero_output_has_no_module_count() {
        let deficit = f64_to_fixed64(12.0);
        assert!(checked_div_64(deficit, Fixed64::ZERO).is_none());
        assert_eq!(checked_div_64(deficit, f64_to_fixed64(5.0)).map(ceil_to_u32), Some(3));
    }

    #[test]
    fn ceil_rounds_up_fractions() {
        assert_eq!(ceil_to_u32(f64_to_fixed64(2.01)), 3);
        assert_eq!(ceil_to_u32(f64_to_fixed64(3.0)), 3);
        assert_eq!(ceil_to_u32(f64_to_fixed64(-1.5)), 0);
    }

    #[test]
    fn addition_is_order_independent() {
        let values = [0.1, 0.7, 1.3, -2.2, 5.9].map(f64_to_fixed64);
        let forward = values.iter().fold(Fixed64::ZERO, |acc, v| acc + *v);
        let backward = values.iter().rev().fold(Fixed64::ZERO, |acc, v| acc + *v);
        assert_eq!(forward, backward);
    }
}
