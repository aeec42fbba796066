use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Angular speeds are carried in this type so that a network rebuilt from a
/// snapshot propagates bit-identical rotations.
pub type Fixed64 = I32F32;

/// Convert an f64 to Fixed64. Use only for initialization, never in propagation.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_round_trips_simple_values() {
        assert_eq!(fixed64_to_f64(f64_to_fixed64(1.5)), 1.5);
        assert_eq!(fixed64_to_f64(f64_to_fixed64(-0.25)), -0.25);
    }

    #[test]
    fn fixed64_negation_is_exact() {
        let a = f64_to_fixed64(1.0 / 3.0);
        assert_eq!(-(-a), a);
        assert_eq!(a + (-a), Fixed64::ZERO);
    }
}
