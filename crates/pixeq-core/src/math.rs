//! Scalar math shared by the shader emitter and the constant evaluator.

/// Exponentiation with a fixed edge-case table.
///
/// Differs from `powf` where the base is zero or negative:
/// * `0 ^ 0` is NaN, `0 ^ x` is `0` for `x > 0` and `+inf` for `x < 0`
/// * a negative base is only defined for integral exponents; the sign
///   follows the exponent's parity
///
/// The shader-side `powEx` in the prelude implements the same table.
pub fn pow_ex(base: f32, exponent: f32) -> f32 {
    if base == 0.0 {
        return if exponent == 0.0 {
            f32::NAN
        } else if exponent > 0.0 {
            0.0
        } else {
            f32::INFINITY
        };
    }

    if base > 0.0 {
        return base.powf(exponent);
    }

    // negative (or NaN) base
    if exponent.fract() != 0.0 {
        return f32::NAN;
    }
    let magnitude = (-base).powf(exponent);
    if is_odd(exponent) {
        -magnitude
    } else {
        magnitude
    }
}

fn is_odd(integral: f32) -> bool {
    (integral % 2.0).abs() == 1.0
}

/// Format a finite float as a locale-independent literal that round-trips.
///
/// Returns `None` for NaN and infinities, which have no literal form.
pub fn float_literal(value: f32) -> Option<String> {
    if value.is_finite() {
        Some(format!("{:?}", value))
    } else {
        None
    }
}
