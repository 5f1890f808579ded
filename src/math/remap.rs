/// Linearly maps `value` from `[from_min, from_max]` onto `[to_min, to_max]`.
///
/// A zero-width (or non-finite) input range maps every value to `to_min`,
/// so the result never carries NaN or infinity into a transform.
pub fn remap(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    let span = from_max - from_min;
    if span == 0.0 || !span.is_finite() || !value.is_finite() {
        return to_min;
    }

    let t = (value - from_min) / span;
    to_min + (to_max - to_min) * t
}

/// Same as [`remap`] but clamps the result to the output range.
///
/// The output range may be reversed (`to_min > to_max`).
pub fn remap_clamped(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    let mapped = remap(value, from_min, from_max, to_min, to_max);
    let (lo, hi) = if to_min <= to_max {
        (to_min, to_max)
    } else {
        (to_max, to_min)
    };
    mapped.clamp(lo, hi)
}

/// Clamp to `[0, 1]`, mapping NaN to `0`.
pub fn saturate(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
