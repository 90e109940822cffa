//! Conversion of duty cycle percentages to compare thresholds.

/// Returns the compare threshold that produces `duty_percent` with a counter wrapping at `period`.
///
/// The duty cycle is clamped to `0.0..=100.0`; NaN counts as zero. The threshold is
/// `duty / 100 * (period + 1)` rounded half up and limited to `period`, which gives an active-high
/// fraction of `threshold / (period + 1)`.
///
/// ```
/// use pwmctl::duty::quantize;
///
/// assert_eq!(quantize(50.0, 799), 400);
/// assert_eq!(quantize(100.0, 799), 799);
/// ```
pub fn quantize(duty_percent: f32, period: u16) -> u16 {
    let duty_percent = if duty_percent.is_nan() {
        0.0
    } else {
        duty_percent.clamp(0.0, 100.0)
    };
    let counts = duty_percent / 100.0 * (f32::from(period) + 1.0);
    // The value is non-negative, so truncation after adding a half rounds half up
    let threshold = (counts + 0.5) as u32;
    threshold.min(u32::from(period)) as u16
}

/// Returns the duty cycle in percent that `threshold` produces with a counter wrapping at
/// `period`.
pub fn percent(threshold: u16, period: u16) -> f32 {
    f32::from(threshold) * 100.0 / (f32::from(period) + 1.0)
}
