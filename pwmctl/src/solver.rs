//! Selection of a clock divider and counter period for a requested output frequency.

/// Smallest period accepted by [`solve`].
pub const MIN_PERIOD: u16 = 1;

/// Largest period a 16-bit counter can hold.
pub const MAX_PERIOD: u16 = u16::MAX;

/// The clock a timer family counts from and the dividers it can apply to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SolverConfig {
    pub base_clock_hz: u32,
    /// Candidate dividers, tried in order. Put the smallest first to prefer timing resolution.
    pub dividers: &'static [u16],
}

impl SolverConfig {
    /// The 16-bit timers of the ATmega2560 at 16 MHz.
    pub const ATMEGA2560: Self = Self {
        base_clock_hz: 16_000_000,
        dividers: &[1, 8, 64, 256, 1024],
    };

    /// The PWM slices of the RP2040 at the default system clock of 125 MHz.
    ///
    /// Only integer dividers are used; the fractional part of the slice divider stays zero.
    pub const RP2040: Self = Self {
        base_clock_hz: 125_000_000,
        dividers: &[1, 2, 4, 8, 16, 32, 64, 128, 255],
    };
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::ATMEGA2560
    }
}

/// A divider and period that realize a requested frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Solution {
    pub divider: u16,
    pub period: u16,
}

impl Solution {
    /// The frequency the timer actually produces with this solution.
    ///
    /// Differs from the requested frequency by the truncation of the period.
    pub fn frequency_hz(&self, config: &SolverConfig) -> u32 {
        let ticks = u64::from(self.divider) * (u64::from(self.period) + 1);
        (u64::from(config.base_clock_hz) / ticks) as u32
    }
}

/// The requested frequency can not be produced by any of the candidate dividers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[display("frequency of {frequency_hz} Hz is out of range")]
pub struct OutOfRange {
    pub frequency_hz: u32,
}

/// Finds the first divider of `config` for which the period of `frequency_hz` fits the counter.
///
/// The period is `floor(base_clock / (divider * frequency)) - 1` and must lie in
/// [`MIN_PERIOD`]`..=`[`MAX_PERIOD`]. A frequency of zero is always out of range.
///
/// ```
/// use pwmctl::solver::{SolverConfig, solve};
///
/// let solution = solve(&SolverConfig::ATMEGA2560, 20_000).unwrap();
/// assert_eq!((solution.divider, solution.period), (1, 799));
/// ```
pub fn solve(config: &SolverConfig, frequency_hz: u32) -> Result<Solution, OutOfRange> {
    if frequency_hz == 0 {
        return Err(OutOfRange { frequency_hz });
    }
    config
        .dividers
        .iter()
        .find_map(|&divider| {
            let ticks = u64::from(config.base_clock_hz)
                / (u64::from(divider) * u64::from(frequency_hz));
            let period = ticks.checked_sub(1)?;
            if (u64::from(MIN_PERIOD)..=u64::from(MAX_PERIOD)).contains(&period) {
                Some(Solution {
                    divider,
                    period: period as u16,
                })
            } else {
                None
            }
        })
        .ok_or(OutOfRange { frequency_hz })
}
