#[cfg(feature = "rp2040")]
pub mod rp2040;

#[cfg(feature = "rp2040")]
pub use rp2040::SliceTimer;

/// A hardware counter/timer unit with one compare output bound to one pin.
///
/// A [`Channel`](crate::Channel) reconfigures its timer with the sequence
/// [`reset`](Self::reset), [`set_period`](Self::set_period), [`set_compare`](Self::set_compare),
/// [`enable`](Self::enable). Implementations must keep the counter from acting on the output
/// until [`enable`](Self::enable) is called, so the hardware never runs with a half applied
/// configuration.
pub trait TimerUnit {
    /// The name of the hardware timer, used in diagnostics (e.g. `"PWM0"`).
    fn name(&self) -> &'static str;

    /// Stops the counter and clears its count.
    fn reset(&mut self);

    /// Sets the value at which the counter wraps back to zero.
    fn set_period(&mut self, period: u16);

    /// Sets the counter value below which the output is driven high.
    fn set_compare(&mut self, threshold: u16);

    /// Starts counting at `base clock / divider` in periodic count-to-period mode with a
    /// non-inverted compare output.
    fn enable(&mut self, divider: u16);

    /// Stops counting, detaches the compare output and drives the pin low as a plain output.
    fn disable(&mut self);
}

impl<T: TimerUnit + ?Sized> TimerUnit for &mut T {
    fn name(&self) -> &'static str {
        T::name(self)
    }

    fn reset(&mut self) {
        T::reset(self)
    }

    fn set_period(&mut self, period: u16) {
        T::set_period(self, period)
    }

    fn set_compare(&mut self, threshold: u16) {
        T::set_compare(self, threshold)
    }

    fn enable(&mut self, divider: u16) {
        T::enable(self, divider)
    }

    fn disable(&mut self) {
        T::disable(self)
    }
}

#[cfg(test)]
pub use recording::{RecordingTimer, TimerOp};

#[cfg(test)]
mod recording {
    use super::TimerUnit;
    use arrayvec::ArrayVec;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum TimerOp {
        Reset,
        SetPeriod(u16),
        SetCompare(u16),
        Enable(u16),
        Disable,
    }

    /// A timer unit that records the operations performed on it instead of touching hardware.
    pub struct RecordingTimer {
        pub name: &'static str,
        pub ops: ArrayVec<TimerOp, 32>,
        pub period: u16,
        pub compare: u16,
        pub divider: Option<u16>,
        pub pin_low: bool,
    }

    impl RecordingTimer {
        pub const fn new(name: &'static str) -> Self {
            Self {
                name,
                ops: ArrayVec::new_const(),
                period: 0,
                compare: 0,
                divider: None,
                pin_low: false,
            }
        }

        pub fn is_counting(&self) -> bool {
            self.divider.is_some()
        }

        fn record(&mut self, op: TimerOp) {
            // Tests only look at the recent history
            if self.ops.try_push(op).is_err() {
                self.ops.remove(0);
                self.ops.push(op);
            }
        }
    }

    impl TimerUnit for RecordingTimer {
        fn name(&self) -> &'static str {
            self.name
        }

        fn reset(&mut self) {
            self.divider = None;
            self.record(TimerOp::Reset);
        }

        fn set_period(&mut self, period: u16) {
            self.period = period;
            self.record(TimerOp::SetPeriod(period));
        }

        fn set_compare(&mut self, threshold: u16) {
            self.compare = threshold;
            self.record(TimerOp::SetCompare(threshold));
        }

        fn enable(&mut self, divider: u16) {
            self.divider = Some(divider);
            self.pin_low = false;
            self.record(TimerOp::Enable(divider));
        }

        fn disable(&mut self) {
            self.divider = None;
            self.pin_low = true;
            self.record(TimerOp::Disable);
        }
    }
}
