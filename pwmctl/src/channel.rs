use crate::mcu::TimerUnit;
use crate::solver::{self, OutOfRange, SolverConfig};
use crate::util::debug;
use crate::{ChannelId, duty};

/// Whether a channel is producing a waveform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelState {
    /// The timer is disabled and the pin is driven low.
    Stopped,
    /// The timer generates a waveform autonomously.
    Running,
}

/// The configuration a running channel has written to its timer.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Waveform {
    pub frequency_hz: u32,
    pub duty_percent: f32,
    pub divider: u16,
    pub period: u16,
    pub threshold: u16,
    /// The frequency the timer produces, after truncation of the period.
    pub output_frequency_hz: u32,
    /// The duty cycle the timer produces, after quantization of the threshold.
    pub output_duty_percent: f32,
}

/// One PWM output, bound to a single timer unit for its whole life.
///
/// The channel stores a target frequency and duty cycle. A target frequency of zero or a duty cycle
/// that is not positive means that the channel is stopped.
pub struct Channel<T> {
    id: ChannelId,
    timer: T,
    solver: SolverConfig,
    frequency_hz: u32,
    duty_percent: f32,
    waveform: Option<Waveform>,
}

impl<T: TimerUnit> Channel<T> {
    /// Creates a stopped channel that starts with `frequency_hz` once its duty cycle is set.
    ///
    /// The timer is disabled immediately, so the pin is low from here on.
    pub fn new(id: ChannelId, timer: T, solver: SolverConfig, frequency_hz: u32) -> Self {
        let mut channel = Self {
            id,
            timer,
            solver,
            frequency_hz,
            duty_percent: 0.0,
            waveform: None,
        };
        channel.stop();
        channel
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// The name of the bound hardware timer.
    pub fn timer_name(&self) -> &'static str {
        self.timer.name()
    }

    /// The stored target frequency.
    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// The stored target duty cycle.
    pub fn duty_percent(&self) -> f32 {
        self.duty_percent
    }

    pub fn state(&self) -> ChannelState {
        match self.waveform {
            Some(_) => ChannelState::Running,
            None => ChannelState::Stopped,
        }
    }

    /// The last successfully applied configuration, or `None` while stopped.
    pub fn waveform(&self) -> Option<&Waveform> {
        self.waveform.as_ref()
    }

    /// Stores a new target frequency and applies it together with the stored duty cycle.
    ///
    /// The target is stored even if it can not be applied.
    pub fn set_frequency(&mut self, frequency_hz: u32) -> Result<ChannelState, OutOfRange> {
        self.frequency_hz = frequency_hz;
        self.apply(self.frequency_hz, self.duty_percent)
    }

    /// Stores a new target duty cycle and applies it together with the stored frequency.
    ///
    /// The target is stored even if it can not be applied.
    pub fn set_duty(&mut self, duty_percent: f32) -> Result<ChannelState, OutOfRange> {
        self.duty_percent = duty_percent;
        self.apply(self.frequency_hz, self.duty_percent)
    }

    /// Programs the timer for the given frequency and duty cycle.
    ///
    /// A frequency of zero or a duty cycle that is not positive stops the channel. If the frequency
    /// can not be produced the timer is not touched and the channel keeps its previous waveform.
    pub fn apply(
        &mut self,
        frequency_hz: u32,
        duty_percent: f32,
    ) -> Result<ChannelState, OutOfRange> {
        if frequency_hz == 0 || duty_percent.is_nan() || duty_percent <= 0.0 {
            self.stop();
            return Ok(ChannelState::Stopped);
        }

        let solution = solver::solve(&self.solver, frequency_hz)?;
        let threshold = duty::quantize(duty_percent, solution.period);

        self.timer.reset();
        self.timer.set_period(solution.period);
        self.timer.set_compare(threshold);
        self.timer.enable(solution.divider);

        let waveform = Waveform {
            frequency_hz,
            duty_percent,
            divider: solution.divider,
            period: solution.period,
            threshold,
            output_frequency_hz: solution.frequency_hz(&self.solver),
            output_duty_percent: duty::percent(threshold, solution.period),
        };
        debug!(
            "Channel {}: {} Hz at {} % (divider {}, period {}, threshold {})",
            self.id,
            waveform.output_frequency_hz,
            waveform.output_duty_percent,
            waveform.divider,
            waveform.period,
            waveform.threshold
        );
        self.waveform = Some(waveform);
        Ok(ChannelState::Running)
    }

    /// Disables the timer and drives the pin low. Can be called in any state.
    pub fn stop(&mut self) {
        self.timer.disable();
        if self.waveform.take().is_some() {
            debug!("Channel {}: stopped", self.id);
        }
    }
}
