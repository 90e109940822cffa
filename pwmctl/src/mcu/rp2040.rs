use super::TimerUnit;
use crate::util::warn;
use embassy_rp::Peri;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::pwm::{self, ChannelAPin, Pwm, Slice};

/// A PWM slice of the RP2040 driving its A output.
///
/// The slice is configured with [`SolverConfig::RP2040`](crate::solver::SolverConfig::RP2040)
/// in mind: the divider is an integer up to 255 and the slice counts up from zero to the period.
/// While disabled the pin is released from the slice and driven low through the SIO.
pub struct SliceTimer<S: Slice, P: ChannelAPin<S>> {
    name: &'static str,
    slice: Peri<'static, S>,
    pin: Peri<'static, P>,
    config: pwm::Config,
    pwm: Option<Pwm<'static>>,
    low: Option<Output<'static>>,
}

impl<S: Slice, P: ChannelAPin<S>> SliceTimer<S, P> {
    pub fn new(name: &'static str, slice: Peri<'static, S>, pin: Peri<'static, P>) -> Self {
        let mut timer = Self {
            name,
            slice,
            pin,
            config: pwm::Config::default(),
            pwm: None,
            low: None,
        };
        timer.disable();
        timer
    }
}

impl<S: Slice, P: ChannelAPin<S>> TimerUnit for SliceTimer<S, P> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn reset(&mut self) {
        self.config = pwm::Config::default();
        self.config.enable = false;
        if let Some(pwm) = &mut self.pwm {
            pwm.set_config(&self.config);
            pwm.set_counter(0);
        }
    }

    fn set_period(&mut self, period: u16) {
        self.config.top = period;
    }

    fn set_compare(&mut self, threshold: u16) {
        self.config.compare_a = threshold;
    }

    fn enable(&mut self, divider: u16) {
        let divider = u8::try_from(divider).unwrap_or_else(|_| {
            warn!("{}: divider {} is too large, using 255", self.name, divider);
            u8::MAX
        });
        self.config.divider = divider.into();
        self.config.invert_a = false;
        self.config.phase_correct = false;
        self.config.enable = true;
        match &mut self.pwm {
            Some(pwm) => pwm.set_config(&self.config),
            None => {
                // The pin has to be released by the SIO before the slice takes it over
                self.low = None;
                // SAFETY: `self` owns the slice and the pin, and the previous driver of the pin
                // has been dropped above
                let (slice, pin) =
                    unsafe { (self.slice.clone_unchecked(), self.pin.clone_unchecked()) };
                self.pwm = Some(Pwm::new_output_a(slice, pin, self.config.clone()));
            }
        }
    }

    fn disable(&mut self) {
        if let Some(mut pwm) = self.pwm.take() {
            self.config.enable = false;
            pwm.set_config(&self.config);
        }
        match &mut self.low {
            Some(output) => output.set_low(),
            None => {
                // SAFETY: `self` owns the pin and the slice has released it above
                let pin = unsafe { self.pin.clone_unchecked() };
                self.low = Some(Output::new(pin, Level::Low));
            }
        }
    }
}
