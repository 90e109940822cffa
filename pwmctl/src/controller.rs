use crate::ChannelId;
use crate::channel::{Channel, ChannelState};
use crate::mcu::TimerUnit;
use crate::protocol::{self, Command, CommandKind, UnrecognizedCommand};
use crate::serial::{Line, Transport};
use crate::solver::{OutOfRange, SolverConfig};
use crate::util::{error, info, warn};
use core::fmt::Write;
use embassy_time::Duration;

/// Written once when the controller starts.
pub const BANNER: &str =
    "PWM ready. Send FAxxxx, FBxxxx, FCxxxx, DAxx, DBxx, DCxx (terminate with \\n).";

/// Written when a line starts with an unknown command.
pub const UNRECOGNIZED_COMMAND: &str = "Unrecognized command. Use FA/FB/FC or DA/DB/DC.";

#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// The clock and dividers of the timer units.
    pub solver: SolverConfig,
    /// The frequency the channels start with once a duty cycle is set.
    pub startup_frequency_hz: u32,
    /// How long a single poll waits for a complete line.
    pub read_timeout: Duration,
    pub banner: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            startup_frequency_hz: 20_000,
            read_timeout: Duration::from_millis(10),
            banner: BANNER,
        }
    }
}

/// What a single [`Controller::poll`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// No complete line arrived in time.
    Idle,
    /// The line was too short to hold a command.
    Ignored,
    /// The line did not start with a known command. A diagnostic was written.
    Unrecognized(UnrecognizedCommand),
    /// The command was applied to the channel.
    Applied {
        channel: ChannelId,
        state: ChannelState,
    },
    /// The channel could not produce the frequency and kept its previous waveform. A diagnostic
    /// was written.
    OutOfRange {
        channel: ChannelId,
        error: OutOfRange,
    },
}

/// The control loop: reads commands from a [`Transport`] and drives three [`Channel`]s.
///
/// The timers of all channels have the same type. Use `&mut dyn TimerUnit` to combine
/// different timer types.
pub struct Controller<T, X> {
    channels: [Channel<T>; 3],
    transport: X,
    read_timeout: Duration,
    banner: &'static str,
}

impl<T: TimerUnit, X: Transport> Controller<T, X> {
    /// Creates the controller with all channels stopped.
    ///
    /// The timers are bound to the channels in the order A, B, C.
    pub fn new(config: Config, timers: [T; 3], transport: X) -> Self {
        let [a, b, c] = timers;
        let channel =
            |id, timer| Channel::new(id, timer, config.solver, config.startup_frequency_hz);
        Self {
            channels: [
                channel(ChannelId::A, a),
                channel(ChannelId::B, b),
                channel(ChannelId::C, c),
            ],
            transport,
            read_timeout: config.read_timeout,
            banner: config.banner,
        }
    }

    pub fn channel(&self, id: ChannelId) -> &Channel<T> {
        &self.channels[id.index()]
    }

    pub fn transport(&self) -> &X {
        &self.transport
    }

    /// Writes the banner.
    pub async fn start(&mut self) -> Result<(), X::Error> {
        info!("{}", self.banner);
        self.transport.write_line(self.banner).await
    }

    /// Runs the controller forever.
    pub async fn run(mut self) -> ! {
        if self.start().await.is_err() {
            error!("Failed to write the banner");
        }
        loop {
            if self.poll().await.is_err() {
                error!("Serial transport failed");
            }
        }
    }

    /// Handles at most one line, waiting no longer than the configured read timeout for it.
    pub async fn poll(&mut self) -> Result<Outcome, X::Error> {
        match self.transport.read_line(self.read_timeout).await? {
            Some(line) => self.handle_line(&line).await,
            None => Ok(Outcome::Idle),
        }
    }

    /// Parses and executes one line, writing diagnostics for commands that fail.
    pub async fn handle_line(&mut self, line: &str) -> Result<Outcome, X::Error> {
        let line = line.trim_end_matches(['\r', ' ', '\t']);
        let command = match protocol::parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Outcome::Ignored),
            Err(error) => {
                warn!("Unrecognized command {}{}", error.prefix[0], error.prefix[1]);
                self.transport.write_line(UNRECOGNIZED_COMMAND).await?;
                return Ok(Outcome::Unrecognized(error));
            }
        };

        let outcome = self.execute(command);
        if let Outcome::OutOfRange { channel, error } = outcome {
            warn!("Channel {}: {} Hz is out of range", channel, error.frequency_hz);
            let mut message = Line::new();
            // A message that does not fit is cut off by the capacity of the line
            let _ = write!(
                message,
                "{} ({}): frequency out of range.",
                self.channel(channel).timer_name(),
                channel
            );
            self.transport.write_line(&message).await?;
        }
        Ok(outcome)
    }

    /// Updates the target of the addressed channel and applies it.
    pub fn execute(&mut self, command: Command) -> Outcome {
        let channel = &mut self.channels[command.channel.index()];
        let result = match command.kind {
            CommandKind::Frequency(frequency_hz) => channel.set_frequency(frequency_hz),
            CommandKind::Duty(duty_percent) => channel.set_duty(duty_percent),
        };
        match result {
            Ok(state) => Outcome::Applied {
                channel: command.channel,
                state,
            },
            Err(error) => Outcome::OutOfRange {
                channel: command.channel,
                error,
            },
        }
    }
}
