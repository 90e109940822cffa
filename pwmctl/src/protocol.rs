//! The line based command protocol.
//!
//! Every command is a two letter prefix followed by a decimal number:
//!
//! | Prefix           | Meaning                                            |
//! |------------------|----------------------------------------------------|
//! | `FA`, `FB`, `FC` | Target frequency in Hz. Zero or less stops.        |
//! | `DA`, `DB`, `DC` | Target duty cycle in percent. Zero or less stops.  |
//!
//! The prefix is case-insensitive and the number may be preceded by whitespace, so `fa 20000` is
//! the same as `FA20000`.

use crate::ChannelId;
use crate::util::debug;
use core::fmt;

/// Lines shorter than this are ignored.
pub const MIN_LINE_LEN: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    Frequency(u32),
    Duty(f32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub channel: ChannelId,
    pub kind: CommandKind,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CommandKind::Frequency(frequency_hz) => write!(f, "F{}{}", self.channel, frequency_hz),
            CommandKind::Duty(duty_percent) => write!(f, "D{}{}", self.channel, duty_percent),
        }
    }
}

/// The line is long enough to carry a command but its prefix is not a known command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[display("unrecognized command {}{}", prefix[0], prefix[1])]
pub struct UnrecognizedCommand {
    pub prefix: [char; 2],
}

/// Parses one line without its terminator.
///
/// Returns `Ok(None)` for lines that are too short to hold a command. A value that is not a number
/// is read as zero.
///
/// ```
/// use pwmctl::ChannelId;
/// use pwmctl::protocol::{Command, CommandKind, parse_line};
///
/// assert_eq!(
///     parse_line("fa 20000"),
///     Ok(Some(Command {
///         channel: ChannelId::A,
///         kind: CommandKind::Frequency(20_000),
///     }))
/// );
/// assert_eq!(parse_line("DA"), Ok(None));
/// assert!(parse_line("ZZ99").is_err());
/// ```
pub fn parse_line(line: &str) -> Result<Option<Command>, UnrecognizedCommand> {
    if line.chars().count() < MIN_LINE_LEN {
        return Ok(None);
    }
    let mut chars = line.chars();
    let (Some(first), Some(second)) = (chars.next(), chars.next()) else {
        return Ok(None);
    };
    let value = chars.as_str();

    let prefix = [first.to_ascii_uppercase(), second.to_ascii_uppercase()];
    let channel = ChannelId::from_letter(prefix[1]).ok_or(UnrecognizedCommand { prefix })?;
    let kind = match prefix[0] {
        'F' => CommandKind::Frequency(frequency_from_value(parse_number(value))),
        'D' => CommandKind::Duty(parse_number(value) as f32),
        _ => return Err(UnrecognizedCommand { prefix }),
    };
    Ok(Some(Command { channel, kind }))
}

fn frequency_from_value(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        // Saturates for values above `u32::MAX`
        value as u32
    }
}

/// Parses the longest decimal number at the start of `text`, skipping leading whitespace.
///
/// Characters after the number are ignored. Text without a number gives zero.
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim_start();
    let number = &text[..numeric_prefix_len(text.as_bytes())];
    match number.parse() {
        Ok(value) => value,
        Err(_) => {
            debug!("No number in {:?}, using 0", text);
            0.0
        }
    }
}

/// Length of the longest prefix of the form `[+-]digits[.digits][(e|E)[+-]digits]` that contains
/// at least one digit in its mantissa.
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    fn digits(bytes: &[u8], start: usize) -> usize {
        bytes[start..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count()
    }

    let mut len = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        len += 1;
    }
    let integer_digits = digits(bytes, len);
    len += integer_digits;
    let mut fraction_digits = 0;
    if bytes.get(len) == Some(&b'.') {
        fraction_digits = digits(bytes, len + 1);
        if integer_digits > 0 || fraction_digits > 0 {
            len += 1 + fraction_digits;
        }
    }
    if integer_digits == 0 && fraction_digits == 0 {
        return 0;
    }
    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exponent_len = 1;
        if matches!(bytes.get(len + 1), Some(b'+' | b'-')) {
            exponent_len += 1;
        }
        let exponent_digits = digits(bytes, len + exponent_len);
        if exponent_digits > 0 {
            len += exponent_len + exponent_digits;
        }
    }
    len
}

#[cfg(test)]
mod test {
    use super::*;
    use std::format;
    use std::string::ToString;

    fn frequency(channel: ChannelId, frequency_hz: u32) -> Option<Command> {
        Some(Command {
            channel,
            kind: CommandKind::Frequency(frequency_hz),
        })
    }

    fn duty(channel: ChannelId, duty_percent: f32) -> Option<Command> {
        Some(Command {
            channel,
            kind: CommandKind::Duty(duty_percent),
        })
    }

    #[test]
    fn test_all_prefixes() {
        assert_eq!(parse_line("FA20000"), Ok(frequency(ChannelId::A, 20_000)));
        assert_eq!(parse_line("FB1"), Ok(frequency(ChannelId::B, 1)));
        assert_eq!(parse_line("FC440"), Ok(frequency(ChannelId::C, 440)));
        assert_eq!(parse_line("DA50"), Ok(duty(ChannelId::A, 50.0)));
        assert_eq!(parse_line("DB12.5"), Ok(duty(ChannelId::B, 12.5)));
        assert_eq!(parse_line("DC100"), Ok(duty(ChannelId::C, 100.0)));
    }

    #[test]
    fn test_case_and_whitespace() {
        assert_eq!(parse_line("fa20000"), Ok(frequency(ChannelId::A, 20_000)));
        assert_eq!(parse_line("dB 33"), Ok(duty(ChannelId::B, 33.0)));
        assert_eq!(parse_line("FC \t 1000"), Ok(frequency(ChannelId::C, 1_000)));
    }

    #[test]
    fn test_short_lines_are_ignored() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("F"), Ok(None));
        assert_eq!(parse_line("FA"), Ok(None));
        assert_eq!(parse_line("ZZ"), Ok(None));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(
            parse_line("ZZ99"),
            Err(UnrecognizedCommand { prefix: ['Z', 'Z'] })
        );
        assert_eq!(
            parse_line("fd10"),
            Err(UnrecognizedCommand { prefix: ['F', 'D'] })
        );
        assert_eq!(
            parse_line("AF10"),
            Err(UnrecognizedCommand { prefix: ['A', 'F'] })
        );
        assert_eq!(
            parse_line("XA10"),
            Err(UnrecognizedCommand { prefix: ['X', 'A'] })
        );
    }

    #[test]
    fn test_malformed_numbers_are_zero() {
        assert_eq!(parse_line("FAabc"), Ok(frequency(ChannelId::A, 0)));
        assert_eq!(parse_line("DA  "), Ok(duty(ChannelId::A, 0.0)));
        assert_eq!(parse_line("DA."), Ok(duty(ChannelId::A, 0.0)));
        assert_eq!(parse_line("DA-"), Ok(duty(ChannelId::A, 0.0)));
    }

    #[test]
    fn test_trailing_text_is_ignored() {
        assert_eq!(parse_line("FA1000Hz"), Ok(frequency(ChannelId::A, 1_000)));
        assert_eq!(parse_line("DA50%"), Ok(duty(ChannelId::A, 50.0)));
        assert_eq!(parse_line("DA1.5.5"), Ok(duty(ChannelId::A, 1.5)));
        assert_eq!(parse_line("FA2e"), Ok(frequency(ChannelId::A, 2)));
    }

    #[test]
    fn test_frequency_coercion() {
        assert_eq!(parse_line("FA-5"), Ok(frequency(ChannelId::A, 0)));
        assert_eq!(parse_line("FA0.9"), Ok(frequency(ChannelId::A, 0)));
        assert_eq!(parse_line("FA1500.7"), Ok(frequency(ChannelId::A, 1_500)));
        assert_eq!(parse_line("FA2e4"), Ok(frequency(ChannelId::A, 20_000)));
        assert_eq!(parse_line("FA1e12"), Ok(frequency(ChannelId::A, u32::MAX)));
    }

    #[test]
    fn test_duty_is_not_clamped() {
        assert_eq!(parse_line("DA150"), Ok(duty(ChannelId::A, 150.0)));
        assert_eq!(parse_line("DA-20"), Ok(duty(ChannelId::A, -20.0)));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number("  +7.25x"), 7.25);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("5."), 5.0);
        assert_eq!(parse_number("-1.5E+2"), -150.0);
        assert_eq!(parse_number("1e-1"), 0.1);
        assert_eq!(parse_number("e5"), 0.0);
        assert_eq!(parse_number(""), 0.0);
    }

    #[test]
    fn test_display_round_trip() {
        for channel in ChannelId::ALL {
            for frequency_hz in [1, 50, 20_000, 8_000_000, u32::MAX] {
                let command = frequency(channel, frequency_hz).unwrap();
                assert_eq!(parse_line(&command.to_string()), Ok(Some(command)));
            }
            for duty_percent in [0.5, 12.5, 33.3, 50.0, 99.99, 100.0] {
                let command = duty(channel, duty_percent).unwrap();
                assert_eq!(parse_line(&command.to_string()), Ok(Some(command)));
            }
        }
        assert_eq!(frequency(ChannelId::B, 440).unwrap().to_string(), "FB440");
        assert_eq!(duty(ChannelId::C, 12.5).unwrap().to_string(), "DC12.5");
        assert_eq!(format!("{}", duty(ChannelId::A, 50.0).unwrap()), "DA50");
    }
}
