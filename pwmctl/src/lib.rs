//! A three-channel programmable PWM generator.
//!
//! Each channel owns one hardware timer unit and produces a square wave of configurable frequency
//! and duty cycle. The channels are controlled at runtime by a line based text protocol:
//!
//! ```text
//! FA20000   set the frequency of channel A to 20 kHz
//! DA50      set the duty cycle of channel A to 50 %
//! FB0       stop channel B
//! ```
//!
//! The [`Controller`] ties everything together: it polls a [`Transport`](serial::Transport) for
//! lines, parses them with [`protocol::parse_line`] and drives the [`Channel`]s, which in turn use
//! [`solver::solve`] and [`duty::quantize`] to program their [`TimerUnit`](mcu::TimerUnit).
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![no_std]

#[cfg(test)]
extern crate std;

pub mod channel;
pub mod controller;
pub mod duty;
pub mod mcu;
pub mod protocol;
pub mod serial;
pub mod solver;
pub mod util;

pub use channel::{Channel, ChannelState, Waveform};
pub use controller::{Config, Controller, Outcome};

use core::fmt;

/// Identifies one of the three PWM channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelId {
    A,
    B,
    C,
}

impl ChannelId {
    pub const ALL: [ChannelId; 3] = [ChannelId::A, ChannelId::B, ChannelId::C];

    /// Returns the channel for the (case-insensitive) letter used in the command protocol.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            _ => None,
        }
    }

    /// The position of the channel in [`ChannelId::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}
