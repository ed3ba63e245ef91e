//! Turn signal, siren and light bar state machines
//!
//! All timing is in simulation ticks. Renderers read lamp states from
//! these types; nothing here affects physics.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Hold a steer input this long to start the signal (250 ms)
pub const SIGNAL_HOLD_TICKS: u64 = 15;
/// Second tap within this window starts the signal (500 ms)
pub const SIGNAL_DOUBLE_TAP_TICKS: u64 = 30;
/// Released signals cancel after this long (1.5 s)
pub const SIGNAL_AUTO_CANCEL_TICKS: u64 = 90;
/// Blink half-period (350 ms)
pub const SIGNAL_BLINK_TICKS: u64 = 21;
/// Light bar advances one phase per this many ticks (50 ms)
pub const LIGHT_BAR_PHASE_TICKS: u64 = 3;
pub const LIGHT_BAR_PHASES: u64 = 12;
/// Upper bound of the random siren follow delay (300 ms)
pub const SIREN_MAX_DELAY_TICKS: u64 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

/// Turn signal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignalState {
    #[default]
    Off,
    /// Steer held on `side` since tick `since`, not long enough yet
    Pending { side: Side, since: u64 },
    /// Blinking since tick `since`
    Blinking { side: Side, since: u64 },
}

/// Turn signals driven by steering input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnSignals {
    pub state: SignalState,
    /// Tick of the most recent press start per side
    last_tap: [Option<u64>; 2],
    /// Side held on the previous update
    held: Option<Side>,
}

impl TurnSignals {
    /// Advance with the side currently steered toward (if any)
    pub fn update(&mut self, held: Option<Side>, now: u64) {
        let pressed = held.filter(|side| self.held != Some(*side));
        self.held = held;

        if let Some(side) = pressed {
            let double_tap = self.last_tap[side.index()]
                .is_some_and(|t| now.saturating_sub(t) < SIGNAL_DOUBLE_TAP_TICKS);
            self.last_tap[side.index()] = Some(now);

            self.state = match self.state {
                _ if double_tap => SignalState::Blinking { side, since: now },
                SignalState::Blinking { side: s, since } if s == side => {
                    SignalState::Blinking { side, since }
                }
                _ => SignalState::Pending { side, since: now },
            };
        }

        self.state = match self.state {
            SignalState::Pending { side, since } if held == Some(side) => {
                if now.saturating_sub(since) >= SIGNAL_HOLD_TICKS {
                    SignalState::Blinking { side, since: now }
                } else {
                    SignalState::Pending { side, since }
                }
            }
            // Released before the hold threshold: just a tap
            SignalState::Pending { .. } => SignalState::Off,
            SignalState::Blinking { side, since }
                if held != Some(side)
                    && now.saturating_sub(since) >= SIGNAL_AUTO_CANCEL_TICKS =>
            {
                SignalState::Off
            }
            other => other,
        };
    }

    /// Whether the lamp on `side` is lit this tick
    pub fn lamp_on(&self, side: Side, now: u64) -> bool {
        match self.state {
            SignalState::Blinking { side: s, since } if s == side => {
                (now.saturating_sub(since) / SIGNAL_BLINK_TICKS) % 2 == 0
            }
            _ => false,
        }
    }

    pub fn active_side(&self) -> Option<Side> {
        match self.state {
            SignalState::Blinking { side, .. } => Some(side),
            _ => None,
        }
    }
}

/// Siren state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Siren {
    #[default]
    Off,
    /// Turning on at tick `at`
    Pending { at: u64 },
    On,
}

impl Siren {
    pub fn is_on(&self) -> bool {
        matches!(self, Siren::On)
    }

    /// Direct switch (player control)
    pub fn set(&mut self, on: bool) {
        *self = if on { Siren::On } else { Siren::Off };
    }

    /// Mirror a followed car's siren after a random short delay
    pub fn follow<R: Rng>(&mut self, target_on: bool, now: u64, rng: &mut R) {
        *self = match (*self, target_on) {
            (Siren::Off, true) => {
                let delay = rng.random_range(0..=SIREN_MAX_DELAY_TICKS);
                if delay == 0 {
                    Siren::On
                } else {
                    Siren::Pending { at: now + delay }
                }
            }
            (Siren::Pending { at }, true) if now >= at => Siren::On,
            (_, false) => Siren::Off,
            (state, true) => state,
        };
    }
}

/// Light bar lamps for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LightBarLamps {
    pub red: bool,
    pub blue: bool,
}

/// Red/blue flash pattern with a per-car phase offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightBar {
    pub phase_offset: u64,
}

impl LightBar {
    pub fn new(phase_offset: u64) -> Self {
        Self {
            phase_offset: phase_offset % LIGHT_BAR_PHASES,
        }
    }

    pub fn lamps(&self, now: u64) -> LightBarLamps {
        let phase = (now / LIGHT_BAR_PHASE_TICKS + self.phase_offset) % LIGHT_BAR_PHASES;
        LightBarLamps {
            red: phase < 2 || (3..5).contains(&phase),
            blue: (6..8).contains(&phase) || (9..11).contains(&phase),
        }
    }
}
