//! Special effects and presets built on top of [`BrightPi`].

use crate::bus::RegisterBus;
use crate::controller::{BrightPi, LedControl, Status};
use crate::led::{Led, LedGroup, LedSet, LedState};
use crate::registers::{DEFAULT_DIM, DEFAULT_GAIN, MAX_GAIN, PRESET_DIM};
use crate::{Error, Result};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Light effects that run as a sequence of on/off frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Every LED on, then every LED off.
    Flash,
    /// A single white LED sweeping back and forth.
    NightRider,
    /// White LEDs 1 and 3 alternating with 2 and 4.
    Alternate,
}

/// One step of an effect: the LEDs lit and how long they stay lit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub leds: LedSet,
    pub hold: Duration,
}

impl Effect {
    /// Expands the effect into frames.
    ///
    /// Every frame is held for `period`.
    pub fn frames(&self, repetitions: u32, period: Duration) -> Result<Vec<Frame>> {
        if repetitions == 0 {
            return Err(Error::InvalidArgument(
                "effect needs at least one repetition".to_string(),
            ));
        }

        let cycle = self.cycle()?;
        let frames = (0..repetitions)
            .flat_map(|_| cycle.iter().copied())
            .map(|leds| Frame { leds, hold: period })
            .collect();
        Ok(frames)
    }

    fn cycle(&self) -> Result<Vec<LedSet>> {
        let white = |numbers: &[u8]| -> Result<LedSet> {
            numbers
                .iter()
                .try_fold(LedSet::EMPTY, |set, &n| Ok(set.with(Led::new(n)?)))
        };

        Ok(match self {
            Effect::Flash => vec![LedGroup::All.into(), LedSet::EMPTY],
            Effect::NightRider => [1, 2, 3, 4, 3, 2]
                .iter()
                .map(|&n| white(&[n]))
                .collect::<Result<Vec<_>>>()?,
            Effect::Alternate => vec![white(&[1, 3])?, white(&[2, 4])?],
        })
    }
}

impl FromStr for Effect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "flash" => Ok(Effect::Flash),
            "night-rider" | "night_rider" | "nightrider" => Ok(Effect::NightRider),
            "alternate" => Ok(Effect::Alternate),
            _ => Err(Error::InvalidArgument(format!("unknown effect: {}", s))),
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Flash => write!(f, "flash"),
            Effect::NightRider => write!(f, "night-rider"),
            Effect::Alternate => write!(f, "alternate"),
        }
    }
}

/// Bright Pi controller with presets and effects.
pub struct SpecialEffects<B> {
    pi: BrightPi<B>,
    last_effect: Option<Effect>,
    saved: Option<LedSet>,
}

impl<B: RegisterBus> SpecialEffects<B> {
    /// Creates a controller assuming the board is in its power-on state.
    pub fn new(bus: B) -> Self {
        Self::from_controller(BrightPi::new(bus))
    }

    /// Creates a controller and loads the current register values from the board.
    pub fn from_device(bus: B) -> Result<Self> {
        Ok(Self::from_controller(BrightPi::from_device(bus)?))
    }

    /// Wraps an existing controller.
    pub fn from_controller(pi: BrightPi<B>) -> Self {
        Self {
            pi,
            last_effect: None,
            saved: None,
        }
    }

    /// Returns the wrapped controller.
    pub fn controller(&self) -> &BrightPi<B> {
        &self.pi
    }

    /// Returns the wrapped controller mutably.
    pub fn controller_mut(&mut self) -> &mut BrightPi<B> {
        &mut self.pi
    }

    /// Consumes the wrapper and returns the controller.
    pub fn into_controller(self) -> BrightPi<B> {
        self.pi
    }

    /// Restores the default state: every LED off, full dim level, default gain.
    ///
    /// Stops at the first failed write; registers written before it keep
    /// their default value.
    pub fn reset(&mut self) -> Result<()> {
        self.pi.show(LedSet::EMPTY)?;
        self.pi.set_led_dim(LedGroup::All, DEFAULT_DIM)?;
        self.pi.set_gain(DEFAULT_GAIN)?;
        info!("Bright Pi reset to defaults");
        Ok(())
    }

    /// Lights exactly `group` at maximum gain with the preset dim level.
    pub fn illuminate(&mut self, group: LedGroup) -> Result<()> {
        self.pi.show(group.into())?;
        self.pi.set_gain(MAX_GAIN)?;
        self.pi.set_led_dim(group, PRESET_DIM)?;
        info!("Illuminating {} LEDs", group);
        Ok(())
    }

    /// Switches every LED off.
    pub fn all_off(&mut self) -> Result<()> {
        self.pi.show(LedSet::EMPTY)?;
        info!("All LEDs off");
        Ok(())
    }

    /// Switches the given LEDs on or off, leaving the others untouched.
    pub fn set_led_on_off(&mut self, leds: impl Into<LedSet>, state: LedState) -> Result<()> {
        self.pi.set_led_on_off(leds, state)
    }

    /// Sets the global gain (0-15).
    pub fn set_gain(&mut self, level: u8) -> Result<()> {
        self.pi.set_gain(level)
    }

    /// Sets the dim level (0-63) of the given LEDs.
    pub fn set_led_dim(&mut self, leds: impl Into<LedSet>, level: u8) -> Result<()> {
        self.pi.set_led_dim(leds, level)
    }

    /// Returns a snapshot of the tracked state.
    pub fn status(&self) -> Status {
        self.pi.status()
    }

    /// Returns the last effect started, if any.
    pub fn last_effect(&self) -> Option<Effect> {
        self.last_effect
    }

    /// Remembers the lit LEDs so [`finish_effect`](Self::finish_effect) can restore them.
    pub fn start_effect(&mut self, effect: Effect) {
        self.saved = Some(self.pi.lit());
        self.last_effect = Some(effect);
        debug!("Starting effect {}", effect);
    }

    /// Shows one frame. Pacing is up to the caller.
    pub fn show_frame(&mut self, frame: &Frame) -> Result<()> {
        self.pi.show(frame.leds)
    }

    /// Restores the LEDs that were lit before the effect started.
    pub fn finish_effect(&mut self) -> Result<()> {
        if let Some(saved) = self.saved.take() {
            self.pi.show(saved)?;
        }
        Ok(())
    }

    /// Runs an effect to completion on the current thread.
    pub fn play_blocking(
        &mut self,
        effect: Effect,
        repetitions: u32,
        period: Duration,
    ) -> Result<()> {
        let frames = effect.frames(repetitions, period)?;
        self.start_effect(effect);
        for frame in &frames {
            if let Err(e) = self.show_frame(frame) {
                self.saved = None;
                return Err(e);
            }
            std::thread::sleep(frame.hold);
        }
        self.finish_effect()?;
        info!("Effect {} played ({} frames)", effect, frames.len());
        Ok(())
    }
}

impl<B: RegisterBus> LedControl for SpecialEffects<B> {
    fn set_led_on_off(&mut self, leds: LedSet, state: LedState) -> Result<()> {
        self.pi.set_led_on_off(leds, state)
    }

    fn set_gain(&mut self, level: u8) -> Result<()> {
        self.pi.set_gain(level)
    }

    fn status_string(&self) -> String {
        self.to_string()
    }
}

impl<B: RegisterBus> std::fmt::Display for SpecialEffects<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bright Pi special effects: {} effect=", self.pi.status())?;
        match self.last_effect {
            Some(effect) => write!(f, "{}", effect),
            None => write!(f, "none"),
        }
    }
}
