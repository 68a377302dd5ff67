//! LED identifiers, groups and on/off states.

use crate::registers::{IR_MASK, LED_BITS, LED_COUNT, WHITE_MASK};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// On/off state of an LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedState {
    On,
    #[default]
    Off,
}

impl LedState {
    /// Returns true for `On`.
    pub fn is_on(&self) -> bool {
        matches!(self, LedState::On)
    }
}

impl From<bool> for LedState {
    fn from(on: bool) -> Self {
        if on {
            LedState::On
        } else {
            LedState::Off
        }
    }
}

impl FromStr for LedState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "on" | "1" | "true" => Ok(LedState::On),
            "off" | "0" | "false" => Ok(LedState::Off),
            _ => Err(Error::InvalidArgument(format!("unknown LED state: {}", s))),
        }
    }
}

impl std::fmt::Display for LedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedState::On => write!(f, "ON"),
            LedState::Off => write!(f, "OFF"),
        }
    }
}

/// A physical LED bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedGroup {
    /// Visible white LEDs (1-4).
    White,
    /// Infrared LEDs (5-8).
    Ir,
    /// Every LED on the board.
    All,
}

impl LedGroup {
    /// Returns the on/off register mask for this group.
    pub fn mask(&self) -> u8 {
        match self {
            LedGroup::White => WHITE_MASK,
            LedGroup::Ir => IR_MASK,
            LedGroup::All => WHITE_MASK | IR_MASK,
        }
    }

    /// Returns the LEDs in this group.
    pub fn leds(&self) -> LedSet {
        LedSet::from(*self)
    }
}

impl FromStr for LedGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "white" => Ok(LedGroup::White),
            "ir" | "infrared" => Ok(LedGroup::Ir),
            "all" => Ok(LedGroup::All),
            _ => Err(Error::InvalidArgument(format!("unknown LED group: {}", s))),
        }
    }
}

impl std::fmt::Display for LedGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedGroup::White => write!(f, "white"),
            LedGroup::Ir => write!(f, "ir"),
            LedGroup::All => write!(f, "all"),
        }
    }
}

/// A single LED, numbered 1-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Led(u8);

impl Led {
    /// Creates an LED from its board number.
    pub fn new(number: u8) -> Result<Self> {
        if !(1..=LED_COUNT as u8).contains(&number) {
            return Err(Error::InvalidArgument(format!(
                "unknown LED: {} (must be 1-{})",
                number, LED_COUNT
            )));
        }
        Ok(Led(number))
    }

    /// Iterates over all LEDs in board order.
    pub fn all() -> impl Iterator<Item = Led> {
        (1..=LED_COUNT as u8).map(Led)
    }

    /// Returns the board number (1-8).
    pub fn number(&self) -> u8 {
        self.0
    }

    /// Returns the bit of this LED in the on/off register.
    pub fn bit(&self) -> u8 {
        LED_BITS[self.index()]
    }

    /// Returns the group this LED belongs to.
    pub fn group(&self) -> LedGroup {
        if self.0 <= 4 {
            LedGroup::White
        } else {
            LedGroup::Ir
        }
    }

    pub(crate) fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl std::fmt::Display for Led {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LED {}", self.0)
    }
}

/// A set of LEDs, stored as an on/off register mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedSet(u8);

impl LedSet {
    /// The empty set.
    pub const EMPTY: LedSet = LedSet(0);

    /// Creates a set from a raw on/off register mask.
    pub fn from_mask(mask: u8) -> Self {
        LedSet(mask)
    }

    /// Returns the on/off register mask.
    pub fn mask(&self) -> u8 {
        self.0
    }

    /// Returns true if no LED is selected.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if `led` is in the set.
    pub fn contains(&self, led: Led) -> bool {
        self.0 & (1 << led.bit()) != 0
    }

    /// Returns this set with `led` added.
    pub fn with(self, led: Led) -> Self {
        LedSet(self.0 | (1 << led.bit()))
    }

    /// Iterates over the LEDs in board order.
    pub fn iter(&self) -> impl Iterator<Item = Led> + '_ {
        Led::all().filter(move |led| self.contains(*led))
    }

    /// Returns the number of LEDs in the set.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }
}

impl From<Led> for LedSet {
    fn from(led: Led) -> Self {
        LedSet::EMPTY.with(led)
    }
}

impl From<LedGroup> for LedSet {
    fn from(group: LedGroup) -> Self {
        LedSet(group.mask())
    }
}

impl std::ops::BitOr for LedSet {
    type Output = LedSet;

    fn bitor(self, rhs: LedSet) -> LedSet {
        LedSet(self.0 | rhs.0)
    }
}

impl FromStr for LedSet {
    type Err = Error;

    /// Parses a group name (`white`, `ir`, `all`) or a comma-separated list
    /// of LED numbers such as `1,2,7`.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(group) = s.parse::<LedGroup>() {
            return Ok(group.into());
        }

        let mut set = LedSet::EMPTY;
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let number: u8 = part
                .parse()
                .map_err(|_| Error::InvalidArgument(format!("unknown LED: {}", part)))?;
            set = set.with(Led::new(number)?);
        }

        if set.is_empty() {
            return Err(Error::InvalidArgument(format!("no LEDs selected: {:?}", s)));
        }
        Ok(set)
    }
}

impl std::fmt::Display for LedSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for group in [LedGroup::All, LedGroup::White, LedGroup::Ir] {
            if self.0 == group.mask() {
                return write!(f, "{}", group);
            }
        }
        let numbers: Vec<String> = self.iter().map(|led| led.number().to_string()).collect();
        write!(f, "{}", numbers.join(","))
    }
}
