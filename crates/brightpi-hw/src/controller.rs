//! Bright Pi device controller.

use crate::bus::RegisterBus;
use crate::led::{Led, LedGroup, LedSet, LedState};
use crate::registers::{
    dim_register, DEFAULT_GAIN, GAIN_REGISTER, LED_COUNT, MAX_DIM, MAX_GAIN, ON_OFF_REGISTER,
};
use crate::{Error, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Aggregate on/off state of an LED group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupState {
    On,
    Off,
    /// Some LEDs of the group are on, some off.
    Mixed,
}

impl std::fmt::Display for GroupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupState::On => write!(f, "ON"),
            GroupState::Off => write!(f, "OFF"),
            GroupState::Mixed => write!(f, "MIXED"),
        }
    }
}

/// State of one LED in a [`Status`] snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedStatus {
    pub number: u8,
    pub group: LedGroup,
    pub state: LedState,
    pub dim: u8,
}

/// Snapshot of the tracked register state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub white: GroupState,
    pub ir: GroupState,
    pub gain: u8,
    pub leds: Vec<LedStatus>,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims: Vec<String> = self.leds.iter().map(|l| l.dim.to_string()).collect();
        write!(
            f,
            "white={} ir={} gain={} dim=[{}]",
            self.white,
            self.ir,
            self.gain,
            dims.join(",")
        )
    }
}

/// Last written register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegisterState {
    on_off: u8,
    /// Indexed by LED number - 1.
    dim: [u8; LED_COUNT],
    gain: u8,
}

impl RegisterState {
    fn power_on() -> Self {
        Self {
            on_off: 0,
            dim: [0; LED_COUNT],
            gain: DEFAULT_GAIN,
        }
    }
}

/// Basic LED control shared by every controller flavour.
pub trait LedControl {
    /// Switches the given LEDs on or off, leaving the others untouched.
    fn set_led_on_off(&mut self, leds: LedSet, state: LedState) -> Result<()>;

    /// Sets the global gain.
    fn set_gain(&mut self, level: u8) -> Result<()>;

    /// Human-readable snapshot of the current state.
    fn status_string(&self) -> String;
}

/// Controller for one Bright Pi board.
///
/// Tracks the value of every register it writes; reads go to the tracked
/// state, not the bus, unless [`BrightPi::refresh`] is called.
pub struct BrightPi<B> {
    bus: B,
    state: RegisterState,
}

impl<B: RegisterBus> BrightPi<B> {
    /// Creates a controller assuming the board is in its power-on state.
    ///
    /// Nothing is written to the bus.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            state: RegisterState::power_on(),
        }
    }

    /// Creates a controller and loads the current register values from the board.
    pub fn from_device(bus: B) -> Result<Self> {
        let mut controller = Self::new(bus);
        controller.refresh()?;
        Ok(controller)
    }

    /// Re-reads every register from the board.
    ///
    /// Fails with `OutOfRange` if a dim or gain register holds a value the
    /// driver does not accept; the tracked state is left unchanged then.
    pub fn refresh(&mut self) -> Result<()> {
        let on_off = self.bus.read_register(ON_OFF_REGISTER)?;
        let mut dim = [0u8; LED_COUNT];
        for led in Led::all() {
            let level = self.bus.read_register(dim_register(led.bit()))?;
            dim[led.index()] = check_range("dim", level, MAX_DIM)?;
        }
        let gain = check_range("gain", self.bus.read_register(GAIN_REGISTER)?, MAX_GAIN)?;

        self.state = RegisterState { on_off, dim, gain };
        debug!("Refreshed state from device: {}", self.status());
        Ok(())
    }

    /// Switches the given LEDs on or off, leaving the others untouched.
    pub fn set_led_on_off(&mut self, leds: impl Into<LedSet>, state: LedState) -> Result<()> {
        let leds = leds.into();
        if leds.is_empty() {
            return Err(Error::InvalidArgument("no LEDs selected".to_string()));
        }

        let mask = match state {
            LedState::On => self.state.on_off | leds.mask(),
            LedState::Off => self.state.on_off & !leds.mask(),
        };
        self.write_on_off(mask)?;
        info!("LEDs {} set {}", leds, state);
        Ok(())
    }

    /// Turns exactly `leds` on and every other LED off.
    pub fn show(&mut self, leds: LedSet) -> Result<()> {
        self.write_on_off(leds.mask())
    }

    /// Sets the global gain (0-15).
    pub fn set_gain(&mut self, level: u8) -> Result<()> {
        check_range("gain", level, MAX_GAIN)?;
        self.bus.write_register(GAIN_REGISTER, level)?;
        self.state.gain = level;
        info!("Gain set to {}", level);
        Ok(())
    }

    /// Sets the dim level (0-63) of the given LEDs.
    ///
    /// Registers are written one LED at a time; on failure the LEDs already
    /// written keep their new level.
    pub fn set_led_dim(&mut self, leds: impl Into<LedSet>, level: u8) -> Result<()> {
        let leds = leds.into();
        if leds.is_empty() {
            return Err(Error::InvalidArgument("no LEDs selected".to_string()));
        }
        check_range("dim", level, MAX_DIM)?;

        for led in leds.iter() {
            self.bus.write_register(dim_register(led.bit()), level)?;
            self.state.dim[led.index()] = level;
        }
        info!("LEDs {} dimmed to {}", leds, level);
        Ok(())
    }

    /// Returns the current gain.
    pub fn gain(&self) -> u8 {
        self.state.gain
    }

    /// Returns the state of one LED.
    pub fn led_state(&self, led: Led) -> LedState {
        LedState::from(self.state.on_off & (1 << led.bit()) != 0)
    }

    /// Returns the dim level of one LED.
    pub fn dim(&self, led: Led) -> u8 {
        self.state.dim[led.index()]
    }

    /// Returns the LEDs currently switched on.
    pub fn lit(&self) -> LedSet {
        LedSet::from_mask(self.state.on_off)
    }

    /// Returns the aggregate state of a group.
    pub fn group_state(&self, group: LedGroup) -> GroupState {
        let mask = group.mask();
        match self.state.on_off & mask {
            0 => GroupState::Off,
            bits if bits == mask => GroupState::On,
            _ => GroupState::Mixed,
        }
    }

    /// Returns a snapshot of the tracked state.
    pub fn status(&self) -> Status {
        Status {
            white: self.group_state(LedGroup::White),
            ir: self.group_state(LedGroup::Ir),
            gain: self.state.gain,
            leds: Led::all()
                .map(|led| LedStatus {
                    number: led.number(),
                    group: led.group(),
                    state: self.led_state(led),
                    dim: self.dim(led),
                })
                .collect(),
        }
    }

    /// Returns the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Returns the underlying bus mutably.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consumes the controller and returns the bus.
    pub fn into_bus(self) -> B {
        self.bus
    }

    fn write_on_off(&mut self, mask: u8) -> Result<()> {
        self.bus.write_register(ON_OFF_REGISTER, mask)?;
        self.state.on_off = mask;
        Ok(())
    }
}

fn check_range(what: &'static str, value: u8, max: u8) -> Result<u8> {
    if value > max {
        return Err(Error::OutOfRange {
            what,
            value: u32::from(value),
            max,
        });
    }
    Ok(value)
}

impl<B: RegisterBus> LedControl for BrightPi<B> {
    fn set_led_on_off(&mut self, leds: LedSet, state: LedState) -> Result<()> {
        BrightPi::set_led_on_off(self, leds, state)
    }

    fn set_gain(&mut self, level: u8) -> Result<()> {
        BrightPi::set_gain(self, level)
    }

    fn status_string(&self) -> String {
        self.to_string()
    }
}

impl<B: RegisterBus> std::fmt::Display for BrightPi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bright Pi: {}", self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBus;

    fn led(n: u8) -> Led {
        Led::new(n).unwrap()
    }

    #[test]
    fn test_new_writes_nothing() {
        let pi = BrightPi::new(MemoryBus::new());
        assert!(pi.bus().writes().is_empty());
        assert_eq!(pi.gain(), DEFAULT_GAIN);
        assert_eq!(pi.group_state(LedGroup::All), GroupState::Off);
    }

    #[test]
    fn test_group_on_off_round_trip() {
        let mut pi = BrightPi::new(MemoryBus::new());
        for group in [LedGroup::White, LedGroup::Ir, LedGroup::All] {
            for state in [LedState::On, LedState::Off] {
                pi.set_led_on_off(group, state).unwrap();
                let expected = if state.is_on() {
                    GroupState::On
                } else {
                    GroupState::Off
                };
                assert_eq!(pi.group_state(group), expected, "{} {}", group, state);
            }
        }
    }

    #[test]
    fn test_on_off_preserves_other_group() {
        let mut pi = BrightPi::new(MemoryBus::new());
        pi.set_led_on_off(LedGroup::Ir, LedState::On).unwrap();
        pi.set_led_on_off(LedGroup::White, LedState::On).unwrap();
        pi.set_led_on_off(LedGroup::White, LedState::Off).unwrap();

        assert_eq!(pi.group_state(LedGroup::Ir), GroupState::On);
        assert_eq!(pi.group_state(LedGroup::White), GroupState::Off);
        assert_eq!(pi.bus().register(ON_OFF_REGISTER), Some(0xA5));
    }

    #[test]
    fn test_single_led_makes_group_mixed() {
        let mut pi = BrightPi::new(MemoryBus::new());
        pi.set_led_on_off(led(2), LedState::On).unwrap();
        assert_eq!(pi.group_state(LedGroup::White), GroupState::Mixed);
        assert_eq!(pi.led_state(led(2)), LedState::On);
        assert_eq!(pi.led_state(led(1)), LedState::Off);
        // LED 2 is on register bit 3
        assert_eq!(pi.bus().register(ON_OFF_REGISTER), Some(0x08));
    }

    #[test]
    fn test_empty_set_rejected() {
        let mut pi = BrightPi::new(MemoryBus::new());
        let err = pi.set_led_on_off(LedSet::EMPTY, LedState::On).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(pi.bus().writes().is_empty());
    }

    #[test]
    fn test_gain_in_range() {
        let mut pi = BrightPi::new(MemoryBus::new());
        for level in 0..=MAX_GAIN {
            pi.set_gain(level).unwrap();
            assert_eq!(pi.gain(), level);
            assert_eq!(pi.status().gain, level);
        }
    }

    #[test]
    fn test_gain_out_of_range_keeps_previous() {
        let mut pi = BrightPi::new(MemoryBus::new());
        pi.set_gain(9).unwrap();
        let err = pi.set_gain(16).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { what: "gain", .. }));
        assert_eq!(pi.gain(), 9);
        assert_eq!(pi.bus().writes(), &[(GAIN_REGISTER, 9)]);
    }

    #[test]
    fn test_failed_write_keeps_state() {
        let mut pi = BrightPi::new(MemoryBus::new());
        pi.set_led_on_off(LedGroup::White, LedState::On).unwrap();
        pi.bus_mut().set_available(false);

        assert!(pi.set_led_on_off(LedGroup::White, LedState::Off).is_err());
        assert!(pi.set_gain(3).unwrap_err().is_hardware());
        assert_eq!(pi.group_state(LedGroup::White), GroupState::On);
        assert_eq!(pi.gain(), DEFAULT_GAIN);
    }

    #[test]
    fn test_dim() {
        let mut pi = BrightPi::new(MemoryBus::new());
        pi.set_led_dim(LedGroup::Ir, 20).unwrap();
        for n in 5..=8 {
            assert_eq!(pi.dim(led(n)), 20);
        }
        assert_eq!(pi.dim(led(1)), 0);
        // LED 5 is on bit 0, so its dim register is 0x01
        assert_eq!(pi.bus().register(0x01), Some(20));

        assert!(matches!(
            pi.set_led_dim(LedGroup::Ir, 64),
            Err(Error::OutOfRange { what: "dim", .. })
        ));
    }

    #[test]
    fn test_refresh_reads_device() {
        let mut bus = MemoryBus::new();
        bus.write_register(ON_OFF_REGISTER, 0x5A).unwrap();
        bus.write_register(GAIN_REGISTER, 0x0F).unwrap();
        bus.write_register(0x02, 0x39).unwrap();

        let pi = BrightPi::from_device(bus).unwrap();
        assert_eq!(pi.group_state(LedGroup::White), GroupState::On);
        assert_eq!(pi.group_state(LedGroup::Ir), GroupState::Off);
        assert_eq!(pi.gain(), 0x0F);
        assert_eq!(pi.dim(led(1)), 0x39);
    }

    #[test]
    fn test_refresh_rejects_out_of_range() {
        let mut bus = MemoryBus::new();
        bus.write_register(GAIN_REGISTER, 0xFF).unwrap();
        assert!(matches!(
            BrightPi::from_device(bus),
            Err(Error::OutOfRange { what: "gain", value: 255, .. })
        ));

        let mut pi = BrightPi::new(MemoryBus::new());
        pi.set_gain(9).unwrap();
        pi.bus_mut().write_register(GAIN_REGISTER, 3).unwrap();
        // LED 5 dim register, only six bits wide
        pi.bus_mut().write_register(0x01, 0x40).unwrap();
        assert!(matches!(
            pi.refresh(),
            Err(Error::OutOfRange { what: "dim", value: 64, .. })
        ));
        assert_eq!(pi.gain(), 9);
        assert_eq!(pi.dim(led(5)), 0);
    }

    #[test]
    fn test_partial_dim_failure() {
        let mut pi = BrightPi::new(MemoryBus::new());
        pi.set_led_dim(LedGroup::White, 10).unwrap();
        pi.bus_mut().fail_after(2);

        assert!(pi.set_led_dim(LedGroup::White, 40).unwrap_err().is_hardware());
        assert_eq!(pi.dim(led(1)), 40);
        assert_eq!(pi.dim(led(2)), 40);
        assert_eq!(pi.dim(led(3)), 10);
        assert_eq!(pi.dim(led(4)), 10);
    }

    #[test]
    fn test_display() {
        let mut pi = BrightPi::new(MemoryBus::new());
        pi.set_led_on_off(LedGroup::Ir, LedState::On).unwrap();
        pi.set_gain(9).unwrap();
        assert_eq!(
            pi.to_string(),
            "Bright Pi: white=OFF ir=ON gain=9 dim=[0,0,0,0,0,0,0,0]"
        );
    }

    #[test]
    fn test_status_json() {
        let pi = BrightPi::new(MemoryBus::new());
        let json = serde_json::to_value(pi.status()).unwrap();
        assert_eq!(json["white"], "off");
        assert_eq!(json["gain"], 8);
        assert_eq!(json["leds"][4]["group"], "ir");
    }

    #[test]
    fn test_trait_object() {
        let mut pi = BrightPi::new(MemoryBus::new());
        let control: &mut dyn LedControl = &mut pi;
        control.set_led_on_off(LedGroup::White.into(), LedState::On).unwrap();
        control.set_gain(4).unwrap();
        assert!(control.status_string().contains("white=ON"));
        assert!(control.status_string().contains("gain=4"));
    }
}
