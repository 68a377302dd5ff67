//! SC620 register map as wired on the Bright Pi.

/// LED on/off bitmask register.
pub const ON_OFF_REGISTER: u8 = 0x00;

/// Global gain register.
pub const GAIN_REGISTER: u8 = 0x09;

/// Number of registers tracked by the controller (0x00 through 0x09).
pub const REGISTER_COUNT: usize = 10;

/// Highest gain value (4-bit register).
pub const MAX_GAIN: u8 = 0x0F;

/// Gain after power-on and after a reset.
pub const DEFAULT_GAIN: u8 = 0x08;

/// Highest dim value (6-bit register).
pub const MAX_DIM: u8 = 0x3F;

/// Dim level restored by a reset.
pub const DEFAULT_DIM: u8 = MAX_DIM;

/// Dim level used by the illumination presets.
pub const PRESET_DIM: u8 = 0x39;

/// Number of LEDs on the board.
pub const LED_COUNT: usize = 8;

/// On/off register bit for each LED, indexed by LED number - 1.
/// LEDs 1-4 are white, 5-8 infrared.
pub const LED_BITS: [u8; LED_COUNT] = [1, 3, 4, 6, 0, 2, 5, 7];

/// On/off mask covering the white LEDs.
pub const WHITE_MASK: u8 = 0x5A;

/// On/off mask covering the infrared LEDs.
pub const IR_MASK: u8 = 0xA5;

/// Dim register of the LED driven by `bit`.
pub const fn dim_register(bit: u8) -> u8 {
    bit + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_of(leds: &[u8]) -> u8 {
        leds.iter().fold(0, |acc, &bit| acc | (1 << bit))
    }

    #[test]
    fn test_group_masks_match_bits() {
        assert_eq!(mask_of(&LED_BITS[..4]), WHITE_MASK);
        assert_eq!(mask_of(&LED_BITS[4..]), IR_MASK);
        assert_eq!(WHITE_MASK | IR_MASK, 0xFF);
    }

    #[test]
    fn test_dim_registers() {
        // White LEDs use 0x02, 0x04, 0x05, 0x07; infrared 0x01, 0x03, 0x06, 0x08
        let white: Vec<u8> = LED_BITS[..4].iter().map(|&b| dim_register(b)).collect();
        let ir: Vec<u8> = LED_BITS[4..].iter().map(|&b| dim_register(b)).collect();
        assert_eq!(white, vec![0x02, 0x04, 0x05, 0x07]);
        assert_eq!(ir, vec![0x01, 0x03, 0x06, 0x08]);
    }
}
