//! Stand-in for the PWM motor driver board.

use haptic_vision::{ActuatorBank, PowerLevel};
use tracing::{debug, warn};

/// Records the duty cycle of every channel and logs each update.
#[derive(Debug, Clone)]
pub struct LoggingActuatorBank {
    duty_cycles: Vec<u16>,
    pwm_frequency_hz: u32,
}

impl LoggingActuatorBank {
    pub fn new(channels: usize, pwm_frequency_hz: u32) -> Self {
        debug!(channels, pwm_frequency_hz, "actuator bank ready");
        Self {
            duty_cycles: vec![0; channels],
            pwm_frequency_hz,
        }
    }

    pub fn duty_cycles(&self) -> &[u16] {
        &self.duty_cycles
    }
}

impl ActuatorBank for LoggingActuatorBank {
    fn channel_count(&self) -> usize {
        self.duty_cycles.len()
    }

    fn apply(&mut self, levels: &[PowerLevel]) {
        if levels.len() > self.duty_cycles.len() {
            warn!(
                requested = levels.len(),
                available = self.duty_cycles.len(),
                "more cells than actuator channels, extra cells dropped"
            );
        }
        for (duty, level) in self.duty_cycles.iter_mut().zip(levels) {
            *duty = level.duty_cycle();
        }
        debug!(
            duty_cycles = ?self.duty_cycles,
            pwm_frequency_hz = self.pwm_frequency_hz,
            "actuators updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_levels_are_dropped() {
        let mut bank = LoggingActuatorBank::new(2, 100);
        bank.apply(&[PowerLevel(65_000), PowerLevel(25_000), PowerLevel(45_000)]);
        assert_eq!(bank.duty_cycles(), &[65_000, 25_000]);
    }

    #[test]
    fn zero_all_silences_every_channel() {
        let mut bank = LoggingActuatorBank::new(4, 100);
        bank.apply(&[PowerLevel::MAX; 4]);
        bank.zero_all();
        assert_eq!(bank.duty_cycles(), &[0, 0, 0, 0]);
    }

    #[test]
    fn short_updates_leave_other_channels_untouched() {
        let mut bank = LoggingActuatorBank::new(3, 100);
        bank.apply(&[PowerLevel::MAX; 3]);
        bank.apply(&[PowerLevel::OFF]);
        assert_eq!(bank.duty_cycles(), &[0, 65_000, 65_000]);
    }
}
