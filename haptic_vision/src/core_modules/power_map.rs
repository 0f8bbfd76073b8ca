// THEORY:
// The power map is the last step between vision and touch. It turns a distance into
// one of six duty-cycle tiers for a vibration motor: the nearer the obstacle, the
// harder the motor buzzes, and anything at or beyond the last breakpoint is silent.
//
// The mapping is total over `i32`. Negative distances are sentinels ("nearest
// possible" or "no match") and land in the strongest tier because every breakpoint
// is a strict upper bound.

/// A 16-bit PWM duty cycle for one actuator channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PowerLevel(pub u16);

impl PowerLevel {
    pub const OFF: PowerLevel = PowerLevel(0);
    pub const MAX: PowerLevel = PowerLevel(65_000);

    pub fn duty_cycle(&self) -> u16 {
        self.0
    }

    pub fn is_off(&self) -> bool {
        self.0 == 0
    }

    /// One `OFF` level per channel, used when a frame yields no points.
    pub fn all_off(channels: usize) -> Vec<PowerLevel> {
        vec![PowerLevel::OFF; channels]
    }
}

/// `(exclusive upper distance, level)` pairs in ascending distance order.
const BREAKPOINTS: [(i32, PowerLevel); 5] = [
    (200, PowerLevel(65_000)),
    (400, PowerLevel(55_000)),
    (600, PowerLevel(45_000)),
    (800, PowerLevel(35_000)),
    (1_000, PowerLevel(25_000)),
];

/// Maps a distance in sensor units to an actuator power level.
pub fn quantize(distance: i32) -> PowerLevel {
    BREAKPOINTS
        .iter()
        .find(|(upper, _)| distance < *upper)
        .map(|(_, level)| *level)
        .unwrap_or(PowerLevel::OFF)
}
