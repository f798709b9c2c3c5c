use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    current: u32,
    max: u32,
}

impl HitPoints {
    pub fn new(max: u32) -> Self {
        Self {
            current: max,
            max,
        }
    }

    pub fn with_current(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Moves the maximum and shifts current hit points by the same amount, so
    /// gaining a level heals by the gained amount and losing one never leaves
    /// current above max.
    pub fn update_max(&mut self, new_max: u32) {
        if new_max >= self.max {
            self.current += new_max - self.max;
        } else {
            self.current = self.current.saturating_sub(self.max - new_max);
        }
        self.max = new_max;
        self.current = self.current.min(self.max);
    }
}
