//! Winner-Takes-All Decoding
//!
//! Running wheel speeds updated sequentially, not simultaneously: the left
//! wheel is compared against the previous right speed, then the right wheel
//! against the just-updated left speed. The order dependency is
//! load-bearing; reordering changes which wheel wins ties.

/// Running wheel speeds of the Winner-Takes-All dynamic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WtaState {
    w_left: f32,
    w_right: f32,
}

impl WtaState {
    /// Both wheels start at the straight-ahead speed w0.
    pub fn new(max_speed: f32) -> Self {
        Self {
            w_left: max_speed,
            w_right: max_speed,
        }
    }

    /// Advance one iteration and return the updated (left, right) speeds.
    pub fn step(
        &mut self,
        left_rate: u32,
        right_rate: u32,
        max_speed: f32,
        c_left: f32,
        c_right: f32,
        brake_speed: f32,
    ) -> (f32, f32) {
        if left_rate == 0 && right_rate == 0 {
            self.w_left = max_speed;
            self.w_right = max_speed;
        } else {
            // First the left wheel, against the previous right speed.
            if self.w_left >= self.w_right {
                self.w_left = max_speed - c_left * left_rate as f32;
            } else {
                self.w_left = -brake_speed;
            }

            // Then the right wheel, against the left speed just written.
            if self.w_right >= self.w_left {
                self.w_right = max_speed - c_right * right_rate as f32;
            } else {
                self.w_right = -brake_speed;
            }
        }

        (self.w_left, self.w_right)
    }

    pub fn speeds(&self) -> (f32, f32) {
        (self.w_left, self.w_right)
    }
}
