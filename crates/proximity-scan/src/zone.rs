//! Obstacle Zone Classification
//!
//! The five sensors cover, left to right: left, left-center, center,
//! right-center, right. Zones are decided by fixed trigger patterns, not
//! by thresholds; patterns outside the table produce no zone.

/// Where the obstacle sits relative to the robot's heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// Dead ahead; logged but produces no stimulus
    Center,
    /// Left side; stimulates the left channel
    Left,
    /// Right side; stimulates the right channel
    Right,
}

/// Classify the 5-sensor trigger vector.
///
/// Center patterns are checked first; an obstacle seen by both outermost
/// sensors without a center pattern is ambiguous and yields no zone.
pub fn classify(triggered: &[bool; 5]) -> Option<Zone> {
    match *triggered {
        [false, false, true, false, false]
        | [false, true, true, true, false]
        | [true, true, true, true, true] => Some(Zone::Center),
        [s0, s1, _, _, false] if s0 || s1 => Some(Zone::Left),
        [false, _, _, s3, s4] if s3 || s4 => Some(Zone::Right),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_patterns() {
        assert_eq!(classify(&[false, false, true, false, false]), Some(Zone::Center));
        assert_eq!(classify(&[false, true, true, true, false]), Some(Zone::Center));
        assert_eq!(classify(&[true, true, true, true, true]), Some(Zone::Center));
    }

    #[test]
    fn test_left_patterns() {
        assert_eq!(classify(&[true, false, false, false, false]), Some(Zone::Left));
        assert_eq!(classify(&[false, true, false, false, false]), Some(Zone::Left));
        // Center sensor participation does not veto the left zone.
        assert_eq!(classify(&[true, true, true, false, false]), Some(Zone::Left));
    }

    #[test]
    fn test_right_patterns() {
        assert_eq!(classify(&[false, false, false, true, false]), Some(Zone::Right));
        assert_eq!(classify(&[false, false, false, false, true]), Some(Zone::Right));
        assert_eq!(classify(&[false, false, true, true, true]), Some(Zone::Right));
    }

    #[test]
    fn test_ambiguous_and_quiet_patterns() {
        assert_eq!(classify(&[false, false, false, false, false]), None);
        // Both outermost sensors without a center pattern: ambiguous.
        assert_eq!(classify(&[true, false, false, false, true]), None);
        assert_eq!(classify(&[true, true, false, true, true]), None);
    }
}
