//! Configurable limits for bounded deframing.

/// Wire-level limits enforced while reading frames.
///
/// The length prefix is attacker-controlled, so it is validated before any
/// buffering decision is made from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum declared frame length in bytes (packet id plus body).
    pub max_frame_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Chunk data is the largest packet the server emits; clients
            // never legitimately approach this inbound.
            max_frame_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_frame_bytes: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_frame_bytes() {
        let limits = Limits::default();
        assert_eq!(limits.max_frame_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn testing_limits_smaller() {
        assert!(Limits::for_testing().max_frame_bytes < Limits::default().max_frame_bytes);
    }

    #[test]
    fn limits_const_constructible() {
        const LIMITS: Limits = Limits::for_testing();
        assert_eq!(LIMITS.max_frame_bytes, 4096);
    }
}
