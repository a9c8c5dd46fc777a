use std::time::Duration;

/// Timing rules the room state machine and supervisor run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomRules {
    /// Caro turn clock
    pub turn_len: Duration,
    /// Disconnect grace before a player is removed
    pub grace: Duration,
    /// Countdown announced in `game_starting`
    pub countdown: Duration,
    /// Think delay before the Caro bot replies
    pub bot_delay: Duration,
}

impl Default for RoomRules {
    fn default() -> Self {
        Self {
            turn_len: Duration::from_secs(300),
            grace: Duration::from_secs(30),
            countdown: Duration::from_secs(3),
            bot_delay: Duration::from_millis(400),
        }
    }
}
