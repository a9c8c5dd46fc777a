use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub type PlayerId = String;

/// Who is acting: the visitor id plus the name to show for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub player_id: PlayerId,
    pub display_name: String,
}

impl Identity {
    pub fn new(player_id: impl Into<PlayerId>, display_name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    #[default]
    Guest,
    Registered,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Guest => "guest",
            SessionKind::Registered => "registered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "guest" => Some(SessionKind::Guest),
            "registered" => Some(SessionKind::Registered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayerStats {
    pub wins: i64,
    pub losses: i64,
    pub draws: i64,
    pub points: i64,
}

/// How a finished game counts for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl GameResult {
    pub fn points(self) -> i64 {
        match self {
            GameResult::Win => 3,
            GameResult::Draw => 1,
            GameResult::Loss => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSession {
    pub session_id: PlayerId,
    pub display_name: String,
    pub kind: SessionKind,
    pub stats: PlayerStats,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen_at: OffsetDateTime,
}

impl PlayerSession {
    pub fn new_guest(identity: &Identity, now: OffsetDateTime) -> Self {
        Self {
            session_id: identity.player_id.clone(),
            display_name: identity.display_name.clone(),
            kind: SessionKind::Guest,
            stats: PlayerStats::default(),
            created_at: now,
            last_seen_at: now,
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(self.session_id.clone(), self.display_name.clone())
    }

    pub fn record(&mut self, result: GameResult) {
        match result {
            GameResult::Win => self.stats.wins += 1,
            GameResult::Loss => self.stats.losses += 1,
            GameResult::Draw => self.stats.draws += 1,
        }
        self.stats.points += result.points();
    }
}
