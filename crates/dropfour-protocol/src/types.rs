//! Identity and match-setup types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable, opaque player identifier issued by the identity provider.
///
/// `PlayerId(0)` is reserved for bot opponents, see [`PlayerId::BOT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// Sentinel identity for every bot opponent. Never issued to a human.
    pub const BOT: PlayerId = PlayerId(0);

    pub fn is_bot(self) -> bool {
        self == Self::BOT
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bot() {
            write!(f, "P-bot")
        } else {
            write!(f, "P-{}", self.0)
        }
    }
}

/// Identifier of one game session. Unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// A player's id together with the name shown to opponents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub username: String,
}

impl PlayerInfo {
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }

    /// The synthetic identity used for a bot opponent.
    pub fn bot(difficulty: Difficulty) -> Self {
        Self {
            id: PlayerId::BOT,
            username: format!("Bot ({difficulty})"),
        }
    }

    pub fn is_bot(&self) -> bool {
        self.id.is_bot()
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// Bot strength tier, in strictly increasing lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// One-ply: win, else block, else random.
    Easy,
    /// Weighted heuristic scoring of every column.
    #[default]
    Medium,
    /// Depth-limited minimax with alpha-beta pruning.
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(ProtocolError::UnknownDifficulty(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Opponent / RematchDecision
// ---------------------------------------------------------------------------

/// The second participant of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opponent {
    Human(PlayerInfo),
    Bot { difficulty: Difficulty },
}

impl Opponent {
    /// The identity that sits in the second seat.
    pub fn info(&self) -> PlayerInfo {
        match self {
            Self::Human(info) => info.clone(),
            Self::Bot { difficulty } => PlayerInfo::bot(*difficulty),
        }
    }

    pub fn bot_difficulty(&self) -> Option<Difficulty> {
        match self {
            Self::Human(_) => None,
            Self::Bot { difficulty } => Some(*difficulty),
        }
    }
}

/// A player's answer to a rematch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RematchDecision {
    Accept,
    Decline,
}

impl FromStr for RematchDecision {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "yes" => Ok(Self::Accept),
            "decline" | "no" => Ok(Self::Decline),
            other => Err(ProtocolError::UnknownDecision(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(42).to_string(), "P-42");
        assert_eq!(PlayerId::BOT.to_string(), "P-bot");
        assert_eq!(SessionId(7).to_string(), "S-7");
    }

    #[test]
    fn test_player_id_serializes_transparently() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_bot_info_uses_sentinel_id() {
        let bot = PlayerInfo::bot(Difficulty::Hard);
        assert!(bot.is_bot());
        assert_eq!(bot.username, "Bot (hard)");
        assert!(!PlayerInfo::new(PlayerId(3), "ann").is_bot());
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(
            "impossible".parse::<Difficulty>(),
            Err(ProtocolError::UnknownDifficulty("impossible".into()))
        );
    }

    #[test]
    fn test_opponent_info() {
        let human = PlayerInfo::new(PlayerId(9), "bo");
        assert_eq!(Opponent::Human(human.clone()).info(), human);
        assert_eq!(Opponent::Human(human).bot_difficulty(), None);

        let bot = Opponent::Bot { difficulty: Difficulty::Easy };
        assert_eq!(bot.info().id, PlayerId::BOT);
        assert_eq!(bot.bot_difficulty(), Some(Difficulty::Easy));
    }

    #[test]
    fn test_rematch_decision_from_str() {
        assert_eq!("accept".parse::<RematchDecision>().unwrap(), RematchDecision::Accept);
        assert_eq!("No".parse::<RematchDecision>().unwrap(), RematchDecision::Decline);
        assert!("maybe".parse::<RematchDecision>().is_err());
    }
}
