//! Which mystery boxes a student has opened.
//!
//! Progress lives in an encrypted cookie, not the database: students are
//! anonymous and the same device may come back to a game later. Boxes are
//! tracked by position within the game so the cookie stays small.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Oldest games are forgotten past this many.
pub const MAX_TRACKED_GAMES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MysteryBoxProgress {
    #[serde(rename = "g", default)]
    games: Vec<GameProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GameProgress {
    #[serde(rename = "id")]
    game_id: Uuid,
    #[serde(rename = "o", default)]
    opened: Vec<i32>,
}

impl MysteryBoxProgress {
    /// Unreadable cookies start over instead of failing the request.
    pub fn from_cookie_value(value: &str) -> Self {
        serde_json::from_str(value).unwrap_or_default()
    }

    pub fn to_cookie_value(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Opened positions for a game, in the order they were opened.
    pub fn opened(&self, game_id: Uuid) -> &[i32] {
        self.games
            .iter()
            .find(|g| g.game_id == game_id)
            .map(|g| g.opened.as_slice())
            .unwrap_or_default()
    }

    pub fn is_opened(&self, game_id: Uuid, position: i32) -> bool {
        self.opened(game_id).contains(&position)
    }

    /// Mark a box opened. Returns `false` if it already was.
    ///
    /// The game becomes the most recently played one.
    pub fn open(&mut self, game_id: Uuid, position: i32) -> bool {
        let mut game = match self.games.iter().position(|g| g.game_id == game_id) {
            Some(index) => self.games.remove(index),
            None => GameProgress {
                game_id,
                opened: Vec::new(),
            },
        };

        let newly_opened = !game.opened.contains(&position);
        if newly_opened {
            game.opened.push(position);
        }
        self.games.push(game);

        if self.games.len() > MAX_TRACKED_GAMES {
            let excess = self.games.len() - MAX_TRACKED_GAMES;
            self.games.drain(..excess);
        }

        newly_opened
    }

    /// Close every box of a game. Returns `false` if nothing was open.
    pub fn reset(&mut self, game_id: Uuid) -> bool {
        let before = self.games.len();
        self.games.retain(|g| g.game_id != game_id);
        self.games.len() != before
    }
}
