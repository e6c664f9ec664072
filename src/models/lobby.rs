use serde::{Deserialize, Serialize};

/// Identity of whoever is using this client, persisted between launches.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub nickname: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub nickname: String,
    #[serde(default)]
    pub score: i64,
}

/// Metadata of the game the user is currently part of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub pin: String,
    pub players: Vec<Player>,
    pub is_host: bool,
}

impl Session {
    pub fn new(pin: String, players: Vec<Player>, is_host: bool) -> Self {
        Session {
            pin,
            players,
            is_host,
        }
    }
}
