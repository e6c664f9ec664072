use serde::{Deserialize, Serialize};

use super::{
    game::{AnswerResult, Question},
    lobby::Player,
};

/// Everything the game server pushes to the client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    NewQuestion(Question),
    QuestionTimer(QuestionTimer),
    AnswerResult(AnswerResult),
    ShowLeaderboard(Leaderboard),
    GameOver(PlayerList),
    UpdatePlayerList(PlayerList),
    GameError(GameError),
    GameJoined(GameJoined),
    GameCreated(GameCreated),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct QuestionTimer {
    /// Seconds.
    pub duration: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub players: Vec<Player>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlayerList {
    pub players: Vec<Player>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GameError {
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GameJoined {
    pub pin: String,
    #[serde(default)]
    pub players: Vec<Player>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GameCreated {
    pub pin: String,
}

/// Everything the client sends to the game server.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    PlayerReadyForQuestion(PinPayload),
    SubmitAnswer(AnswerSubmission),
    JoinGame(JoinRequest),
    HostGame(HostRequest),
    StartGame(PinPayload),
    LeaveGame(PinPayload),
}

impl ClientCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::PlayerReadyForQuestion(_) => "player_ready_for_question",
            ClientCommand::SubmitAnswer(_) => "submit_answer",
            ClientCommand::JoinGame(_) => "join_game",
            ClientCommand::HostGame(_) => "host_game",
            ClientCommand::StartGame(_) => "start_game",
            ClientCommand::LeaveGame(_) => "leave_game",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PinPayload {
    pub pin: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub option_id: String,
    pub time_taken_ms: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JoinRequest {
    pub pin: String,
    pub nickname: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostRequest {
    pub quiz_id: String,
}

#[derive(Serialize, Debug)]
pub struct CommandTokenPair {
    #[serde(flatten)]
    pub command: ClientCommand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
