use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,
    pub text: String,
    pub options: Vec<AnswerOption>,
    pub question_number: u32,
    pub total_questions: u32,
}

impl Question {
    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|option| option.id == option_id)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub is_correct: bool,
    pub correct_option_id: String,
    pub score_awarded: i64,
}

/// Stage of the current round as seen by this client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Joined, no question received yet.
    Waiting,
    Question,
    Results,
    Finished,
    /// The server reported an error or the connection dropped mid-game.
    Aborted,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Finished | Phase::Aborted)
    }
}

/// Local, advisory countdown seeded by the server's timer event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    pub duration_secs: u32,
    pub time_left: u32,
}

impl Countdown {
    pub fn new(duration_secs: u32) -> Self {
        Countdown {
            duration_secs,
            time_left: duration_secs,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.time_left == 0
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::from(self.duration_secs.saturating_sub(self.time_left)) * 1000
    }
}

/// How a single answer option should be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionState {
    Correct,
    Wrong,
    Disabled,
    Selected,
    Default,
}
