use log::{debug, info};
use thiserror::Error;

use crate::{
    handlers::phase_handler::GameState,
    models::{
        communication::{AnswerSubmission, ClientCommand},
        game::Phase,
    },
};

/// Why a tap on an answer option did not produce a submission.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitRejection {
    #[error("no question is being asked")]
    NoQuestion,
    #[error("option {0} is not part of the current question")]
    UnknownOption(String),
    #[error("an answer was already selected")]
    AlreadySelected,
    #[error("the result for this question already arrived")]
    ResultReceived,
    #[error("the correct answer was already revealed")]
    AlreadyRevealed,
    #[error("time is up")]
    TimeUp,
}

/// Records the player's choice and builds the one message sent for this question.
///
/// Correctness and points are left to the server; they come back later as an
/// `answer_result` event.
pub fn submit_answer(
    state: &mut GameState,
    option_id: &str,
) -> Result<ClientCommand, SubmitRejection> {
    check_submission(state, option_id)?;

    let time_taken_ms = state
        .countdown
        .map(|countdown| countdown.elapsed_ms())
        .unwrap_or(0);
    state.selected = Some(option_id.to_string());

    info!(
        "Submitting option {} after {} ms",
        option_id, time_taken_ms
    );
    Ok(ClientCommand::SubmitAnswer(AnswerSubmission {
        option_id: option_id.to_string(),
        time_taken_ms,
    }))
}

fn check_submission(state: &GameState, option_id: &str) -> Result<(), SubmitRejection> {
    let question = match (&state.phase, &state.question) {
        (Phase::Question, Some(question)) => question,
        _ => return Err(SubmitRejection::NoQuestion),
    };
    if state.selected.is_some() {
        return Err(SubmitRejection::AlreadySelected);
    }
    if state.result.is_some() {
        return Err(SubmitRejection::ResultReceived);
    }
    if state.correct_option.is_some() {
        return Err(SubmitRejection::AlreadyRevealed);
    }
    if state.is_time_up() {
        return Err(SubmitRejection::TimeUp);
    }
    if !question.has_option(option_id) {
        debug!("Ignoring tap on unknown option {}", option_id);
        return Err(SubmitRejection::UnknownOption(option_id.to_string()));
    }
    Ok(())
}
