use std::fmt::Write;

use crate::{
    handlers::phase_handler::GameState,
    models::game::{OptionState, Phase},
};

/// Plain-text view of the game screen.
pub fn render(state: &GameState) -> String {
    let mut out = String::new();

    match state.phase {
        Phase::Waiting => out.push_str("Waiting for the first question...\n"),
        Phase::Question => render_question(state, &mut out),
        Phase::Results => {
            out.push_str("Leaderboard\n");
            render_standings(state, &mut out);
        }
        Phase::Finished => {
            out.push_str("Game over! Final standings\n");
            render_standings(state, &mut out);
        }
        Phase::Aborted => {
            let _ = writeln!(
                out,
                "Game aborted: {}",
                state.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    out
}

fn render_question(state: &GameState, out: &mut String) {
    let question = match &state.question {
        Some(question) => question,
        None => return,
    };

    let _ = writeln!(
        out,
        "Question {}/{}: {}",
        question.question_number, question.total_questions, question.text
    );
    for (index, option) in question.options.iter().enumerate() {
        let marker = match state.option_state(&option.id) {
            OptionState::Correct => "[correct]",
            OptionState::Wrong => "[wrong]",
            OptionState::Disabled => "",
            OptionState::Selected => "[your answer]",
            OptionState::Default => "",
        };
        let _ = writeln!(out, "  {}) {} {}", index + 1, option.text, marker);
    }

    match state.time_left() {
        None => out.push_str("Waiting for the timer...\n"),
        Some(0) => out.push_str("Time is up!\n"),
        Some(left) => {
            let _ = writeln!(out, "{}s left", left);
        }
    }
    if let Some(result) = &state.result {
        if result.is_correct {
            let _ = writeln!(out, "Correct! +{}", result.score_awarded);
        } else {
            out.push_str("Wrong answer\n");
        }
    }
}

fn render_standings(state: &GameState, out: &mut String) {
    let mut players: Vec<_> = state
        .players
        .iter()
        .map(|player| (state.displayed_score(player), player))
        .collect();
    players.sort_by(|a, b| b.0.cmp(&a.0));

    for (place, (score, player)) in players.iter().enumerate() {
        let _ = writeln!(out, "  {}. {} - {}", place + 1, player.nickname, score);
    }
}
