//! Client-side view of a game round.
//!
//! [`reduce`] is the only place [`GameState`] changes. Every server event,
//! timer tick and user tap arrives as an [`Input`] and comes out as a list of
//! [`Effect`]s for the game handler to carry out, so the machine can be driven
//! without a socket or a clock.

use log::{debug, info, warn};
use std::time::Duration;

use crate::{
    handlers::answer_handler::submit_answer,
    models::{
        communication::{ClientCommand, Leaderboard, ServerEvent},
        game::{AnswerResult, Countdown, OptionState, Phase, Question},
        lobby::Player,
    },
    session::Notification,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Server(ServerEvent),
    /// One second of local countdown passed on the ticker started as `ticker`.
    Tick { ticker: u64 },
    RevealElapsed { round: u64 },
    SelectOption(String),
    Focus,
    Blur,
    ConnectionLost(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Send(ClientCommand),
    StartCountdown { ticker: u64 },
    StopCountdown,
    ScheduleReveal { round: u64, after: Duration },
    CancelReveal,
    Navigate(Screen),
    Notify(Notification),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Podium,
}

/// Leaderboard held back while the correct answer is on screen.
#[derive(Clone, Debug, PartialEq)]
struct PendingReveal {
    round: u64,
    players: Vec<Player>,
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub phase: Phase,
    pub question: Option<Question>,
    pub countdown: Option<Countdown>,
    pub selected: Option<String>,
    pub result: Option<AnswerResult>,
    pub correct_option: Option<String>,
    /// Authoritative standings, only ever replaced by server data.
    pub players: Vec<Player>,
    /// Points shown for the local player before the server confirms them.
    pub score_overlay: Option<i64>,
    pub local_player_id: Option<String>,
    pub focused: bool,
    pub error: Option<String>,
    reveal: Option<PendingReveal>,
    round: u64,
    ticker: u64,
    reveal_window: Duration,
}

impl GameState {
    pub fn new(reveal_window: Duration) -> Self {
        GameState {
            phase: Phase::Waiting,
            question: None,
            countdown: None,
            selected: None,
            result: None,
            correct_option: None,
            players: Vec::new(),
            score_overlay: None,
            local_player_id: None,
            focused: true,
            error: None,
            reveal: None,
            round: 0,
            ticker: 0,
            reveal_window,
        }
    }

    pub fn with_local_player(mut self, player_id: impl Into<String>) -> Self {
        self.local_player_id = Some(player_id.into());
        self
    }

    pub fn with_players(mut self, players: Vec<Player>) -> Self {
        self.players = players;
        self
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Stamp of the only countdown ticker whose ticks still count.
    pub fn ticker(&self) -> u64 {
        self.ticker
    }

    pub fn time_left(&self) -> Option<u32> {
        self.countdown.map(|countdown| countdown.time_left)
    }

    pub fn is_time_up(&self) -> bool {
        self.countdown
            .map(|countdown| countdown.is_expired())
            .unwrap_or(false)
    }

    pub fn is_waiting_for_timer(&self) -> bool {
        self.phase == Phase::Question && self.countdown.is_none()
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    pub fn input_enabled(&self) -> bool {
        self.phase == Phase::Question
            && self.question.is_some()
            && self.selected.is_none()
            && self.result.is_none()
            && self.correct_option.is_none()
            && !self.is_time_up()
    }

    pub fn option_state(&self, option_id: &str) -> OptionState {
        derive_option_state(
            self.result.is_some(),
            self.correct_option.is_some(),
            self.selected.as_deref() == Some(option_id),
            self.correct_option.as_deref() == Some(option_id),
        )
    }

    pub fn option_id_at(&self, index: usize) -> Option<String> {
        self.question
            .as_ref()
            .and_then(|question| question.options.get(index))
            .map(|option| option.id.clone())
    }

    pub fn displayed_score(&self, player: &Player) -> i64 {
        match (&self.local_player_id, self.score_overlay) {
            (Some(id), Some(bump)) if id == &player.id => player.score + bump,
            _ => player.score,
        }
    }
}

/// Picks how an option is drawn. Earlier rules win over later ones.
pub fn derive_option_state(
    result_arrived: bool,
    correct_known: bool,
    is_selected: bool,
    is_correct: bool,
) -> OptionState {
    if correct_known && is_correct {
        OptionState::Correct
    } else if is_selected && (result_arrived || correct_known) {
        OptionState::Wrong
    } else if result_arrived || correct_known {
        OptionState::Disabled
    } else if is_selected {
        OptionState::Selected
    } else {
        OptionState::Default
    }
}

pub fn reduce(state: &mut GameState, input: Input) -> Vec<Effect> {
    if state.phase.is_terminal() {
        debug!("Game is over, ignoring {:?}", input);
        return Vec::new();
    }

    match input {
        Input::Server(event) => apply_server_event(state, event),
        Input::Tick { ticker } => tick(state, ticker),
        Input::RevealElapsed { round } => finish_reveal(state, round),
        Input::SelectOption(option_id) => match submit_answer(state, &option_id) {
            Ok(command) => vec![Effect::Send(command)],
            Err(rejection) => {
                debug!("Answer not submitted: {}", rejection);
                Vec::new()
            }
        },
        Input::Focus => focus(state),
        Input::Blur => {
            state.focused = false;
            vec![stop_countdown(state), Effect::CancelReveal]
        }
        Input::ConnectionLost(reason) => abort(state, format!("Connection lost: {}", reason)),
    }
}

fn apply_server_event(state: &mut GameState, event: ServerEvent) -> Vec<Effect> {
    match event {
        ServerEvent::NewQuestion(question) => new_question(state, question),
        ServerEvent::QuestionTimer(timer) => start_timer(state, timer.duration),
        ServerEvent::AnswerResult(result) => answer_result(state, result),
        ServerEvent::ShowLeaderboard(board) => show_leaderboard(state, board),
        ServerEvent::GameOver(standings) => {
            info!("Game over after round {}", state.round);
            state.reveal = None;
            apply_standings(state, standings.players);
            state.phase = Phase::Finished;
            vec![
                stop_countdown(state),
                Effect::CancelReveal,
                Effect::Navigate(Screen::Podium),
            ]
        }
        ServerEvent::UpdatePlayerList(list) => {
            state.players = list.players;
            Vec::new()
        }
        ServerEvent::GameError(error) => abort(state, error.message),
        ServerEvent::GameJoined(_) | ServerEvent::GameCreated(_) => {
            debug!("Handshake event outside of a handshake, ignoring");
            Vec::new()
        }
    }
}

fn new_question(state: &mut GameState, question: Question) -> Vec<Effect> {
    if let Some(reveal) = state.reveal.take() {
        state.players = reveal.players;
    }

    state.round += 1;
    info!(
        "Question {}/{} (round {})",
        question.question_number, question.total_questions, state.round
    );
    state.question = Some(question);
    state.countdown = None;
    state.selected = None;
    state.result = None;
    state.correct_option = None;
    state.score_overlay = None;
    state.phase = Phase::Question;

    vec![stop_countdown(state), Effect::CancelReveal]
}

fn start_timer(state: &mut GameState, duration: u32) -> Vec<Effect> {
    if state.phase != Phase::Question || state.reveal.is_some() {
        debug!("Timer event outside of an open question, ignoring");
        return Vec::new();
    }

    state.countdown = Some(Countdown::new(duration));
    if state.focused && duration > 0 {
        vec![start_countdown(state)]
    } else {
        Vec::new()
    }
}

fn tick(state: &mut GameState, ticker: u64) -> Vec<Effect> {
    if ticker != state.ticker {
        debug!("Tick from stopped ticker {}, ignoring", ticker);
        return Vec::new();
    }
    if state.phase != Phase::Question || !state.focused {
        return Vec::new();
    }
    let countdown = match state.countdown.as_mut() {
        Some(countdown) if !countdown.is_expired() => countdown,
        _ => return Vec::new(),
    };

    countdown.time_left -= 1;
    if countdown.is_expired() {
        info!("Time is up for round {}", state.round);
        vec![stop_countdown(state)]
    } else {
        Vec::new()
    }
}

/// Every start or stop invalidates ticks already queued by older tickers.
fn start_countdown(state: &mut GameState) -> Effect {
    state.ticker += 1;
    Effect::StartCountdown {
        ticker: state.ticker,
    }
}

fn stop_countdown(state: &mut GameState) -> Effect {
    state.ticker += 1;
    Effect::StopCountdown
}

fn answer_result(state: &mut GameState, result: AnswerResult) -> Vec<Effect> {
    if state.phase != Phase::Question || state.result.is_some() {
        warn!("Unexpected answer result in {:?}, ignoring", state.phase);
        return Vec::new();
    }

    info!(
        "Answer result: correct={} awarded={}",
        result.is_correct, result.score_awarded
    );
    state.correct_option = Some(result.correct_option_id.clone());
    if result.score_awarded > 0 {
        state.score_overlay = Some(result.score_awarded);
    }
    state.result = Some(result);
    Vec::new()
}

fn show_leaderboard(state: &mut GameState, board: Leaderboard) -> Vec<Effect> {
    if state.phase != Phase::Question {
        apply_standings(state, board.players);
        state.phase = Phase::Results;
        return Vec::new();
    }

    if state.correct_option.is_none() {
        state.correct_option = board.correct_option_id;
    }
    if let Some(pending) = state.reveal.as_mut() {
        pending.players = board.players;
        return Vec::new();
    }

    state.reveal = Some(PendingReveal {
        round: state.round,
        players: board.players,
    });
    let mut effects = vec![stop_countdown(state)];
    if state.focused {
        effects.push(Effect::ScheduleReveal {
            round: state.round,
            after: state.reveal_window,
        });
    }
    effects
}

fn finish_reveal(state: &mut GameState, round: u64) -> Vec<Effect> {
    match state.reveal.take() {
        Some(reveal) if reveal.round == round && state.phase == Phase::Question => {
            apply_standings(state, reveal.players);
            state.phase = Phase::Results;
        }
        other => {
            debug!("Stale reveal for round {}, ignoring", round);
            state.reveal = other;
        }
    }
    Vec::new()
}

fn focus(state: &mut GameState) -> Vec<Effect> {
    if state.focused {
        return Vec::new();
    }
    state.focused = true;
    if state.phase != Phase::Question {
        return Vec::new();
    }

    if let Some(reveal) = &state.reveal {
        return vec![Effect::ScheduleReveal {
            round: reveal.round,
            after: state.reveal_window,
        }];
    }
    if state.time_left().map_or(false, |left| left > 0) {
        vec![start_countdown(state)]
    } else {
        Vec::new()
    }
}

fn apply_standings(state: &mut GameState, players: Vec<Player>) {
    state.players = players;
    state.score_overlay = None;
}

fn abort(state: &mut GameState, message: String) -> Vec<Effect> {
    warn!("Aborting game: {}", message);
    state.phase = Phase::Aborted;
    state.reveal = None;
    state.error = Some(message.clone());
    vec![
        stop_countdown(state),
        Effect::CancelReveal,
        Effect::Notify(Notification::GameError(message)),
        Effect::Navigate(Screen::Dashboard),
    ]
}
