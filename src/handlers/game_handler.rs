use crate::{
    handlers::{
        connection_handler::{ConnectionEvent, ConnectionHandle},
        phase_handler::{reduce, Effect, GameState, Input, Screen},
        timeout_handler::{Timers, TICK_PERIOD},
    },
    models::{
        communication::{ClientCommand, PinPayload},
        game::Phase,
        lobby::Player,
    },
    session::{Notification, Notifications},
};
use futures_channel::mpsc::{unbounded, UnboundedReceiver};
use futures_util::StreamExt;
use log::{info, warn};
use std::time::Duration;

/// What the player did on the game screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserAction {
    SelectOption(String),
    /// Zero-based position in the current question's option list.
    SelectIndex(usize),
    Focus,
    Blur,
    Leave,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameOutcome {
    Finished(Vec<Player>),
    Aborted(String),
    Left,
}

enum Step {
    Connection(Option<ConnectionEvent>),
    User(Option<UserAction>),
    Timer(Input),
}

/// Runs one game screen: the only writer of its [`GameState`].
pub struct GameHandler {
    pin: String,
    state: GameState,
    timers: Timers,
    timer_inputs: UnboundedReceiver<Input>,
    notifications: Notifications,
    destination: Option<Screen>,
}

impl GameHandler {
    pub fn new(pin: impl Into<String>, state: GameState, notifications: Notifications) -> Self {
        Self::with_tick_period(pin, state, notifications, TICK_PERIOD)
    }

    pub fn with_tick_period(
        pin: impl Into<String>,
        state: GameState,
        notifications: Notifications,
        tick_period: Duration,
    ) -> Self {
        let (tx, rx) = unbounded();
        GameHandler {
            pin: pin.into(),
            state,
            timers: Timers::new(tx, tick_period),
            timer_inputs: rx,
            notifications,
            destination: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn destination(&self) -> Option<Screen> {
        self.destination
    }

    /// Plays until the game finishes, aborts or the player leaves.
    ///
    /// `on_change` sees the state after every processed input. All timers
    /// started here are cancelled before this returns.
    pub async fn run<F>(
        &mut self,
        connection: &mut ConnectionHandle,
        actions: &mut UnboundedReceiver<UserAction>,
        mut on_change: F,
    ) -> GameOutcome
    where
        F: FnMut(&GameState),
    {
        info!("Entering game {}", &self.pin);
        self.send(
            connection,
            ClientCommand::PlayerReadyForQuestion(PinPayload {
                pin: self.pin.clone(),
            }),
        );
        on_change(&self.state);

        let outcome = loop {
            let step = tokio::select! {
                event = connection.next_event() => Step::Connection(event),
                action = actions.next() => Step::User(action),
                Some(input) = self.timer_inputs.next() => Step::Timer(input),
            };

            let input = match step {
                Step::Connection(Some(ConnectionEvent::Event(event))) => Input::Server(event),
                Step::Connection(Some(ConnectionEvent::Connected)) => continue,
                Step::Connection(Some(ConnectionEvent::Reconnecting { attempt, reason })) => {
                    warn!("Connection dropped mid-game (attempt {}): {}", attempt, reason);
                    self.notifications
                        .push(Notification::ConnectionError(reason.clone()));
                    Input::ConnectionLost(reason)
                }
                Step::Connection(Some(ConnectionEvent::Closed { reason })) => {
                    Input::ConnectionLost(reason)
                }
                Step::Connection(None) => Input::ConnectionLost("connection closed".to_string()),
                Step::User(None) | Step::User(Some(UserAction::Leave)) => break GameOutcome::Left,
                Step::User(Some(UserAction::SelectOption(option_id))) => {
                    Input::SelectOption(option_id)
                }
                Step::User(Some(UserAction::SelectIndex(index))) => {
                    match self.state.option_id_at(index) {
                        Some(option_id) => Input::SelectOption(option_id),
                        None => continue,
                    }
                }
                Step::User(Some(UserAction::Focus)) => Input::Focus,
                Step::User(Some(UserAction::Blur)) => Input::Blur,
                Step::Timer(input) => input,
            };

            self.dispatch(input, connection);
            on_change(&self.state);

            match self.state.phase {
                Phase::Finished => break GameOutcome::Finished(self.state.players.clone()),
                Phase::Aborted => {
                    break GameOutcome::Aborted(self.state.error.clone().unwrap_or_default())
                }
                _ => (),
            }
        };

        self.timers.cancel_all();
        info!("Leaving game {}: {:?}", &self.pin, outcome);
        outcome
    }

    fn dispatch(&mut self, input: Input, connection: &ConnectionHandle) {
        for effect in reduce(&mut self.state, input) {
            match effect {
                Effect::Send(command) => self.send(connection, command),
                Effect::StartCountdown { ticker } => self.timers.start_countdown(ticker),
                Effect::StopCountdown => self.timers.stop_countdown(),
                Effect::ScheduleReveal { round, after } => {
                    self.timers.schedule_reveal(round, after)
                }
                Effect::CancelReveal => self.timers.cancel_reveal(),
                Effect::Navigate(screen) => {
                    info!("Navigating to {:?}", screen);
                    self.destination = Some(screen);
                }
                Effect::Notify(notification) => self.notifications.push(notification),
            }
        }
    }

    fn send(&self, connection: &ConnectionHandle, command: ClientCommand) {
        let name = command.name();
        if let Err(error) = connection.send(command) {
            warn!("Could not send {}: {}", name, error);
            self.notifications
                .push(Notification::SendFailed(format!("{}: {}", name, error)));
        }
    }
}
