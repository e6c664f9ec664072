use futures_timer::Delay;
use log::{debug, info, warn};
use std::time::Duration;

use futures_channel::mpsc::UnboundedReceiver;

use crate::{
    error::{ClientError, Result, ValidationError},
    handlers::{
        connection_handler::{ConnectionEvent, ConnectionHandle},
        game_handler::{GameHandler, GameOutcome, UserAction},
        phase_handler::GameState,
    },
    helpers::{validate_nickname, validate_pin},
    models::{
        communication::{ClientCommand, HostRequest, JoinRequest, PinPayload, ServerEvent},
        lobby::Session,
    },
    session::{Notification, Notifications, SessionStore},
};

pub async fn join_game(
    store: &mut SessionStore,
    pin: &str,
    nickname: &str,
    timeout: Duration,
) -> Result<Session> {
    let pin = validate_pin(pin)?;
    let nickname = validate_nickname(nickname)?;
    info!("Join game request for pin {}", &pin);

    let notifications = store.notifications();
    let connection = store.connection_mut()?;
    connection.send(ClientCommand::JoinGame(JoinRequest {
        pin: pin.clone(),
        nickname,
    }))?;

    let joined = await_handshake(connection, &notifications, timeout, |event| match event {
        ServerEvent::GameJoined(joined) if joined.pin == pin => Some(joined),
        _ => None,
    })
    .await?;

    let session = Session::new(joined.pin, joined.players, false);
    store.create_session(session.clone());
    info!("Successful join for pin {}", &session.pin);
    Ok(session)
}

pub async fn host_game(store: &mut SessionStore, quiz_id: &str, timeout: Duration) -> Result<Session> {
    let quiz_id = quiz_id.trim();
    if quiz_id.is_empty() {
        return Err(ValidationError::EmptyQuizId.into());
    }
    info!("Host game request for quiz {}", quiz_id);

    let notifications = store.notifications();
    let connection = store.connection_mut()?;
    connection.send(ClientCommand::HostGame(HostRequest {
        quiz_id: quiz_id.to_string(),
    }))?;

    let created = await_handshake(connection, &notifications, timeout, |event| match event {
        ServerEvent::GameCreated(created) => Some(created),
        _ => None,
    })
    .await?;

    let session = Session::new(created.pin, Vec::new(), true);
    store.create_session(session.clone());
    info!("Successful game creation, pin {}", &session.pin);
    Ok(session)
}

pub fn start_game(store: &mut SessionStore) -> Result<()> {
    let session = store.session().ok_or(ClientError::NoSession)?;
    if !session.is_host {
        return Err(ClientError::NotHost);
    }
    let pin = session.pin.clone();

    store
        .connection_mut()?
        .send(ClientCommand::StartGame(PinPayload { pin: pin.clone() }))?;
    info!("Start game command sent for {}", pin);
    Ok(())
}

/// Plays the current session's game. Roster changes seen in the game are
/// written back to the session as they arrive.
pub async fn play_game<F>(
    store: &mut SessionStore,
    game: &mut GameHandler,
    actions: &mut UnboundedReceiver<UserAction>,
    mut on_change: F,
) -> Result<GameOutcome>
where
    F: FnMut(&GameState),
{
    if store.session().is_none() {
        return Err(ClientError::NoSession);
    }
    let mut connection = store.take_connection()?;

    let outcome = game
        .run(&mut connection, actions, |state| {
            if store.session().map_or(false, |session| session.players != state.players) {
                store.update_players(state.players.clone());
            }
            on_change(state);
        })
        .await;

    store.attach_connection(connection);
    Ok(outcome)
}

/// Leaves the current game. The session is destroyed even if the server can't be told.
pub fn leave_game(store: &mut SessionStore) -> Result<()> {
    let session = match store.destroy_session() {
        Some(session) => session,
        None => return Ok(()),
    };

    match store.connection_mut() {
        Ok(connection) => {
            if let Err(error) = connection.send(ClientCommand::LeaveGame(PinPayload {
                pin: session.pin.clone(),
            })) {
                warn!("Could not tell the server we left {}: {}", session.pin, error);
            }
        }
        Err(_) => debug!("No connection, leaving {} locally", session.pin),
    }
    Ok(())
}

async fn await_handshake<T, F>(
    connection: &mut ConnectionHandle,
    notifications: &Notifications,
    timeout: Duration,
    accept: F,
) -> Result<T>
where
    F: Fn(ServerEvent) -> Option<T>,
{
    let mut deadline = Delay::new(timeout);

    loop {
        let event = tokio::select! {
            _ = &mut deadline => {
                return Err(ClientError::Handshake("timed out waiting for the server".to_string()));
            }
            event = connection.next_event() => event,
        };

        match event {
            Some(ConnectionEvent::Event(ServerEvent::GameError(error))) => {
                return Err(ClientError::Handshake(error.message));
            }
            Some(ConnectionEvent::Event(event)) => match accept(event) {
                Some(accepted) => return Ok(accepted),
                None => debug!("Ignoring event while waiting for handshake"),
            },
            Some(ConnectionEvent::Connected) => (),
            Some(ConnectionEvent::Reconnecting { reason, .. }) => {
                notifications.push(Notification::ConnectionError(reason.clone()));
                return Err(ClientError::Handshake(format!("connection lost: {}", reason)));
            }
            Some(ConnectionEvent::Closed { .. }) | None => return Err(ClientError::NotConnected),
        }
    }
}
