use crossbeam_queue::SegQueue;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{ClientError, Result},
    handlers::connection_handler::ConnectionHandle,
    helpers::validate_nickname,
    jwtoken::decode_token,
    models::lobby::{Player, Session, User},
    storage::Storage,
};

/// Short-lived messages for the user, shown once and dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    ConnectionError(String),
    GameError(String),
    SendFailed(String),
}

/// Queue shared between the session store and the game handler.
#[derive(Clone, Default)]
pub struct Notifications {
    queue: Arc<SegQueue<Notification>>,
}

impl Notifications {
    pub fn push(&self, notification: Notification) {
        self.queue.push(notification);
    }

    pub fn drain(&self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Some(notification) = self.queue.pop() {
            drained.push(notification);
        }
        drained
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Everything one running client knows about who it is and what it is playing.
///
/// Passed explicitly to whatever needs it; dropping it closes the connection.
pub struct SessionStore {
    storage: Storage,
    user: Option<User>,
    token: Option<String>,
    session: Option<Session>,
    connection: Option<ConnectionHandle>,
    notifications: Notifications,
}

impl SessionStore {
    /// Loads the persisted identity. An expired or unreadable token is forgotten.
    pub fn restore(storage: Storage) -> Result<Self> {
        let mut token = storage.auth_token()?;
        let mut user = None;

        if let Some(raw) = token.as_deref() {
            match decode_token(raw) {
                Ok(data) => {
                    info!("Restored signed-in user {}", data.claims.id);
                    user = Some(data.claims.user());
                }
                Err(error) => {
                    warn!("Discarding stored token: {}", error);
                    storage.clear_identity()?;
                    token = None;
                }
            }
        }
        if user.is_none() {
            user = storage.profile()?;
        }

        Ok(SessionStore {
            storage,
            user,
            token,
            session: None,
            connection: None,
            notifications: Notifications::default(),
        })
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<String> {
        self.token.clone()
    }

    /// Returns the current user, creating and persisting a guest profile when there is none.
    pub fn ensure_user(&mut self, nickname: &str) -> Result<User> {
        let nickname = validate_nickname(nickname)?;
        let user = match self.user.take() {
            Some(mut user) => {
                user.nickname = nickname;
                user
            }
            None => {
                let user = User {
                    id: Uuid::new_v4().to_string(),
                    nickname,
                };
                info!("Created guest profile {}", user.id);
                user
            }
        };
        self.storage.save_profile(&user)?;
        self.user = Some(user.clone());
        Ok(user)
    }

    pub fn sign_in(&mut self, token: &str) -> Result<User> {
        let user = decode_token(token)?.claims.user();
        self.storage.save_auth_token(token)?;
        self.storage.save_profile(&user)?;
        self.token = Some(token.to_string());
        self.user = Some(user.clone());
        info!("Signed in as {}", user.id);
        Ok(user)
    }

    pub fn sign_out(&mut self) -> Result<()> {
        self.storage.clear_identity()?;
        self.token = None;
        self.user = None;
        Ok(())
    }

    pub fn attach_connection(&mut self, connection: ConnectionHandle) {
        self.connection = Some(connection);
    }

    pub fn connection_mut(&mut self) -> Result<&mut ConnectionHandle> {
        self.connection.as_mut().ok_or(ClientError::NotConnected)
    }

    /// Lends the connection out, e.g. to a running game. Give it back with
    /// [`SessionStore::attach_connection`].
    pub fn take_connection(&mut self) -> Result<ConnectionHandle> {
        self.connection.take().ok_or(ClientError::NotConnected)
    }

    pub async fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn create_session(&mut self, session: Session) {
        info!(
            "Session {} created (host: {}, players: {})",
            session.pin,
            session.is_host,
            session.players.len()
        );
        self.session = Some(session);
    }

    pub fn update_players(&mut self, players: Vec<Player>) {
        if let Some(session) = self.session.as_mut() {
            session.players = players;
        }
    }

    pub fn destroy_session(&mut self) -> Option<Session> {
        let session = self.session.take();
        if let Some(session) = &session {
            info!("Session {} destroyed", session.pin);
        }
        session
    }

    pub fn notifications(&self) -> Notifications {
        self.notifications.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwtoken::tests::issue_token;
    use chrono::Duration;

    #[test]
    fn guest_profile_is_created_once() {
        let mut store = SessionStore::restore(Storage::open_in_memory().unwrap()).unwrap();
        assert!(store.user().is_none());

        let first = store.ensure_user("ann").unwrap();
        let second = store.ensure_user("annie").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.nickname, "annie");
    }

    #[test]
    fn rejects_empty_nickname() {
        let mut store = SessionStore::restore(Storage::open_in_memory().unwrap()).unwrap();
        assert!(matches!(
            store.ensure_user("  "),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn restores_signed_in_user_from_token() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .save_auth_token(&issue_token("u-7", "bob", Duration::hours(1)))
            .unwrap();

        let store = SessionStore::restore(storage).unwrap();
        assert_eq!(store.user().unwrap().id, "u-7");
        assert!(store.token().is_some());
    }

    #[test]
    fn expired_token_is_forgotten() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .save_auth_token(&issue_token("u-7", "bob", Duration::days(-3)))
            .unwrap();

        let store = SessionStore::restore(storage).unwrap();
        assert!(store.user().is_none());
        assert!(store.token().is_none());
    }

    #[test]
    fn sign_in_then_sign_out() {
        let mut store = SessionStore::restore(Storage::open_in_memory().unwrap()).unwrap();
        let user = store
            .sign_in(&issue_token("u-9", "cat", Duration::hours(1)))
            .unwrap();
        assert_eq!(user.nickname, "cat");
        assert!(store.token().is_some());

        store.sign_out().unwrap();
        assert!(store.user().is_none());
        assert!(store.token().is_none());
    }

    #[test]
    fn session_lifecycle() {
        let mut store = SessionStore::restore(Storage::open_in_memory().unwrap()).unwrap();
        store.create_session(Session::new("1234".to_string(), Vec::new(), true));
        store.update_players(vec![Player {
            id: "p1".to_string(),
            nickname: "ann".to_string(),
            score: 0,
        }]);
        assert_eq!(store.session().unwrap().players.len(), 1);

        let session = store.destroy_session().unwrap();
        assert_eq!(session.pin, "1234");
        assert!(store.session().is_none());
    }

    #[test]
    fn notifications_drain_in_order() {
        let notifications = Notifications::default();
        notifications.push(Notification::ConnectionError("one".to_string()));
        notifications.push(Notification::GameError("two".to_string()));

        assert_eq!(
            notifications.drain(),
            vec![
                Notification::ConnectionError("one".to_string()),
                Notification::GameError("two".to_string()),
            ]
        );
        assert!(notifications.is_empty());
    }

    #[test]
    fn connection_is_required() {
        let mut store = SessionStore::restore(Storage::open_in_memory().unwrap()).unwrap();
        assert!(matches!(
            store.connection_mut(),
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(
            store.take_connection(),
            Err(ClientError::NotConnected)
        ));
    }
}
