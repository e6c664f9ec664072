use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("tls error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("not connected to the game server")]
    NotConnected,

    #[error("not part of a game")]
    NoSession,

    #[error("only the host can start the game")]
    NotHost,

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("logger setup failed: {0}")]
    Logger(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Input problems caught before anything reaches the server.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("game pin is required")]
    EmptyPin,
    #[error("game pin must be digits only")]
    MalformedPin,
    #[error("nickname is required")]
    EmptyNickname,
    #[error("nickname is longer than {0} characters")]
    NicknameTooLong(usize),
    #[error("quiz id is required")]
    EmptyQuizId,
}

pub type Result<T> = std::result::Result<T, ClientError>;
