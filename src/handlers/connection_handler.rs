use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
    helpers::{command_message, parse_event},
    models::communication::{ClientCommand, ServerEvent},
};
use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_timer::Delay;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use rand::Rng;
use std::time::Duration;
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tungstenite::Message;
use uuid::Uuid;

type Tx = UnboundedSender<Message>;
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Clone, Debug)]
pub struct ConnectionSettings {
    pub url: String,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub reconnect_jitter: Duration,
    pub accept_invalid_certs: bool,
}

impl ConnectionSettings {
    fn backoff(&self) -> Duration {
        let jitter_ms = self.reconnect_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.reconnect_delay + Duration::from_millis(jitter)
    }
}

impl From<&ClientConfig> for ConnectionSettings {
    fn from(config: &ClientConfig) -> Self {
        ConnectionSettings {
            url: config.server_url.clone(),
            max_reconnect_attempts: config.max_reconnect_attempts,
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            reconnect_jitter: Duration::from_millis(config.reconnect_jitter_ms),
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionEvent {
    Connected,
    Event(ServerEvent),
    Reconnecting { attempt: u32, reason: String },
    /// The connection is gone for good, either closed by the client or out of retries.
    Closed { reason: String },
}

/// The client's single link to the game server.
pub struct ConnectionHandle {
    id: String,
    outgoing: Tx,
    events: UnboundedReceiver<ConnectionEvent>,
    token: Option<String>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Builds a handle over caller-provided channels with no socket behind it.
    pub fn detached(
        outgoing: Tx,
        events: UnboundedReceiver<ConnectionEvent>,
        token: Option<String>,
    ) -> Self {
        ConnectionHandle {
            id: Uuid::new_v4().to_string(),
            outgoing,
            events,
            token,
            task: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queues a command. It is never retried: if the socket drops before it
    /// is written, it is lost.
    pub fn send(&self, command: ClientCommand) -> Result<()> {
        let name = command.name();
        let msg = command_message(command, self.token.clone())?;
        self.outgoing
            .unbounded_send(msg)
            .map_err(|_| ClientError::NotConnected)?;
        debug!("Queued {} on connection {}", name, &self.id);
        Ok(())
    }

    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        self.events.next().await
    }

    pub async fn close(mut self) {
        info!("Closing connection {}", &self.id);
        self.outgoing.close_channel();
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                warn!("Connection task ended abnormally: {}", error);
            }
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub fn connect(settings: ConnectionSettings, token: Option<String>) -> ConnectionHandle {
    let (tx, rx) = unbounded();
    let (event_tx, event_rx) = unbounded();
    let connection_id = Uuid::new_v4().to_string();

    let task = tokio::spawn(handle_connection(
        settings,
        rx,
        event_tx,
        connection_id.clone(),
    ));

    ConnectionHandle {
        id: connection_id,
        outgoing: tx,
        events: event_rx,
        token,
        task: Some(task),
    }
}

enum SocketEnd {
    ClosedByClient,
    Dropped(String),
}

async fn handle_connection(
    settings: ConnectionSettings,
    mut outgoing: UnboundedReceiver<Message>,
    events: UnboundedSender<ConnectionEvent>,
    connection_id: String,
) {
    let mut failures = 0;

    loop {
        let reason = match open_socket(&settings).await {
            Ok(ws_stream) => {
                info!(
                    "WebSocket connection {} established: {}",
                    &connection_id, &settings.url
                );
                failures = 0;
                let _ = events.unbounded_send(ConnectionEvent::Connected);

                match pump(ws_stream, &mut outgoing, &events).await {
                    SocketEnd::ClosedByClient => {
                        info!("Connection {} closed by client", &connection_id);
                        let _ = events.unbounded_send(ConnectionEvent::Closed {
                            reason: "closed by client".to_string(),
                        });
                        return;
                    }
                    SocketEnd::Dropped(reason) => reason,
                }
            }
            Err(error) => error.to_string(),
        };

        failures += 1;
        if failures > settings.max_reconnect_attempts {
            warn!(
                "Connection {} giving up after {} attempts: {}",
                &connection_id, settings.max_reconnect_attempts, reason
            );
            let _ = events.unbounded_send(ConnectionEvent::Closed { reason });
            return;
        }

        warn!(
            "Connection {} lost ({}), reconnect attempt {}/{}",
            &connection_id, reason, failures, settings.max_reconnect_attempts
        );
        let _ = events.unbounded_send(ConnectionEvent::Reconnecting {
            attempt: failures,
            reason,
        });
        Delay::new(settings.backoff()).await;

        if drop_queued(&mut outgoing) {
            let _ = events.unbounded_send(ConnectionEvent::Closed {
                reason: "closed by client".to_string(),
            });
            return;
        }
    }
}

async fn open_socket(settings: &ConnectionSettings) -> Result<WsStream> {
    let connector = if settings.accept_invalid_certs {
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        Some(tokio_tungstenite::Connector::NativeTls(tls))
    } else {
        None
    };

    let (ws_stream, _) =
        tokio_tungstenite::connect_async_tls_with_config(settings.url.as_str(), None, connector)
            .await?;
    Ok(ws_stream)
}

async fn pump(
    ws_stream: WsStream,
    outgoing: &mut UnboundedReceiver<Message>,
    events: &UnboundedSender<ConnectionEvent>,
) -> SocketEnd {
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            msg = outgoing.next() => match msg {
                Some(msg) => {
                    if let Err(error) = sink.send(msg).await {
                        return SocketEnd::Dropped(error.to_string());
                    }
                }
                None => {
                    let _ = sink.close().await;
                    return SocketEnd::ClosedByClient;
                }
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) => {
                    return SocketEnd::Dropped("closed by server".to_string());
                }
                Some(Ok(msg)) if msg.is_text() || msg.is_binary() => match parse_event(&msg) {
                    Ok(event) => {
                        let _ = events.unbounded_send(ConnectionEvent::Event(event));
                    }
                    Err(error) => warn!("Error parsing event!: {}", error),
                },
                Some(Ok(_)) => (),
                Some(Err(error)) => return SocketEnd::Dropped(error.to_string()),
                None => return SocketEnd::Dropped("stream ended".to_string()),
            },
        }
    }
}

/// Drops whatever was queued while the socket was down. Returns true once the
/// client side has hung up.
fn drop_queued(outgoing: &mut UnboundedReceiver<Message>) -> bool {
    loop {
        match outgoing.try_next() {
            Ok(Some(_)) => warn!("Dropping message queued while disconnected"),
            Ok(None) => return true,
            Err(_) => return false,
        }
    }
}
