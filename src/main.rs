use futures_channel::mpsc::{unbounded, UnboundedSender};
use log::{info, warn};
use quiz_client::{
    config::ClientConfig,
    error::Result,
    handlers::{
        command_handler::{host_game, join_game, leave_game, play_game, start_game},
        connection_handler::{connect, ConnectionSettings},
        game_handler::{GameHandler, GameOutcome, UserAction},
        phase_handler::GameState,
    },
    loggers::file_logger::init_file_logger,
    models::lobby::Session,
    render::render,
    session::SessionStore,
    storage::Storage,
};
use std::{env, fs};
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};

enum Mode {
    Join { pin: String, nickname: String },
    Host { quiz_id: String, nickname: String },
}

fn parse_args() -> Option<Mode> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [mode, pin, nickname] if mode == "join" => Some(Mode::Join {
            pin: pin.clone(),
            nickname: nickname.clone(),
        }),
        [mode, quiz_id, nickname] if mode == "host" => Some(Mode::Host {
            quiz_id: quiz_id.clone(),
            nickname: nickname.clone(),
        }),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mode = match parse_args() {
        Some(mode) => mode,
        None => {
            eprintln!("usage: quiz-client join <pin> <nickname>");
            eprintln!("       quiz-client host <quiz-id> <nickname>");
            return Ok(());
        }
    };

    let config = ClientConfig::from_env()?;
    fs::create_dir_all(&config.log_dir)?;
    init_file_logger(&config.log_dir)?;
    info!("App started!");

    let mut store = SessionStore::restore(Storage::open(&config.storage_path)?)?;
    let nickname = match &mode {
        Mode::Join { nickname, .. } | Mode::Host { nickname, .. } => nickname.clone(),
    };
    let user = store.ensure_user(&nickname)?;
    let token = store.token();
    store.attach_connection(connect(ConnectionSettings::from(&config), token));

    let mut lines = BufReader::new(stdin()).lines();
    let session = match mode {
        Mode::Join { pin, nickname } => {
            join_game(&mut store, &pin, &nickname, config.handshake_timeout()).await
        }
        Mode::Host { quiz_id, .. } => {
            host(&mut store, &quiz_id, &config, &mut lines).await
        }
    };
    let session = match session {
        Ok(session) => session,
        Err(error) => {
            eprintln!("{}", error);
            store.disconnect().await;
            return Ok(());
        }
    };
    if session.is_host {
        println!("Hosting game {} as {}", session.pin, user.nickname);
    } else {
        println!("Joined game {} as {}", session.pin, user.nickname);
    }
    println!("Type an option number to answer, q to leave.");

    let (action_tx, mut actions) = unbounded();
    tokio::spawn(read_actions(lines, action_tx));

    let state = GameState::new(config.reveal_window())
        .with_local_player(user.id.clone())
        .with_players(session.players.clone());
    let mut game = GameHandler::new(session.pin.clone(), state, store.notifications());

    let mut last_view = String::new();
    let notifications = store.notifications();
    let outcome = play_game(&mut store, &mut game, &mut actions, |state| {
        for notification in notifications.drain() {
            println!("! {:?}", notification);
        }
        let view = render(state);
        if view != last_view {
            println!("{}", view);
            last_view = view;
        }
    })
    .await?;

    match outcome {
        GameOutcome::Finished(_) => println!("Thanks for playing!"),
        GameOutcome::Aborted(reason) => println!("Back to the dashboard: {}", reason),
        GameOutcome::Left => println!("You left the game."),
    }

    if let Err(error) = leave_game(&mut store) {
        warn!("Error leaving game: {}", error);
    }
    store.disconnect().await;
    Ok(())
}

async fn host(
    store: &mut SessionStore,
    quiz_id: &str,
    config: &ClientConfig,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<Session> {
    let session = host_game(store, quiz_id, config.handshake_timeout()).await?;
    println!("Game pin: {}. Press enter to start.", session.pin);
    lines.next_line().await?;
    start_game(store)?;
    Ok(session)
}

async fn read_actions(mut lines: Lines<BufReader<Stdin>>, actions: UnboundedSender<UserAction>) {
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        let action = if line == "q" {
            UserAction::Leave
        } else {
            match line.parse::<usize>() {
                Ok(number) if number > 0 => UserAction::SelectIndex(number - 1),
                _ => {
                    println!("Unknown input: {}", line);
                    continue;
                }
            }
        };
        if actions.unbounded_send(action).is_err() {
            return;
        }
    }
    let _ = actions.unbounded_send(UserAction::Leave);
}
