use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use parlor_game::{Game, GameError};
use parlor_types::events::{GatewayCommand, GatewayEvent};

use crate::registry::{self, AppState};
use crate::error::RegistryError;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Handle a single WebSocket connection.
///
/// Each connection owns one game session; registry events flow in from the
/// dispatcher's broadcast channel, game replies through the targeted one.
pub async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut sender, receiver) = socket.split();

    let (conn_id, conn_rx) = state.dispatcher.register().await;
    info!("client {} connected to gateway", conn_id);

    // Push the current registry snapshot so the client renders without
    // having to ask first.
    match registry::list_users(&state).await {
        Ok(rows) => {
            if send_event(&mut sender, &GatewayEvent::UserList { rows })
                .await
                .is_err()
            {
                state.dispatcher.unregister(conn_id).await;
                return;
            }
        }
        Err(err) => warn!("initial user list fetch failed: {err}"),
    }

    let broadcast_rx = state.dispatcher.subscribe();

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received;

    let mut send_task = tokio::spawn(run_send_loop(
        sender,
        broadcast_rx,
        conn_rx,
        pong_flag_send,
    ));

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(run_recv_loop(
        receiver,
        recv_state,
        conn_id,
        pong_flag_recv,
    ));

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.dispatcher.unregister(conn_id).await;
    info!("client {} disconnected from gateway", conn_id);
}

/// Forward broadcast and targeted events to the client, keeping the
/// heartbeat going.
async fn run_send_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut broadcast_rx: broadcast::Receiver<GatewayEvent>,
    mut conn_rx: tokio::sync::mpsc::UnboundedReceiver<GatewayEvent>,
    pong_received: Arc<AtomicBool>,
) {
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;
    let mut missed_heartbeats: u8 = 0;

    loop {
        tokio::select! {
            result = broadcast_rx.recv() => {
                let event = match result {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} events", n);
                        continue;
                    }
                    Err(_) => break,
                };
                if send_event(&mut sender, &event).await.is_err() {
                    break;
                }
            }
            result = conn_rx.recv() => {
                let Some(event) = result else { break };
                if send_event(&mut sender, &event).await.is_err() {
                    break;
                }
            }
            _ = heartbeat.tick() => {
                if pong_received.swap(false, Ordering::Acquire) {
                    missed_heartbeats = 0;
                } else {
                    missed_heartbeats += 1;
                    if missed_heartbeats >= 2 {
                        warn!("heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                        break;
                    }
                }
                if sender.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Parse inbound commands and drive this connection's game session.
async fn run_recv_loop(
    mut receiver: SplitStream<WebSocket>,
    state: AppState,
    conn_id: Uuid,
    pong_received: Arc<AtomicBool>,
) {
    let mut game = Game::new();

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                Ok(cmd) => handle_command(&state, conn_id, &mut game, cmd).await,
                Err(err) => {
                    warn!(
                        "client {} bad command: {} -- raw: {}",
                        conn_id,
                        err,
                        &text[..text.len().min(200)]
                    );
                    state
                        .dispatcher
                        .send_to(
                            conn_id,
                            GatewayEvent::Error {
                                message: "unrecognized command".to_string(),
                            },
                        )
                        .await;
                }
            },
            Message::Pong(_) => pong_received.store(true, Ordering::Release),
            Message::Close(_) => break,
            _ => {}
        }
    }
}

async fn handle_command(state: &AppState, conn_id: Uuid, game: &mut Game, cmd: GatewayCommand) {
    let dispatcher = &state.dispatcher;

    match cmd {
        GatewayCommand::AddUser { user } => match registry::add_user(state, user).await {
            // The service already broadcast the refreshed listing.
            Ok(_) => {}
            Err(RegistryError::Validation(message)) => {
                dispatcher
                    .send_to(
                        conn_id,
                        GatewayEvent::Error {
                            message: message.to_string(),
                        },
                    )
                    .await;
            }
            Err(err) => error!("add-user failed: {err}"),
        },

        GatewayCommand::GetUsers => match registry::list_users(state).await {
            Ok(rows) => {
                dispatcher
                    .send_to(conn_id, GatewayEvent::UserList { rows })
                    .await;
            }
            Err(err) => error!("get-users failed: {err}"),
        },

        GatewayCommand::Start { player1, player2 } => {
            match game.start(&player1, &player2) {
                Ok(()) => {
                    // start just activated the session
                    if let Some(session) = game.session() {
                        dispatcher
                            .send_to(
                                conn_id,
                                GatewayEvent::GameStarted {
                                    players: session.players().clone(),
                                    current_player: session.current_player().to_string(),
                                    rounds_remaining: session.rounds_remaining(),
                                    play_enabled: true,
                                    death_visible: false,
                                },
                            )
                            .await;
                    }
                }
                Err(err) => {
                    dispatcher
                        .send_to(
                            conn_id,
                            GatewayEvent::Error {
                                message: err.to_string(),
                            },
                        )
                        .await;
                }
            }
        }

        GatewayCommand::Play => match game.play() {
            Ok(report) => {
                let event = GatewayEvent::RoundResult {
                    eliminated: report.death_visible(),
                    message: report.message(),
                    play_enabled: report.play_enabled(),
                    death_visible: report.death_visible(),
                    rounds_remaining: report.rounds_remaining,
                    next_player: report.next_player,
                    player: report.player,
                };
                dispatcher.send_to(conn_id, event).await;
            }
            Err(err @ GameError::GameOver) => {
                dispatcher
                    .send_to(
                        conn_id,
                        GatewayEvent::GameOver {
                            message: err.to_string(),
                        },
                    )
                    .await;
            }
            Err(err) => {
                dispatcher
                    .send_to(
                        conn_id,
                        GatewayEvent::Error {
                            message: err.to_string(),
                        },
                    )
                    .await;
            }
        },

        GatewayCommand::Reset => {
            game.reset();
            dispatcher.send_to(conn_id, GatewayEvent::GameReset).await;
        }
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &GatewayEvent,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).unwrap();
    sender.send(Message::Text(text.into())).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parlor_db::Database;
    use parlor_types::api::NewUser;

    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::registry::AppStateInner;

    fn test_state() -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            dispatcher: Dispatcher::new(),
        })
    }

    async fn recv_targeted(
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<GatewayEvent>,
    ) -> GatewayEvent {
        rx.try_recv().expect("expected a targeted event")
    }

    #[tokio::test]
    async fn add_user_command_broadcasts_the_new_listing() {
        let state = test_state();
        let (conn_id, _rx) = state.dispatcher.register().await;
        let mut events = state.dispatcher.subscribe();
        let mut game = Game::new();

        let cmd = GatewayCommand::AddUser {
            user: NewUser {
                name: "Ana".into(),
                email: "ana@example.com".into(),
                age: None,
            },
        };
        handle_command(&state, conn_id, &mut game, cmd).await;

        match events.recv().await.unwrap() {
            GatewayEvent::UserList { rows } => assert_eq!(rows[0].name, "Ana"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_add_user_gets_a_targeted_error() {
        let state = test_state();
        let (conn_id, mut rx) = state.dispatcher.register().await;
        let mut game = Game::new();

        let cmd = GatewayCommand::AddUser {
            user: NewUser {
                name: "".into(),
                email: "a@example.com".into(),
                age: None,
            },
        };
        handle_command(&state, conn_id, &mut game, cmd).await;

        assert!(matches!(
            recv_targeted(&mut rx).await,
            GatewayEvent::Error { .. }
        ));
        assert!(registry::list_users(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_users_replies_only_to_the_requester() {
        let state = test_state();
        let (conn_id, mut rx) = state.dispatcher.register().await;
        let (_other_id, mut other_rx) = state.dispatcher.register().await;
        let mut game = Game::new();

        handle_command(&state, conn_id, &mut game, GatewayCommand::GetUsers).await;

        assert!(matches!(
            recv_targeted(&mut rx).await,
            GatewayEvent::UserList { rows } if rows.is_empty()
        ));
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn game_flow_over_the_gateway() {
        let state = test_state();
        let (conn_id, mut rx) = state.dispatcher.register().await;
        let mut game = Game::new();

        // Blank names are refused.
        let cmd = GatewayCommand::Start {
            player1: "".into(),
            player2: "Bia".into(),
        };
        handle_command(&state, conn_id, &mut game, cmd).await;
        assert!(matches!(
            recv_targeted(&mut rx).await,
            GatewayEvent::Error { .. }
        ));

        // A valid start opens play.
        let cmd = GatewayCommand::Start {
            player1: "Ana".into(),
            player2: "Bia".into(),
        };
        handle_command(&state, conn_id, &mut game, cmd).await;
        match recv_targeted(&mut rx).await {
            GatewayEvent::GameStarted {
                current_player,
                rounds_remaining,
                play_enabled,
                death_visible,
                ..
            } => {
                assert_eq!(current_player, "Ana");
                assert_eq!(rounds_remaining, parlor_game::CHAMBER_SIZE);
                assert!(play_enabled);
                assert!(!death_visible);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        // Play until the elimination lands; at most six rounds.
        let mut saw_elimination = false;
        for _ in 0..parlor_game::CHAMBER_SIZE {
            handle_command(&state, conn_id, &mut game, GatewayCommand::Play).await;
            match recv_targeted(&mut rx).await {
                GatewayEvent::RoundResult {
                    eliminated,
                    play_enabled,
                    death_visible,
                    ..
                } => {
                    assert_eq!(play_enabled, !eliminated);
                    assert_eq!(death_visible, eliminated);
                    if eliminated {
                        saw_elimination = true;
                        break;
                    }
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(saw_elimination);

        // The session is terminal now.
        handle_command(&state, conn_id, &mut game, GatewayCommand::Play).await;
        assert!(matches!(
            recv_targeted(&mut rx).await,
            GatewayEvent::GameOver { .. }
        ));

        // Reset clears back to setup.
        handle_command(&state, conn_id, &mut game, GatewayCommand::Reset).await;
        assert!(matches!(recv_targeted(&mut rx).await, GatewayEvent::GameReset));
        assert_eq!(game, Game::Setup);
    }

    #[tokio::test]
    async fn play_before_start_is_a_targeted_error() {
        let state = test_state();
        let (conn_id, mut rx) = state.dispatcher.register().await;
        let mut game = Game::new();

        handle_command(&state, conn_id, &mut game, GatewayCommand::Play).await;
        match recv_targeted(&mut rx).await {
            GatewayEvent::Error { message } => {
                assert_eq!(message, GameError::NotStarted.to_string());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
