//! Integration tests for the room system: registry, actors, timers.
//!
//! Every test runs on a paused current-thread runtime, so phase
//! windows elapse instantly and deterministically — sleeping past a
//! deadline lets the room actor fire it before the test resumes.

use std::time::Duration;

use spyline_protocol::{Mode, PlayerId, Role, ServerEvent};
use spyline_room::{GameCommand, GameConfig, RoomRegistry};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

/// One connected player's view: their id and event stream.
struct Client {
    id: PlayerId,
    events: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Client {
    /// Everything delivered since the last drain.
    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// The role this client was just dealt.
    fn dealt_role(&mut self) -> Role {
        self.drain()
            .into_iter()
            .find_map(|e| match e {
                ServerEvent::RoleAssigned { role, .. } => Some(role),
                _ => None,
            })
            .unwrap_or_else(|| panic!("{} received no role handout", self.id))
    }
}

/// Creates a room with players 1..=n (player 1 hosts) and drains the
/// lobby traffic so tests start from a clean stream.
async fn lobby(registry: &mut RoomRegistry, mode: Mode, n: u64) -> Vec<Client> {
    let mut clients = Vec::new();
    let (sender, events) = mpsc::unbounded_channel();
    let code = registry
        .create_room(pid(1), "p1", mode, sender)
        .await
        .unwrap();
    clients.push(Client {
        id: pid(1),
        events,
    });
    for i in 2..=n {
        let (sender, events) = mpsc::unbounded_channel();
        registry
            .join_room(pid(i), &code, &format!("p{i}"), sender)
            .await
            .unwrap();
        clients.push(Client {
            id: pid(i),
            events,
        });
    }
    tokio::task::yield_now().await;
    for client in &mut clients {
        client.drain();
    }
    clients
}

/// Sleeps just past a phase window so the room's deadline fires first.
async fn elapse(window: Duration) {
    tokio::time::sleep(window + Duration::from_millis(1)).await;
}

fn config() -> GameConfig {
    GameConfig::default()
}

// =========================================================================
// Lobby flow
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_room_announces_code_and_membership() {
    let mut registry = RoomRegistry::new(config());
    let (sender, events) = mpsc::unbounded_channel();
    let code = registry
        .create_room(pid(1), "p1", Mode::Classic, sender)
        .await
        .unwrap();
    tokio::task::yield_now().await;

    let mut host = Client {
        id: pid(1),
        events,
    };
    let events = host.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::RoomCreated { room_code, mode: Mode::Classic } if *room_code == code
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ServerEvent::MembershipUpdated { players, host_id }
            if players.len() == 1 && *host_id == pid(1)
    )));
}

#[tokio::test(start_paused = true)]
async fn test_every_member_sees_each_join() {
    let mut registry = RoomRegistry::new(config());
    let (sender, events) = mpsc::unbounded_channel();
    let code = registry
        .create_room(pid(1), "p1", Mode::Classic, sender)
        .await
        .unwrap();
    tokio::task::yield_now().await;
    let mut host = Client {
        id: pid(1),
        events,
    };
    host.drain();

    let (sender, events) = mpsc::unbounded_channel();
    registry
        .join_room(pid(2), &code, "p2", sender)
        .await
        .unwrap();
    let mut guest = Client {
        id: pid(2),
        events,
    };

    for client in [&mut host, &mut guest] {
        let events = client.drain();
        let snapshot = events.iter().find_map(|e| match e {
            ServerEvent::MembershipUpdated { players, .. } => Some(players.clone()),
            _ => None,
        });
        let players = snapshot.unwrap_or_else(|| panic!("{} saw no membership", client.id));
        assert_eq!(players.len(), 2);
        assert!(players[0].is_host);
    }
}

// =========================================================================
// Classic mode: full round
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_classic_round_catches_a_unanimously_accused_spy() {
    let mut registry = RoomRegistry::new(config());
    let mut clients = lobby(&mut registry, Mode::Classic, 4).await;

    registry
        .route_command(pid(1), GameCommand::Start)
        .await
        .unwrap();

    // Exactly one spy was dealt; everyone got exactly one handout.
    let roles: Vec<(PlayerId, Role)> = clients
        .iter_mut()
        .map(|c| (c.id, c.dealt_role()))
        .collect();
    let spies: Vec<PlayerId> = roles
        .iter()
        .filter(|(_, role)| *role == Role::Spy)
        .map(|(id, _)| *id)
        .collect();
    assert_eq!(spies.len(), 1);
    let spy = spies[0];

    // The discussion window elapses and voting opens for everyone.
    elapse(config().discussion_window).await;
    for client in &mut clients {
        let events = client.drain();
        let targets = events
            .iter()
            .find_map(|e| match e {
                ServerEvent::VotingStarted { voteable_players } => Some(voteable_players.clone()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("{} saw no voting prompt", client.id));
        assert_eq!(targets.len(), 3);
        assert!(targets.iter().all(|t| t.id != client.id));
    }

    // Everyone piles on the spy; the spy deflects at player 1 (or 2).
    let decoy_target = if spy == pid(1) { pid(2) } else { pid(1) };
    for id in (1..=4).map(pid) {
        let target = if id == spy { decoy_target } else { spy };
        registry
            .route_command(id, GameCommand::Vote { target: Some(target) })
            .await
            .unwrap();
    }

    // The last vote resolves the round without waiting out the window.
    for client in &mut clients {
        let events = client.drain();
        let resolved = events
            .iter()
            .find_map(|e| match e {
                ServerEvent::RoundResolved {
                    spy_caught,
                    selected_name,
                    players,
                } => Some((*spy_caught, selected_name.clone(), players.clone())),
                _ => None,
            })
            .unwrap_or_else(|| panic!("{} saw no resolution", client.id));
        let (spy_caught, selected_name, players) = resolved;
        assert!(spy_caught);
        assert_eq!(selected_name, Some(format!("p{}", spy.0)));
        for player in &players {
            let expected = if player.id == spy { 0 } else { 1 };
            assert_eq!(player.score, expected, "wrong score for {}", player.id);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_voting_window_expires_into_spy_evasion() {
    let mut registry = RoomRegistry::new(config());
    let mut clients = lobby(&mut registry, Mode::Classic, 3).await;

    registry
        .route_command(pid(1), GameCommand::Start)
        .await
        .unwrap();
    elapse(config().discussion_window).await;
    for client in &mut clients {
        client.drain();
    }

    // Nobody votes; the window expires and the spies evade.
    elapse(config().voting_window).await;
    let events = clients[0].drain();
    let resolved = events.iter().find_map(|e| match e {
        ServerEvent::RoundResolved {
            spy_caught,
            selected_name,
            ..
        } => Some((*spy_caught, selected_name.clone())),
        _ => None,
    });
    assert_eq!(resolved, Some((false, None)));
}

#[tokio::test(start_paused = true)]
async fn test_non_host_start_gets_an_error_event() {
    let mut registry = RoomRegistry::new(config());
    let mut clients = lobby(&mut registry, Mode::Classic, 3).await;

    registry
        .route_command(pid(2), GameCommand::Start)
        .await
        .unwrap();

    let events = clients[1].drain();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, ServerEvent::Error { .. })),
        "the rejected sender should hear about it"
    );
    // Nobody else does, and no round started.
    assert!(clients[0].drain().is_empty());
    assert!(clients[2].drain().is_empty());
}

// =========================================================================
// Lightning mode
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_lightning_runs_two_rotations_of_timed_turns() {
    let mut registry = RoomRegistry::new(config());
    let mut clients = lobby(&mut registry, Mode::Lightning, 3).await;

    registry
        .route_command(pid(1), GameCommand::Start)
        .await
        .unwrap();

    let opening = clients[0].drain();
    assert!(opening.iter().any(|e| matches!(
        e,
        ServerEvent::TurnStarted { player_id, rotation: 1, .. } if *player_id == pid(1)
    )));

    // Each elapsed window hands the turn to the next player in join
    // order; after two full rotations, voting opens instead.
    let mut speakers = Vec::new();
    for _ in 0..5 {
        elapse(config().turn_window).await;
        for event in clients[0].drain() {
            if let ServerEvent::TurnStarted {
                player_id,
                rotation,
                ..
            } = event
            {
                speakers.push((player_id, rotation));
            }
        }
    }
    assert_eq!(
        speakers,
        vec![
            (pid(2), 1),
            (pid(3), 1),
            (pid(1), 2),
            (pid(2), 2),
            (pid(3), 2),
        ]
    );

    elapse(config().turn_window).await;
    assert!(
        clients[0]
            .drain()
            .iter()
            .any(|e| matches!(e, ServerEvent::VotingStarted { .. }))
    );
}

// =========================================================================
// Membership churn
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_host_disconnect_migrates_and_unindexes() {
    let mut registry = RoomRegistry::new(config());
    let mut clients = lobby(&mut registry, Mode::Classic, 3).await;

    registry.disconnect(pid(1)).await;
    assert_eq!(registry.player_room(pid(1)), None);
    assert_eq!(registry.room_count(), 1);

    let events = clients[1].drain();
    let host_id = events.iter().find_map(|e| match e {
        ServerEvent::MembershipUpdated { host_id, .. } => Some(*host_id),
        _ => None,
    });
    assert_eq!(host_id, Some(pid(2)));

    // The departed host hears nothing more.
    assert!(clients[0].drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_voter_disconnecting_resolves_the_round() {
    let mut registry = RoomRegistry::new(config());
    let mut clients = lobby(&mut registry, Mode::Classic, 3).await;

    registry
        .route_command(pid(1), GameCommand::Start)
        .await
        .unwrap();
    elapse(config().discussion_window).await;

    registry
        .route_command(pid(1), GameCommand::Vote { target: None })
        .await
        .unwrap();
    registry
        .route_command(pid(2), GameCommand::Vote { target: None })
        .await
        .unwrap();

    // Player 3 never votes; their disconnect completes the tally.
    registry.disconnect(pid(3)).await;
    assert!(
        clients[0]
            .drain()
            .iter()
            .any(|e| matches!(e, ServerEvent::RoundResolved { .. }))
    );
}

// =========================================================================
// Round lifecycle and teardown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_new_round_redeals_and_end_game_closes_the_room() {
    let mut registry = RoomRegistry::new(config());
    let mut clients = lobby(&mut registry, Mode::Classic, 3).await;

    registry
        .route_command(pid(1), GameCommand::Start)
        .await
        .unwrap();
    elapse(config().discussion_window).await;
    elapse(config().voting_window).await;
    for client in &mut clients {
        client.drain();
    }

    // Next round: a fresh handout for everyone, scores intact.
    registry
        .route_command(pid(1), GameCommand::NewRound)
        .await
        .unwrap();
    for client in &mut clients {
        client.dealt_role();
    }

    // Resolve again, then the host ends the session.
    elapse(config().discussion_window).await;
    elapse(config().voting_window).await;
    registry
        .route_command(pid(1), GameCommand::EndGame)
        .await
        .unwrap();

    let events = clients[1].drain();
    let ended = events.iter().find_map(|e| match e {
        ServerEvent::GameEnded {
            winner_name,
            winner_score,
        } => Some((winner_name.clone(), *winner_score)),
        _ => None,
    });
    // Two rounds of spy evasion: the spy of at least one round holds
    // the top score.
    let (_, score) = ended.expect("no GameEnded broadcast");
    assert!(score >= 2);

    // The registry noticed the close and forgot everything.
    assert_eq!(registry.room_count(), 0);
    for id in (1..=3).map(pid) {
        assert_eq!(registry.player_room(id), None);
    }
}
