//! The room entity: one session's state and its phase machine.
//!
//! ```text
//! Lobby → Assigning → Active → Voting → Resolved → (Assigning | Ended)
//! ```
//!
//! `Assigning` is transient — entered and left within a single command
//! or deadline handler, never observable between events. Host commands
//! drive `Lobby→Assigning`, `Resolved→Assigning` and `Resolved→Ended`;
//! everything else is timer-driven.
//!
//! All methods here are synchronous: they mutate the room and return a
//! batch of `(Recipient, ServerEvent)` pairs for the actor to deliver.
//! Timing is expressed as a single rewritable deadline — every phase
//! transition replaces or clears it, so a timer armed for an abandoned
//! phase can never fire.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rand::Rng;
use spyline_protocol::{
    Mode, PlayerId, PlayerSummary, Recipient, RoomCode, ServerEvent, VoteTarget,
};
use tokio::time::Instant;

use crate::{GameConfig, Player, RoomError, roles, scoring, tally};

/// A batch entry produced by room logic for the actor to deliver.
pub type Outgoing = (Recipient, ServerEvent);

/// Where a room is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Gathering players; the only phase that accepts joins.
    Lobby,
    /// Dealing roles and locations. Transient.
    Assigning,
    /// Discussion (classic) or speaking turns (lightning).
    Active,
    /// Votes are being collected.
    Voting,
    /// Outcome announced; waiting on the host for a new round or the end.
    Resolved,
    /// The session is over; the actor is shutting down.
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "Lobby",
            Self::Assigning => "Assigning",
            Self::Active => "Active",
            Self::Voting => "Voting",
            Self::Resolved => "Resolved",
            Self::Ended => "Ended",
        };
        f.write_str(name)
    }
}

/// An in-room command from a member, already decoded and routed.
#[derive(Debug, Clone)]
pub enum GameCommand {
    /// Host only: deal roles and leave the lobby.
    Start,
    /// Cast or replace a vote; `None` abstains.
    Vote { target: Option<PlayerId> },
    /// Host only: next round, keeping scores.
    NewRound,
    /// Host only: finish the session.
    EndGame,
}

impl GameCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Start => "startGame",
            Self::Vote { .. } => "submitVote",
            Self::NewRound => "newRound",
            Self::EndGame => "endGame",
        }
    }
}

/// One game session's full mutable state.
///
/// Owned exclusively by its room actor; nothing outside the actor holds
/// a reference past the handling of one command.
pub struct Room {
    code: RoomCode,
    mode: Mode,
    config: GameConfig,
    /// Insertion order is display order, speaking order, and the
    /// host-migration line of succession.
    players: Vec<Player>,
    host: PlayerId,
    phase: Phase,
    /// The round's real location, set while a round is live.
    location: Option<String>,
    /// The round's spy identities. Only ever leaves the room inside the
    /// resolved outcome.
    spies: HashSet<PlayerId>,
    /// voter → target. `None` is an abstention. At most one entry per
    /// connected player; entries for departed players are removed.
    votes: HashMap<PlayerId, Option<PlayerId>>,
    /// Current speaker index (lightning mode).
    turn: usize,
    /// Current rotation, 1-based (lightning mode).
    rotation: u8,
    /// The single pending phase deadline. Rewritten or cleared on every
    /// transition; `None` means no timer is armed.
    deadline: Option<Instant>,
}

impl Room {
    /// Creates a room in its lobby with the host as the only member.
    pub fn new(
        code: RoomCode,
        mode: Mode,
        config: GameConfig,
        host: PlayerId,
        host_name: &str,
    ) -> Result<Self, RoomError> {
        let name = clean_name(host_name)?;
        Ok(Self {
            code,
            mode,
            config,
            players: vec![Player::new(host, name)],
            host,
            phase: Phase::Lobby,
            location: None,
            spies: HashSet::new(),
            votes: HashMap::new(),
            turn: 0,
            rotation: 1,
            deadline: None,
        })
    }

    // -- Accessors ---------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn host(&self) -> PlayerId {
        self.host
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// The pending phase deadline, if a timer is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    // -- Membership --------------------------------------------------------

    /// Events announcing a freshly created room to its host.
    pub fn open_events(&self) -> Vec<Outgoing> {
        vec![
            (
                Recipient::All,
                ServerEvent::RoomCreated {
                    room_code: self.code.clone(),
                    mode: self.mode,
                },
            ),
            self.membership_event(),
        ]
    }

    /// Adds a player. Only valid in the lobby.
    pub fn join(&mut self, id: PlayerId, name: &str) -> Result<Vec<Outgoing>, RoomError> {
        if self.phase != Phase::Lobby {
            return Err(RoomError::RoomAlreadyStarted(self.code.clone()));
        }
        let name = clean_name(name)?;
        self.players.push(Player::new(id, name));
        tracing::info!(
            room = %self.code,
            player = %id,
            players = self.players.len(),
            "player joined"
        );
        Ok(vec![
            (
                Recipient::All,
                ServerEvent::RoomJoined {
                    room_code: self.code.clone(),
                    mode: self.mode,
                },
            ),
            self.membership_event(),
        ])
    }

    /// Removes a player in any phase: disconnect is a first-class
    /// membership transition, not an error.
    ///
    /// Handles host migration, vote cleanup, lightning-turn handoff,
    /// and — during `Voting` — re-evaluates the "everyone has voted"
    /// condition against the reduced player count. The caller checks
    /// [`is_empty`](Self::is_empty) afterwards and tears the room down.
    pub fn remove_player(&mut self, id: PlayerId, rng: &mut impl Rng) -> Vec<Outgoing> {
        let Some(index) = self.players.iter().position(|p| p.id == id) else {
            return Vec::new();
        };
        let was_speaking =
            self.phase == Phase::Active && self.mode == Mode::Lightning && index == self.turn;

        self.players.remove(index);
        self.votes.remove(&id);
        for target in self.votes.values_mut() {
            // Votes for the departed become abstentions; the voter
            // still counts as having voted.
            if *target == Some(id) {
                *target = None;
            }
        }
        tracing::info!(
            room = %self.code,
            player = %id,
            remaining = self.players.len(),
            "player left"
        );

        if self.players.is_empty() {
            self.phase = Phase::Ended;
            self.deadline = None;
            return Vec::new();
        }

        if self.host == id {
            self.host = self.players[0].id;
            tracing::info!(room = %self.code, host = %self.host, "host migrated");
        }

        let mut events = vec![self.membership_event()];

        if self.phase == Phase::Active && self.mode == Mode::Lightning {
            if index < self.turn {
                self.turn -= 1;
            }
            if was_speaking {
                // The departed speaker's turn ends immediately; `turn`
                // already points at the next player in order.
                events.extend(self.begin_turn());
            }
        }

        if self.phase == Phase::Voting && self.all_voted() {
            events.extend(self.resolve(rng));
        }

        events
    }

    // -- Commands ----------------------------------------------------------

    /// Applies a member's command. Failures never corrupt room state;
    /// they become an error event unicast back to the sender.
    pub fn handle_command(
        &mut self,
        sender: PlayerId,
        cmd: GameCommand,
        rng: &mut impl Rng,
    ) -> Vec<Outgoing> {
        let name = cmd.name();
        let result = match cmd {
            GameCommand::Start => self.start(sender, rng),
            GameCommand::Vote { target } => self.cast_vote(sender, target, rng),
            GameCommand::NewRound => self.new_round(sender, rng),
            GameCommand::EndGame => self.end_game(sender),
        };
        match result {
            Ok(events) => events,
            Err(err) => {
                tracing::debug!(
                    room = %self.code,
                    player = %sender,
                    command = name,
                    error = %err,
                    "command rejected"
                );
                vec![(
                    Recipient::Player(sender),
                    ServerEvent::Error { kind: err.kind() },
                )]
            }
        }
    }

    /// Fires the pending phase deadline.
    ///
    /// The actor only calls this when the stored deadline elapses, and
    /// every transition rewrites that deadline, so whatever phase we
    /// are in now is the phase the timer belongs to.
    pub fn handle_deadline(&mut self, rng: &mut impl Rng) -> Vec<Outgoing> {
        self.deadline = None;
        match (self.phase, self.mode) {
            (Phase::Active, Mode::Classic) => self.begin_voting(),
            (Phase::Active, Mode::Lightning) => self.advance_turn(),
            (Phase::Voting, _) => self.resolve(rng),
            _ => Vec::new(),
        }
    }

    // -- Transitions -------------------------------------------------------

    fn start(&mut self, sender: PlayerId, rng: &mut impl Rng) -> Result<Vec<Outgoing>, RoomError> {
        if self.phase != Phase::Lobby {
            return Ok(self.ignored("startGame"));
        }
        self.require_host(sender)?;
        if self.players.len() < self.config.min_players {
            return Err(RoomError::InsufficientPlayers {
                required: self.config.min_players,
                present: self.players.len(),
            });
        }
        Ok(self.begin_round(rng))
    }

    fn new_round(
        &mut self,
        sender: PlayerId,
        rng: &mut impl Rng,
    ) -> Result<Vec<Outgoing>, RoomError> {
        if self.phase != Phase::Resolved {
            return Ok(self.ignored("newRound"));
        }
        self.require_host(sender)?;
        self.location = None;
        self.spies.clear();
        for player in &mut self.players {
            player.clear_round();
        }
        Ok(self.begin_round(rng))
    }

    fn end_game(&mut self, sender: PlayerId) -> Result<Vec<Outgoing>, RoomError> {
        if self.phase != Phase::Resolved {
            return Ok(self.ignored("endGame"));
        }
        self.require_host(sender)?;

        // Ties go to the earliest joiner: only a strictly greater score
        // displaces the current leader.
        let mut winner = &self.players[0];
        for player in &self.players[1..] {
            if player.score > winner.score {
                winner = player;
            }
        }
        let (winner_name, winner_score) = (winner.name.clone(), winner.score);

        self.phase = Phase::Ended;
        self.deadline = None;
        tracing::info!(room = %self.code, winner = %winner_name, "game ended");
        Ok(vec![(
            Recipient::All,
            ServerEvent::GameEnded {
                winner_name,
                winner_score,
            },
        )])
    }

    /// `(Lobby | Resolved) → Assigning → Active`, synchronously.
    fn begin_round(&mut self, rng: &mut impl Rng) -> Vec<Outgoing> {
        self.phase = Phase::Assigning;
        self.votes.clear();

        let ids: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        let assignment = roles::assign(&ids, self.config.spy_count, rng);
        self.location = Some(assignment.location.to_string());
        self.spies = assignment.spies;

        let mut events = Vec::with_capacity(self.players.len() + 1);
        for (player, &(id, role, seen)) in
            self.players.iter_mut().zip(assignment.handouts.iter())
        {
            debug_assert_eq!(player.id, id);
            player.role = Some(role);
            player.location = Some(seen.to_string());
            // Unicast only — this is the secrecy boundary.
            events.push((
                Recipient::Player(id),
                ServerEvent::RoleAssigned {
                    role,
                    location: seen.to_string(),
                },
            ));
        }

        self.phase = Phase::Active;
        tracing::info!(
            room = %self.code,
            mode = ?self.mode,
            players = self.players.len(),
            spies = self.spies.len(),
            "round started"
        );

        match self.mode {
            Mode::Classic => {
                self.deadline = Some(Instant::now() + self.config.discussion_window);
            }
            Mode::Lightning => {
                self.turn = 0;
                self.rotation = 1;
                events.push(self.turn_event());
                self.deadline = Some(Instant::now() + self.config.turn_window);
            }
        }
        events
    }

    /// Lightning: the current speaker's window elapsed.
    fn advance_turn(&mut self) -> Vec<Outgoing> {
        self.turn += 1;
        self.begin_turn()
    }

    /// Opens the turn at the current index, wrapping into the next
    /// rotation — or into voting once the rotations are exhausted.
    fn begin_turn(&mut self) -> Vec<Outgoing> {
        if self.turn >= self.players.len() {
            self.turn = 0;
            self.rotation += 1;
            if self.rotation > self.config.rotations {
                return self.begin_voting();
            }
        }
        self.deadline = Some(Instant::now() + self.config.turn_window);
        vec![self.turn_event()]
    }

    fn begin_voting(&mut self) -> Vec<Outgoing> {
        self.phase = Phase::Voting;
        self.votes.clear();
        self.deadline = Some(Instant::now() + self.config.voting_window);
        tracing::info!(room = %self.code, "voting started");

        // Tailored unicasts: each player's target list excludes them,
        // so self-voting is never offered.
        self.players
            .iter()
            .map(|voter| {
                let voteable_players = self
                    .players
                    .iter()
                    .filter(|target| target.id != voter.id)
                    .map(|target| VoteTarget {
                        id: target.id,
                        name: target.name.clone(),
                    })
                    .collect();
                (
                    Recipient::Player(voter.id),
                    ServerEvent::VotingStarted { voteable_players },
                )
            })
            .collect()
    }

    fn cast_vote(
        &mut self,
        sender: PlayerId,
        target: Option<PlayerId>,
        rng: &mut impl Rng,
    ) -> Result<Vec<Outgoing>, RoomError> {
        if self.phase != Phase::Voting {
            return Ok(self.ignored("submitVote"));
        }
        if let Some(target) = target {
            if target == sender || !self.contains(target) {
                tracing::debug!(
                    room = %self.code,
                    voter = %sender,
                    target = %target,
                    "invalid vote target ignored"
                );
                return Ok(Vec::new());
            }
        }

        // A resubmission replaces the earlier entry.
        self.votes.insert(sender, target);

        if self.all_voted() {
            return Ok(self.resolve(rng));
        }
        Ok(Vec::new())
    }

    fn resolve(&mut self, rng: &mut impl Rng) -> Vec<Outgoing> {
        let outcome = tally::tally(&self.votes, &self.spies, rng);
        scoring::apply(&mut self.players, &self.spies, outcome.spy_caught);

        let selected_name = outcome
            .selected
            .and_then(|id| self.players.iter().find(|p| p.id == id))
            .map(|p| p.name.clone());

        self.phase = Phase::Resolved;
        self.deadline = None;
        tracing::info!(
            room = %self.code,
            spy_caught = outcome.spy_caught,
            votes = self.votes.len(),
            "round resolved"
        );

        vec![
            (
                Recipient::All,
                ServerEvent::RoundResolved {
                    spy_caught: outcome.spy_caught,
                    selected_name,
                    players: self.summaries(),
                },
            ),
            // Scores changed: re-broadcast the membership snapshot.
            self.membership_event(),
        ]
    }

    // -- Helpers -----------------------------------------------------------

    fn require_host(&self, sender: PlayerId) -> Result<(), RoomError> {
        if sender != self.host {
            return Err(RoomError::NotHost(sender));
        }
        Ok(())
    }

    fn all_voted(&self) -> bool {
        self.players.iter().all(|p| self.votes.contains_key(&p.id))
    }

    fn summaries(&self) -> Vec<PlayerSummary> {
        self.players.iter().map(|p| p.summary(self.host)).collect()
    }

    fn membership_event(&self) -> Outgoing {
        (
            Recipient::All,
            ServerEvent::MembershipUpdated {
                players: self.summaries(),
                host_id: self.host,
            },
        )
    }

    fn turn_event(&self) -> Outgoing {
        (
            Recipient::All,
            ServerEvent::TurnStarted {
                player_id: self.players[self.turn].id,
                turn: self.turn,
                rotation: self.rotation,
            },
        )
    }

    fn ignored(&self, command: &str) -> Vec<Outgoing> {
        tracing::debug!(
            room = %self.code,
            phase = %self.phase,
            command,
            "command does not apply in this phase"
        );
        Vec::new()
    }
}

/// Trims a display name, rejecting names that end up empty.
pub(crate) fn clean_name(name: &str) -> Result<String, RoomError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RoomError::InvalidName);
    }
    Ok(trimmed.to_string())
}

// =========================================================================
// Tests
// =========================================================================
