use super::*;
use parlay_core::*;
use parlay_dispatch::Target;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of a lobby deadline firing against current state.
#[derive(Clone, Debug)]
pub enum ExpiryAction {
    /// The session already left the lobby; the fire was a no-op.
    Ignored,
    /// The deadline moved after the timer armed; re-arm for the new one.
    Deferred(Instant),
    /// Nobody but the creator was ready: the session is cancelled.
    Cancelled(Session),
    /// Registration closed and play (or format choice) begins.
    Started(Session),
}

/// The authoritative state for sessions, memberships, turn orders, votes,
/// and per-turn execution stage.
///
/// Every operation is one short read-modify-write under the lock and
/// re-checks its precondition before mutating (guard-then-act): callers race
/// freely against timers and each other, and the loser of a race gets a
/// rejection instead of a double mutation. Nothing here ever holds the lock
/// across an await.
pub struct Store {
    inner: Mutex<Inner>,
}

struct Inner {
    rng: SmallRng,
    sessions: HashMap<ID<Session>, Session>,
    participants: HashMap<ID<Session>, Vec<Participant>>,
    orders: HashMap<(ID<Session>, Round), Vec<ID<Member>>>,
    turns: HashMap<(ID<Session>, ID<Member>), TurnExecution>,
    results: HashMap<ID<Session>, Vec<TurnResult>>,
    votes: HashMap<ID<Session>, Vec<RematchVote>>,
    tallied: HashSet<ID<Session>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }
    /// Deterministic store for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }
    fn with_rng(rng: SmallRng) -> Self {
        Self {
            inner: Mutex::new(Inner {
                rng,
                sessions: HashMap::new(),
                participants: HashMap::new(),
                orders: HashMap::new(),
                turns: HashMap::new(),
                results: HashMap::new(),
                votes: HashMap::new(),
                tallied: HashSet::new(),
            }),
        }
    }
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("store lock poisoned")
    }
}

/// Reads. All return snapshots; nothing borrows out of the lock.
impl Store {
    pub fn session(&self, id: ID<Session>) -> Option<Session> {
        self.lock().sessions.get(&id).cloned()
    }
    pub fn sessions(&self) -> Vec<Session> {
        self.lock().sessions.values().cloned().collect()
    }
    pub fn participants(&self, id: ID<Session>) -> Vec<Participant> {
        self.lock().participants.get(&id).cloned().unwrap_or_default()
    }
    pub fn results(&self, id: ID<Session>) -> Vec<TurnResult> {
        self.lock().results.get(&id).cloned().unwrap_or_default()
    }
    /// Accumulated delta per participant, in join order.
    pub fn summary(&self, id: ID<Session>) -> Vec<(ID<Member>, Credits)> {
        let inner = self.lock();
        let results = inner.results.get(&id).cloned().unwrap_or_default();
        inner
            .participants
            .get(&id)
            .map(|ps| {
                ps.iter()
                    .map(|p| {
                        let total = results
                            .iter()
                            .filter(|r| r.user == p.user())
                            .map(|r| r.delta)
                            .sum();
                        (p.user(), total)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
    /// Participants currently mid-resolution. The single-active-turn
    /// invariant says this never exceeds one.
    pub fn resolving(&self, id: ID<Session>) -> usize {
        self.lock()
            .turns
            .iter()
            .filter(|((sid, _), turn)| *sid == id && turn.stage == Stage::Resolving)
            .count()
    }
}

/// Lobby lifecycle.
impl Store {
    /// Open a fresh session with the creator as first ready participant.
    pub fn open(
        &self,
        variant: Variant,
        stake: Credits,
        creator: ID<Member>,
        target: Target,
        window: Duration,
        now: Instant,
    ) -> Session {
        let mut inner = self.lock();
        let session = Session::new(variant, stake, creator, target, window, now);
        let id = session.id();
        inner.participants.insert(
            id,
            vec![Participant::new(id, creator, ParticipantStatus::Ready, now)],
        );
        inner.sessions.insert(id, session.clone());
        log::info!("[store] opened {} session {} at stake {}", variant, id, stake);
        session
    }
    /// Add a participant to an open lobby.
    /// Pending confirmations count toward the headcount cap.
    pub fn join(
        &self,
        id: ID<Session>,
        user: ID<Member>,
        ready: bool,
        now: Instant,
    ) -> Result<(Session, ParticipantStatus), ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get(&id).ok_or(ActionError::NotFound)?;
        if session.state() != SessionState::Lobby {
            return Err(ActionError::TooLate);
        }
        let session = session.clone();
        let members = inner.participants.entry(id).or_default();
        if members.iter().any(|p| p.user() == user) {
            return Err(ActionError::AlreadyJoined);
        }
        if members.len() >= MAX_PLAYERS {
            return Err(ActionError::LobbyFull);
        }
        let status = if ready {
            ParticipantStatus::Ready
        } else {
            ParticipantStatus::PendingConfirmation
        };
        members.push(Participant::new(id, user, status, now));
        log::debug!("[store] {} joined session {} as {:?}", user, id, status);
        Ok((session, status))
    }
    /// Promote a pending participant who completed their profile.
    pub fn confirm(&self, id: ID<Session>, user: ID<Member>) -> Result<Session, ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get(&id).ok_or(ActionError::NotFound)?;
        if session.state() != SessionState::Lobby {
            return Err(ActionError::TooLate);
        }
        let session = session.clone();
        let members = inner.participants.entry(id).or_default();
        let member = members
            .iter_mut()
            .find(|p| p.user() == user)
            .ok_or(ActionError::NotParticipant)?;
        member.promote();
        Ok(session)
    }
    /// Push the registration deadline forward, once, creator only.
    pub fn extend(
        &self,
        id: ID<Session>,
        actor: ID<Member>,
        by: Duration,
    ) -> Result<(Session, Instant), ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get_mut(&id).ok_or(ActionError::NotFound)?;
        if session.creator() != actor {
            return Err(ActionError::NotCreator);
        }
        if session.state() != SessionState::Lobby {
            return Err(ActionError::TooLate);
        }
        if session.extended() {
            return Err(ActionError::AlreadyExtended);
        }
        let deadline = session.extend(by);
        Ok((session.clone(), deadline))
    }
    /// Cancel, creator only, any time before Finished.
    /// First cancel wins; the loser of the race gets TooLate, which is what
    /// makes the caller's one-shot compensation safe.
    pub fn cancel(&self, id: ID<Session>, actor: ID<Member>) -> Result<Session, ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get_mut(&id).ok_or(ActionError::NotFound)?;
        if session.creator() != actor {
            return Err(ActionError::NotCreator);
        }
        if !session.transition(SessionState::Cancelled) {
            return Err(ActionError::TooLate);
        }
        log::info!("[store] session {} cancelled by creator", id);
        Ok(session.clone())
    }
    /// Explicit early start, creator only, needs the minimum ready count.
    pub fn continue_early(
        &self,
        id: ID<Session>,
        actor: ID<Member>,
    ) -> Result<Session, ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get(&id).ok_or(ActionError::NotFound)?;
        if session.creator() != actor {
            return Err(ActionError::NotCreator);
        }
        if session.state() != SessionState::Lobby {
            return Err(ActionError::TooLate);
        }
        if inner.ready(id).len() < MIN_PLAYERS {
            return Err(ActionError::NotEnoughPlayers);
        }
        Ok(inner.leave_lobby(id))
    }
    /// Handle a deadline fire. Idempotent: re-reads state first, so races
    /// with an explicit continue or cancel degrade to Ignored.
    pub fn expire(&self, id: ID<Session>, now: Instant) -> ExpiryAction {
        let mut inner = self.lock();
        let Some(session) = inner.sessions.get(&id) else {
            return ExpiryAction::Ignored;
        };
        match session.expiry(now) {
            Expiry::Ignore => ExpiryAction::Ignored,
            Expiry::Defer(at) => ExpiryAction::Deferred(at),
            Expiry::Due => {
                inner.drop_pending(id);
                let creator = inner.sessions.get(&id).expect("present").creator();
                let solo = inner.ready(id).iter().all(|u| *u == creator);
                if solo {
                    let session = inner.sessions.get_mut(&id).expect("present");
                    session.transition(SessionState::Cancelled);
                    log::info!("[store] session {} expired with no takers", id);
                    ExpiryAction::Cancelled(session.clone())
                } else {
                    ExpiryAction::Started(inner.leave_lobby(id))
                }
            }
        }
    }
    /// Creator picks a format; play begins.
    pub fn choose_format(
        &self,
        id: ID<Session>,
        actor: ID<Member>,
        format: Format,
    ) -> Result<Session, ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get_mut(&id).ok_or(ActionError::NotFound)?;
        if session.creator() != actor {
            return Err(ActionError::NotCreator);
        }
        if session.state() != SessionState::ChooseFormat {
            return Err(ActionError::TooLate);
        }
        session.set_format(format);
        session.transition(SessionState::Playing);
        session.set_round(1);
        session.set_cursor(0);
        inner.ensure_order(id, 1);
        Ok(inner.sessions.get(&id).expect("present").clone())
    }
}

/// Turn and round progression.
impl Store {
    /// The persisted order for a round, generated on first use.
    /// Idempotent while the ready set is unchanged; reshuffles otherwise.
    pub fn order(&self, id: ID<Session>, round: Round) -> Result<Vec<ID<Member>>, ActionError> {
        let mut inner = self.lock();
        if !inner.sessions.contains_key(&id) {
            return Err(ActionError::NotFound);
        }
        Ok(inner.ensure_order(id, round))
    }
    /// Whose turn it is right now.
    pub fn current_turn(&self, id: ID<Session>) -> Result<ID<Member>, ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get(&id).ok_or(ActionError::NotFound)?;
        if session.state() != SessionState::Playing {
            return Err(ActionError::TooLate);
        }
        let (round, cursor) = (session.round(), session.cursor());
        let order = inner.ensure_order(id, round);
        Ok(order[cursor % order.len()])
    }
    /// Activate a turn for its owner.
    /// Rejects the wrong actor and repeated activations; on success the
    /// participant is the session's single Resolving turn.
    pub fn begin_turn(
        &self,
        id: ID<Session>,
        user: ID<Member>,
        now: Instant,
    ) -> Result<TurnTicket, ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get(&id).ok_or(ActionError::NotFound)?;
        if session.state() != SessionState::Playing {
            return Err(ActionError::TooLate);
        }
        let session = session.clone();
        let order = inner.ensure_order(id, session.round());
        if order[session.cursor() % order.len()] != user {
            return Err(ActionError::NotYourTurn);
        }
        if let Some(turn) = inner.turns.get(&(id, user)) {
            if turn.round == session.round() && turn.stage != Stage::Ready {
                return Err(ActionError::TurnTaken);
            }
        }
        inner
            .turns
            .insert((id, user), TurnExecution::begin(user, session.round(), now));
        log::debug!("[store] {} began turn in session {}", user, id);
        Ok(TurnTicket {
            session: id,
            user,
            variant: session.variant(),
            round: session.round(),
            stake: session.stake(),
            target: session.target().clone(),
        })
    }
    /// Remember the latest intermediate frame of a resolving turn.
    pub fn record_frame(&self, id: ID<Session>, user: ID<Member>, frame: String) {
        if let Some(turn) = self.lock().turns.get_mut(&(id, user)) {
            turn.frame = Some(frame);
        }
    }
    /// Force a turn's stage to Done. Always succeeds: the executor calls
    /// this on both the happy path and the fault path so a crashed turn can
    /// never wedge the session.
    pub fn finish_turn(&self, id: ID<Session>, user: ID<Member>) {
        if let Some(turn) = self.lock().turns.get_mut(&(id, user)) {
            turn.stage = Stage::Done;
        }
    }
    /// Persist a finalized turn outcome.
    /// Guarded like every other write: a turn committing after the session
    /// was cancelled gets no summary row, and the caller learns to skip the
    /// outcome render too.
    pub fn record_result(&self, id: ID<Session>, result: TurnResult) -> bool {
        let mut inner = self.lock();
        match inner.sessions.get(&id) {
            Some(session) if session.state() != SessionState::Cancelled => {
                inner.results.entry(id).or_default().push(result);
                true
            }
            _ => false,
        }
    }
    /// Move the cursor after a resolved turn.
    pub fn advance(&self, id: ID<Session>) -> Result<(Session, Advance), ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get(&id).ok_or(ActionError::NotFound)?;
        if session.state() != SessionState::Playing {
            return Err(ActionError::TooLate);
        }
        let (round, cursor, rounds) = (session.round(), session.cursor(), session.variant().rounds());
        let len = inner.ensure_order(id, round).len();
        let advance = order::step(cursor, len, round, rounds);
        let session = inner.sessions.get_mut(&id).expect("present");
        match advance {
            Advance::NextTurn => session.set_cursor(cursor + 1),
            Advance::RoundAdvanced => {
                session.set_round(round + 1);
                session.set_cursor(0);
                let next = session.round();
                inner.ensure_order(id, next);
            }
            Advance::Complete => {
                session.transition(SessionState::Finished);
                log::info!("[store] session {} finished", id);
            }
        }
        Ok((inner.sessions.get(&id).expect("present").clone(), advance))
    }
}

/// Rematch votes.
impl Store {
    /// Cast or change a vote; last vote wins until everyone has voted.
    /// Returns the tally, final exactly once.
    pub fn cast_vote(
        &self,
        id: ID<Session>,
        user: ID<Member>,
        choice: Choice,
    ) -> Result<Tally, ActionError> {
        let mut inner = self.lock();
        let session = inner.sessions.get(&id).ok_or(ActionError::NotFound)?;
        if session.state() != SessionState::Finished {
            return Err(ActionError::TooLate);
        }
        if inner.tallied.contains(&id) {
            return Err(ActionError::VotingClosed);
        }
        let creator = session.creator();
        let members: Vec<ID<Member>> = inner
            .participants
            .get(&id)
            .map(|ps| ps.iter().map(|p| p.user()).collect())
            .unwrap_or_default();
        if !members.contains(&user) {
            return Err(ActionError::NotParticipant);
        }
        let votes = inner.votes.entry(id).or_default();
        match votes.iter_mut().find(|v| v.user == user) {
            Some(vote) => vote.choice = choice,
            None => votes.push(RematchVote { user, choice }),
        }
        log::debug!("[store] {} voted {:?} on session {}", user, choice, id);
        if votes.len() < members.len() {
            return Ok(Tally::Pending);
        }
        let votes = votes.clone();
        inner.tallied.insert(id);
        let yes: Vec<ID<Member>> = members
            .into_iter()
            .filter(|u| {
                votes
                    .iter()
                    .any(|v| v.user == *u && v.choice == Choice::Yes)
            })
            .collect();
        if yes.len() < REMATCH_QUORUM {
            log::info!("[store] session {} rematch declined", id);
            return Ok(Tally::Declined);
        }
        let creator = if yes.contains(&creator) {
            creator
        } else {
            yes[0]
        };
        Ok(Tally::Approved {
            members: yes,
            creator,
        })
    }
    /// Spawn the successor session for an approved rematch.
    /// Starts in Playing with a fresh round-1 order when every member can
    /// cover the stake; otherwise in Lobby with the short ones NeedsStake.
    pub fn open_successor(
        &self,
        predecessor: &Session,
        members: Vec<(ID<Member>, ParticipantStatus)>,
        creator: ID<Member>,
        window: Duration,
        now: Instant,
    ) -> Session {
        let mut inner = self.lock();
        let mut session = Session::new(
            predecessor.variant(),
            predecessor.stake(),
            creator,
            predecessor.target().clone(),
            window,
            now,
        );
        let id = session.id();
        let funded = members
            .iter()
            .all(|(_, status)| *status == ParticipantStatus::Ready);
        inner.participants.insert(
            id,
            members
                .into_iter()
                .map(|(user, status)| Participant::new(id, user, status, now))
                .collect(),
        );
        if funded {
            if predecessor.variant().selectable_format() {
                if let Some(format) = predecessor.format() {
                    session.set_format(format);
                }
            }
            session.transition(SessionState::Playing);
        }
        inner.sessions.insert(id, session.clone());
        if funded {
            inner.ensure_order(id, 1);
        }
        log::info!(
            "[store] session {} rematched into {} ({})",
            predecessor.id(),
            id,
            session.state()
        );
        session
    }
}

impl Inner {
    fn ready(&self, id: ID<Session>) -> Vec<ID<Member>> {
        self.participants
            .get(&id)
            .map(|ps| ps.iter().filter(|p| p.is_ready()).map(|p| p.user()).collect())
            .unwrap_or_default()
    }
    fn drop_pending(&mut self, id: ID<Session>) {
        if let Some(members) = self.participants.get_mut(&id) {
            let before = members.len();
            members.retain(|p| p.status() != ParticipantStatus::PendingConfirmation);
            if members.len() < before {
                log::debug!(
                    "[store] dropped {} unconfirmed from session {}",
                    before - members.len(),
                    id
                );
            }
        }
    }
    /// Leave the lobby: unconfirmed members are dropped, fixed-format
    /// variants go straight to Playing with a round-1 order, the rest wait
    /// for the creator's format pick.
    fn leave_lobby(&mut self, id: ID<Session>) -> Session {
        self.drop_pending(id);
        let session = self.sessions.get_mut(&id).expect("present");
        if session.variant().selectable_format() {
            session.transition(SessionState::ChooseFormat);
        } else {
            session.transition(SessionState::Playing);
            session.set_round(1);
            session.set_cursor(0);
            self.ensure_order(id, 1);
        }
        self.sessions.get(&id).expect("present").clone()
    }
    /// Get-or-create the order for a round. Returns the stored permutation
    /// while its member set matches the ready set, reshuffles otherwise.
    fn ensure_order(&mut self, id: ID<Session>, round: Round) -> Vec<ID<Member>> {
        let ready = self.ready(id);
        match self.orders.get(&(id, round)) {
            Some(existing) if order::covers(existing, &ready) => existing.clone(),
            _ => {
                let fresh = order::permutation(&mut self.rng, ready);
                self.orders.insert((id, round), fresh.clone());
                fresh
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target::Inline { id: "t".into() }
    }
    fn window() -> Duration {
        Duration::from_secs(30)
    }
    fn lobby(store: &Store, now: Instant) -> (Session, ID<Member>) {
        let creator = ID::default();
        let session = store.open(Variant::Marathon, 10, creator, target(), window(), now);
        (session, creator)
    }

    #[test]
    fn full_lobby_walk_into_play() {
        let store = Store::seeded(1);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        let b = ID::default();
        let (_, status) = store.join(id, b, true, now + Duration::from_secs(10)).unwrap();
        assert_eq!(status, ParticipantStatus::Ready);
        let action = store.expire(id, now + window());
        let Some(session) = store.session(id) else { panic!() };
        assert!(matches!(action, ExpiryAction::Started(_)));
        assert_eq!(session.state(), SessionState::Playing);
        let order = store.order(id, 1).unwrap();
        assert!(order::covers(&order, &[creator, b]));
        assert_eq!(store.current_turn(id).unwrap(), order[0]);
    }

    #[test]
    fn expiry_with_no_takers_cancels() {
        let store = Store::seeded(2);
        let now = Instant::now();
        let (session, _) = lobby(&store, now);
        let action = store.expire(session.id(), now + window());
        assert!(matches!(action, ExpiryAction::Cancelled(_)));
        assert_eq!(store.session(session.id()).unwrap().state(), SessionState::Cancelled);
    }

    #[test]
    fn pending_members_are_dropped_at_start() {
        let store = Store::seeded(3);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        let ready = ID::default();
        let pending = ID::default();
        store.join(id, ready, true, now).unwrap();
        store.join(id, pending, false, now).unwrap();
        assert!(matches!(store.expire(id, now + window()), ExpiryAction::Started(_)));
        let members: Vec<_> = store.participants(id).iter().map(|p| p.user()).collect();
        assert_eq!(members, vec![creator, ready]);
    }

    #[test]
    fn pending_member_counts_toward_cap() {
        let store = Store::seeded(4);
        let now = Instant::now();
        let (session, _) = lobby(&store, now);
        let id = session.id();
        for _ in 1..MAX_PLAYERS {
            store.join(id, ID::default(), false, now).unwrap();
        }
        assert_eq!(
            store.join(id, ID::default(), true, now).unwrap_err(),
            ActionError::LobbyFull
        );
    }

    #[test]
    fn extension_is_one_shot_and_defers_expiry() {
        let store = Store::seeded(5);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        let (_, deadline) = store.extend(id, creator, LOBBY_EXTENSION).unwrap();
        assert_eq!(deadline, now + window() + LOBBY_EXTENSION);
        assert_eq!(
            store.extend(id, creator, LOBBY_EXTENSION).unwrap_err(),
            ActionError::AlreadyExtended
        );
        assert!(matches!(
            store.expire(id, now + window()),
            ExpiryAction::Deferred(at) if at == deadline
        ));
    }

    #[test]
    fn extension_is_creator_only() {
        let store = Store::seeded(6);
        let now = Instant::now();
        let (session, _) = lobby(&store, now);
        let outsider = ID::default();
        assert_eq!(
            store.extend(session.id(), outsider, LOBBY_EXTENSION).unwrap_err(),
            ActionError::NotCreator
        );
    }

    #[test]
    fn first_cancel_wins() {
        let store = Store::seeded(7);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        assert!(store.cancel(id, creator).is_ok());
        assert_eq!(store.cancel(id, creator).unwrap_err(), ActionError::TooLate);
        assert!(matches!(store.expire(id, now + window()), ExpiryAction::Ignored));
    }

    #[test]
    fn continue_needs_quorum_then_closes_registration() {
        let store = Store::seeded(8);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        assert_eq!(
            store.continue_early(id, creator).unwrap_err(),
            ActionError::NotEnoughPlayers
        );
        store.join(id, ID::default(), true, now).unwrap();
        let session = store.continue_early(id, creator).unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(
            store.join(id, ID::default(), true, now).unwrap_err(),
            ActionError::TooLate
        );
        assert!(matches!(store.expire(id, now + window()), ExpiryAction::Ignored));
    }

    #[test]
    fn classic_waits_for_format_choice() {
        let store = Store::seeded(9);
        let now = Instant::now();
        let creator = ID::default();
        let session = store.open(Variant::Classic, 5, creator, target(), window(), now);
        let id = session.id();
        store.join(id, ID::default(), true, now).unwrap();
        let session = store.continue_early(id, creator).unwrap();
        assert_eq!(session.state(), SessionState::ChooseFormat);
        assert_eq!(store.current_turn(id).unwrap_err(), ActionError::TooLate);
        let session = store.choose_format(id, creator, Format::Grid).unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        assert_eq!(session.format(), Some(Format::Grid));
        assert!(store.current_turn(id).is_ok());
    }

    #[test]
    fn order_is_idempotent_within_a_round() {
        let store = Store::seeded(10);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        for _ in 0..4 {
            store.join(id, ID::default(), true, now).unwrap();
        }
        store.continue_early(id, creator).unwrap();
        let first = store.order(id, 1).unwrap();
        assert_eq!(first, store.order(id, 1).unwrap());
        assert_eq!(first, store.order(id, 1).unwrap());
    }

    #[test]
    fn only_current_participant_activates_once() {
        let store = Store::seeded(11);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        store.join(id, ID::default(), true, now).unwrap();
        store.continue_early(id, creator).unwrap();
        let order = store.order(id, 1).unwrap();
        let (current, next) = (order[0], order[1]);
        assert_eq!(
            store.begin_turn(id, next, now).unwrap_err(),
            ActionError::NotYourTurn
        );
        let ticket = store.begin_turn(id, current, now).unwrap();
        assert_eq!(ticket.user, current);
        assert_eq!(ticket.stake, 10);
        assert_eq!(
            store.begin_turn(id, current, now).unwrap_err(),
            ActionError::TurnTaken
        );
        assert_eq!(store.resolving(id), 1);
        store.finish_turn(id, current);
        assert_eq!(store.resolving(id), 0);
    }

    #[test]
    fn marathon_walks_rounds_to_completion() {
        let store = Store::seeded(12);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        store.join(id, ID::default(), true, now).unwrap();
        store.continue_early(id, creator).unwrap();
        let mut advances = Vec::new();
        loop {
            let user = store.current_turn(id).unwrap();
            store.begin_turn(id, user, now).unwrap();
            store.finish_turn(id, user);
            let (session, advance) = store.advance(id).unwrap();
            advances.push(advance);
            if session.state().terminal() {
                break;
            }
        }
        let rounds = advances
            .iter()
            .filter(|a| **a == Advance::RoundAdvanced)
            .count();
        assert_eq!(rounds as Round, MARATHON_ROUNDS - 1);
        assert_eq!(advances.last(), Some(&Advance::Complete));
        assert_eq!(advances.len(), 2 * MARATHON_ROUNDS as usize);
        assert_eq!(store.session(id).unwrap().state(), SessionState::Finished);
    }

    #[test]
    fn summary_accumulates_in_join_order() {
        let store = Store::seeded(13);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        let b = ID::default();
        store.join(id, b, true, now).unwrap();
        for (user, round, delta) in [(creator, 1, 30), (b, 1, -10), (creator, 2, -5)] {
            store.record_result(id, TurnResult { user, round, delta, frame: "x".into() });
        }
        assert_eq!(store.summary(id), vec![(creator, 25), (b, -10)]);
    }

    #[test]
    fn results_committing_after_cancel_are_discarded() {
        let store = Store::seeded(21);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        let b = ID::default();
        store.join(id, b, true, now).unwrap();
        store.continue_early(id, creator).unwrap();
        assert!(store.record_result(id, TurnResult { user: b, round: 1, delta: 5, frame: "x".into() }));
        store.cancel(id, creator).unwrap();
        assert!(!store.record_result(id, TurnResult { user: creator, round: 1, delta: 5, frame: "x".into() }));
        assert_eq!(store.results(id).len(), 1);
    }

    fn finished_pair(store: &Store, now: Instant) -> (ID<Session>, ID<Member>, ID<Member>) {
        let (session, creator) = lobby(store, now);
        let id = session.id();
        let b = ID::default();
        store.join(id, b, true, now).unwrap();
        store.continue_early(id, creator).unwrap();
        loop {
            let user = store.current_turn(id).unwrap();
            store.begin_turn(id, user, now).unwrap();
            store.finish_turn(id, user);
            if store.advance(id).unwrap().0.state().terminal() {
                break;
            }
        }
        (id, creator, b)
    }

    #[test]
    fn unanimous_yes_approves_with_original_creator() {
        let store = Store::seeded(14);
        let now = Instant::now();
        let (id, creator, b) = finished_pair(&store, now);
        assert_eq!(store.cast_vote(id, creator, Choice::Yes), Ok(Tally::Pending));
        assert_eq!(
            store.cast_vote(id, b, Choice::Yes),
            Ok(Tally::Approved { members: vec![creator, b], creator })
        );
        assert_eq!(store.cast_vote(id, b, Choice::Yes), Err(ActionError::VotingClosed));
    }

    #[test]
    fn below_quorum_declines() {
        let store = Store::seeded(15);
        let now = Instant::now();
        let (id, creator, b) = finished_pair(&store, now);
        store.cast_vote(id, creator, Choice::Yes).unwrap();
        assert_eq!(store.cast_vote(id, b, Choice::No), Ok(Tally::Declined));
    }

    #[test]
    fn creator_passes_to_first_yes_voter() {
        let store = Store::seeded(16);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        let id = session.id();
        let b = ID::default();
        let c = ID::default();
        store.join(id, b, true, now).unwrap();
        store.join(id, c, true, now).unwrap();
        store.continue_early(id, creator).unwrap();
        loop {
            let user = store.current_turn(id).unwrap();
            store.begin_turn(id, user, now).unwrap();
            store.finish_turn(id, user);
            if store.advance(id).unwrap().0.state().terminal() {
                break;
            }
        }
        store.cast_vote(id, creator, Choice::No).unwrap();
        store.cast_vote(id, b, Choice::Yes).unwrap();
        let tally = store.cast_vote(id, c, Choice::Yes).unwrap();
        assert_eq!(tally, Tally::Approved { members: vec![b, c], creator: b });
    }

    #[test]
    fn revote_flips_until_everyone_voted() {
        let store = Store::seeded(17);
        let now = Instant::now();
        let (id, creator, b) = finished_pair(&store, now);
        store.cast_vote(id, creator, Choice::No).unwrap();
        store.cast_vote(id, creator, Choice::Yes).unwrap();
        assert!(matches!(
            store.cast_vote(id, b, Choice::Yes),
            Ok(Tally::Approved { .. })
        ));
    }

    #[test]
    fn votes_rejected_before_finish_and_from_outsiders() {
        let store = Store::seeded(18);
        let now = Instant::now();
        let (session, creator) = lobby(&store, now);
        assert_eq!(
            store.cast_vote(session.id(), creator, Choice::Yes),
            Err(ActionError::TooLate)
        );
        let (id, _, _) = finished_pair(&store, now);
        assert_eq!(
            store.cast_vote(id, ID::default(), Choice::Yes),
            Err(ActionError::NotParticipant)
        );
    }

    #[test]
    fn funded_successor_starts_playing() {
        let store = Store::seeded(19);
        let now = Instant::now();
        let (id, creator, b) = finished_pair(&store, now);
        let predecessor = store.session(id).unwrap();
        let successor = store.open_successor(
            &predecessor,
            vec![(creator, ParticipantStatus::Ready), (b, ParticipantStatus::Ready)],
            creator,
            window(),
            now,
        );
        assert_eq!(successor.state(), SessionState::Playing);
        assert_eq!(successor.stake(), predecessor.stake());
        assert_eq!(successor.target(), predecessor.target());
        let order = store.order(successor.id(), 1).unwrap();
        assert!(order::covers(&order, &[creator, b]));
    }

    #[test]
    fn short_funds_reopen_the_lobby() {
        let store = Store::seeded(20);
        let now = Instant::now();
        let (id, creator, b) = finished_pair(&store, now);
        let predecessor = store.session(id).unwrap();
        let successor = store.open_successor(
            &predecessor,
            vec![(creator, ParticipantStatus::Ready), (b, ParticipantStatus::NeedsStake)],
            creator,
            window(),
            now,
        );
        assert_eq!(successor.state(), SessionState::Lobby);
        let statuses: Vec<_> = store
            .participants(successor.id())
            .iter()
            .map(|p| p.status())
            .collect();
        assert_eq!(statuses, vec![ParticipantStatus::Ready, ParticipantStatus::NeedsStake]);
    }
}
