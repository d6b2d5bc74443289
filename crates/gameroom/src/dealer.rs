use super::*;
use parlay_core::*;
use parlay_dispatch::Dispatcher;
use parlay_dispatch::Target;
use std::sync::Arc;
use tokio::time::Instant;

/// Live session coordinator.
/// Imperative shell that owns the store (functional core) and wires it to
/// the dispatcher, the payout engine, the economy ledger, and the profile
/// gate. Every inbound command gets a fast reply; shared-surface renders go
/// through the dispatcher and arrive whenever pacing allows.
pub struct Dealer {
    pub(crate) store: Arc<Store>,
    pub(crate) dispatch: Dispatcher,
    pub(crate) payout: Arc<dyn Payout>,
    pub(crate) economy: Arc<dyn Economy>,
    pub(crate) profiles: Arc<dyn ProfileGate>,
}

impl Dealer {
    pub fn new(
        store: Arc<Store>,
        dispatch: Dispatcher,
        payout: Arc<dyn Payout>,
        economy: Arc<dyn Economy>,
        profiles: Arc<dyn ProfileGate>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            dispatch,
            payout,
            economy,
            profiles,
        })
    }
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
    pub async fn handle(self: &Arc<Self>, command: Command) -> Reply {
        log::debug!("[dealer] {:?}", command);
        match command {
            Command::Open {
                creator,
                variant,
                stake,
                target,
            } => self.open(creator, variant, stake, target).await,
            Command::Act {
                session,
                actor,
                action,
            } => match action {
                Action::Join => self.join(session, actor).await,
                Action::Confirm => self.confirm(session, actor).await,
                Action::Extend => self.extend(session, actor),
                Action::Cancel => self.cancel(session, actor).await,
                Action::Continue => self.continue_early(session, actor),
                Action::Choose(format) => self.choose(session, actor, format),
                Action::Spin => self.spin(session, actor),
                Action::Vote(choice) => self.vote(session, actor, choice).await,
            },
        }
    }
}

/// Lobby commands. Stakes are held up front and compensated on the rare
/// loser of a guard race, never double-applied.
impl Dealer {
    async fn open(
        self: &Arc<Self>,
        creator: ID<Member>,
        variant: Variant,
        stake: Credits,
        target: Target,
    ) -> Reply {
        if let Err(e) = self.economy.apply(creator, -stake).await {
            return Reply::Rejected {
                reason: e.to_string(),
            };
        }
        let session = self
            .store
            .open(variant, stake, creator, target, REGISTRATION_WINDOW, Instant::now());
        self.arm(session.id(), session.deadline());
        self.render(session.id());
        Reply::Opened {
            session: session.id(),
        }
    }
    async fn join(self: &Arc<Self>, id: ID<Session>, user: ID<Member>) -> Reply {
        let Some(session) = self.store.session(id) else {
            return ActionError::NotFound.into();
        };
        let ready = self.profiles.is_ready(user).await;
        if ready {
            if let Err(e) = self.economy.apply(user, -session.stake()).await {
                return Reply::Rejected {
                    reason: e.to_string(),
                };
            }
        }
        match self.store.join(id, user, ready, Instant::now()) {
            Ok((_, status)) => {
                self.render(id);
                Reply::Joined {
                    status: status.to_string(),
                }
            }
            Err(e) => {
                if ready {
                    self.release(user, session.stake()).await;
                }
                e.into()
            }
        }
    }
    /// Second chance for pending or short-funded members: re-check the gate,
    /// hold the stake, promote.
    async fn confirm(self: &Arc<Self>, id: ID<Session>, user: ID<Member>) -> Reply {
        let Some(session) = self.store.session(id) else {
            return ActionError::NotFound.into();
        };
        let status = self
            .store
            .participants(id)
            .iter()
            .find(|p| p.user() == user)
            .map(|p| p.status());
        match status {
            None => ActionError::NotParticipant.into(),
            Some(ParticipantStatus::Ready) => ActionError::AlreadyJoined.into(),
            Some(status) => {
                if status == ParticipantStatus::PendingConfirmation
                    && !self.profiles.is_ready(user).await
                {
                    return Reply::Rejected {
                        reason: "profile still incomplete".into(),
                    };
                }
                if let Err(e) = self.economy.apply(user, -session.stake()).await {
                    return Reply::Rejected {
                        reason: e.to_string(),
                    };
                }
                match self.store.confirm(id, user) {
                    Ok(_) => {
                        self.render(id);
                        Reply::Joined {
                            status: ParticipantStatus::Ready.to_string(),
                        }
                    }
                    Err(e) => {
                        self.release(user, session.stake()).await;
                        e.into()
                    }
                }
            }
        }
    }
    fn extend(self: &Arc<Self>, id: ID<Session>, actor: ID<Member>) -> Reply {
        match self.store.extend(id, actor, LOBBY_EXTENSION) {
            Ok((_, deadline)) => {
                self.render(id);
                Reply::Extended {
                    seconds_left: deadline
                        .saturating_duration_since(Instant::now())
                        .as_secs(),
                }
            }
            Err(e) => e.into(),
        }
    }
    async fn cancel(self: &Arc<Self>, id: ID<Session>, actor: ID<Member>) -> Reply {
        match self.store.cancel(id, actor) {
            Ok(session) => {
                self.compensate(&session).await;
                self.render(id);
                Reply::Cancelled
            }
            Err(e) => e.into(),
        }
    }
    fn continue_early(self: &Arc<Self>, id: ID<Session>, actor: ID<Member>) -> Reply {
        match self.store.continue_early(id, actor) {
            Ok(_) => {
                self.render(id);
                Reply::Continued
            }
            Err(e) => e.into(),
        }
    }
    fn choose(self: &Arc<Self>, id: ID<Session>, actor: ID<Member>, format: Format) -> Reply {
        match self.store.choose_format(id, actor, format) {
            Ok(_) => {
                self.render(id);
                Reply::FormatChosen
            }
            Err(e) => e.into(),
        }
    }
    fn spin(self: &Arc<Self>, id: ID<Session>, actor: ID<Member>) -> Reply {
        match self.store.begin_turn(id, actor, Instant::now()) {
            Ok(ticket) => {
                self.detach(ticket);
                Reply::TurnStarted
            }
            Err(e) => e.into(),
        }
    }
}

impl Dealer {
    /// Arm the registration deadline as a detached task.
    pub(crate) fn arm(self: &Arc<Self>, id: ID<Session>, at: Instant) {
        let dealer = self.clone();
        tokio::spawn(async move {
            match Deadline::new(id, at).watch(dealer.store.clone()).await {
                Some(ExpiryAction::Cancelled(session)) => {
                    dealer.compensate(&session).await;
                    dealer.render(id);
                }
                Some(_) => dealer.render(id),
                None => {}
            }
        });
    }
    /// Refund held stakes after a cancel.
    /// Only participants without a finalized outcome get one: a resolved
    /// turn already settled through its payout delta.
    pub(crate) async fn compensate(&self, session: &Session) {
        let id = session.id();
        let resolved: Vec<ID<Member>> = self
            .store
            .results(id)
            .iter()
            .map(|r| r.user)
            .collect();
        for member in self.store.participants(id) {
            if member.is_ready() && !resolved.contains(&member.user()) {
                self.release(member.user(), session.stake()).await;
            }
        }
    }
    /// Return a held stake; a failed release is reported and dropped, the
    /// operator reconciles the ledger.
    pub(crate) async fn release(&self, user: ID<Member>, stake: Credits) {
        if let Err(e) = self.economy.apply(user, stake).await {
            log::error!(target: "operator", "[dealer] stake release failed for {}: {}", user, e);
        }
    }
    /// Re-render the shared surface from current state.
    /// Reads are fresh snapshots; the dispatcher coalesces whatever burst
    /// this lands in.
    pub(crate) fn render(&self, id: ID<Session>) {
        let Some(session) = self.store.session(id) else {
            return;
        };
        let view = match session.state() {
            SessionState::Lobby => {
                let members = self.store.participants(id);
                View::Lobby {
                    session: id,
                    stake: session.stake(),
                    ready: members.iter().filter(|p| p.is_ready()).count(),
                    pending: members.iter().filter(|p| !p.is_ready()).count(),
                    seconds_left: session
                        .deadline()
                        .saturating_duration_since(Instant::now())
                        .as_secs(),
                }
            }
            SessionState::ChooseFormat => View::ChooseFormat {
                session: id,
                formats: [Format::Single, Format::Triple, Format::Grid]
                    .iter()
                    .map(Format::to_string)
                    .collect(),
            },
            SessionState::Playing => match self.store.current_turn(id) {
                Ok(user) => View::Turn {
                    user,
                    round: session.round(),
                    rounds: session.variant().rounds(),
                },
                Err(_) => return,
            },
            SessionState::Finished => View::Summary {
                lines: self
                    .store
                    .summary(id)
                    .into_iter()
                    .map(|(user, delta)| SummaryLine { user, delta })
                    .collect(),
            },
            SessionState::Cancelled => View::Cancelled,
        };
        self.dispatch.enqueue(session.target().clone(), view.to_json());
    }
}
