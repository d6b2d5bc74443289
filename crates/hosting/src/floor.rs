use parlay_core::ID;
use parlay_core::Unique;
use parlay_dispatch::Target;
use parlay_gameroom::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Manages live sessions and routes commands to the dealer.
/// Keeps a surface index so a button press on a chat message finds the
/// session currently living there, including rematch successors that
/// inherit their predecessor's surface.
pub struct Floor {
    dealer: Arc<Dealer>,
    surfaces: RwLock<HashMap<Target, ID<Session>>>,
}

impl Floor {
    pub fn new(dealer: Arc<Dealer>) -> Arc<Self> {
        Arc::new(Self {
            dealer,
            surfaces: RwLock::new(HashMap::new()),
        })
    }
    pub fn dealer(&self) -> &Arc<Dealer> {
        &self.dealer
    }
    /// Route one command and track the surface index.
    pub async fn submit(self: &Arc<Self>, command: Command) -> Reply {
        let reply = self.dealer.handle(command).await;
        if let Reply::Opened { session } = reply {
            if let Some(session) = self.dealer.store().session(session) {
                log::debug!("[floor] session {} registered on {}", session.id(), session.target());
                self.surfaces
                    .write()
                    .await
                    .insert(session.target().clone(), session.id());
            }
        }
        reply
    }
    /// The live session on a surface, if any.
    /// A stale index entry (finished or cancelled session) is repaired by
    /// scanning for a live session on the same surface, which is how a
    /// rematch successor takes over its predecessor's message.
    pub async fn lookup(&self, target: &Target) -> Option<ID<Session>> {
        let indexed = self.surfaces.read().await.get(target).copied();
        let live = |id: ID<Session>| {
            self.dealer
                .store()
                .session(id)
                .filter(|s| !s.state().terminal())
                .map(|s| s.id())
        };
        if let Some(id) = indexed.and_then(live) {
            return Some(id);
        }
        let successor = self
            .dealer
            .store()
            .sessions()
            .into_iter()
            .filter(|s| !s.state().terminal())
            .find(|s| s.target() == target)
            .map(|s| s.id());
        let mut surfaces = self.surfaces.write().await;
        match successor {
            Some(id) => {
                surfaces.insert(target.clone(), id);
                Some(id)
            }
            None => {
                surfaces.remove(target);
                None
            }
        }
    }
    /// Every session that has not reached a terminal state.
    pub fn live(&self) -> Vec<ID<Session>> {
        self.dealer
            .store()
            .sessions()
            .into_iter()
            .filter(|s| !s.state().terminal())
            .map(|s| s.id())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ButtonPress;
    use crate::OpenRequest;
    use crate::Pool;
    use parlay_dispatch::Dispatcher;
    use parlay_dispatch::Transport;
    use parlay_dispatch::TransportError;
    use std::time::Duration;

    struct Sink;
    #[async_trait::async_trait]
    impl Transport for Sink {
        async fn edit(&self, _: &Target, _: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    fn floor() -> Arc<Floor> {
        Floor::new(Dealer::new(
            Arc::new(Store::seeded(7)),
            Dispatcher::spawn(Arc::new(Sink)),
            Arc::new(FixedWheel::new(5)),
            Arc::new(Vault::new(100)),
            Arc::new(OpenGate),
        ))
    }
    fn target() -> Target {
        Target::Message {
            chat: -100,
            message: 1,
        }
    }
    async fn open(pool: &Pool, user: ID<Member>) -> ID<Session> {
        let request = OpenRequest {
            user,
            target: target(),
            variant: Variant::SpecialReveal,
            stake: 10,
        };
        match pool.submit(request.into()).await.unwrap() {
            Reply::Opened { session } => session,
            other => panic!("open failed: {:?}", other),
        }
    }
    async fn press(pool: &Pool, id: ID<Session>, user: ID<Member>, data: &str) -> Reply {
        let press = ButtonPress {
            user,
            target: target(),
            data: format!("{}/{}", id, data),
        };
        pool.submit(Command::try_from(press).unwrap()).await.unwrap()
    }
    async fn play_out(floor: &Arc<Floor>, pool: &Pool, id: ID<Session>) {
        loop {
            if floor.dealer().store().session(id).unwrap().state().terminal() {
                return;
            }
            let user = floor.dealer().store().current_turn(id).unwrap();
            press(pool, id, user, "spin").await;
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pool_routes_commands_and_acks() {
        let floor = floor();
        let pool = Pool::spawn(floor.clone(), 4);
        let creator = ID::default();
        let id = open(&pool, creator).await;
        assert_eq!(floor.lookup(&target()).await, Some(id));
        assert_eq!(floor.live(), vec![id]);
        let reply = press(&pool, id, ID::default(), "join").await;
        assert!(matches!(reply, Reply::Joined { .. }));
        let reply = press(&pool, id, creator, "continue").await;
        assert!(matches!(reply, Reply::Continued));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_surface_unregisters() {
        let floor = floor();
        let pool = Pool::spawn(floor.clone(), 2);
        let creator = ID::default();
        let id = open(&pool, creator).await;
        assert!(matches!(press(&pool, id, creator, "cancel").await, Reply::Cancelled));
        assert_eq!(floor.lookup(&target()).await, None);
        assert!(floor.live().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn surface_index_follows_the_rematch() {
        let floor = floor();
        let pool = Pool::spawn(floor.clone(), 2);
        let (creator, b) = (ID::default(), ID::default());
        let id = open(&pool, creator).await;
        press(&pool, id, b, "join").await;
        press(&pool, id, creator, "continue").await;
        play_out(&floor, &pool, id).await;
        press(&pool, id, creator, "vote/yes").await;
        press(&pool, id, b, "vote/yes").await;
        let successor = floor.lookup(&target()).await.expect("successor live");
        assert_ne!(successor, id);
        assert_eq!(
            floor.dealer().store().session(successor).unwrap().state(),
            SessionState::Playing
        );
    }
}
