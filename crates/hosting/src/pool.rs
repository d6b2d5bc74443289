use super::Floor;
use parlay_gameroom::Command;
use parlay_gameroom::Reply;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;

type Envelope = (Command, oneshot::Sender<Reply>);

/// Fixed-size pool of command workers.
/// N tasks share one inbound channel, so a slow session (a spin animation,
/// a collaborator round trip) never blocks commands for the others. Order
/// across sessions is not guaranteed; within the store every operation is
/// guarded, so reordering only changes who wins a race.
pub struct Pool {
    tx: UnboundedSender<Envelope>,
}

impl Pool {
    pub fn spawn(floor: Arc<Floor>, size: usize) -> Self {
        let (tx, rx) = unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        for n in 0..size {
            tokio::spawn(Self::work(n, floor.clone(), rx.clone()));
        }
        Self { tx }
    }
    /// Submit one command and wait for its acknowledgment.
    pub async fn submit(&self, command: Command) -> anyhow::Result<Reply> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send((command, ack))
            .map_err(|_| anyhow::anyhow!("pool is shut down"))?;
        done.await.map_err(|_| anyhow::anyhow!("worker dropped the ack"))
    }
    async fn work(n: usize, floor: Arc<Floor>, rx: Arc<Mutex<UnboundedReceiver<Envelope>>>) {
        log::debug!("[pool] worker {} started", n);
        loop {
            // hold the lock only long enough to claim one envelope
            let envelope = rx.lock().await.recv().await;
            match envelope {
                Some((command, ack)) => {
                    let reply = floor.submit(command).await;
                    log::debug!("[pool] worker {} acking {}", n, reply.to_json());
                    let _ = ack.send(reply);
                }
                None => break,
            }
        }
        log::debug!("[pool] worker {} stopped", n);
    }
}
