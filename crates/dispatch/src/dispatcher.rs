use super::DispatchQueue;
use super::Poll;
use super::Target;
use super::Transport;
use super::TransportError;
use parlay_core::GLOBAL_GAP;
use parlay_core::TARGET_GAP;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio::time::Instant;

/// Cheap cloneable handle for producers.
/// `enqueue` is fire-and-forget: it never blocks and never fails into the
/// caller, even when the consumer is gone (surfaces are best-effort).
#[derive(Clone, Debug)]
pub struct Dispatcher {
    tx: UnboundedSender<(Target, String)>,
}

impl Dispatcher {
    /// Spawn the single consumer task and return the producer handle.
    pub fn spawn(transport: Arc<dyn Transport>) -> Self {
        let (tx, rx) = unbounded_channel();
        tokio::spawn(Consumer::new(rx, transport).run());
        Self { tx }
    }
    /// Request a re-render of one surface.
    pub fn enqueue(&self, target: Target, payload: impl Into<String>) {
        let _ = self.tx.send((target, payload.into()));
    }
}

/// The consumer owns the queue outright; producers reach it only through the
/// channel, which is what serializes all transport access to one task.
struct Consumer {
    rx: UnboundedReceiver<(Target, String)>,
    queue: DispatchQueue,
    transport: Arc<dyn Transport>,
    closed: bool,
}

impl Consumer {
    fn new(rx: UnboundedReceiver<(Target, String)>, transport: Arc<dyn Transport>) -> Self {
        Self {
            rx,
            queue: DispatchQueue::new(GLOBAL_GAP, TARGET_GAP),
            transport,
            closed: false,
        }
    }
    async fn run(mut self) {
        log::debug!("[dispatch] consumer started");
        loop {
            self.absorb();
            match self.queue.next(Instant::now()) {
                Poll::Send(job) => self.send(job).await,
                Poll::Wait(due) => {
                    if self.wait(due).await {
                        break;
                    }
                }
                Poll::Idle => {
                    if self.closed {
                        break;
                    }
                    match self.rx.recv().await {
                        Some((target, payload)) => {
                            self.queue.push(target, payload, Instant::now());
                        }
                        None => self.closed = true,
                    }
                }
            }
        }
        log::debug!("[dispatch] consumer stopped");
    }
    /// Drain every pending enqueue request without blocking.
    fn absorb(&mut self) {
        while let Ok((target, payload)) = self.rx.try_recv() {
            self.queue.push(target, payload, Instant::now());
        }
    }
    /// Sleep until the next job is due, waking early for fresh requests.
    /// Returns true when the channel closed with nothing left worth waiting
    /// for (never: a queued job is always worth finishing).
    async fn wait(&mut self, due: Instant) -> bool {
        if self.closed {
            tokio::time::sleep_until(due).await;
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep_until(due) => {}
            msg = self.rx.recv() => match msg {
                Some((target, payload)) => {
                    self.queue.push(target, payload, Instant::now());
                }
                None => self.closed = true,
            },
        }
        false
    }
    /// Send one job; all transport errors are resolved right here.
    async fn send(&mut self, job: super::Job) {
        match self.transport.edit(&job.target, &job.payload).await {
            Ok(()) => {
                log::debug!("[dispatch] sent job {} to {}", job.seq, job.target);
                self.queue.sent(&job.target, Instant::now());
            }
            Err(TransportError::RetryAfter(after)) => {
                log::warn!(
                    "[dispatch] rate limited on {}, retrying in {:?}",
                    job.target,
                    after
                );
                self.queue.delay(job, Instant::now(), after);
            }
            Err(e) => {
                log::warn!("[dispatch] dropping job {} for {}: {}", job.seq, job.target, e);
            }
        }
    }
}
