use super::Job;
use super::Target;
use parlay_core::Sequence;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// What the consumer should do next.
#[derive(Debug)]
pub enum Poll {
    /// This job is due and fresh: send it now.
    Send(Job),
    /// The earliest candidate is not due yet: sleep until then.
    Wait(Instant),
    /// Nothing queued.
    Idle,
}

/// Functional core of the dispatcher: a due-ordered heap with per-target
/// coalescing and pacing bookkeeping. No tasks, no channels, no clock reads;
/// every operation takes `now` so tests can drive time explicitly.
///
/// Coalescing rule: `latest` remembers the newest sequence id enqueued per
/// target. A popped job whose sequence no longer matches was superseded and
/// is silently discarded, so for any target only the last payload enqueued
/// before the consumer actually sends one ever reaches the transport.
#[derive(Debug)]
pub struct DispatchQueue {
    heap: BinaryHeap<Reverse<Job>>,
    latest: HashMap<Target, Sequence>,
    next_seq: Sequence,
    global_gap: Duration,
    target_gap: Duration,
    last_global: Option<Instant>,
    last_target: HashMap<Target, Instant>,
}

impl DispatchQueue {
    pub fn new(global_gap: Duration, target_gap: Duration) -> Self {
        Self {
            heap: BinaryHeap::new(),
            latest: HashMap::new(),
            next_seq: 0,
            global_gap,
            target_gap,
            last_global: None,
            last_target: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Enqueue a render request for a target.
    /// The job's due time respects both pacing gaps as of `now`; the target's
    /// latest-sequence marker advances so older queued jobs become stale.
    pub fn push(&mut self, target: Target, payload: String, now: Instant) -> Sequence {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = self.due(&target, now);
        self.latest.insert(target.clone(), seq);
        self.heap.push(Reverse(Job {
            target,
            seq,
            due,
            payload,
        }));
        seq
    }

    /// Re-admit a job the transport rate-limited.
    /// Keeps the original sequence id so the job is not mistaken for stale;
    /// if a newer payload arrived meanwhile, staleness wins as usual.
    pub fn delay(&mut self, mut job: Job, now: Instant, retry_after: Duration) {
        job.due = now + retry_after + parlay_core::RETRY_BUFFER;
        self.heap.push(Reverse(job));
    }

    /// Record a successful send for pacing.
    pub fn sent(&mut self, target: &Target, now: Instant) {
        self.last_global = Some(now);
        self.last_target.insert(target.clone(), now);
    }

    /// Pop the next actionable job, discarding stale ones along the way.
    /// Pacing is re-checked against `now` at pop time, not just enqueue time:
    /// a send to any target pushes every queued due time forward implicitly.
    pub fn next(&mut self, now: Instant) -> Poll {
        loop {
            let Some(Reverse(head)) = self.heap.peek() else {
                return Poll::Idle;
            };
            if self.latest.get(&head.target) != Some(&head.seq) {
                let Reverse(stale) = self.heap.pop().expect("peeked");
                log::debug!("[dispatch] superseded job {} for {}", stale.seq, stale.target);
                continue;
            }
            let due = head.due.max(self.due(&head.target, now));
            if due > now {
                return Poll::Wait(due);
            }
            let Reverse(job) = self.heap.pop().expect("peeked");
            return Poll::Send(job);
        }
    }

    /// Earliest instant a send to `target` would satisfy both gaps.
    fn due(&self, target: &Target, now: Instant) -> Instant {
        let global = self
            .last_global
            .map(|t| t + self.global_gap)
            .unwrap_or(now);
        let local = self
            .last_target
            .get(target)
            .map(|t| *t + self.target_gap)
            .unwrap_or(now);
        now.max(global).max(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const G: Duration = Duration::from_millis(50);
    const T: Duration = Duration::from_millis(1000);
    fn surface(id: &str) -> Target {
        Target::Inline { id: id.to_string() }
    }
    #[test]
    fn empty_queue_is_idle() {
        let mut q = DispatchQueue::new(G, T);
        assert!(matches!(q.next(Instant::now()), Poll::Idle));
    }
    #[test]
    fn burst_coalesces_to_last_payload() {
        let mut q = DispatchQueue::new(G, T);
        let now = Instant::now();
        q.push(surface("x"), "1".into(), now);
        q.push(surface("x"), "2".into(), now);
        q.push(surface("x"), "3".into(), now);
        match q.next(now) {
            Poll::Send(job) => assert_eq!(job.payload, "3"),
            other => panic!("expected send, got {:?}", other),
        }
        assert!(matches!(q.next(now), Poll::Idle));
    }
    #[test]
    fn send_starts_both_pacing_gaps() {
        let mut q = DispatchQueue::new(G, T);
        let now = Instant::now();
        q.push(surface("x"), "a".into(), now);
        let Poll::Send(job) = q.next(now) else {
            panic!("expected send")
        };
        q.sent(&job.target, now);
        q.push(surface("y"), "b".into(), now);
        match q.next(now) {
            Poll::Wait(due) => assert_eq!(due, now + G),
            other => panic!("expected wait, got {:?}", other),
        }
        let Poll::Send(job) = q.next(now + G) else {
            panic!("expected send")
        };
        q.sent(&job.target, now + G);
        q.push(surface("x"), "c".into(), now + G);
        match q.next(now + G) {
            Poll::Wait(due) => assert_eq!(due, now + T),
            other => panic!("expected wait, got {:?}", other),
        }
    }
    #[test]
    fn delayed_job_keeps_sequence() {
        let mut q = DispatchQueue::new(G, T);
        let now = Instant::now();
        q.push(surface("x"), "a".into(), now);
        let Poll::Send(job) = q.next(now) else {
            panic!("expected send")
        };
        let seq = job.seq;
        q.delay(job, now, Duration::from_millis(2500));
        let later = now + Duration::from_millis(2500) + parlay_core::RETRY_BUFFER;
        match q.next(later) {
            Poll::Send(job) => assert_eq!(job.seq, seq),
            other => panic!("expected send, got {:?}", other),
        }
    }
    #[test]
    fn newer_payload_supersedes_delayed_job() {
        let mut q = DispatchQueue::new(G, T);
        let now = Instant::now();
        q.push(surface("x"), "old".into(), now);
        let Poll::Send(job) = q.next(now) else {
            panic!("expected send")
        };
        q.delay(job, now, Duration::from_millis(100));
        q.push(surface("x"), "new".into(), now);
        let later = now + Duration::from_secs(5);
        match q.next(later) {
            Poll::Send(job) => assert_eq!(job.payload, "new"),
            other => panic!("expected send, got {:?}", other),
        }
        assert!(matches!(q.next(later), Poll::Idle));
    }
}
