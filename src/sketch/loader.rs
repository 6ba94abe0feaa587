use crate::sketch::background::BackgroundRef;
use crate::sketch::snapshot::Snapshot;
use anyhow::Result;
use image::RgbaImage;
use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a decode result will be applied to. Each target only honours its
/// newest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeTarget {
    Background,
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Jobs run during `submit`; results still wait for `poll`.
    Inline,
    /// Jobs run on a dedicated worker thread.
    Background,
}

#[derive(Debug)]
pub enum DecodeJob {
    Background {
        background: BackgroundRef,
    },
    Restore {
        snapshot: Snapshot,
        /// Already decoded background, if the library had it cached.
        cached_background: Option<Arc<RgbaImage>>,
    },
}

#[derive(Debug)]
pub enum DecodeOutput {
    Background {
        background: BackgroundRef,
        image: Result<RgbaImage>,
    },
    Restore {
        snapshot: Snapshot,
        pixels: Result<RgbaImage>,
        background: Option<Result<Arc<RgbaImage>>>,
    },
}

#[derive(Debug)]
pub struct DecodeResult {
    pub target: DecodeTarget,
    pub id: u64,
    pub output: DecodeOutput,
}

/// Hands out monotonically increasing ids and remembers the newest per target.
#[derive(Debug, Default)]
pub struct RequestGate {
    next_id: u64,
    latest: HashMap<DecodeTarget, u64>,
}

impl RequestGate {
    pub fn issue(&mut self, target: DecodeTarget) -> u64 {
        self.next_id += 1;
        self.latest.insert(target, self.next_id);
        self.next_id
    }

    pub fn is_latest(&self, target: DecodeTarget, id: u64) -> bool {
        self.latest.get(&target) == Some(&id)
    }

    pub fn latest(&self, target: DecodeTarget) -> Option<u64> {
        self.latest.get(&target).copied()
    }
}

struct Worker {
    jobs: Sender<(DecodeTarget, u64, DecodeJob)>,
    results: Receiver<DecodeResult>,
}

pub struct DecodeQueue {
    gate: RequestGate,
    worker: Option<Worker>,
    finished: VecDeque<DecodeResult>,
    last_submitted: u64,
    received_up_to: u64,
}

impl DecodeQueue {
    pub fn new(mode: DecodeMode) -> Self {
        let worker = match mode {
            DecodeMode::Inline => None,
            DecodeMode::Background => spawn_worker(),
        };
        Self {
            gate: RequestGate::default(),
            worker,
            finished: VecDeque::new(),
            last_submitted: 0,
            received_up_to: 0,
        }
    }

    pub fn mode(&self) -> DecodeMode {
        if self.worker.is_some() {
            DecodeMode::Background
        } else {
            DecodeMode::Inline
        }
    }

    pub fn latest(&self, target: DecodeTarget) -> Option<u64> {
        self.gate.latest(target)
    }

    /// Queues `job` and supersedes any earlier request for `target`.
    pub fn submit(&mut self, target: DecodeTarget, job: DecodeJob) -> u64 {
        let id = self.gate.issue(target);
        self.last_submitted = id;
        let job = match &self.worker {
            Some(worker) => match worker.jobs.send((target, id, job)) {
                Ok(()) => return id,
                Err(mpsc::SendError((_, _, job))) => job,
            },
            None => job,
        };
        if self.worker.take().is_some() {
            tracing::warn!("decode worker gone; decoding inline");
        }
        self.receive(DecodeResult {
            target,
            id,
            output: run_job(job),
        });
        id
    }

    /// Whether results are still in flight or waiting to be polled.
    pub fn is_busy(&self) -> bool {
        self.has_outstanding() || !self.finished.is_empty()
    }

    /// Supersedes whatever is in flight for `target` without queueing work.
    pub fn invalidate(&mut self, target: DecodeTarget) {
        if self.gate.latest(target).is_some() {
            self.gate.issue(target);
        }
    }

    /// Returns finished results that are still the newest for their target.
    pub fn poll(&mut self) -> Vec<DecodeResult> {
        self.collect_finished();
        self.take_fresh()
    }

    /// Like `poll`, but blocks up to `timeout` for the worker to finish
    /// the newest outstanding requests.
    pub fn wait(&mut self, timeout: Duration) -> Vec<DecodeResult> {
        let deadline = Instant::now() + timeout;
        loop {
            self.collect_finished();
            if !self.has_outstanding() {
                break;
            }
            let Some(worker) = &self.worker else {
                break;
            };
            let remaining = deadline.saturating_duration_since(Instant::now());
            let received = worker.results.recv_timeout(remaining);
            match received {
                Ok(result) => self.receive(result),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    self.worker = None;
                    break;
                }
            }
        }
        self.take_fresh()
    }

    /// The worker answers in submission order, so everything is back once
    /// the last submitted id has arrived.
    fn has_outstanding(&self) -> bool {
        self.worker.is_some() && self.received_up_to < self.last_submitted
    }

    fn collect_finished(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };
        let mut received = Vec::new();
        let mut disconnected = false;
        loop {
            match worker.results.try_recv() {
                Ok(result) => received.push(result),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            tracing::warn!("decode worker disconnected");
            self.worker = None;
        }
        for result in received {
            self.receive(result);
        }
    }

    fn receive(&mut self, result: DecodeResult) {
        self.received_up_to = self.received_up_to.max(result.id);
        self.finished.push_back(result);
    }

    fn take_fresh(&mut self) -> Vec<DecodeResult> {
        let mut fresh = Vec::new();
        for result in self.finished.drain(..) {
            if self.gate.is_latest(result.target, result.id) {
                fresh.push(result);
            } else {
                tracing::debug!(
                    target_kind = ?result.target,
                    id = result.id,
                    "dropping stale decode result"
                );
            }
        }
        fresh
    }
}

fn spawn_worker() -> Option<Worker> {
    let (job_tx, job_rx) = mpsc::channel::<(DecodeTarget, u64, DecodeJob)>();
    let (result_tx, result_rx) = mpsc::channel::<DecodeResult>();
    let spawned = std::thread::Builder::new()
        .name("sketch-decode".into())
        .spawn(move || {
            while let Ok((target, id, job)) = job_rx.recv() {
                let output = run_job(job);
                if result_tx.send(DecodeResult { target, id, output }).is_err() {
                    break;
                }
            }
        });
    match spawned {
        Ok(_) => Some(Worker {
            jobs: job_tx,
            results: result_rx,
        }),
        Err(err) => {
            tracing::warn!(?err, "failed to spawn decode worker; decoding inline");
            None
        }
    }
}

fn run_job(job: DecodeJob) -> DecodeOutput {
    match job {
        DecodeJob::Background { background } => {
            let image = background.source().load();
            DecodeOutput::Background { background, image }
        }
        DecodeJob::Restore {
            snapshot,
            cached_background,
        } => {
            let pixels = snapshot.decode();
            let background = match (snapshot.background(), cached_background) {
                (None, _) => None,
                (Some(_), Some(image)) => Some(Ok(image)),
                (Some(background), None) => Some(background.source().load().map(Arc::new)),
            };
            DecodeOutput::Restore {
                snapshot,
                pixels,
                background,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn background_job(tag: u8) -> DecodeJob {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([tag, 0, 0, 255]));
        let bytes = crate::sketch::snapshot::encode_png(&img).expect("encode");
        DecodeJob::Background {
            background: BackgroundRef::from_bytes(format!("bg{tag}"), bytes),
        }
    }

    #[test]
    fn gate_only_accepts_newest_id_per_target() {
        let mut gate = RequestGate::default();
        let first = gate.issue(DecodeTarget::Restore);
        let second = gate.issue(DecodeTarget::Restore);
        let other = gate.issue(DecodeTarget::Background);

        assert!(second > first);
        assert!(!gate.is_latest(DecodeTarget::Restore, first));
        assert!(gate.is_latest(DecodeTarget::Restore, second));
        assert!(gate.is_latest(DecodeTarget::Background, other));
        assert!(!gate.is_latest(DecodeTarget::Background, second));
    }

    #[test]
    fn inline_queue_drops_superseded_results() {
        let mut queue = DecodeQueue::new(DecodeMode::Inline);
        let _stale = queue.submit(DecodeTarget::Background, background_job(1));
        let fresh = queue.submit(DecodeTarget::Background, background_job(2));

        let results = queue.poll();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, fresh);
        match &results[0].output {
            DecodeOutput::Background { background, image } => {
                assert_eq!(background.name(), "bg2");
                assert!(image.is_ok());
            }
            other => panic!("unexpected output {other:?}"),
        }
        assert!(queue.poll().is_empty());
    }

    #[test]
    fn background_worker_delivers_newest_result() {
        let mut queue = DecodeQueue::new(DecodeMode::Background);
        assert_eq!(queue.mode(), DecodeMode::Background);
        for tag in 1..=4 {
            queue.submit(DecodeTarget::Background, background_job(tag));
        }
        let newest = queue.latest(DecodeTarget::Background).expect("issued");

        let results = queue.wait(Duration::from_secs(10));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, newest);
    }
}
