//! Job queue - runs a batch of per-file jobs on a dedicated worker thread
//!
//! A queue instance is single-use: it is started with a fixed, copied job
//! list, emits `JobBegin`/`JobDone` per item in submission order plus a
//! final `AllDone`, and supports cooperative cancellation between items.
//! The in-flight item is never preempted; per-item work is not itself
//! interruptible.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Shared cancel flag, written by the controller thread and read by the
/// worker between items.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Per-item work of a queue.
///
/// Processing is infallible at this boundary: failures are encoded in the
/// outcome value and never abort the batch.
pub trait JobProcessor: Send + 'static {
    type Outcome: Send + 'static;

    fn process(&mut self, source: &Path) -> Self::Outcome;
}

/// Lifecycle events of a queue, delivered to exactly one observer in the
/// order jobs were submitted. `AllDone` is always the last event and fires
/// exactly once, even for an empty batch.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent<O> {
    JobBegin(PathBuf),
    JobDone(PathBuf, O),
    AllDone,
}

/// Handle to a running queue worker.
pub struct JobQueue {
    cancel: CancellationToken,
    worker: Option<thread::JoinHandle<()>>,
}

impl JobQueue {
    /// Start processing `jobs` on a new worker thread. Returns immediately.
    ///
    /// The cancel flag is checked once before each item: after
    /// `request_cancel` the in-flight item still completes and reports, but
    /// no further item begins. Skipped items emit no events.
    pub fn start<P, F>(jobs: Vec<PathBuf>, mut processor: P, mut observer: F) -> Self
    where
        P: JobProcessor,
        F: FnMut(QueueEvent<P::Outcome>) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let worker = thread::spawn(move || {
            for source in jobs {
                if token.is_cancelled() {
                    break;
                }
                observer(QueueEvent::JobBegin(source.clone()));
                let outcome = processor.process(&source);
                observer(QueueEvent::JobDone(source, outcome));
            }
            observer(QueueEvent::AllDone);
        });

        Self {
            cancel,
            worker: Some(worker),
        }
    }

    /// Request cooperative cancellation. Safe to call from any thread, any
    /// number of times.
    pub fn request_cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker to finish. The queue always runs to its
    /// `AllDone` event, cancelled or not.
    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct Tagger;

    impl JobProcessor for Tagger {
        type Outcome = bool;

        fn process(&mut self, source: &Path) -> bool {
            // "fails" for any path containing `bad`, batch must continue
            !source.to_string_lossy().contains("bad")
        }
    }

    fn collect_events<O: Send + 'static>(
        rx: mpsc::Receiver<QueueEvent<O>>,
    ) -> Vec<QueueEvent<O>> {
        let mut events = Vec::new();
        loop {
            let event = rx.recv().expect("worker dropped channel before AllDone");
            let done = matches!(event, QueueEvent::AllDone);
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[test]
    fn test_events_ordered_with_final_alldone() {
        let (tx, rx) = mpsc::channel();
        let jobs = vec![PathBuf::from("a.fb2"), PathBuf::from("bad.fb2")];
        let queue = JobQueue::start(jobs, Tagger, move |ev| {
            let _ = tx.send(ev);
        });

        let events = collect_events(rx);
        queue.join();

        assert_eq!(
            events,
            vec![
                QueueEvent::JobBegin(PathBuf::from("a.fb2")),
                QueueEvent::JobDone(PathBuf::from("a.fb2"), true),
                QueueEvent::JobBegin(PathBuf::from("bad.fb2")),
                QueueEvent::JobDone(PathBuf::from("bad.fb2"), false),
                QueueEvent::AllDone,
            ]
        );
    }

    #[test]
    fn test_empty_batch_emits_only_alldone() {
        let (tx, rx) = mpsc::channel();
        let queue = JobQueue::start(Vec::new(), Tagger, move |ev| {
            let _ = tx.send(ev);
        });

        let events = collect_events(rx);
        queue.join();
        assert_eq!(events, vec![QueueEvent::AllDone]);
    }

    /// Blocks inside `process` until the test releases it, so cancellation
    /// can be requested while an item is in flight.
    struct Gated {
        entered: mpsc::Sender<()>,
        release: mpsc::Receiver<()>,
    }

    impl JobProcessor for Gated {
        type Outcome = ();

        fn process(&mut self, _source: &Path) {
            let _ = self.entered.send(());
            let _ = self.release.recv();
        }
    }

    #[test]
    fn test_cancel_lets_inflight_item_finish_but_starts_no_more() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let jobs = vec![PathBuf::from("first.fb2"), PathBuf::from("second.fb2")];
        let queue = JobQueue::start(
            jobs,
            Gated {
                entered: entered_tx,
                release: release_rx,
            },
            move |ev| {
                let _ = event_tx.send(ev);
            },
        );

        // first item is in flight; cancel, then let it finish
        entered_rx.recv().unwrap();
        queue.request_cancel();
        release_tx.send(()).unwrap();

        let events = collect_events(event_rx);
        queue.join();

        assert_eq!(
            events,
            vec![
                QueueEvent::JobBegin(PathBuf::from("first.fb2")),
                QueueEvent::JobDone(PathBuf::from("first.fb2"), ()),
                QueueEvent::AllDone,
            ]
        );
    }

    #[test]
    fn test_cancel_before_start_skips_everything() {
        let (tx, rx) = mpsc::channel();
        let queue = JobQueue::start(vec![PathBuf::from("a.fb2")], Tagger, move |ev| {
            let _ = tx.send(ev);
        });
        // Cancellation may race the first item here; either zero or one
        // item runs, but AllDone is always last and begin/done counts match.
        queue.request_cancel();
        let events = collect_events(rx);
        queue.join();

        let begins = events
            .iter()
            .filter(|e| matches!(e, QueueEvent::JobBegin(_)))
            .count();
        let dones = events
            .iter()
            .filter(|e| matches!(e, QueueEvent::JobDone(..)))
            .count();
        assert_eq!(begins, dones);
        assert!(begins <= 1);
        assert_eq!(events.last(), Some(&QueueEvent::AllDone));
    }
}
