#![forbid(unsafe_code)]

//! Records every snapshot a controller emits.
//!
//! The JSON-lines rendering and its digest make two runs of the same
//! scenario comparable byte for byte.

use std::cell::RefCell;
use std::rc::Rc;

use mcq_core::MatchVector;
use mcq_runtime::{ContainerQueryEngine, QueryBindingController, Subscription};

/// Captures emitted match vectors while alive.
pub struct SnapshotRecorder {
    log: Rc<RefCell<Vec<MatchVector>>>,
    _subscription: Subscription,
}

impl SnapshotRecorder {
    /// Start recording `controller`'s emissions.
    pub fn attach<G: ContainerQueryEngine>(controller: &QueryBindingController<G>) -> Self {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let subscription = controller.subscribe(move |v| sink.borrow_mut().push(v.clone()));
        Self {
            log,
            _subscription: subscription,
        }
    }

    /// All snapshots so far, oldest first.
    #[must_use]
    pub fn snapshots(&self) -> Vec<MatchVector> {
        self.log.borrow().clone()
    }

    /// Most recent snapshot.
    #[must_use]
    pub fn last(&self) -> Option<MatchVector> {
        self.log.borrow().last().cloned()
    }

    /// Number of snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// Whether nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    /// Forget recorded snapshots.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    /// One JSON array per line, e.g. `[true,false]`.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for snapshot in self.log.borrow().iter() {
            // A Vec<bool> always serializes.
            if let Ok(line) = serde_json::to_string(snapshot) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }

    /// BLAKE3 digest of [`to_jsonl`](Self::to_jsonl), hex encoded.
    #[must_use]
    pub fn digest(&self) -> String {
        blake3::hash(self.to_jsonl().as_bytes()).to_hex().to_string()
    }
}

impl std::fmt::Debug for SnapshotRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotRecorder")
            .field("snapshots", &self.len())
            .finish()
    }
}
