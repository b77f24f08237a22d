#![no_main]

//! Drives a controller through arbitrary lifecycle operations, including
//! reentrant detach from a consumer callback, and checks that the match
//! vector length and listener count always agree with the session.

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mcq_core::QueryList;
use mcq_harness::{Delivery, FakeEngine, Size};
use mcq_runtime::{BindingConfig, DetachPolicy, EmitPolicy, EngineCapability, QueryBindingController};

const POOL: [&str; 6] = [
    "(min-width: 100px)",
    "(min-width: 300px)",
    "(max-width: 200px)",
    "(height >= 50px)",
    "(min-width: 100px) and (max-height: 80px)",
    "(orientation: landscape)",
];

#[derive(Debug, Arbitrary)]
enum Op {
    Attach(u8),
    Detach,
    Resize { element: u8, width: u16, height: u16 },
    SetQueries(Vec<u8>),
    Flush { reversed: bool },
    ToggleReentrantDetach,
}

#[derive(Debug, Arbitrary)]
struct Input {
    deferred: bool,
    reset_on_detach: bool,
    per_index: bool,
    queries: Vec<u8>,
    ops: Vec<Op>,
}

fn to_list(indices: &[u8]) -> QueryList {
    indices
        .iter()
        .take(16)
        .map(|&i| POOL[usize::from(i) % POOL.len()])
        .collect()
}

fuzz_target!(|input: Input| {
    let delivery = if input.deferred {
        Delivery::Deferred
    } else {
        Delivery::Immediate
    };
    let engine = FakeEngine::with_delivery(delivery);
    let elements: Vec<_> = (0..3)
        .map(|_| engine.create_element(Size::new(0.0, 0.0)))
        .collect();
    let mut config = BindingConfig::new();
    if input.reset_on_detach {
        config = config.detach(DetachPolicy::ResetToFalse);
    }
    if input.per_index {
        config = config.emit(EmitPolicy::PerIndex);
    }
    let controller =
        QueryBindingController::with_config(EngineCapability::ready(engine.clone()), to_list(&input.queries), config);

    let reentrant = Rc::new(Cell::new(false));
    let flag = Rc::clone(&reentrant);
    let c = controller.clone();
    let _sub = controller.subscribe(move |_| {
        if flag.get() {
            c.detach();
        }
    });

    for op in input.ops.into_iter().take(256) {
        match op {
            Op::Attach(e) => {
                let element = elements[usize::from(e) % elements.len()];
                controller.attach(element, controller.queries());
            }
            Op::Detach => {
                controller.detach();
            }
            Op::Resize {
                element,
                width,
                height,
            } => {
                let element = elements[usize::from(element) % elements.len()];
                engine.resize(element, Size::new(f32::from(width), f32::from(height)));
            }
            Op::SetQueries(q) => {
                controller.set_queries(to_list(&q));
            }
            Op::Flush { reversed } => {
                if reversed {
                    engine.flush_reversed();
                } else {
                    engine.flush();
                }
            }
            Op::ToggleReentrantDetach => reentrant.set(!reentrant.get()),
        }

        if controller.is_attached() {
            assert_eq!(controller.len(), controller.queries().len());
            assert_eq!(engine.listener_count(), controller.subscription_count());
        } else {
            assert_eq!(engine.listener_count(), 0);
            assert_eq!(controller.subscription_count(), 0);
        }
    }
});
