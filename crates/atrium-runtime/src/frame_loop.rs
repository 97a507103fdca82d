//! Render/update scheduler: one tick cycle driving every subscribed component

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Instant;

/// Upper bound on the delta handed to subscribers. Long stalls (window
/// minimized, debugger break) would otherwise feed the simulation one huge
/// step and destabilize it.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// A component ticked once per frame by the loop
pub trait Updatable {
    fn update(&mut self, delta: f32);
}

/// Shared handle to an updatable component
pub type UpdatableHandle = Rc<RefCell<dyn Updatable>>;

/// Shared handle to the frame loop
pub type LoopHandle = Rc<RefCell<FrameLoop>>;

/// The per-frame scheduler.
///
/// Holds an unordered set of subscribers; no ordering guarantee between
/// them exists and none may be relied on. Subscribers are weakly held, so
/// a dropped component simply stops receiving ticks.
///
/// The loop is host-driven: the windowing layer calls [`FrameLoop::tick`]
/// once per frame (or [`FrameLoop::tick_with`] with its own timing).
pub struct FrameLoop {
    subscribers: HashMap<usize, Weak<RefCell<dyn Updatable>>>,
    running: bool,
    last_instant: Option<Instant>,
}

fn handle_key(handle: &UpdatableHandle) -> usize {
    Rc::as_ptr(handle) as *const () as usize
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
            running: false,
            last_instant: None,
        }
    }

    /// Convenience: a new loop already wrapped in its shared handle
    pub fn handle() -> LoopHandle {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Add a component to the tick cycle. Subscribing the same component
    /// twice keeps a single registration.
    pub fn subscribe(&mut self, updatable: &UpdatableHandle) {
        self.subscribers
            .insert(handle_key(updatable), Rc::downgrade(updatable));
    }

    /// Remove a component from the tick cycle
    pub fn unsubscribe(&mut self, updatable: &UpdatableHandle) {
        self.subscribers.remove(&handle_key(updatable));
    }

    /// Begin ticking. Idempotent: calling while already running keeps the
    /// elapsed-time clock untouched.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_instant = Some(Instant::now());
    }

    /// Stop ticking. A tick already in flight finishes its running-flag
    /// checks and no-ops for the remaining subscribers.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run one tick, deriving the delta from the wall clock
    pub fn tick(this: &LoopHandle) {
        let delta = {
            let mut frame_loop = this.borrow_mut();
            if !frame_loop.running {
                return;
            }
            frame_loop.frame_delta()
        };
        Self::tick_with(this, delta);
    }

    /// Run one tick with an explicit delta (clamped to `[0, MAX_FRAME_DELTA]`).
    ///
    /// The subscriber list is snapshotted before dispatch, so callbacks may
    /// subscribe/unsubscribe or stop the loop without re-entrancy issues;
    /// a stop mid-tick skips the remaining subscribers.
    pub fn tick_with(this: &LoopHandle, delta: f32) {
        let delta = delta.clamp(0.0, MAX_FRAME_DELTA);

        let snapshot: Vec<Weak<RefCell<dyn Updatable>>> = {
            let frame_loop = this.borrow();
            if !frame_loop.running {
                return;
            }
            frame_loop.subscribers.values().cloned().collect()
        };

        for weak in snapshot {
            if !this.borrow().running {
                break;
            }
            if let Some(subscriber) = weak.upgrade() {
                subscriber.borrow_mut().update(delta);
            }
        }

        this.borrow_mut()
            .subscribers
            .retain(|_, weak| weak.strong_count() > 0);
    }

    fn frame_delta(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = match self.last_instant {
            Some(prev) => now.duration_since(prev).as_secs_f32(),
            None => 0.0,
        };
        self.last_instant = Some(now);
        elapsed.min(MAX_FRAME_DELTA)
    }
}
