//! Atrium Runtime - Frame loop and input routing
//!
//! Provides the per-frame update contract shared by every component:
//! - `FrameLoop` / `Updatable` — single authority for the tick cycle and
//!   frame timing
//! - `Keyboard` / `KeyboardListener` — edge-triggered key distribution
//! - `KeyBindings` / `Action` — raw key to semantic action table
//!
//! Everything here is single-threaded and handle-based: services are
//! explicitly constructed and injected (`Rc<RefCell<_>>`), never reached
//! through module-level globals.

mod bindings;
mod frame_loop;
mod keyboard;

pub use bindings::{Action, KeyBindings};
pub use frame_loop::{FrameLoop, LoopHandle, Updatable, UpdatableHandle, MAX_FRAME_DELTA};
pub use keyboard::{Keyboard, KeyboardHandle, KeyboardListener, ListenerHandle};

// The raw key identifier type, re-exported so downstream crates don't need
// a direct winit dependency.
pub use winit::keyboard::KeyCode;
