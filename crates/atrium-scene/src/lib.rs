//! Atrium Scene - Visual scene model
//!
//! Holds the node hierarchy the renderer draws and physics writes into:
//! - `Scene` / `Node` — arena of named nodes with local TRS transforms and
//!   optional bounding half-extents
//! - `AnimationPlayer` — named-clip playback with crossfade
//!
//! Pose composition ignores scale: scale only sizes geometry (and the
//! colliders derived from it), it never shears child positions.

mod animation;
mod node;

pub use animation::AnimationPlayer;
pub use node::{Node, Scene};
