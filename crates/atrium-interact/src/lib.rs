//! Atrium Interact - Raycast interaction targeting
//!
//! Lets the player use objects in the world:
//! - `InteractionTargeting` — per-frame raycast selection, prompt display,
//!   and confirm-key gating
//! - `Interactable` — the capability contract objects implement
//! - `Terminal` — the in-world computer: pauses the frame loop while its
//!   UI is mounted
//! - `register_environment` — registers a loaded scene's flagged nodes

pub mod environment;
pub mod interactable;
pub mod prompt;
pub mod targeting;
pub mod terminal;

pub use environment::{register_environment, Environment};
pub use interactable::{Interactable, InteractableHandle};
pub use prompt::{LogPrompt, PromptSink};
pub use targeting::{InteractionTargeting, CONFIRM_KEY, RAY_FAR, RAY_NEAR};
pub use terminal::{Terminal, TerminalUi, EXIT_KEY};
