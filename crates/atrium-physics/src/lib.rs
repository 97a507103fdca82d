//! Atrium Physics - Rapier 3D integration
//!
//! Physics simulation for the Atrium runtime:
//! - `PhysicsWorld` — wraps the Rapier pipeline and body/collider sets,
//!   registers colliders from scene nodes and mirrors simulated poses back
//! - `CharacterController` — kinematic character driven by semantic key
//!   bindings, with jump/gravity/friction integration and facing slerp
//! - `CharacterTuning` — TOML-loadable movement constants

pub mod character;
pub mod config;
pub mod world;

pub use character::{CharacterController, CharacterState};
pub use config::CharacterTuning;
pub use world::{PhysicsWorld, GRAVITY};
