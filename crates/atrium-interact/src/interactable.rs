//! The interactable capability contract

use atrium_core::NodeId;
use std::cell::RefCell;
use std::rc::Rc;

/// An object the player can target and activate.
///
/// `objects` lists the scene nodes acting as raycast targets; hitting any
/// of them selects this interactable. Activation side effects (mounting
/// UI, pausing the frame loop) are owned by the implementer.
pub trait Interactable {
    fn objects(&self) -> &[NodeId];
    fn activate(&mut self);
    fn prompt_text(&self) -> &str;
}

/// Shared handle to an interactable
pub type InteractableHandle = Rc<RefCell<dyn Interactable>>;
