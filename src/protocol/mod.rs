//! Contract between a view and its host.
//!
//! The host sends the whole manifest with `load`; the view answers with the
//! whole manifest in `save`. There are no partial updates. Everything the
//! user does on the canvas arrives as a [`UserAction`] and is answered with a
//! [`Reply`].

mod controller;
mod message;
mod port;

pub use controller::ViewController;
pub use message::{HostMessage, Inbound, Reply, UserAction, ViewMessage};
pub use port::{HostEnd, UiEnd, ViewEnd, ViewPort};
