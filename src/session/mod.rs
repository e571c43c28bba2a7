//! Edit sessions: at most one pending edit across module settings, system
//! settings and route attributes.

mod draft;
mod session;

pub use draft::{Draft, ModuleDraft, ModulePatch, RouteDraft, RoutePatch, SystemPatch};
pub use session::{BeginEdit, EditSession, EditTarget, Outcome, Resolved, SessionState, Viewing};
