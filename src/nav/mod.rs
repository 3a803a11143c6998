//! URL-driven navigation state.
//!
//! Every screen is addressed by an app-local URL. [`NavState`] is parsed
//! from it and serialized back into it; [`History`] is the back stack.

mod history;
mod location;
mod state;

pub use history::History;
pub use state::NavState;
