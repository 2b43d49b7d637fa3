//! Observable view state for front ends.
//!
//! Each container publishes its fields through `tokio::sync::watch`
//! channels. Actions spawn one task and return its handle. Optimistic
//! edits are published before the handle is returned.

mod auth;
mod coach;
mod workout;

pub use auth::{AuthState, AuthViewModel};
pub use coach::CoachViewModel;
pub use workout::WorkoutViewModel;
