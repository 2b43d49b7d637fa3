//! Repositories combine the local cache with a [`RemoteStore`].
//!
//! [`RemoteStore`]: crate::remote::RemoteStore

mod coach;
mod progress;
mod workout;

pub use coach::CoachRepository;
pub use progress::ProgressRepository;
pub use workout::{SyncReport, WorkoutRepository};
