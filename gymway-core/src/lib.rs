//! GymWay Core Library
//!
//! Workout models, the offline-first local cache, remote document store
//! access and the view state shared by GymWay front ends.

pub mod identity;
pub mod local;
pub mod models;
pub mod remote;
pub mod repository;
pub mod state;
pub mod validation;

pub use identity::{HttpIdentityClient, IdentityError, IdentityProvider, Session};
pub use local::{LocalCache, LocalCacheError};
pub use models::{
    sample_workout_plans, Coach, Difficulty, Exercise, ExerciseStatus, ProfileUpdate, Role, User,
    WorkoutPlan, WorkoutProgress,
};
pub use remote::{
    check_server, ApiClient, HttpRemoteStore, InMemoryRemoteStore, RemoteError, RemoteStore,
};
pub use repository::{CoachRepository, ProgressRepository, SyncReport, WorkoutRepository};
pub use state::{AuthState, AuthViewModel, CoachViewModel, WorkoutViewModel};
pub use validation::ValidationError;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
