//! Wiring between the loaded config and the core library.

use std::sync::Arc;

use gymway_core::{
    ApiClient, AuthViewModel, CoachRepository, CoachViewModel, HttpIdentityClient,
    HttpRemoteStore, IdentityProvider, LocalCache, ProgressRepository, WorkoutRepository,
    WorkoutViewModel,
};

use crate::config::Config;
use crate::error::CliError;

/// Shared clients for one `gym` invocation.
///
/// The identity client and the remote store share one [`ApiClient`], so a
/// login made through one authenticates the other.
pub struct Context {
    pub config: Config,
    pub local: LocalCache,
    pub identity: Arc<HttpIdentityClient>,
    pub remote: Arc<HttpRemoteStore>,
}

impl Context {
    pub async fn open(config: Config) -> Result<Self, CliError> {
        let local = LocalCache::shared(&config.database_path.value).await?;
        let api = ApiClient::new(&config.server_url.value);

        let identity = match config.session() {
            Some(session) => HttpIdentityClient::with_session(api.clone(), session),
            None => HttpIdentityClient::new(api.clone()),
        };

        Ok(Self {
            config,
            local,
            identity: Arc::new(identity),
            remote: Arc::new(HttpRemoteStore::new(api)),
        })
    }

    pub fn require_uid(&self) -> Result<String, CliError> {
        self.identity.current_uid().ok_or(CliError::NotSignedIn)
    }

    pub fn workouts(&self) -> WorkoutRepository<HttpRemoteStore> {
        WorkoutRepository::new(self.local.clone(), Arc::clone(&self.remote))
    }

    pub fn workout_view(&self) -> WorkoutViewModel<HttpRemoteStore> {
        WorkoutViewModel::new(
            self.workouts(),
            ProgressRepository::new(Arc::clone(&self.remote)),
        )
    }

    pub fn coach_view(&self) -> CoachViewModel<HttpRemoteStore> {
        CoachViewModel::new(CoachRepository::new(
            self.local.clone(),
            Arc::clone(&self.remote),
        ))
    }

    pub fn auth_view(&self) -> AuthViewModel<HttpIdentityClient> {
        AuthViewModel::new(Arc::clone(&self.identity))
    }
}
