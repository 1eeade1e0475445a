//! Application state management

use std::sync::Arc;

use crate::{
    auth::PasswordHasher,
    config::Config,
    error::{Error, Result},
    repository::Storage,
};

/// Application state shared across handlers
///
/// Cheap to clone: configuration and the hasher sit behind `Arc`s and store
/// handles are themselves shared handles.
#[derive(Debug)]
pub struct AppState<S> {
    config: Arc<Config>,
    storage: S,
    hasher: Arc<PasswordHasher>,
}

impl<S: Clone> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            storage: self.storage.clone(),
            hasher: Arc::clone(&self.hasher),
        }
    }
}

impl<S: Storage> AppState<S> {
    /// Create state from configuration and storage
    ///
    /// # Errors
    ///
    /// Fails when the configured password hashing parameters are invalid.
    pub fn new(config: Config, storage: S) -> Result<Self> {
        let hasher = PasswordHasher::new(&config.auth.password)?;
        Ok(Self {
            config: Arc::new(config),
            storage,
            hasher: Arc::new(hasher),
        })
    }

    /// Create a new state builder
    pub fn builder() -> AppStateBuilder<S> {
        AppStateBuilder::new()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the store collections
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Get the password hasher
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }
}

/// Builder for AppState
pub struct AppStateBuilder<S> {
    config: Option<Config>,
    storage: Option<S>,
    hasher: Option<PasswordHasher>,
}

impl<S: Storage> AppStateBuilder<S> {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: None,
            storage: None,
            hasher: None,
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the store collections
    pub fn storage(mut self, storage: S) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use a specific password hasher instead of one built from configuration
    pub fn hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Build the state
    ///
    /// # Errors
    ///
    /// Fails when no storage was supplied or the password parameters are invalid.
    pub fn build(self) -> Result<AppState<S>> {
        let config = self.config.unwrap_or_default();
        let storage = self
            .storage
            .ok_or_else(|| Error::Internal("AppState requires a storage backend".to_string()))?;
        let hasher = match self.hasher {
            Some(hasher) => hasher,
            None => PasswordHasher::new(&config.auth.password)?,
        };

        Ok(AppState {
            config: Arc::new(config),
            storage,
            hasher: Arc::new(hasher),
        })
    }
}

impl<S: Storage> Default for AppStateBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStorage;

    #[test]
    fn test_builder_requires_storage() {
        let result = AppState::<MemoryStorage>::builder().build();
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn test_builder_uses_config() {
        let mut config = Config::default();
        config.pagination.default_page_size = 25;

        let state = AppState::builder()
            .config(config)
            .storage(MemoryStorage::new())
            .build()
            .unwrap();

        assert_eq!(state.config().pagination.default_page_size, 25);
        assert_eq!(state.hasher().min_password_length(), 6);
    }

    #[test]
    fn test_clone_shares_config() {
        let state = AppState::new(Config::default(), MemoryStorage::new()).unwrap();
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
    }
}
