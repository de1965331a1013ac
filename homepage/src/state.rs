use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type StateMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Values shared with every handler, keyed by type.
///
/// The app always stores its [`Config`](crate::config::Config) here.
#[derive(Default, Clone)]
pub struct AppState {
    inner: StateMap,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Stores `value`, replacing any previous value of the same type.
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.inner.insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.inner
            .get(&TypeId::of::<T>())
            .and_then(|arc| arc.downcast_ref::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_app_state_get_missing() {
        struct Missing;

        let state = AppState::new();
        assert!(state.get::<Missing>().is_none());
    }

    #[test]
    fn test_app_state_holds_config() {
        let state = AppState::new().with(Config::testing());
        assert!(state.get::<Config>().unwrap().testing);
    }

    #[test]
    fn test_app_state_overwrites_same_type() {
        let state = AppState::new()
            .with(Config::default())
            .with(Config::testing());

        assert!(state.get::<Config>().unwrap().testing);
    }

    #[test]
    fn test_app_state_clone_shares_values() {
        let state = AppState::new().with(42i32).with("name".to_string());
        let cloned = state.clone();

        assert_eq!(cloned.get::<i32>(), Some(&42));
        assert_eq!(cloned.get::<String>().map(String::as_str), Some("name"));
    }
}
