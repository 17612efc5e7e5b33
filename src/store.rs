//! Device-scoped interaction-mode persistence
//!
//! The terminal remembers whether it last ran as a front-desk station or a
//! self-service kiosk. An explicit override always wins and is persisted
//! for the next start.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// How the terminal is operated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    /// Operator-attended station with a tag scanner.
    FrontDesk,
    /// Resident-facing kiosk with credential login.
    SelfService,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionMode::FrontDesk => "front-desk",
            InteractionMode::SelfService => "self-service",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "front-desk" => Some(InteractionMode::FrontDesk),
            "self-service" => Some(InteractionMode::SelfService),
            _ => None,
        }
    }
}

/// Key-value store for the last-used mode.
pub trait ModeStore: Send + Sync {
    fn load(&self) -> Option<InteractionMode>;
    fn save(&self, mode: InteractionMode);
}

/// File-backed store; the value is a single token in a device-local file.
/// Store failures are logged, never fatal.
pub struct FileModeStore {
    path: PathBuf,
}

impl FileModeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModeStore for FileModeStore {
    fn load(&self) -> Option<InteractionMode> {
        let value = fs::read_to_string(&self.path).ok()?;
        InteractionMode::parse(&value)
    }

    fn save(&self, mode: InteractionMode) {
        if let Err(error) = fs::write(&self.path, mode.as_str()) {
            tracing::warn!(path = %self.path.display(), %error, "failed to persist mode");
        }
    }
}

/// In-memory store for tests and embedders without a writable disk.
#[derive(Default)]
pub struct InMemoryModeStore {
    mode: Mutex<Option<InteractionMode>>,
}

impl InMemoryModeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModeStore for InMemoryModeStore {
    fn load(&self) -> Option<InteractionMode> {
        *self.mode.lock().expect("mode store poisoned")
    }

    fn save(&self, mode: InteractionMode) {
        *self.mode.lock().expect("mode store poisoned") = Some(mode);
    }
}

/// Explicit override > stored value > configured default.
pub fn resolve_mode(
    explicit: Option<InteractionMode>,
    store: &dyn ModeStore,
    default: InteractionMode,
) -> InteractionMode {
    explicit.or_else(|| store.load()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_order() {
        let store = InMemoryModeStore::new();
        assert_eq!(
            resolve_mode(None, &store, InteractionMode::SelfService),
            InteractionMode::SelfService
        );

        store.save(InteractionMode::FrontDesk);
        assert_eq!(
            resolve_mode(None, &store, InteractionMode::SelfService),
            InteractionMode::FrontDesk
        );

        assert_eq!(
            resolve_mode(Some(InteractionMode::SelfService), &store, InteractionMode::FrontDesk),
            InteractionMode::SelfService
        );
    }

    #[test]
    fn test_parse_round_trip() {
        assert_eq!(InteractionMode::parse("front-desk"), Some(InteractionMode::FrontDesk));
        assert_eq!(InteractionMode::parse(" self-service "), Some(InteractionMode::SelfService));
        assert_eq!(InteractionMode::parse("desktop"), None);
    }
}
