//! Capability-polymorphic units of behavior driven by the world.
//!
//! A [`System`] declares which phases it participates in via
//! [`phases()`](System::phases): initialize-capable systems run once before
//! the first tick, update-capable systems run every tick, and any system may
//! additionally implement [`close()`](System::close) to release resources it
//! acquired (background listener threads, file handles) when the world shuts
//! down.
//!
//! Hook failures are isolated at the system granularity: a returned
//! [`SystemError`] or a panic inside a hook is logged by the world and does
//! not stop the tick loop or the other systems.

use std::error::Error;
use std::fmt;

use crate::ecs::world::World;

/// The phases a system participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phases {
    /// Run once before the first tick.
    Initialize,
    /// Run every tick.
    Update,
    /// Run once before the first tick and then every tick.
    InitializeUpdate,
}

impl Phases {
    /// Whether the initialize hook participates.
    #[inline]
    pub fn initializes(self) -> bool {
        matches!(self, Phases::Initialize | Phases::InitializeUpdate)
    }

    /// Whether the update hook participates.
    #[inline]
    pub fn updates(self) -> bool {
        matches!(self, Phases::Update | Phases::InitializeUpdate)
    }
}

/// A failure reported by a system hook. Captured and logged by the world;
/// never propagated to other systems.
#[derive(Debug)]
pub struct SystemError {
    message: String,
}

impl SystemError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system error: {}", self.message)
    }
}

impl Error for SystemError {}

impl From<&str> for SystemError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for SystemError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// A unit of per-tick or one-time behavior operating over groups and the
/// world. Hooks not covered by the declared phases are never invoked, so the
/// defaults are no-ops.
pub trait System: Send + 'static {
    /// A short name for diagnostics.
    fn name(&self) -> &str {
        "system"
    }

    /// Which phases this system participates in.
    fn phases(&self) -> Phases;

    /// Invoked once before the first tick, in registration order.
    fn initialize(&mut self, _world: &mut World) -> Result<(), SystemError> {
        Ok(())
    }

    /// Invoked every tick, in registration order.
    fn update(&mut self, _world: &mut World) -> Result<(), SystemError> {
        Ok(())
    }

    /// Release hook invoked exactly once per system instance at world close,
    /// regardless of how many phases the system was filed under.
    fn close(&mut self) -> Result<(), SystemError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_capabilities() {
        assert!(Phases::Initialize.initializes());
        assert!(!Phases::Initialize.updates());
        assert!(Phases::Update.updates());
        assert!(!Phases::Update.initializes());
        assert!(Phases::InitializeUpdate.initializes());
        assert!(Phases::InitializeUpdate.updates());
    }

    #[test]
    fn system_error_displays_message() {
        let err = SystemError::from("listener thread did not stop");
        assert_eq!(err.to_string(), "system error: listener thread did not stop");
    }
}
