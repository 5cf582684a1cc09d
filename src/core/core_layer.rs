// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "watch/watch_service.rs"]
pub mod watch;
