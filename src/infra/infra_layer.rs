// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "legifrance/legifrance_client.rs"]
pub mod legifrance;

#[path = "grist/grist_client.rs"]
pub mod grist;
