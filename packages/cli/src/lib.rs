// ABOUTME: Library side of the cloudlens CLI
// ABOUTME: Application wiring and terminal rendering shared by the binary and its tests

pub mod app;
pub mod provider;
pub mod render;

pub use app::App;
pub use provider::UnconfiguredProvider;

#[cfg(test)]
mod tests;
