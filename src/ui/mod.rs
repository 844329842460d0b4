//! Terminal rendering using ratatui.
//!
//! [`TerminalRenderer`] implements [`Renderer`](crate::render::Renderer) over
//! any ratatui backend: crossterm in the binary, `TestBackend` in tests.

pub mod common;
pub mod dashboard;
pub mod terminal;
pub mod theme;

pub use terminal::TerminalRenderer;
pub use theme::Theme;
