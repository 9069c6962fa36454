//! Render engine interface and the external-program bridge.
//!
//! The batch dispatcher only knows the [`Renderer`] trait. The
//! [`CommandRenderer`] implementation talks to a depth-animation engine
//! running as a separate process.

pub mod command;
pub mod renderer;
pub mod subprocess;

pub use command::{CommandRenderer, EngineHandle};
pub use renderer::{RenderError, Renderer, ResourceConfig, ResourceInitError};
