//! Prerender Core Library
//!
//! Core types, configuration, and error handling for the Prerender static
//! document pipeline.

pub mod component;
pub mod config;
pub mod error;
pub mod route;

pub use component::{ComponentError, FnComponent, RenderContext, Renderable, StateStore};
pub use config::{BuildConfig, RenderMode};
pub use error::{CoreError, Result};
pub use route::{Guard, GuardError, Route, RouteModule};
