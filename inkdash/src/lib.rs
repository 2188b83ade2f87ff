pub mod canvas;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod panel;
pub mod render;
pub mod runtime;
pub mod sampler;
pub mod scheduler;
pub mod sim;
pub mod touch;
pub mod transport;

pub use error::{Error, Result};
