pub mod alert;
pub mod auto;
pub mod behavior;
pub mod binding;
pub mod board;
pub mod condition;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod io_frames;
pub mod scheduler;
pub mod step;
pub mod telemetry;
pub mod teleop;
pub mod trigger;
pub mod types;

pub use error::{CadenceError, Result};
