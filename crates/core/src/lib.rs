//! Event model, calendar convention and window selection shared by the
//! CarePulse insight crates.

pub mod config;
pub mod error;
pub mod event;
pub mod insight;
pub mod time;
pub mod validate;
pub mod window;

pub use config::Config;
pub use error::*;
pub use event::*;
pub use insight::*;
pub use time::{Calendar, TimestampParser};
pub use window::{select_window, Window};
