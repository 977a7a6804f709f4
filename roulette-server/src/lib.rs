mod app;
mod config;
mod error;
mod lobby;
mod signaling;

pub use app::*;
pub use config::*;
pub use error::*;
pub use lobby::*;
pub use signaling::*;
