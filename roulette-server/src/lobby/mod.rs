mod lobby;
mod lobby_command;
mod lobby_handle;
mod matchmaker;
mod registry;
mod snapshot;
mod waiting_pool;

pub use lobby::*;
pub use lobby_command::*;
pub use lobby_handle::*;
pub use matchmaker::*;
pub use registry::*;
pub use snapshot::*;
pub use waiting_pool::*;
