mod participant;
mod signaling;

pub use participant::ParticipantId;
pub use signaling::{ClientSignal, EndReason, ErrorCode, IceServerConfig, ServerSignal, SignalKind};
