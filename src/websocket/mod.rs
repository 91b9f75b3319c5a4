/// WebSocket real-time notification transport
///
/// 1. ConnectionRegistry: explicit user-id to connection-set membership
/// 2. Envelope: one-event wire format clients subscribe to
/// 3. WsSession: per-connection actor with heartbeat and cleanup
pub mod messages;
pub mod registry;
pub mod session;

pub use messages::{Envelope, CONNECTED, RECEIVE_NOTIFICATION};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use session::WsSession;
