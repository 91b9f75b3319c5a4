pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod websocket;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::dispatcher::{DeliveryOutcome, NotificationDispatcher, RealtimeTransport};
pub use state::AppState;
pub use websocket::{ConnectionRegistry, Envelope, WsSession};
