//! WebSocket session actor.
//!
//! One actor per accepted connection. The upgrade handler has already
//! authenticated the socket and resolved its user id; this actor forwards
//! registry pushes into the socket, keeps the heartbeat, and deregisters its
//! connection handle when the session stops.

use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web_actors::ws;
use tokio::sync::mpsc::UnboundedReceiver;

use super::messages::Envelope;
use super::registry::{ConnectionId, ConnectionRegistry};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Frame from the registry destined for this socket
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct PushFrame(String);

pub struct WsSession {
    user_id: String,
    connection_id: ConnectionId,
    registry: ConnectionRegistry,
    hb: Instant,
    // Taken once in started() and pumped into the socket
    rx: Option<UnboundedReceiver<String>>,
}

impl WsSession {
    pub fn new(
        user_id: String,
        connection_id: ConnectionId,
        registry: ConnectionRegistry,
        rx: UnboundedReceiver<String>,
    ) -> Self {
        Self {
            user_id,
            connection_id,
            registry,
            hb: Instant::now(),
            rx: Some(rx),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(
                    user_id = %act.user_id,
                    connection_id = %act.connection_id,
                    "WebSocket heartbeat failed, disconnecting"
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn forward_pushes(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(mut rx) = self.rx.take() {
            let addr = ctx.address();
            actix::spawn(async move {
                while let Some(frame) = rx.recv().await {
                    addr.do_send(PushFrame(frame));
                }
            });
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            user_id = %self.user_id,
            connection_id = %self.connection_id,
            "WebSocket session started"
        );

        self.hb(ctx);
        self.forward_pushes(ctx);

        match Envelope::connected(self.connection_id).to_json() {
            Ok(frame) => ctx.text(frame),
            Err(e) => tracing::error!(
                connection_id = %self.connection_id,
                error = %e,
                "failed to serialize connection confirmation"
            ),
        }
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            user_id = %self.user_id,
            connection_id = %self.connection_id,
            "WebSocket session stopped"
        );

        let registry = self.registry.clone();
        let user_id = self.user_id.clone();
        let connection_id = self.connection_id;

        actix::spawn(async move {
            registry.deregister(&user_id, connection_id).await;
        });
    }
}

impl Handler<PushFrame> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: PushFrame, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(_)) => {
                // push-only channel; client text carries no protocol meaning
                tracing::debug!(
                    user_id = %self.user_id,
                    "ignoring client text frame on push-only channel"
                );
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary WebSocket messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::info!(
                    connection_id = %self.connection_id,
                    "WebSocket close message received: {:?}",
                    reason
                );
                ctx.stop();
            }
            _ => {}
        }
    }
}
