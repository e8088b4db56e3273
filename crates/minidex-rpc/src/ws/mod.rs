pub mod events;
pub mod server;

pub use events::{EventBroadcaster, Subscription, WsEvent};
pub use server::create_ws_router;
