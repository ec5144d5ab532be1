//! WebSocket Real-Time Updates
//!
//! Pushes a user's changes to their open clients as they happen, the way a
//! hosted document database pushes snapshot updates.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Manages connections, their owners and subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! ## Topics
//!
//! `logs`, `goal`, `settings`, `notifications`, `reminders`, `achievements`,
//! `alerts`, or `*` for all of them.
//!
//! ## Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8090/api/v1/ws');
//!
//! ws.onopen = () => {
//!   ws.send(JSON.stringify({type: 'subscribe', topics: ['logs', 'alerts']}));
//! };
//!
//! ws.onmessage = (event) => console.log(JSON.parse(event.data));
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage, WsEvent, TOPICS, WILDCARD_TOPIC};
