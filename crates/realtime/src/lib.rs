//! Realtime presence and messaging core for SkillSwap.
//!
//! Connections are admitted by the gateway after authentication, grouped into
//! personal and exchange rooms, and fed chat messages and background events
//! through per-connection outbound queues.

pub mod connections;
pub mod error;
pub mod events;
pub mod fanout;
pub mod memory;
pub mod pipeline;
pub mod rooms;
pub mod session;
pub mod stores;
pub mod types;

pub use connections::{
    ConnectionHandle, ConnectionId, ConnectionManager, EventStream, DEFAULT_OUTBOUND_BUFFER,
};
pub use error::{RealtimeError, RealtimeResult};
pub use events::{
    AchievementUnlocked, ClientEvent, ErrorPayload, FanoutEvent, MessageView, NotificationView,
    SendMessagePayload, ServerEvent, SkillVerified, TranscriptReady,
};
pub use fanout::FanoutGateway;
pub use memory::MemoryStore;
pub use pipeline::{ChatPipeline, MAX_MESSAGE_CHARS};
pub use rooms::RoomRegistry;
pub use session::{Session, SessionOptions};
pub use stores::{ExchangeStore, MessageStore, StoreError, UserStore};
pub use types::{
    ChatMessage, ExchangeId, ExchangeRecord, ExchangeStatus, NewChatMessage, Room, UserId,
    UserProfile,
};
