//! Thin chat-platform API clients for connection-constrained targets.
//!
//! `chatwire` formats and sends requests to chat-platform HTTP(S) APIs
//! (the Discord bot API, Discord webhooks, and a Zalo-style bot API) and
//! classifies their JSON responses into typed results. It is written for
//! environments with one physical TLS connection and one application
//! thread: nothing blocks, nothing spawns, and the one async long poll is
//! a cooperative single-flight state machine the caller drives from its
//! own loop.
//!
//! The physical transport is an external collaborator: implement
//! [`Transport`] for your platform's HTTP client and hand it to a façade.
//!
//! ```no_run
//! use chatwire::{DiscordClient, Embed, MessageBuilder};
//! # fn demo<T: chatwire::Transport>(transport: T) -> chatwire::ApiResult {
//! let mut client = DiscordClient::new(transport, "bot-token");
//! let message = MessageBuilder::new()
//!     .content("deploy finished")
//!     .embed(Embed::new().title("build #42").color(0x2ECC71));
//! client.send_message("123456789", &message)
//! # }
//! ```

pub mod component;
pub mod discord;
pub mod dispatch;
pub mod encode;
pub mod message;
pub mod poller;
pub mod response;
pub mod transport;
pub mod zalo;

pub use component::{
    ActionRow, Button, ButtonStyle, Component, ComponentKind, Container, Emoji, File,
    GalleryItem, MediaGallery, MediaItem, Section, Separator, TextDisplay, Thumbnail,
};
pub use discord::{DiscordClient, MessageQuery, WebhookClient};
pub use dispatch::Dispatcher;
pub use message::{
    AllowedMentions, Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedMedia, EmbedProvider,
    MentionType, MessageBuilder, MessageFlags,
};
pub use poller::{PollStatus, Poller};
pub use response::{
    ApiResponse, ApiResult, ClientError, HttpErrorKind, InvalidParameter, TransportError,
};
pub use transport::{Method, Transport, TransportConfig};
pub use zalo::ZaloClient;
