//! Outbound message payloads: embeds, allowed mentions, flags, and the
//! top-level [`MessageBuilder`].
//!
//! These mirror the chat platform's message-object docs so callers never
//! hand-assemble JSON. The builder aggregates everything a webhook or bot
//! message can carry and [`MessageBuilder::to_payload`] renders the wire
//! object; [`MessageBuilder::validate`] is run by the façades before any
//! request leaves the device.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::component::Component;
use crate::response::InvalidParameter;

// ---------------------------------------------------------------------------
// Message flags
// ---------------------------------------------------------------------------

bitflags! {
    /// Bitfield sent as the payload's `flags` key.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MessageFlags: u64 {
        const SUPPRESS_EMBEDS = 1 << 2;
        const SUPPRESS_NOTIFICATIONS = 1 << 12;
        const IS_VOICE_MESSAGE = 1 << 13;
        const IS_COMPONENTS_V2 = 1 << 15;
    }
}

// ---------------------------------------------------------------------------
// Embeds
// ---------------------------------------------------------------------------

/// Maximum number of fields a single embed may carry.
pub const EMBED_FIELD_MAX: usize = 25;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// ISO 8601 timestamp rendered in the embed footer line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<EmbedMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<EmbedProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Add a field. Fields past the 25-field cap are dropped.
    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        if self.fields.len() >= EMBED_FIELD_MAX {
            warn!("embed already has {} fields, dropping field", EMBED_FIELD_MAX);
            return self;
        }
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter {
            text: text.into(),
            icon_url: None,
        });
        self
    }

    pub fn footer_with_icon(
        mut self,
        text: impl Into<String>,
        icon_url: impl Into<String>,
    ) -> Self {
        self.footer = Some(EmbedFooter {
            text: text.into(),
            icon_url: Some(icon_url.into()),
        });
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(EmbedMedia::new(url));
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(EmbedMedia::new(url));
        self
    }

    pub fn video(mut self, url: impl Into<String>) -> Self {
        self.video = Some(EmbedMedia::new(url));
        self
    }

    pub fn provider(mut self, provider: EmbedProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn author(mut self, author: EmbedAuthor) -> Self {
        self.author = Some(author);
        self
    }

    /// Set the timestamp from a pre-formatted ISO 8601 string.
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Set the timestamp from a [`DateTime`], rendered as RFC 3339.
    pub fn timestamp_at(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at.to_rfc3339());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EmbedMedia {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl EmbedMedia {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            proxy_url: None,
            height: None,
            width: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EmbedProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl EmbedAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            icon_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

// ---------------------------------------------------------------------------
// Allowed mentions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MentionType {
    /// Leave the `parse` key out entirely (platform default behavior).
    #[default]
    Unset,
    /// Empty `parse` array: the message pings nobody.
    NoMention,
    Users,
    Roles,
    Everyone,
}

/// Controls who a message is allowed to ping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowedMentions {
    mention_type: MentionType,
    user_ids: Vec<String>,
    role_ids: Vec<String>,
}

impl AllowedMentions {
    /// Id lists are capped at 100 entries, the platform maximum.
    pub const ID_MAX: usize = 100;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn mention_type(mut self, mention_type: MentionType) -> Self {
        self.mention_type = mention_type;
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        if self.user_ids.len() >= Self::ID_MAX {
            warn!("allowed-mentions user list is full, dropping id");
            return self;
        }
        self.user_ids.push(user_id.into());
        self
    }

    pub fn role_id(mut self, role_id: impl Into<String>) -> Self {
        if self.role_ids.len() >= Self::ID_MAX {
            warn!("allowed-mentions role list is full, dropping id");
            return self;
        }
        self.role_ids.push(role_id.into());
        self
    }

    pub fn to_value(&self) -> Value {
        let mut doc = Map::new();
        match self.mention_type {
            MentionType::Unset => {}
            MentionType::NoMention => {
                doc.insert("parse".to_string(), json!([]));
            }
            MentionType::Users => {
                doc.insert("parse".to_string(), json!(["users"]));
            }
            MentionType::Roles => {
                doc.insert("parse".to_string(), json!(["roles"]));
            }
            MentionType::Everyone => {
                doc.insert("parse".to_string(), json!(["everyone"]));
            }
        }
        if !self.user_ids.is_empty() {
            doc.insert("users".to_string(), json!(self.user_ids));
        }
        if !self.role_ids.is_empty() {
            doc.insert("roles".to_string(), json!(self.role_ids));
        }
        Value::Object(doc)
    }
}

impl Serialize for AllowedMentions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// MessageBuilder
// ---------------------------------------------------------------------------

/// Maximum number of embeds a non-V2 message may carry.
pub const EMBED_MAX: usize = 10;

/// Accumulates everything an outbound message can carry.
///
/// Built empty, mutated through chained setters, then read by
/// [`validate`](Self::validate) and [`to_payload`](Self::to_payload). Both
/// take `&self`, so a builder can be serialized repeatedly and reused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBuilder {
    content: Option<String>,
    username: Option<String>,
    avatar_url: Option<String>,
    tts: bool,
    voice_message: bool,
    suppress_embeds: bool,
    suppress_notifications: bool,
    embeds: Vec<Embed>,
    allowed_mentions: Option<AllowedMentions>,
    components: Vec<Component>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Override the sender name (webhook messages only).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Override the sender avatar (webhook messages only).
    pub fn avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    pub fn tts(mut self, tts: bool) -> Self {
        self.tts = tts;
        self
    }

    /// Mark the message as a voice message. Ignored on the webhook path.
    pub fn voice_message(mut self, voice_message: bool) -> Self {
        self.voice_message = voice_message;
        self
    }

    pub fn suppress_embeds(mut self, suppress: bool) -> Self {
        self.suppress_embeds = suppress;
        self
    }

    pub fn suppress_notifications(mut self, suppress: bool) -> Self {
        self.suppress_notifications = suppress;
        self
    }

    pub fn allowed_mentions(mut self, allowed_mentions: AllowedMentions) -> Self {
        self.allowed_mentions = Some(allowed_mentions);
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn embeds(mut self, embeds: impl IntoIterator<Item = Embed>) -> Self {
        self.embeds.extend(embeds);
        self
    }

    pub fn clear_embeds(mut self) -> Self {
        self.embeds.clear();
        self
    }

    pub fn component(mut self, component: impl Into<Component>) -> Self {
        self.components.push(component.into());
        self
    }

    pub fn components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        self.components.extend(components);
        self
    }

    pub fn clear_components(mut self) -> Self {
        self.components.clear();
        self
    }

    /// Whether any component in the tree is a V2 display component, which
    /// switches the whole message into component-only mode.
    pub fn is_components_v2(&self) -> bool {
        self.components.iter().any(Component::is_v2)
    }

    /// Check the platform's mutual-exclusion rules. Run by the façades
    /// before anything touches the network.
    pub fn validate(&self) -> Result<(), InvalidParameter> {
        if self.is_components_v2() {
            if self.components.is_empty() {
                return Err(InvalidParameter::ComponentsV2Empty);
            }
            if !self.embeds.is_empty() || self.content.is_some() {
                return Err(InvalidParameter::ComponentsV2Exclusive);
            }
        } else if self.embeds.len() > EMBED_MAX {
            return Err(InvalidParameter::TooManyEmbeds);
        }
        Ok(())
    }

    /// Render the wire payload.
    ///
    /// The webhook path suppresses the voice-message flag and drops
    /// top-level buttons that are not Link-style, neither of which the
    /// webhook API accepts.
    pub fn to_payload(&self, for_webhook: bool) -> Value {
        let v2 = self.is_components_v2();

        let mut flags = MessageFlags::empty();
        if self.suppress_embeds {
            flags |= MessageFlags::SUPPRESS_EMBEDS;
        }
        if self.suppress_notifications {
            flags |= MessageFlags::SUPPRESS_NOTIFICATIONS;
        }
        if v2 {
            flags |= MessageFlags::IS_COMPONENTS_V2;
        }
        if self.voice_message && !for_webhook {
            flags |= MessageFlags::IS_VOICE_MESSAGE;
        }

        let mut doc = Map::new();
        doc.insert("flags".to_string(), json!(flags.bits()));
        if let Some(content) = &self.content {
            doc.insert("content".to_string(), json!(content));
        }
        if let Some(username) = &self.username {
            doc.insert("username".to_string(), json!(username));
        }
        if let Some(avatar_url) = &self.avatar_url {
            doc.insert("avatar_url".to_string(), json!(avatar_url));
        }
        if self.tts {
            doc.insert("tts".to_string(), json!(true));
        }
        if let Some(allowed_mentions) = &self.allowed_mentions {
            doc.insert("allowed_mentions".to_string(), allowed_mentions.to_value());
        }
        if !self.embeds.is_empty() {
            doc.insert(
                "embeds".to_string(),
                serde_json::to_value(&self.embeds).unwrap_or_default(),
            );
        }
        if !self.components.is_empty() {
            let mut rendered = Vec::with_capacity(self.components.len());
            for component in &self.components {
                if for_webhook {
                    if let Component::Button(button) = component {
                        if !button.is_link() {
                            debug!("webhook payload drops non-link top-level buttons");
                            continue;
                        }
                    }
                }
                rendered.push(component.to_value());
            }
            doc.insert("components".to_string(), Value::Array(rendered));
        }
        Value::Object(doc)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
