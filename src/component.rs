//! Message components: buttons, layout containers, and the V2 display tree.
//!
//! Components form a tree with per-container rules about which child kinds
//! are allowed and how many fit. Rather than mirroring the REST docs with an
//! open class hierarchy, the tree is a closed [`Component`] enum: every
//! node is owned by its parent, `Clone` deep-copies whole subtrees, and
//! [`Component::to_value`] renders the wire JSON without ever mutating the
//! tree.
//!
//! A mutation that violates a container's rules (wrong child kind, capacity
//! reached) is dropped rather than erroring: callers chain setters
//! fire-and-forget style on constrained targets. Each drop is logged at
//! `warn` level so the mistake is visible at integration time.
//!
//! Select menus, text inputs, labels and file uploads are interactive or
//! modal-only kinds; their tags exist for classification but they carry no
//! builder here.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use serde_repr::{Deserialize_repr, Serialize_repr};
use tracing::warn;

// ---------------------------------------------------------------------------
// Kind + style tags
// ---------------------------------------------------------------------------

/// Wire tag of every component kind.
///
/// The numbering is the platform's: V2 display kinds occupy the contiguous
/// range `[Section, Label)`, which is what makes [`ComponentKind::is_v2`] a
/// single pair of comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum ComponentKind {
    ActionRow = 1,
    Button = 2,
    StringSelect = 3,
    TextInput = 4,
    UserSelect = 5,
    RoleSelect = 6,
    MentionableSelect = 7,
    ChannelSelect = 8,
    Section = 9,
    TextDisplay = 10,
    Thumbnail = 11,
    MediaGallery = 12,
    File = 13,
    Separator = 14,
    Container = 17,
    Label = 18,
    FileUpload = 19,
}

impl ComponentKind {
    /// Whether this kind belongs to the V2 display family.
    pub fn is_v2(&self) -> bool {
        let tag = *self as u32;
        tag >= ComponentKind::Section as u32 && tag < ComponentKind::Label as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum ButtonStyle {
    Primary = 1,
    Secondary = 2,
    Success = 3,
    Danger = 4,
    Link = 5,
    Premium = 6,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        ButtonStyle::Primary
    }
}

// ---------------------------------------------------------------------------
// Support records
// ---------------------------------------------------------------------------

/// A unicode or custom guild emoji.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emoji {
    name: String,
    id: Option<u64>,
    animated: bool,
}

impl Emoji {
    /// A plain unicode emoji, e.g. `Emoji::unicode("👍")`.
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            animated: false,
        }
    }

    /// A custom guild emoji identified by name + snowflake.
    pub fn custom(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id: Some(id),
            animated: false,
        }
    }

    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    /// The chat-markup form: `<:name:id>` / `<a:name:id>`, or the bare
    /// unicode character.
    pub fn mention(&self) -> String {
        match self.id {
            Some(id) if self.animated => format!("<a:{}:{}>", self.name, id),
            Some(id) => format!("<:{}:{}>", self.name, id),
            None => self.name.clone(),
        }
    }

    fn to_value(&self) -> Value {
        let mut doc = Map::new();
        if let Some(id) = self.id {
            // Snowflakes travel as strings.
            doc.insert("id".to_string(), json!(id.to_string()));
            doc.insert("animated".to_string(), json!(self.animated));
        }
        doc.insert("name".to_string(), json!(self.name));
        Value::Object(doc)
    }
}

/// An unfurled media reference. Only the URL is sent in requests; the
/// proxy/size fields a server echoes back are response-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaItem {
    url: String,
}

impl MediaItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn to_value(&self) -> Value {
        json!({ "url": self.url })
    }
}

/// One entry of a [`MediaGallery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryItem {
    media: MediaItem,
    description: Option<String>,
    spoiler: bool,
}

impl GalleryItem {
    pub fn new(media: MediaItem) -> Self {
        Self {
            media,
            description: None,
            spoiler: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn spoiler(mut self, spoiler: bool) -> Self {
        self.spoiler = spoiler;
        self
    }

    fn to_value(&self) -> Value {
        let mut doc = Map::new();
        if let Some(description) = &self.description {
            doc.insert("description".to_string(), json!(description));
        }
        doc.insert("spoiler".to_string(), json!(self.spoiler));
        doc.insert("media".to_string(), self.media.to_value());
        Value::Object(doc)
    }
}

// ---------------------------------------------------------------------------
// Concrete components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Button {
    id: Option<u32>,
    style: ButtonStyle,
    label: Option<String>,
    emoji: Option<Emoji>,
    custom_id: String,
    url: Option<String>,
    disabled: bool,
}

impl Button {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn emoji(mut self, emoji: Emoji) -> Self {
        self.emoji = Some(emoji);
        self
    }

    pub fn custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_id = custom_id.into();
        self
    }

    /// Target URL; only emitted for [`ButtonStyle::Link`] buttons.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Whether this is a Link-style button (the only style webhooks accept
    /// at the top level).
    pub fn is_link(&self) -> bool {
        self.style == ButtonStyle::Link
    }

    fn to_value(&self) -> Value {
        let mut doc = base_value(ComponentKind::Button, self.id);
        doc.insert("style".to_string(), json!(self.style as u32));
        if let Some(label) = &self.label {
            doc.insert("label".to_string(), json!(label));
        }
        if let Some(emoji) = &self.emoji {
            doc.insert("emoji".to_string(), emoji.to_value());
        }
        doc.insert("disabled".to_string(), json!(self.disabled));
        // Link buttons carry a URL, every other style a custom_id.
        match (&self.url, self.style) {
            (Some(url), ButtonStyle::Link) => {
                doc.insert("url".to_string(), json!(url));
            }
            _ => {
                if !self.custom_id.is_empty() {
                    doc.insert("custom_id".to_string(), json!(self.custom_id));
                }
            }
        }
        Value::Object(doc)
    }
}

/// A row of up to five buttons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionRow {
    id: Option<u32>,
    components: Vec<Component>,
}

impl ActionRow {
    pub const MAX_CHILDREN: usize = 5;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// Add a child. Non-button kinds and additions past capacity are
    /// dropped.
    pub fn component(mut self, component: impl Into<Component>) -> Self {
        let component = component.into();
        if self.components.len() >= Self::MAX_CHILDREN {
            warn!(kind = ?component.kind(), "action row is full, dropping component");
            return self;
        }
        if component.kind() != ComponentKind::Button {
            warn!(kind = ?component.kind(), "action row only accepts buttons, dropping component");
            return self;
        }
        self.components.push(component);
        self
    }

    pub fn components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        for component in components {
            self = self.component(component);
        }
        self
    }

    pub fn clear_components(mut self) -> Self {
        self.components.clear();
        self
    }

    pub fn children(&self) -> &[Component] {
        &self.components
    }

    fn to_value(&self) -> Value {
        let mut doc = base_value(ComponentKind::ActionRow, self.id);
        doc.insert(
            "components".to_string(),
            Value::Array(self.components.iter().map(Component::to_value).collect()),
        );
        Value::Object(doc)
    }
}

/// Up to three text displays plus one optional button/thumbnail accessory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    id: Option<u32>,
    components: Vec<Component>,
    accessory: Option<Box<Component>>,
}

impl Section {
    pub const MAX_CHILDREN: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn component(mut self, component: impl Into<Component>) -> Self {
        let component = component.into();
        if self.components.len() >= Self::MAX_CHILDREN {
            warn!(kind = ?component.kind(), "section is full, dropping component");
            return self;
        }
        if component.kind() != ComponentKind::TextDisplay {
            warn!(kind = ?component.kind(), "section only accepts text displays, dropping component");
            return self;
        }
        self.components.push(component);
        self
    }

    pub fn components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        for component in components {
            self = self.component(component);
        }
        self
    }

    pub fn clear_components(mut self) -> Self {
        self.components.clear();
        self
    }

    /// Set the accessory. Anything other than a button or thumbnail is
    /// dropped.
    pub fn accessory(mut self, accessory: impl Into<Component>) -> Self {
        let accessory = accessory.into();
        match accessory.kind() {
            ComponentKind::Button | ComponentKind::Thumbnail => {
                self.accessory = Some(Box::new(accessory));
            }
            kind => {
                warn!(?kind, "section accessory must be a button or thumbnail, dropping");
            }
        }
        self
    }

    pub fn children(&self) -> &[Component] {
        &self.components
    }

    pub fn accessory_component(&self) -> Option<&Component> {
        self.accessory.as_deref()
    }

    fn to_value(&self) -> Value {
        let mut doc = base_value(ComponentKind::Section, self.id);
        doc.insert(
            "components".to_string(),
            Value::Array(self.components.iter().map(Component::to_value).collect()),
        );
        if let Some(accessory) = &self.accessory {
            doc.insert("accessory".to_string(), accessory.to_value());
        }
        Value::Object(doc)
    }
}

/// A markdown text block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextDisplay {
    id: Option<u32>,
    content: String,
}

impl TextDisplay {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
        }
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    fn to_value(&self) -> Value {
        let mut doc = base_value(ComponentKind::TextDisplay, self.id);
        doc.insert("content".to_string(), json!(self.content));
        Value::Object(doc)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thumbnail {
    id: Option<u32>,
    media: MediaItem,
    description: Option<String>,
    spoiler: bool,
}

impl Thumbnail {
    pub fn new(media: MediaItem) -> Self {
        Self {
            id: None,
            media,
            description: None,
            spoiler: false,
        }
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn spoiler(mut self, spoiler: bool) -> Self {
        self.spoiler = spoiler;
        self
    }

    fn to_value(&self) -> Value {
        let mut doc = base_value(ComponentKind::Thumbnail, self.id);
        if let Some(description) = &self.description {
            doc.insert("description".to_string(), json!(description));
        }
        doc.insert("spoiler".to_string(), json!(self.spoiler));
        doc.insert("media".to_string(), self.media.to_value());
        Value::Object(doc)
    }
}

/// Up to ten media items displayed as a grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaGallery {
    id: Option<u32>,
    items: Vec<GalleryItem>,
}

impl MediaGallery {
    pub const MAX_ITEMS: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn item(mut self, item: GalleryItem) -> Self {
        if self.items.len() >= Self::MAX_ITEMS {
            warn!("media gallery is full, dropping item");
            return self;
        }
        self.items.push(item);
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = GalleryItem>) -> Self {
        for item in items {
            self = self.item(item);
        }
        self
    }

    pub fn clear_items(mut self) -> Self {
        self.items.clear();
        self
    }

    pub fn gallery_items(&self) -> &[GalleryItem] {
        &self.items
    }

    fn to_value(&self) -> Value {
        let mut doc = base_value(ComponentKind::MediaGallery, self.id);
        doc.insert(
            "items".to_string(),
            Value::Array(self.items.iter().map(GalleryItem::to_value).collect()),
        );
        Value::Object(doc)
    }
}

/// An attached file rendered inline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    id: Option<u32>,
    file: MediaItem,
    spoiler: Option<bool>,
}

impl File {
    pub fn new(file: MediaItem) -> Self {
        Self {
            id: None,
            file,
            spoiler: None,
        }
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn spoiler(mut self, spoiler: bool) -> Self {
        self.spoiler = Some(spoiler);
        self
    }

    fn to_value(&self) -> Value {
        let mut doc = base_value(ComponentKind::File, self.id);
        doc.insert("file".to_string(), self.file.to_value());
        if let Some(spoiler) = self.spoiler {
            doc.insert("spoiler".to_string(), json!(spoiler));
        }
        Value::Object(doc)
    }
}

/// Vertical padding, optionally with a visible divider line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Separator {
    id: Option<u32>,
    divider: Option<bool>,
    spacing: Option<u32>,
}

impl Separator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn divider(mut self, divider: bool) -> Self {
        self.divider = Some(divider);
        self
    }

    pub fn spacing(mut self, spacing: u32) -> Self {
        self.spacing = Some(spacing);
        self
    }

    fn to_value(&self) -> Value {
        let mut doc = base_value(ComponentKind::Separator, self.id);
        if let Some(divider) = self.divider {
            doc.insert("divider".to_string(), json!(divider));
        }
        if let Some(spacing) = self.spacing {
            doc.insert("spacing".to_string(), json!(spacing));
        }
        Value::Object(doc)
    }
}

/// A bordered group of layout components with an optional accent color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    id: Option<u32>,
    components: Vec<Component>,
    accent_color: Option<u32>,
    spoiler: Option<bool>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    /// Add a child. Containers accept the layout family only: action rows,
    /// text displays, sections, media galleries, separators and files.
    pub fn component(mut self, component: impl Into<Component>) -> Self {
        let component = component.into();
        match component.kind() {
            ComponentKind::ActionRow
            | ComponentKind::TextDisplay
            | ComponentKind::Section
            | ComponentKind::MediaGallery
            | ComponentKind::Separator
            | ComponentKind::File => self.components.push(component),
            kind => {
                warn!(?kind, "container does not accept this kind, dropping component");
            }
        }
        self
    }

    pub fn components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        for component in components {
            self = self.component(component);
        }
        self
    }

    pub fn clear_components(mut self) -> Self {
        self.components.clear();
        self
    }

    pub fn accent_color(mut self, accent_color: u32) -> Self {
        self.accent_color = Some(accent_color);
        self
    }

    pub fn spoiler(mut self, spoiler: bool) -> Self {
        self.spoiler = Some(spoiler);
        self
    }

    pub fn children(&self) -> &[Component] {
        &self.components
    }

    fn to_value(&self) -> Value {
        let mut doc = base_value(ComponentKind::Container, self.id);
        doc.insert(
            "components".to_string(),
            Value::Array(self.components.iter().map(Component::to_value).collect()),
        );
        if let Some(accent_color) = self.accent_color {
            doc.insert("accent_color".to_string(), json!(accent_color));
        }
        if let Some(spoiler) = self.spoiler {
            doc.insert("spoiler".to_string(), json!(spoiler));
        }
        Value::Object(doc)
    }
}

// ---------------------------------------------------------------------------
// The closed component union
// ---------------------------------------------------------------------------

/// Any concrete component. Owned tree, value semantics: `Clone` deep-copies
/// the entire subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    ActionRow(ActionRow),
    Button(Button),
    Section(Section),
    TextDisplay(TextDisplay),
    Thumbnail(Thumbnail),
    MediaGallery(MediaGallery),
    File(File),
    Separator(Separator),
    Container(Container),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::ActionRow(_) => ComponentKind::ActionRow,
            Component::Button(_) => ComponentKind::Button,
            Component::Section(_) => ComponentKind::Section,
            Component::TextDisplay(_) => ComponentKind::TextDisplay,
            Component::Thumbnail(_) => ComponentKind::Thumbnail,
            Component::MediaGallery(_) => ComponentKind::MediaGallery,
            Component::File(_) => ComponentKind::File,
            Component::Separator(_) => ComponentKind::Separator,
            Component::Container(_) => ComponentKind::Container,
        }
    }

    /// Whether this node or any node below it is a V2 display component.
    pub fn is_v2(&self) -> bool {
        if self.kind().is_v2() {
            return true;
        }
        match self {
            Component::ActionRow(row) => row.components.iter().any(Component::is_v2),
            _ => false,
        }
    }

    /// Render the wire JSON for this subtree. Pure: the tree is not
    /// mutated and repeated calls yield identical output.
    pub fn to_value(&self) -> Value {
        match self {
            Component::ActionRow(c) => c.to_value(),
            Component::Button(c) => c.to_value(),
            Component::Section(c) => c.to_value(),
            Component::TextDisplay(c) => c.to_value(),
            Component::Thumbnail(c) => c.to_value(),
            Component::MediaGallery(c) => c.to_value(),
            Component::File(c) => c.to_value(),
            Component::Separator(c) => c.to_value(),
            Component::Container(c) => c.to_value(),
        }
    }
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

macro_rules! component_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Component {
                fn from(inner: $variant) -> Self {
                    Component::$variant(inner)
                }
            }
        )*
    };
}

component_from!(
    ActionRow,
    Button,
    Section,
    TextDisplay,
    Thumbnail,
    MediaGallery,
    File,
    Separator,
    Container,
);

fn base_value(kind: ComponentKind, id: Option<u32>) -> Map<String, Value> {
    let mut doc = Map::new();
    doc.insert("type".to_string(), json!(kind as u32));
    if let Some(id) = id {
        doc.insert("id".to_string(), json!(id));
    }
    doc
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
