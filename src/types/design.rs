//! Live design state owned by an editing session.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::analysis::{
    AnalyzedItem, AnalyzedMessage, BaselineAnalysis, ItemSize, MessageKind, MessagePosition,
    Position, TopperClassification,
};
use super::cake::{CakeInfo, IcingDesign};

/// Stable identity of a decoration or message for its whole UI lifetime.
///
/// `generation` is the analysis generation that minted the id, `seq` the
/// position within that generation. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct ItemId {
    pub generation: u32,
    pub seq: u32,
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}-{}", self.generation, self.seq)
    }
}

/// Opaque image payload (base64 data plus MIME type).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageData {
    pub mime_type: String,
    pub data: String,
}

/// Snapshot of a decoration as it appeared in the accepted baseline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ItemOriginal {
    pub item_type: String,
    pub description: String,
    pub color: Option<String>,
    pub colors: Vec<Option<String>>,
}

/// A main topper or support element in the live state.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Decoration {
    pub id: ItemId,
    pub enabled: bool,
    pub item_type: String,
    pub description: String,
    pub size: ItemSize,
    pub quantity: u32,
    pub group_id: String,
    pub classification: Option<TopperClassification>,
    pub color: Option<String>,
    pub colors: Vec<Option<String>>,
    pub subtype: Option<String>,
    pub position: Option<Position>,
    pub replacement_image: Option<ImageData>,
    /// Baseline view; `None` for items the user added after the baseline.
    pub original: Option<ItemOriginal>,
}

pub type Topper = Decoration;
pub type SupportElement = Decoration;

impl Decoration {
    /// Build from an analysed item, capturing it as the original view.
    pub fn from_analysis(id: ItemId, item: &AnalyzedItem) -> Self {
        Self {
            id,
            enabled: true,
            item_type: item.item_type.clone(),
            description: item.description.clone(),
            size: item.size,
            quantity: item.quantity,
            group_id: item.group_id.clone(),
            classification: item.classification,
            color: item.color.clone(),
            colors: item.colors.clone(),
            subtype: item.subtype.clone(),
            position: item.position(),
            replacement_image: None,
            original: Some(ItemOriginal {
                item_type: item.item_type.clone(),
                description: item.description.clone(),
                color: item.color.clone(),
                colors: item.colors.clone(),
            }),
        }
    }

    /// Build a user-added item with no baseline counterpart.
    pub fn added(id: ItemId, draft: &AnalyzedItem) -> Self {
        Self {
            original: None,
            ..Self::from_analysis(id, draft)
        }
    }

    /// Current view expressed as an analysis item.
    pub fn to_analyzed(&self) -> AnalyzedItem {
        AnalyzedItem {
            item_type: self.item_type.clone(),
            description: self.description.clone(),
            size: self.size,
            quantity: self.quantity,
            group_id: self.group_id.clone(),
            classification: self.classification,
            color: self.color.clone(),
            colors: self.colors.clone(),
            subtype: self.subtype.clone(),
            x: self.position.map(|p| p.x),
            y: self.position.map(|p| p.y),
        }
    }

    /// Overwrite the original view with the current view.
    pub fn capture_original(&mut self) {
        self.original = Some(ItemOriginal {
            item_type: self.item_type.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            colors: self.colors.clone(),
        });
    }

    /// Apply a user patch. Identity and original view are never touched.
    pub fn apply(&mut self, patch: &DecorationPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(item_type) = &patch.item_type {
            self.item_type = item_type.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(size) = patch.size {
            self.size = size;
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity;
        }
        if let Some(color) = &patch.color {
            self.color = Some(color.clone());
        }
        if let Some(subtype) = &patch.subtype {
            self.subtype = subtype.clone();
        }
    }
}

/// Partial user edit of a [`Decoration`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecorationPatch {
    pub enabled: Option<bool>,
    pub item_type: Option<String>,
    pub description: Option<String>,
    pub size: Option<ItemSize>,
    pub quantity: Option<u32>,
    pub color: Option<String>,
    pub subtype: Option<Option<String>>,
}

impl DecorationPatch {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Default::default()
        }
    }

    pub fn item_type(item_type: impl Into<String>) -> Self {
        Self {
            item_type: Some(item_type.into()),
            ..Default::default()
        }
    }

    pub fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Default::default()
        }
    }
}

/// Snapshot of a message as it appeared in the accepted baseline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MessageOriginal {
    pub kind: MessageKind,
    pub text: String,
    pub position: MessagePosition,
    pub color: String,
}

/// A cake message in the live state.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub id: ItemId,
    pub enabled: bool,
    pub kind: MessageKind,
    pub text: String,
    pub position: MessagePosition,
    pub color: String,
    /// When false the user picked the colour explicitly.
    pub use_default_color: bool,
    pub coordinates: Option<Position>,
    pub original: Option<MessageOriginal>,
}

impl Message {
    pub fn from_analysis(id: ItemId, msg: &AnalyzedMessage) -> Self {
        Self {
            id,
            enabled: true,
            kind: msg.kind,
            text: msg.text.clone(),
            position: msg.position,
            color: msg.color.clone(),
            use_default_color: true,
            coordinates: match (msg.x, msg.y) {
                (Some(x), Some(y)) => Some(Position { x, y }),
                _ => None,
            },
            original: Some(MessageOriginal {
                kind: msg.kind,
                text: msg.text.clone(),
                position: msg.position,
                color: msg.color.clone(),
            }),
        }
    }

    pub fn added(id: ItemId, draft: &AnalyzedMessage) -> Self {
        Self {
            original: None,
            ..Self::from_analysis(id, draft)
        }
    }

    pub fn to_analyzed(&self) -> AnalyzedMessage {
        AnalyzedMessage {
            kind: self.kind,
            text: self.text.clone(),
            position: self.position,
            color: self.color.clone(),
            x: self.coordinates.map(|p| p.x),
            y: self.coordinates.map(|p| p.y),
        }
    }

    pub fn capture_original(&mut self) {
        self.original = Some(MessageOriginal {
            kind: self.kind,
            text: self.text.clone(),
            position: self.position,
            color: self.color.clone(),
        });
    }

    /// Whether the message contributes visible text.
    pub fn is_visible(&self) -> bool {
        self.enabled && !self.text.trim().is_empty()
    }

    pub fn apply(&mut self, patch: &MessagePatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(color) = &patch.color {
            self.color = color.clone();
            self.use_default_color = false;
        }
        if let Some(use_default) = patch.use_default_color {
            self.use_default_color = use_default;
        }
    }
}

/// Partial user edit of a [`Message`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub enabled: Option<bool>,
    pub kind: Option<MessageKind>,
    pub text: Option<String>,
    pub position: Option<MessagePosition>,
    /// Setting a colour implies the user opted out of the default colour.
    pub color: Option<String>,
    pub use_default_color: Option<bool>,
}

impl MessagePatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Default::default()
        }
    }
}

/// The single mutable live copy of the design.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DesignState {
    pub cake_info: CakeInfo,
    pub toppers: Vec<Topper>,
    pub support_elements: Vec<SupportElement>,
    pub messages: Vec<Message>,
    pub icing: IcingDesign,
    pub free_text: String,
}

impl DesignState {
    pub fn topper(&self, id: ItemId) -> Option<&Topper> {
        self.toppers.iter().find(|t| t.id == id)
    }

    pub fn topper_mut(&mut self, id: ItemId) -> Option<&mut Topper> {
        self.toppers.iter_mut().find(|t| t.id == id)
    }

    pub fn support_element(&self, id: ItemId) -> Option<&SupportElement> {
        self.support_elements.iter().find(|s| s.id == id)
    }

    pub fn support_element_mut(&mut self, id: ItemId) -> Option<&mut SupportElement> {
        self.support_elements.iter_mut().find(|s| s.id == id)
    }

    pub fn message(&self, id: ItemId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn message_mut(&mut self, id: ItemId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Enabled toppers followed by enabled support elements.
    pub fn enabled_decorations(&self) -> impl Iterator<Item = &Decoration> {
        self.toppers
            .iter()
            .chain(self.support_elements.iter())
            .filter(|d| d.enabled)
    }

    /// Replacement images supplied by the user, in topper-then-support order.
    pub fn replacement_images(&self) -> Vec<ImageData> {
        self.toppers
            .iter()
            .chain(self.support_elements.iter())
            .filter(|d| d.enabled)
            .filter_map(|d| d.replacement_image.clone())
            .collect()
    }

    /// Express the enabled parts of the live state as an analysis snapshot.
    ///
    /// Used to re-sync the baseline after a render is accepted.
    pub fn to_analysis(&self) -> BaselineAnalysis {
        BaselineAnalysis {
            cake_type: self.cake_info.cake_type,
            cake_thickness: self.cake_info.thickness.clone(),
            cake_size: Some(self.cake_info.size.clone()),
            main_toppers: self
                .toppers
                .iter()
                .filter(|t| t.enabled)
                .map(Decoration::to_analyzed)
                .collect(),
            support_elements: self
                .support_elements
                .iter()
                .filter(|s| s.enabled)
                .map(Decoration::to_analyzed)
                .collect(),
            cake_messages: self
                .messages
                .iter()
                .filter(|m| m.is_visible())
                .map(Message::to_analyzed)
                .collect(),
            icing_design: self.icing.clone(),
        }
    }
}
