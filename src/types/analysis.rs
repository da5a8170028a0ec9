//! Analysis payload types as produced by the AI analysis provider.
//!
//! Field names follow the provider's JSON schema, so payloads deserialize
//! directly with `serde_json::from_str::<BaselineAnalysis>`.

use serde::{Deserialize, Serialize};

use super::cake::{CakeType, IcingDesign};

/// Relative size of a decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Mixed,
}

impl ItemSize {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemSize::Tiny => "tiny",
            ItemSize::Small => "small",
            ItemSize::Medium => "medium",
            ItemSize::Large => "large",
            ItemSize::Mixed => "mixed",
        }
    }
}

/// Visual prominence assigned by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum TopperClassification {
    #[serde(rename = "hero")]
    Hero,
    #[serde(rename = "support")]
    Support,
    #[serde(rename = "hero + support")]
    HeroAndSupport,
}

/// Lettering technique of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    GumpasteLetters,
    #[default]
    IcingScript,
    Printout,
    Cardstock,
}

impl MessageKind {
    /// Rule-table key and prompt wording.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::GumpasteLetters => "gumpaste_letters",
            MessageKind::IcingScript => "icing_script",
            MessageKind::Printout => "printout",
            MessageKind::Cardstock => "cardstock",
        }
    }
}

/// Where a message sits on the cake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePosition {
    #[default]
    Top,
    Side,
    BaseBoard,
}

impl MessagePosition {
    pub fn as_str(self) -> &'static str {
        match self {
            MessagePosition::Top => "top",
            MessagePosition::Side => "side",
            MessagePosition::BaseBoard => "base board",
        }
    }
}

/// Image coordinates supplied by a coordinate-enrichment pass.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A decoration as reported by analysis (main topper or support element).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalyzedItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size: ItemSize,
    /// Omitted counts deserialize as zero; main toppers are raised to one piece at ingestion.
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<TopperClassification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl AnalyzedItem {
    pub fn new(item_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            description: description.into(),
            size: ItemSize::default(),
            quantity: 1,
            group_id: String::new(),
            classification: None,
            color: None,
            colors: Vec::new(),
            subtype: None,
            x: None,
            y: None,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Position { x, y }),
            _ => None,
        }
    }
}

/// A message as reported by analysis.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalyzedMessage {
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub position: MessagePosition,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

/// Last accepted AI snapshot of the design.
///
/// Immutable once accepted; replaced wholesale by the next analysis or by an
/// accepted render.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BaselineAnalysis {
    #[serde(rename = "cakeType", default)]
    pub cake_type: CakeType,
    #[serde(rename = "cakeThickness", default)]
    pub cake_thickness: String,
    /// Size resolved by a previous render; analysis never reports one.
    #[serde(rename = "cakeSize", default, skip_serializing_if = "Option::is_none")]
    pub cake_size: Option<String>,
    #[serde(default)]
    pub main_toppers: Vec<AnalyzedItem>,
    #[serde(default)]
    pub support_elements: Vec<AnalyzedItem>,
    #[serde(default)]
    pub cake_messages: Vec<AnalyzedMessage>,
    #[serde(default)]
    pub icing_design: IcingDesign,
}

impl Default for BaselineAnalysis {
    /// Stand-in baseline for sessions that have not been analysed yet.
    fn default() -> Self {
        Self {
            cake_type: CakeType::OneTier,
            cake_thickness: CakeType::OneTier.default_thickness().to_string(),
            cake_size: None,
            main_toppers: Vec::new(),
            support_elements: Vec::new(),
            cake_messages: Vec::new(),
            icing_design: IcingDesign::default(),
        }
    }
}

impl BaselineAnalysis {
    /// Thickness, falling back to the format default when the provider left it blank.
    pub fn thickness(&self) -> &str {
        if self.cake_thickness.trim().is_empty() {
            self.cake_type.default_thickness()
        } else {
            &self.cake_thickness
        }
    }

    /// Size, falling back to the format default.
    pub fn size(&self) -> &str {
        self.cake_size
            .as_deref()
            .unwrap_or_else(|| self.cake_type.default_size())
    }

    /// Whether `other` differs from `self` only in item coordinates.
    pub fn same_structure(&self, other: &BaselineAnalysis) -> bool {
        fn strip_items(items: &[AnalyzedItem]) -> Vec<AnalyzedItem> {
            items
                .iter()
                .map(|i| AnalyzedItem {
                    x: None,
                    y: None,
                    ..i.clone()
                })
                .collect()
        }
        fn strip_messages(msgs: &[AnalyzedMessage]) -> Vec<AnalyzedMessage> {
            msgs.iter()
                .map(|m| AnalyzedMessage {
                    x: None,
                    y: None,
                    ..m.clone()
                })
                .collect()
        }
        self.cake_type == other.cake_type
            && self.cake_thickness == other.cake_thickness
            && self.cake_size == other.cake_size
            && self.icing_design == other.icing_design
            && strip_items(&self.main_toppers) == strip_items(&other.main_toppers)
            && strip_items(&self.support_elements) == strip_items(&other.support_elements)
            && strip_messages(&self.cake_messages) == strip_messages(&other.cake_messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "cakeType": "2 Tier",
        "cakeThickness": "4 in",
        "main_toppers": [
            {"type": "toy", "description": "unicorn figure", "size": "large", "quantity": 1,
             "group_id": "g1", "classification": "hero", "color": "#FFFFFF", "x": 10.5, "y": -4.0}
        ],
        "support_elements": [
            {"type": "chocolates", "description": "ferrero balls", "size": "small",
             "group_id": "g2", "subtype": "ferrero", "quantity": 6}
        ],
        "cake_messages": [
            {"type": "icing_script", "text": "Happy 7th", "position": "top", "color": "#000000"}
        ],
        "icing_design": {
            "base": "soft_icing", "color_type": "single",
            "colors": {"side": "#FBCFE8", "top": "#FFFFFF"},
            "border_top": true, "border_base": false, "drip": true, "gumpasteBaseBoard": false
        }
    }"##;

    #[test]
    fn test_deserialize_provider_payload() {
        let analysis: BaselineAnalysis = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(analysis.cake_type, CakeType::TwoTier);
        assert_eq!(analysis.main_toppers.len(), 1);
        assert_eq!(
            analysis.main_toppers[0].classification,
            Some(TopperClassification::Hero)
        );
        assert_eq!(
            analysis.main_toppers[0].position(),
            Some(Position { x: 10.5, y: -4.0 })
        );
        assert_eq!(analysis.support_elements[0].subtype.as_deref(), Some("ferrero"));
        assert_eq!(analysis.cake_messages[0].kind, MessageKind::IcingScript);
        assert!(analysis.icing_design.drip);
    }

    #[test]
    fn test_same_structure_ignores_coordinates() {
        let a: BaselineAnalysis = serde_json::from_str(SAMPLE).unwrap();
        let mut b = a.clone();
        b.main_toppers[0].x = Some(99.0);
        b.cake_messages[0].y = Some(3.0);
        assert!(a.same_structure(&b));

        b.main_toppers[0].description = "pegasus figure".to_string();
        assert!(!a.same_structure(&b));
    }

    #[test]
    fn test_blank_thickness_falls_back() {
        let analysis = BaselineAnalysis {
            cake_type: CakeType::Bento,
            cake_thickness: String::new(),
            ..Default::default()
        };
        assert_eq!(analysis.thickness(), "2 in");
    }
}
