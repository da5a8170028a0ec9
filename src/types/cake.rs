//! Cake structure and icing types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural format of the cake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum CakeType {
    #[default]
    #[serde(rename = "1 Tier")]
    OneTier,
    #[serde(rename = "2 Tier")]
    TwoTier,
    #[serde(rename = "3 Tier")]
    ThreeTier,
    #[serde(rename = "1 Tier Fondant")]
    OneTierFondant,
    #[serde(rename = "2 Tier Fondant")]
    TwoTierFondant,
    #[serde(rename = "3 Tier Fondant")]
    ThreeTierFondant,
    Square,
    Rectangle,
    Bento,
}

impl CakeType {
    pub const ALL: [CakeType; 9] = [
        CakeType::OneTier,
        CakeType::TwoTier,
        CakeType::ThreeTier,
        CakeType::OneTierFondant,
        CakeType::TwoTierFondant,
        CakeType::ThreeTierFondant,
        CakeType::Square,
        CakeType::Rectangle,
        CakeType::Bento,
    ];

    /// Display label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            CakeType::OneTier => "1 Tier",
            CakeType::TwoTier => "2 Tier",
            CakeType::ThreeTier => "3 Tier",
            CakeType::OneTierFondant => "1 Tier Fondant",
            CakeType::TwoTierFondant => "2 Tier Fondant",
            CakeType::ThreeTierFondant => "3 Tier Fondant",
            CakeType::Square => "Square",
            CakeType::Rectangle => "Rectangle",
            CakeType::Bento => "Bento",
        }
    }

    /// Parse from the display label.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == s.trim())
    }

    /// Number of stacked tiers. Non-tiered formats count as one.
    pub fn tier_count(self) -> u8 {
        match self {
            CakeType::TwoTier | CakeType::TwoTierFondant => 2,
            CakeType::ThreeTier | CakeType::ThreeTierFondant => 3,
            _ => 1,
        }
    }

    pub fn is_fondant(self) -> bool {
        matches!(
            self,
            CakeType::OneTierFondant | CakeType::TwoTierFondant | CakeType::ThreeTierFondant
        )
    }

    /// Whether the format has room for a decorated base board.
    pub fn supports_base_board(self) -> bool {
        self != CakeType::Bento
    }

    pub fn default_size(self) -> &'static str {
        match self {
            CakeType::OneTier | CakeType::OneTierFondant => "8\" Round",
            CakeType::TwoTier | CakeType::TwoTierFondant => "6\"/8\" Round",
            CakeType::ThreeTier | CakeType::ThreeTierFondant => "6\"/8\"/10\" Round",
            CakeType::Square => "8\" Square",
            CakeType::Rectangle => "9\"x13\" Rectangle",
            CakeType::Bento => "4\" Round",
        }
    }

    pub fn default_thickness(self) -> &'static str {
        match self {
            CakeType::Bento => "2 in",
            t if t.is_fondant() => "5 in",
            _ => "4 in",
        }
    }
}

impl fmt::Display for CakeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sponge flavour, one per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum CakeFlavor {
    #[default]
    #[serde(rename = "Chocolate Cake")]
    Chocolate,
    #[serde(rename = "Ube Cake")]
    Ube,
    #[serde(rename = "Vanilla Cake")]
    Vanilla,
    #[serde(rename = "Mocha Cake")]
    Mocha,
}

/// Structural description of the cake.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CakeInfo {
    #[serde(rename = "type")]
    pub cake_type: CakeType,
    pub thickness: String,
    pub size: String,
    pub flavors: Vec<CakeFlavor>,
}

impl CakeInfo {
    /// Defaults for a format: default thickness and size, one default flavour per tier.
    pub fn for_type(cake_type: CakeType) -> Self {
        Self {
            cake_type,
            thickness: cake_type.default_thickness().to_string(),
            size: cake_type.default_size().to_string(),
            flavors: default_flavors(cake_type),
        }
    }

    /// Apply a partial update.
    ///
    /// A format change resets thickness, size and flavours to the new format's
    /// defaults before any explicit values in the same update are applied.
    /// Returns true when the format changed.
    pub fn apply(&mut self, update: &CakeInfoUpdate) -> bool {
        let type_changed = match update.cake_type {
            Some(t) if t != self.cake_type => {
                *self = CakeInfo::for_type(t);
                true
            }
            _ => false,
        };
        if let Some(thickness) = &update.thickness {
            self.thickness = thickness.clone();
        }
        if let Some(size) = &update.size {
            self.size = size.clone();
        }
        if let Some(flavors) = &update.flavors {
            self.flavors = flavors.clone();
        }
        type_changed
    }
}

impl Default for CakeInfo {
    fn default() -> Self {
        Self::for_type(CakeType::default())
    }
}

fn default_flavors(cake_type: CakeType) -> Vec<CakeFlavor> {
    vec![CakeFlavor::default(); cake_type.tier_count() as usize]
}

/// Partial update to [`CakeInfo`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CakeInfoUpdate {
    pub cake_type: Option<CakeType>,
    pub thickness: Option<String>,
    pub size: Option<String>,
    pub flavors: Option<Vec<CakeFlavor>>,
}

impl CakeInfoUpdate {
    pub fn cake_type(cake_type: CakeType) -> Self {
        Self {
            cake_type: Some(cake_type),
            ..Default::default()
        }
    }

    pub fn size(size: impl Into<String>) -> Self {
        Self {
            size: Some(size.into()),
            ..Default::default()
        }
    }
}

/// Icing material covering the cake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IcingBase {
    #[default]
    SoftIcing,
    Fondant,
}

impl IcingBase {
    pub fn label(self) -> &'static str {
        match self {
            IcingBase::SoftIcing => "soft icing",
            IcingBase::Fondant => "fondant",
        }
    }
}

/// Colour layout of the icing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ColorType {
    #[default]
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "gradient_2")]
    Gradient2,
    #[serde(rename = "gradient_3")]
    Gradient3,
    #[serde(rename = "abstract")]
    Abstract,
}

impl ColorType {
    pub fn label(self) -> &'static str {
        match self {
            ColorType::Single => "a single colour",
            ColorType::Gradient2 => "a two-colour gradient",
            ColorType::Gradient3 => "a three-colour gradient",
            ColorType::Abstract => "an abstract colour pattern",
        }
    }
}

/// Individually addressable icing colour slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IcingColorKey {
    Side,
    Top,
    BorderTop,
    BorderBase,
    Drip,
    GumpasteBaseBoardColor,
}

impl IcingColorKey {
    pub const ALL: [IcingColorKey; 6] = [
        IcingColorKey::Side,
        IcingColorKey::Top,
        IcingColorKey::BorderTop,
        IcingColorKey::BorderBase,
        IcingColorKey::Drip,
        IcingColorKey::GumpasteBaseBoardColor,
    ];

    /// Serialized key name.
    pub fn as_str(self) -> &'static str {
        match self {
            IcingColorKey::Side => "side",
            IcingColorKey::Top => "top",
            IcingColorKey::BorderTop => "borderTop",
            IcingColorKey::BorderBase => "borderBase",
            IcingColorKey::Drip => "drip",
            IcingColorKey::GumpasteBaseBoardColor => "gumpasteBaseBoardColor",
        }
    }
}

/// Icing layer of the design.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IcingDesign {
    #[serde(default)]
    pub base: IcingBase,
    #[serde(default)]
    pub color_type: ColorType,
    #[serde(default)]
    pub colors: BTreeMap<IcingColorKey, String>,
    #[serde(default)]
    pub border_top: bool,
    #[serde(default)]
    pub border_base: bool,
    #[serde(default)]
    pub drip: bool,
    #[serde(default, rename = "gumpasteBaseBoard")]
    pub gumpaste_base_board: bool,
}

impl IcingDesign {
    pub fn color(&self, key: IcingColorKey) -> Option<&str> {
        self.colors.get(&key).map(String::as_str)
    }

    /// Whether the base board is present and not plain white.
    ///
    /// A white board is indistinguishable from an undecorated one, so the
    /// analysed flag only counts when a non-white colour accompanies it.
    pub fn has_decorated_base_board(&self) -> bool {
        let is_white = self
            .color(IcingColorKey::GumpasteBaseBoardColor)
            .is_some_and(|c| c.eq_ignore_ascii_case("#ffffff"));
        self.gumpaste_base_board && !is_white
    }
}

impl Default for IcingDesign {
    fn default() -> Self {
        Self {
            base: IcingBase::SoftIcing,
            color_type: ColorType::Single,
            colors: BTreeMap::from([(IcingColorKey::Side, "#FFFFFF".to_string())]),
            border_top: false,
            border_base: false,
            drip: false,
            gumpaste_base_board: false,
        }
    }
}
