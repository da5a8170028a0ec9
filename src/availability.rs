//! Fulfilment-speed classification.
//!
//! Pure rules over the live state. Precedence is strict: anything that needs
//! the normal lead time wins, then same-day decorations, then the small set
//! of rush-eligible base formats.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{kind, CakeType, Decoration, DesignState, IcingBase};

/// Lead-time tier. Ordered from fastest to slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityTier {
    Rush,
    SameDay,
    Normal,
}

impl fmt::Display for AvailabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AvailabilityTier::Rush => "rush",
            AvailabilityTier::SameDay => "same-day",
            AvailabilityTier::Normal => "normal",
        };
        f.write_str(s)
    }
}

const NORMAL_DECORATIONS: [&str; 4] = [
    kind::EDIBLE_3D_COMPLEX,
    kind::EDIBLE_3D_ORDINARY,
    kind::EDIBLE_2D_SUPPORT,
    kind::EDIBLE_FLOWERS,
];

const RUSH_ROUND_SIZES: [&str; 2] = ["6\" Round", "8\" Round"];

fn is_structurally_complex(state: &DesignState) -> bool {
    let t = state.cake_info.cake_type;
    matches!(
        t,
        CakeType::TwoTier | CakeType::ThreeTier | CakeType::Square | CakeType::Rectangle
    ) || t.is_fondant()
        || state.icing.base == IcingBase::Fondant
}

fn is_same_day_decoration(item: &Decoration) -> bool {
    match item.item_type.as_str() {
        kind::EDIBLE_2D_SUPPORT
        | kind::EDIBLE_PHOTO_TOP
        | kind::EDIBLE_PHOTO_SIDE
        | kind::ICING_DOODLE => true,
        kind::EDIBLE_3D_SUPPORT => !item.description.to_lowercase().contains("dots"),
        _ => false,
    }
}

fn is_rush_base(state: &DesignState) -> bool {
    match state.cake_info.cake_type {
        CakeType::Bento => true,
        CakeType::OneTier => RUSH_ROUND_SIZES.contains(&state.cake_info.size.as_str()),
        _ => false,
    }
}

/// Classify a design. Disabled items do not count.
pub fn classify(state: &DesignState) -> AvailabilityTier {
    let has_normal_decoration = state
        .enabled_decorations()
        .any(|d| NORMAL_DECORATIONS.contains(&d.item_type.as_str()));

    if is_structurally_complex(state)
        || has_normal_decoration
        || state.icing.drip
        || state.icing.gumpaste_base_board
    {
        return AvailabilityTier::Normal;
    }
    if state.enabled_decorations().any(is_same_day_decoration) {
        return AvailabilityTier::SameDay;
    }
    if is_rush_base(state) {
        return AvailabilityTier::Rush;
    }
    AvailabilityTier::Normal
}

/// Most restrictive tier of several designs; `Rush` when there are none.
pub fn aggregate(tiers: impl IntoIterator<Item = AvailabilityTier>) -> AvailabilityTier {
    tiers.into_iter().max().unwrap_or(AvailabilityTier::Rush)
}
