//! Dirty-field tracking.
//!
//! A marker means the user touched that field since the last accepted
//! baseline; the reconciler must not overwrite it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::IcingColorKey;

/// Mutable field of the design state, at reconciliation granularity.
///
/// Icing colours are tracked per key so unrelated keys stay mergeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum FieldId {
    CakeInfo,
    Toppers,
    SupportElements,
    Messages,
    FreeText,
    IcingBase,
    IcingColorType,
    IcingDrip,
    IcingBorderTop,
    IcingBorderBase,
    IcingBaseBoard,
    IcingColor(IcingColorKey),
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::CakeInfo => f.write_str("cakeInfo"),
            FieldId::Toppers => f.write_str("toppers"),
            FieldId::SupportElements => f.write_str("supportElements"),
            FieldId::Messages => f.write_str("messages"),
            FieldId::FreeText => f.write_str("freeText"),
            FieldId::IcingBase => f.write_str("icing.base"),
            FieldId::IcingColorType => f.write_str("icing.colorType"),
            FieldId::IcingDrip => f.write_str("icing.drip"),
            FieldId::IcingBorderTop => f.write_str("icing.borderTop"),
            FieldId::IcingBorderBase => f.write_str("icing.borderBase"),
            FieldId::IcingBaseBoard => f.write_str("icing.gumpasteBaseBoard"),
            FieldId::IcingColor(key) => write!(f, "icing.colors.{}", key.as_str()),
        }
    }
}

/// Set of fields touched by the user since the last baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DirtyFieldSet {
    fields: BTreeSet<FieldId>,
}

impl DirtyFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a field dirty. Returns true if it was not already marked.
    pub fn mark(&mut self, field: FieldId) -> bool {
        self.fields.insert(field)
    }

    pub fn is_dirty(&self, field: FieldId) -> bool {
        self.fields.contains(&field)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Keep only the markers for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(FieldId) -> bool) {
        self.fields.retain(|f| keep(*f));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Markers in stable order.
    pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.fields.iter().copied()
    }
}
