//! Merging an incoming analysis into the live design state.
//!
//! Collections the user has not touched are regenerated wholesale with fresh
//! ids and fresh originals. Dirty fields are left alone. Icing colours merge
//! key by key.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::dirty::{DirtyFieldSet, FieldId};
use super::ids::IdAllocator;
use crate::types::{
    kind, AnalyzedItem, AnalyzedMessage, BaselineAnalysis, CakeInfo, Decoration, DesignState,
    IcingColorKey, IcingDesign, Message, Position,
};

static PRINTABLE_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)character|figure|logo|brand").expect("printable subject regex")
});

/// Kind of analysis pass being merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum AnalysisPass {
    /// First or repeated full analysis of the image.
    Full,
    /// Additive pass that only contributes item coordinates.
    Coordinates,
}

/// One-shot notification produced after a full merge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconcileSummary {
    pub toppers: usize,
    pub support_elements: usize,
    pub messages: usize,
    /// Fields kept from the live state because the user had touched them.
    pub preserved: Vec<FieldId>,
}

/// Presentation a main topper defaults to at ingestion.
///
/// Figures, logos and toys are usually ordered as flat printouts, so those
/// start as `printout`; the analysed type stays on the original view.
pub fn default_topper_type(item: &AnalyzedItem) -> &str {
    match item.item_type.as_str() {
        kind::TOY | kind::FIGURINE | kind::PLASTIC_BALL => kind::PRINTOUT,
        kind::EDIBLE_3D_COMPLEX | kind::EDIBLE_3D_ORDINARY | kind::EDIBLE_PHOTO_TOP
            if PRINTABLE_SUBJECT.is_match(&item.description) =>
        {
            kind::PRINTOUT
        }
        other => other,
    }
}

/// Presentation a support element defaults to at ingestion.
pub fn default_support_type(item: &AnalyzedItem) -> &str {
    match item.item_type.as_str() {
        kind::EDIBLE_PHOTO_SIDE => kind::SUPPORT_PRINTOUT,
        other => other,
    }
}

/// Icing as the live state should see it for a given analysis.
///
/// A reported base board only counts when it is not plain white.
pub fn project_icing(icing: &IcingDesign) -> IcingDesign {
    IcingDesign {
        gumpaste_base_board: icing.has_decorated_base_board(),
        ..icing.clone()
    }
}

pub(crate) fn project_cake_info(analysis: &BaselineAnalysis) -> CakeInfo {
    CakeInfo {
        thickness: analysis.thickness().to_string(),
        size: analysis.size().to_string(),
        ..CakeInfo::for_type(analysis.cake_type)
    }
}

fn ingest_toppers(items: &[AnalyzedItem], ids: &mut IdAllocator) -> Vec<Decoration> {
    items
        .iter()
        .map(|item| {
            let mut topper = Decoration::from_analysis(ids.mint(), item);
            topper.item_type = default_topper_type(item).to_string();
            if topper.quantity == 0 {
                topper.quantity = 1;
            }
            topper
        })
        .collect()
}

fn ingest_support(items: &[AnalyzedItem], ids: &mut IdAllocator) -> Vec<Decoration> {
    items
        .iter()
        .map(|item| {
            let mut support = Decoration::from_analysis(ids.mint(), item);
            support.item_type = default_support_type(item).to_string();
            support
        })
        .collect()
}

fn ingest_messages(msgs: &[AnalyzedMessage], ids: &mut IdAllocator) -> Vec<Message> {
    msgs.iter()
        .map(|m| Message::from_analysis(ids.mint(), m))
        .collect()
}

/// Copy coordinates onto items of a dirty collection, matched by their
/// original type and description in analysis order.
fn merge_item_coordinates(items: &mut [Decoration], analyzed: &[AnalyzedItem]) -> usize {
    let mut used = vec![false; analyzed.len()];
    let mut updated = 0;
    for item in items.iter_mut() {
        let Some(original) = &item.original else {
            continue;
        };
        let found = analyzed.iter().enumerate().find(|(i, a)| {
            !used[*i] && a.item_type == original.item_type && a.description == original.description
        });
        if let Some((i, a)) = found {
            used[i] = true;
            if let Some(pos) = a.position() {
                item.position = Some(pos);
                updated += 1;
            }
        }
    }
    updated
}

fn merge_message_coordinates(msgs: &mut [Message], analyzed: &[AnalyzedMessage]) -> usize {
    let mut used = vec![false; analyzed.len()];
    let mut updated = 0;
    for msg in msgs.iter_mut() {
        let Some(original) = &msg.original else {
            continue;
        };
        let found = analyzed
            .iter()
            .enumerate()
            .find(|(i, a)| !used[*i] && a.text == original.text && a.position == original.position);
        if let Some((i, a)) = found {
            used[i] = true;
            if let (Some(x), Some(y)) = (a.x, a.y) {
                msg.coordinates = Some(Position { x, y });
                updated += 1;
            }
        }
    }
    updated
}

fn merge_icing(current: &mut IcingDesign, incoming: &IcingDesign, dirty: &DirtyFieldSet) {
    let incoming = project_icing(incoming);

    if !dirty.is_dirty(FieldId::IcingBase) {
        current.base = incoming.base;
    }
    if !dirty.is_dirty(FieldId::IcingColorType) {
        current.color_type = incoming.color_type;
    }
    if !dirty.is_dirty(FieldId::IcingDrip) {
        current.drip = incoming.drip;
    }
    if !dirty.is_dirty(FieldId::IcingBorderTop) {
        current.border_top = incoming.border_top;
    }
    if !dirty.is_dirty(FieldId::IcingBorderBase) {
        current.border_base = incoming.border_base;
    }
    if !dirty.is_dirty(FieldId::IcingBaseBoard) {
        current.gumpaste_base_board = incoming.gumpaste_base_board;
    }

    // Keys absent from the analysis are dropped unless dirty.
    for key in IcingColorKey::ALL {
        if dirty.is_dirty(FieldId::IcingColor(key)) {
            continue;
        }
        match incoming.colors.get(&key) {
            Some(hex) => {
                current.colors.insert(key, hex.clone());
            }
            None => {
                current.colors.remove(&key);
            }
        }
    }
}

/// Merge `analysis` into `state`, leaving every dirty field untouched.
///
/// Opens a new id generation. The caller owns clearing the dirty set.
pub fn reconcile(
    state: &mut DesignState,
    analysis: &BaselineAnalysis,
    dirty: &DirtyFieldSet,
    ids: &mut IdAllocator,
) -> ReconcileSummary {
    let generation = ids.next_generation();

    if !dirty.is_dirty(FieldId::CakeInfo) {
        state.cake_info = project_cake_info(analysis);
    }
    if !dirty.is_dirty(FieldId::Toppers) {
        state.toppers = ingest_toppers(&analysis.main_toppers, ids);
    }
    if !dirty.is_dirty(FieldId::SupportElements) {
        state.support_elements = ingest_support(&analysis.support_elements, ids);
    }
    if !dirty.is_dirty(FieldId::Messages) {
        state.messages = ingest_messages(&analysis.cake_messages, ids);
    }
    if !dirty.is_dirty(FieldId::FreeText) {
        state.free_text.clear();
    }
    merge_icing(&mut state.icing, &analysis.icing_design, dirty);

    let summary = ReconcileSummary {
        toppers: state.toppers.len(),
        support_elements: state.support_elements.len(),
        messages: state.messages.len(),
        preserved: dirty.iter().collect(),
    };
    debug!(
        target: "cake_customizer::reconcile",
        generation,
        preserved = summary.preserved.len(),
        "Analysis merged"
    );
    summary
}

/// Merge a coordinate-only pass.
///
/// Regenerated collections pick up coordinates through [`reconcile`]; dirty
/// collections keep their items and only receive positions.
pub fn reconcile_coordinates(
    state: &mut DesignState,
    analysis: &BaselineAnalysis,
    dirty: &DirtyFieldSet,
    ids: &mut IdAllocator,
) {
    reconcile(state, analysis, dirty, ids);

    let mut updated = 0;
    if dirty.is_dirty(FieldId::Toppers) {
        updated += merge_item_coordinates(&mut state.toppers, &analysis.main_toppers);
    }
    if dirty.is_dirty(FieldId::SupportElements) {
        updated += merge_item_coordinates(&mut state.support_elements, &analysis.support_elements);
    }
    if dirty.is_dirty(FieldId::Messages) {
        updated += merge_message_coordinates(&mut state.messages, &analysis.cake_messages);
    }
    if updated > 0 {
        info!(
            target: "cake_customizer::reconcile",
            updated,
            "Coordinates applied to edited items"
        );
    }
}
