//! The editing session: owner of the live design state.
//!
//! Every user mutator marks exactly the field it touches. Cascading
//! corrections caused by structural changes go through an unmarked path so
//! a later reversal can restore those fields from the baseline.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::dirty::{DirtyFieldSet, FieldId};
use super::ids::IdAllocator;
use super::reconcile::{
    project_icing, reconcile, reconcile_coordinates, AnalysisPass, ReconcileSummary,
};
use crate::availability::{classify, AvailabilityTier};
use crate::pricing::{compute_price, PriceBreakdown, RuleSet};
use crate::prelude::Result;
use crate::prompt::{synthesize_prompt, EditInstruction};
use crate::providers::RenderOutcome;
use crate::types::{
    AnalyzedItem, AnalyzedMessage, BaselineAnalysis, CakeInfoUpdate, CakeType, Decoration,
    DecorationPatch, DesignState, IcingColorKey, IcingDesign, ImageData, ItemId, Message,
    MessagePatch, MessagePosition,
};
use crate::Error;

/// Single-user editing session.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EditingSession {
    state: DesignState,
    baseline: Option<BaselineAnalysis>,
    dirty: DirtyFieldSet,
    ids: IdAllocator,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DesignState {
        &self.state
    }

    pub fn baseline(&self) -> Option<&BaselineAnalysis> {
        self.baseline.as_ref()
    }

    pub fn dirty(&self) -> &DirtyFieldSet {
        &self.dirty
    }

    // === Analysis ===

    /// Merge an analysis result and adopt it as the new baseline.
    ///
    /// Returns the one-shot summary for full passes; coordinate passes are
    /// silent.
    pub fn apply_analysis(
        &mut self,
        analysis: BaselineAnalysis,
        pass: AnalysisPass,
    ) -> Option<ReconcileSummary> {
        let summary = match pass {
            AnalysisPass::Full => Some(reconcile(
                &mut self.state,
                &analysis,
                &self.dirty,
                &mut self.ids,
            )),
            AnalysisPass::Coordinates => {
                reconcile_coordinates(&mut self.state, &analysis, &self.dirty, &mut self.ids);
                None
            }
        };
        self.baseline = Some(analysis);
        self.dirty.clear();
        // A dirty format may still disallow what the analysis just merged in.
        let cake_type = self.state.cake_info.cake_type;
        self.correct_for_type(cake_type);

        if let Some(summary) = &summary {
            info!(
                target: "cake_customizer::reconcile",
                toppers = summary.toppers,
                support_elements = summary.support_elements,
                messages = summary.messages,
                preserved = summary.preserved.len(),
                "Design updated from analysis"
            );
        }
        summary
    }

    // === Cake structure ===

    /// User edit of the cake structure.
    pub fn set_cake_info(&mut self, update: CakeInfoUpdate) {
        let previous = self.state.cake_info.cake_type;
        let type_changed = self.state.cake_info.apply(&update);
        self.dirty.mark(FieldId::CakeInfo);
        if type_changed {
            self.correct_for_type(previous);
        }
    }

    /// Structural change that is not a user edit. Marks nothing.
    pub fn apply_system_correction(&mut self, update: CakeInfoUpdate) {
        let previous = self.state.cake_info.cake_type;
        if self.state.cake_info.apply(&update) {
            self.correct_for_type(previous);
        }
    }

    /// Clear or restore fields that depend on the cake format.
    fn correct_for_type(&mut self, previous: CakeType) {
        let current = self.state.cake_info.cake_type;

        if !current.supports_base_board() {
            self.state.icing.gumpaste_base_board = false;
            self.state.icing.border_base = false;
            for msg in &mut self.state.messages {
                if msg.position == MessagePosition::BaseBoard {
                    msg.enabled = false;
                }
            }
            debug!(
                target: "cake_customizer::reconcile",
                cake_type = %current,
                "Base board features cleared for format"
            );
            return;
        }

        if previous.supports_base_board() {
            return;
        }
        let Some(baseline) = &self.baseline else {
            return;
        };
        let projected = project_icing(&baseline.icing_design);
        if !self.dirty.is_dirty(FieldId::IcingBaseBoard) {
            self.state.icing.gumpaste_base_board = projected.gumpaste_base_board;
        }
        if !self.dirty.is_dirty(FieldId::IcingBorderBase) {
            self.state.icing.border_base = projected.border_base;
        }
        if !self.dirty.is_dirty(FieldId::Messages) {
            for msg in &mut self.state.messages {
                if msg.position == MessagePosition::BaseBoard && msg.original.is_some() {
                    msg.enabled = true;
                }
            }
        }
        debug!(
            target: "cake_customizer::reconcile",
            cake_type = %current,
            "Base board features restored from baseline"
        );
    }

    // === Decorations ===

    pub fn update_topper(&mut self, id: ItemId, patch: DecorationPatch) -> Result<()> {
        let topper = self.state.topper_mut(id).ok_or(Error::UnknownItem(id))?;
        topper.apply(&patch);
        self.dirty.mark(FieldId::Toppers);
        Ok(())
    }

    /// Soft-disable a topper. It stays addressable so the diff can emit a removal.
    pub fn remove_topper(&mut self, id: ItemId) -> Result<()> {
        self.update_topper(id, DecorationPatch::enabled(false))
    }

    pub fn add_topper(&mut self, draft: &AnalyzedItem) -> ItemId {
        let id = self.ids.mint();
        self.state.toppers.push(Decoration::added(id, draft));
        self.dirty.mark(FieldId::Toppers);
        id
    }

    pub fn replace_toppers(&mut self, toppers: Vec<Decoration>) {
        self.state.toppers = toppers;
        self.dirty.mark(FieldId::Toppers);
    }

    pub fn set_topper_replacement_image(
        &mut self,
        id: ItemId,
        image: Option<ImageData>,
    ) -> Result<()> {
        let topper = self.state.topper_mut(id).ok_or(Error::UnknownItem(id))?;
        topper.replacement_image = image;
        self.dirty.mark(FieldId::Toppers);
        Ok(())
    }

    pub fn update_support_element(&mut self, id: ItemId, patch: DecorationPatch) -> Result<()> {
        let element = self
            .state
            .support_element_mut(id)
            .ok_or(Error::UnknownItem(id))?;
        element.apply(&patch);
        self.dirty.mark(FieldId::SupportElements);
        Ok(())
    }

    pub fn remove_support_element(&mut self, id: ItemId) -> Result<()> {
        self.update_support_element(id, DecorationPatch::enabled(false))
    }

    pub fn add_support_element(&mut self, draft: &AnalyzedItem) -> ItemId {
        let id = self.ids.mint();
        self.state.support_elements.push(Decoration::added(id, draft));
        self.dirty.mark(FieldId::SupportElements);
        id
    }

    pub fn replace_support_elements(&mut self, elements: Vec<Decoration>) {
        self.state.support_elements = elements;
        self.dirty.mark(FieldId::SupportElements);
    }

    pub fn set_support_replacement_image(
        &mut self,
        id: ItemId,
        image: Option<ImageData>,
    ) -> Result<()> {
        let element = self
            .state
            .support_element_mut(id)
            .ok_or(Error::UnknownItem(id))?;
        element.replacement_image = image;
        self.dirty.mark(FieldId::SupportElements);
        Ok(())
    }

    // === Messages ===

    pub fn update_message(&mut self, id: ItemId, patch: MessagePatch) -> Result<()> {
        let msg = self.state.message_mut(id).ok_or(Error::UnknownItem(id))?;
        msg.apply(&patch);
        self.dirty.mark(FieldId::Messages);
        Ok(())
    }

    pub fn remove_message(&mut self, id: ItemId) -> Result<()> {
        self.update_message(
            id,
            MessagePatch {
                enabled: Some(false),
                ..Default::default()
            },
        )
    }

    pub fn add_message(&mut self, draft: &AnalyzedMessage) -> ItemId {
        let id = self.ids.mint();
        self.state.messages.push(Message::added(id, draft));
        self.dirty.mark(FieldId::Messages);
        id
    }

    // === Icing ===

    /// Replace the icing, marking one field per changed scalar or colour key.
    pub fn set_icing(&mut self, icing: IcingDesign) {
        let old = &self.state.icing;
        let scalar_changes = [
            (old.base != icing.base, FieldId::IcingBase),
            (old.color_type != icing.color_type, FieldId::IcingColorType),
            (old.drip != icing.drip, FieldId::IcingDrip),
            (old.border_top != icing.border_top, FieldId::IcingBorderTop),
            (old.border_base != icing.border_base, FieldId::IcingBorderBase),
            (
                old.gumpaste_base_board != icing.gumpaste_base_board,
                FieldId::IcingBaseBoard,
            ),
        ];
        let changed_keys: Vec<IcingColorKey> = IcingColorKey::ALL
            .into_iter()
            .filter(|k| old.colors.get(k) != icing.colors.get(k))
            .collect();

        for (changed, field) in scalar_changes {
            if changed {
                self.dirty.mark(field);
            }
        }
        for key in changed_keys {
            self.dirty.mark(FieldId::IcingColor(key));
        }
        self.state.icing = icing;
    }

    pub fn set_icing_color(&mut self, key: IcingColorKey, hex: impl Into<String>) {
        self.state.icing.colors.insert(key, hex.into());
        self.dirty.mark(FieldId::IcingColor(key));
    }

    // === Free text ===

    pub fn set_free_text(&mut self, text: impl Into<String>) {
        self.state.free_text = text.into();
        self.dirty.mark(FieldId::FreeText);
    }

    // === Derived views ===

    pub fn compute_price(&self, rules: &RuleSet) -> PriceBreakdown {
        compute_price(&self.state, rules)
    }

    pub fn availability(&self) -> AvailabilityTier {
        classify(&self.state)
    }

    /// Edit script from the baseline (or an empty 1 Tier cake) to the live state.
    pub fn synthesize_prompt(&self) -> Result<Vec<EditInstruction>> {
        match &self.baseline {
            Some(baseline) => synthesize_prompt(baseline, &self.state),
            None => synthesize_prompt(&BaselineAnalysis::default(), &self.state),
        }
    }

    // === Re-sync ===

    /// Adopt a successful render as the new baseline.
    ///
    /// Originals are re-captured from the state that was rendered, so edits
    /// made while the render was in flight still show up in the next diff.
    /// Those edits also stay dirty; every other marker is cleared.
    pub fn accept_render(&mut self, outcome: &RenderOutcome) {
        let rendered = &outcome.rendered;
        let live = &self.state;
        self.dirty.retain(|field| field_differs(field, rendered, live));

        for topper in &mut self.state.toppers {
            if let Some(shown) = rendered.topper(topper.id) {
                recapture_decoration(topper, shown);
            }
        }
        for element in &mut self.state.support_elements {
            if let Some(shown) = rendered.support_element(element.id) {
                recapture_decoration(element, shown);
            }
        }
        for msg in &mut self.state.messages {
            if let Some(shown) = rendered.message(msg.id) {
                msg.original = if shown.is_visible() {
                    let mut snapshot = shown.clone();
                    snapshot.capture_original();
                    snapshot.original
                } else {
                    None
                };
            }
        }

        self.baseline = Some(rendered.to_analysis());
        info!(
            target: "cake_customizer::reconcile",
            instructions = outcome.instructions.len(),
            still_dirty = self.dirty.len(),
            "Render accepted as new baseline"
        );
    }
}

/// Whether `field` holds different values in `a` and `b`.
fn field_differs(field: FieldId, a: &DesignState, b: &DesignState) -> bool {
    match field {
        FieldId::CakeInfo => a.cake_info != b.cake_info,
        FieldId::Toppers => a.toppers != b.toppers,
        FieldId::SupportElements => a.support_elements != b.support_elements,
        FieldId::Messages => a.messages != b.messages,
        FieldId::FreeText => a.free_text != b.free_text,
        FieldId::IcingBase => a.icing.base != b.icing.base,
        FieldId::IcingColorType => a.icing.color_type != b.icing.color_type,
        FieldId::IcingDrip => a.icing.drip != b.icing.drip,
        FieldId::IcingBorderTop => a.icing.border_top != b.icing.border_top,
        FieldId::IcingBorderBase => a.icing.border_base != b.icing.border_base,
        FieldId::IcingBaseBoard => a.icing.gumpaste_base_board != b.icing.gumpaste_base_board,
        FieldId::IcingColor(key) => a.icing.color(key) != b.icing.color(key),
    }
}

fn recapture_decoration(live: &mut Decoration, shown: &Decoration) {
    if !shown.enabled {
        live.original = None;
        return;
    }
    let mut snapshot = shown.clone();
    snapshot.capture_original();
    live.original = snapshot.original;
    if shown.replacement_image.is_some() && live.replacement_image == shown.replacement_image {
        live.replacement_image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::kind;

    fn analysis() -> BaselineAnalysis {
        let mut icing = IcingDesign {
            gumpaste_base_board: true,
            border_base: true,
            ..Default::default()
        };
        icing
            .colors
            .insert(IcingColorKey::GumpasteBaseBoardColor, "#EC4899".to_string());
        BaselineAnalysis {
            main_toppers: vec![AnalyzedItem::new(kind::EDIBLE_3D_ORDINARY, "bunny")],
            cake_messages: vec![AnalyzedMessage {
                kind: crate::types::MessageKind::IcingScript,
                text: "Love you".to_string(),
                position: MessagePosition::BaseBoard,
                color: "#FFFFFF".to_string(),
                x: None,
                y: None,
            }],
            icing_design: icing,
            ..Default::default()
        }
    }

    #[test]
    fn test_mutators_mark_their_field() {
        let mut session = EditingSession::new();
        session.apply_analysis(analysis(), AnalysisPass::Full);
        let id = session.state().toppers[0].id;

        session
            .update_topper(id, DecorationPatch::color("#EF4444"))
            .unwrap();
        session.set_icing_color(IcingColorKey::Top, "#FFFFFF");

        let dirty: Vec<FieldId> = session.dirty().iter().collect();
        assert_eq!(
            dirty,
            vec![FieldId::Toppers, FieldId::IcingColor(IcingColorKey::Top)]
        );
    }

    #[test]
    fn test_unknown_item_is_error() {
        let mut session = EditingSession::new();
        let missing = ItemId { generation: 7, seq: 7 };
        assert_eq!(
            session.remove_topper(missing),
            Err(Error::UnknownItem(missing))
        );
        assert!(session.dirty().is_empty());
    }

    #[test]
    fn test_set_icing_marks_only_changes() {
        let mut session = EditingSession::new();
        session.apply_analysis(analysis(), AnalysisPass::Full);

        let mut icing = session.state().icing.clone();
        icing.drip = true;
        icing.colors.insert(IcingColorKey::Drip, "#78350F".to_string());
        session.set_icing(icing);

        let dirty: Vec<FieldId> = session.dirty().iter().collect();
        assert_eq!(
            dirty,
            vec![FieldId::IcingDrip, FieldId::IcingColor(IcingColorKey::Drip)]
        );
    }

    #[test]
    fn test_bento_correction_is_reversible() {
        let mut session = EditingSession::new();
        session.apply_analysis(analysis(), AnalysisPass::Full);
        assert!(session.state().icing.gumpaste_base_board);

        session.set_cake_info(CakeInfoUpdate::cake_type(CakeType::Bento));
        assert!(!session.state().icing.gumpaste_base_board);
        assert!(!session.state().icing.border_base);
        assert!(!session.state().messages[0].enabled);
        assert!(!session.dirty().is_dirty(FieldId::IcingBaseBoard));
        assert!(!session.dirty().is_dirty(FieldId::Messages));

        session.set_cake_info(CakeInfoUpdate::cake_type(CakeType::OneTier));
        assert!(session.state().icing.gumpaste_base_board);
        assert!(session.state().icing.border_base);
        assert!(session.state().messages[0].enabled);
    }

    #[test]
    fn test_system_correction_marks_nothing() {
        let mut session = EditingSession::new();
        session.apply_analysis(analysis(), AnalysisPass::Full);
        session.apply_system_correction(CakeInfoUpdate::cake_type(CakeType::Bento));
        assert_eq!(session.state().cake_info.cake_type, CakeType::Bento);
        assert!(session.dirty().is_empty());
    }

    #[test]
    fn test_coordinate_pass_has_no_summary() {
        let mut session = EditingSession::new();
        assert!(session
            .apply_analysis(analysis(), AnalysisPass::Full)
            .is_some());
        assert!(session
            .apply_analysis(analysis(), AnalysisPass::Coordinates)
            .is_none());
    }

    #[test]
    fn test_added_items_get_fresh_ids() {
        let mut session = EditingSession::new();
        session.apply_analysis(analysis(), AnalysisPass::Full);
        let existing = session.state().toppers[0].id;
        let added = session.add_topper(&AnalyzedItem::new(kind::PRINTOUT, "logo"));

        assert_ne!(existing, added);
        assert!(session.state().topper(added).unwrap().original.is_none());
    }
}
