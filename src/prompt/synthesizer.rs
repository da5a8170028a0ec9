//! Baseline-to-live diff, expressed as ordered edit instructions.
//!
//! Output order is fixed: structure, main toppers, support elements, icing,
//! messages, free text. Items are matched to their captured original by id,
//! never by position.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::instruction::{EditInstruction, InstructionTarget, Section};
use super::policy::check_free_text;
use crate::customization::{project_cake_info, project_icing};
use crate::prelude::Result;
use crate::types::{
    describe_color, kind, BaselineAnalysis, CakeInfo, Decoration, DesignState, IcingColorKey,
    IcingDesign, Message, MessagePosition,
};

static FIGURE_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)person|character|human|figure").expect("figure subject regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemRole {
    MainTopper,
    Support,
}

impl ItemRole {
    fn noun(self) -> &'static str {
        match self {
            ItemRole::MainTopper => "main topper",
            ItemRole::Support => "support element",
        }
    }
}

fn same_color(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

fn structural(baseline: &CakeInfo, current: &CakeInfo, out: &mut Vec<EditInstruction>) {
    let push = |out: &mut Vec<EditInstruction>, text: String| {
        out.push(EditInstruction::new(Section::Structural, InstructionTarget::Cake, text));
    };

    let old_tiers = baseline.cake_type.tier_count();
    let new_tiers = current.cake_type.tier_count();
    if old_tiers != new_tiers {
        push(
            out,
            format!(
                "**Reconstruct the cake as a {new_tiers}-tier cake** (it is currently {old_tiers}-tier). \
                 The new cake type is \"{}\", the size is \"{}\" and the thickness is \"{}\". \
                 Redistribute the existing decorations naturally across the tiers and keep the \
                 original style, colours and theme.",
                current.cake_type, current.size, current.thickness
            ),
        );
        return;
    }

    if baseline.cake_type != current.cake_type {
        push(
            out,
            format!(
                "**Change the cake type** from \"{}\" to \"{}\".",
                baseline.cake_type, current.cake_type
            ),
        );
    }
    if baseline.thickness != current.thickness {
        push(
            out,
            format!(
                "**Change the cake thickness** from \"{}\" to \"{}\". Keep the decorations proportional.",
                baseline.thickness, current.thickness
            ),
        );
    }
    if baseline.size != current.size {
        push(
            out,
            format!(
                "**Change the cake size** from \"{}\" to \"{}\".",
                baseline.size, current.size
            ),
        );
    }
}

fn replacement_wording(item: &Decoration, role: ItemRole) -> &'static str {
    let is_figure = FIGURE_SUBJECT.is_match(&item.description);
    match (role, item.item_type.as_str()) {
        (ItemRole::MainTopper, kind::ICING_DOODLE) if is_figure => {
            "**redraw it based on the new reference image provided**. The new drawing must be in \
             the same **piped icing doodle style**. Capture the likeness from the reference photo \
             but render it as a simple, elegant line art portrait using piped icing"
        }
        (ItemRole::MainTopper, kind::ICING_PALETTE_KNIFE) if is_figure => {
            "**redraw it based on the new reference image provided**. The new drawing must be in \
             the same **painterly palette knife style**. Capture the likeness from the reference \
             photo but render it as a textured, abstract portrait using palette knife strokes"
        }
        (ItemRole::MainTopper, kind::EDIBLE_3D_COMPLEX | kind::EDIBLE_3D_ORDINARY) if is_figure => {
            "**re-sculpt this 3D gumpaste figure based on the new reference image provided**. The \
             new figure must be in the same **3D gumpaste style**. Capture the likeness, pose, and \
             details from the reference photo but render it as a hand-sculpted, edible gumpaste figure"
        }
        (ItemRole::MainTopper, kind::PRINTOUT) => {
            "replace its image with the new one provided. The printout topper should be **standing \
             vertically** on the top surface of the cake, as if supported by a small stick from behind"
        }
        (ItemRole::Support, kind::EDIBLE_3D_SUPPORT) if is_figure => {
            "**re-sculpt this small 3D gumpaste item based on the new reference image provided**. \
             The new item must be in the same **3D gumpaste style** as the original cake. Capture \
             the likeness, pose, and details from the reference photo but render it as a small, \
             hand-sculpted, edible gumpaste figure"
        }
        _ => "replace its image with the new one provided",
    }
}

fn item_instruction(item: &Decoration, role: ItemRole) -> Option<String> {
    let noun = role.noun();
    match (&item.original, item.enabled) {
        (Some(original), false) => Some(format!(
            "**Remove the {noun}** described as: \"{}\".",
            original.description
        )),
        (None, false) => None,
        (None, true) => {
            let placement = match role {
                ItemRole::MainTopper => "on the top of the cake",
                ItemRole::Support => "around the existing decorations",
            };
            let color = item
                .color
                .as_deref()
                .map(|c| format!(" in **{}**", describe_color(Some(c))))
                .unwrap_or_default();
            Some(format!(
                "**Add a new {noun}**: \"{}\" made as **{}**{color}. Place it naturally {placement}.",
                item.description, item.item_type
            ))
        }
        (Some(original), true) => {
            let mut changes: Vec<String> = Vec::new();
            if item.item_type != original.item_type {
                changes.push(format!("change its material to **{}**", item.item_type));
            }
            if item.replacement_image.is_some() {
                changes.push(replacement_wording(item, role).to_string());
            }
            if let Some(color) = item.color.as_deref() {
                if !same_color(Some(color), original.color.as_deref()) {
                    changes.push(format!("recolor it to **{}**", describe_color(Some(color))));
                }
            }
            if changes.is_empty() {
                None
            } else {
                Some(format!(
                    "For the {noun} \"{}\": {}.",
                    original.description,
                    changes.join(" and ")
                ))
            }
        }
    }
}

fn items(
    decorations: &[Decoration],
    role: ItemRole,
    out: &mut Vec<EditInstruction>,
) {
    for item in decorations {
        if let Some(text) = item_instruction(item, role) {
            out.push(EditInstruction::new(
                Section::Item,
                InstructionTarget::Item(item.id),
                text,
            ));
        }
    }
}

/// Add/remove/recolour wording for an optional icing feature.
struct FeatureWording {
    add: &'static str,
    remove: &'static str,
    recolor: &'static str,
    color_label: &'static str,
}

fn feature(
    was: bool,
    is: bool,
    old_color: Option<&str>,
    new_color: Option<&str>,
    wording: &FeatureWording,
) -> Option<String> {
    match (was, is) {
        (false, true) => {
            let mut text = wording.add.to_string();
            if new_color.is_some() {
                text.push_str(&format!(
                    " The {} should be **{}**.",
                    wording.color_label,
                    describe_color(new_color)
                ));
            }
            Some(text)
        }
        (true, false) => Some(wording.remove.to_string()),
        (true, true) if !same_color(old_color, new_color) && new_color.is_some() => Some(format!(
            "{} **{}**. Preserve all other details.",
            wording.recolor,
            describe_color(new_color)
        )),
        _ => None,
    }
}

const DRIP: FeatureWording = FeatureWording {
    add: "**Add a drip effect**. Make it look realistic on the existing cake texture.",
    remove: "**Remove the drip effect**.",
    recolor: "**Recolor the drip** to",
    color_label: "drip color",
};

const BASE_BOARD: FeatureWording = FeatureWording {
    add: "**Cover the whole base board with a colored gumpaste covered base board**. Preserve any existing decorations on the base area.",
    remove: "**Remove the gumpaste-covered base board**.",
    recolor: "**Recolor the gumpaste base board** to",
    color_label: "gumpaste covered base board color",
};

const TOP_BORDER: FeatureWording = FeatureWording {
    add: "**Add a piped icing border** around the top edge of the cake.",
    remove: "**Remove the top border**. Leave a clean top edge.",
    recolor: "**Recolor the top border** to",
    color_label: "top border color",
};

const BASE_BORDER: FeatureWording = FeatureWording {
    add: "**Add a piped icing border** around the base of the cake.",
    remove: "**Remove the base border**. Leave a clean bottom edge.",
    recolor: "**Recolor the base border** to",
    color_label: "base border color",
};

fn icing(baseline: &IcingDesign, current: &IcingDesign, out: &mut Vec<EditInstruction>) {
    let mut lines: Vec<String> = Vec::new();

    lines.extend(feature(
        baseline.drip,
        current.drip,
        baseline.color(IcingColorKey::Drip),
        current.color(IcingColorKey::Drip),
        &DRIP,
    ));
    lines.extend(feature(
        baseline.gumpaste_base_board,
        current.gumpaste_base_board,
        baseline.color(IcingColorKey::GumpasteBaseBoardColor),
        current.color(IcingColorKey::GumpasteBaseBoardColor),
        &BASE_BOARD,
    ));

    for (key, surface) in [(IcingColorKey::Side, "side"), (IcingColorKey::Top, "top")] {
        let new = current.color(key);
        if new.is_some() && !same_color(baseline.color(key), new) {
            lines.push(format!(
                "**Recolor the {surface} icing** to **{}**. Preserve all original textures and decorations on this surface.",
                describe_color(new)
            ));
        }
    }

    lines.extend(feature(
        baseline.border_top,
        current.border_top,
        baseline.color(IcingColorKey::BorderTop),
        current.color(IcingColorKey::BorderTop),
        &TOP_BORDER,
    ));
    lines.extend(feature(
        baseline.border_base,
        current.border_base,
        baseline.color(IcingColorKey::BorderBase),
        current.color(IcingColorKey::BorderBase),
        &BASE_BORDER,
    ));

    if baseline.base != current.base {
        lines.push(format!(
            "**Change the icing base** from {} to {}. Keep the same colours and decorations.",
            baseline.base.label(),
            current.base.label()
        ));
    }
    if baseline.color_type != current.color_type {
        lines.push(format!(
            "**Change the icing colour style** to {}.",
            current.color_type.label()
        ));
    }

    out.extend(
        lines
            .into_iter()
            .map(|text| EditInstruction::new(Section::Icing, InstructionTarget::Icing, text)),
    );
}

fn message_instruction(msg: &Message) -> Option<String> {
    let custom_color = !msg.use_default_color;
    match &msg.original {
        Some(original) if !msg.is_visible() => Some(format!(
            "**Remove the message** \"{}\" from the {} of the cake.",
            original.text,
            original.position.as_str()
        )),
        None if !msg.is_visible() => None,
        Some(original) => {
            let text_changed = msg.text != original.text;
            let color_changed = custom_color && !msg.color.eq_ignore_ascii_case(&original.color);
            let moved = msg.position != original.position;
            let restyled = msg.kind != original.kind;
            if !text_changed && !color_changed && !moved && !restyled {
                return None;
            }
            let color = if custom_color {
                describe_color(Some(&msg.color))
            } else {
                "its original color".to_string()
            };
            if moved {
                let rewrite = if text_changed {
                    format!(", rewriting it as \"{}\"", msg.text)
                } else {
                    String::new()
                };
                return Some(format!(
                    "**Move the message** \"{}\" from the {} of the cake to the {}{rewrite}. Render it as {} in {color}, and leave no trace of it at its old location.",
                    original.text,
                    original.position.as_str(),
                    msg.position.as_str(),
                    msg.kind.as_str()
                ));
            }
            if restyled {
                let reading = if text_changed {
                    format!(" reading \"{}\"", msg.text)
                } else {
                    String::new()
                };
                return Some(format!(
                    "**Find the message \"{}\" on the cake and recreate it as {}**{reading}, in {color}. Preserve the original text's general location and size.",
                    original.text,
                    msg.kind.as_str()
                ));
            }
            if msg.position == MessagePosition::BaseBoard {
                let mut text = format!(
                    "**On the cake's base board, replace the existing text** with the message: \"{}\".",
                    msg.text
                );
                if custom_color {
                    text.push_str(&format!(
                        " The text should be written in an 'icing_script' style with the color {}.",
                        describe_color(Some(&msg.color))
                    ));
                } else {
                    text.push_str(" Match the original style and color.");
                }
                return Some(text);
            }
            let style = if custom_color {
                format!(
                    "using the **exact same style** as the original message, but change the **color to {}**.",
                    describe_color(Some(&msg.color))
                )
            } else {
                "using the **exact same style (e.g., piped icing, gumpaste letters) and color** as the original message."
                    .to_string()
            };
            Some(format!(
                "**Find the message \"{}\" on the cake and completely replace the text** with \"{}\", {style} Preserve the original text's general location and size.",
                original.text, msg.text
            ))
        }
        None => {
            if msg.position == MessagePosition::BaseBoard {
                let color = if custom_color {
                    format!("the color {}", describe_color(Some(&msg.color)))
                } else {
                    "a color that contrasts well with the board".to_string()
                };
                return Some(format!(
                    "**On the cake's base board, add the message**: \"{}\". Use an 'icing_script' style in {color}.",
                    msg.text
                ));
            }
            Some(format!(
                "**Add the message** \"{}\" on the {} of the cake as {} in {}.",
                msg.text,
                msg.position.as_str(),
                msg.kind.as_str(),
                describe_color(Some(&msg.color))
            ))
        }
    }
}

/// Diff `current` against `baseline` into the ordered edit script.
///
/// Fails only when the free text violates the no-new-items policy.
pub fn synthesize_prompt(
    baseline: &BaselineAnalysis,
    current: &DesignState,
) -> Result<Vec<EditInstruction>> {
    let mut out = Vec::new();

    structural(&project_cake_info(baseline), &current.cake_info, &mut out);
    items(&current.toppers, ItemRole::MainTopper, &mut out);
    items(&current.support_elements, ItemRole::Support, &mut out);
    icing(&project_icing(&baseline.icing_design), &current.icing, &mut out);

    for msg in &current.messages {
        if let Some(text) = message_instruction(msg) {
            out.push(EditInstruction::new(
                Section::Message,
                InstructionTarget::Message(msg.id),
                text,
            ));
        }
    }

    let free_text = current.free_text.trim();
    if !free_text.is_empty() {
        check_free_text(free_text)?;
        out.push(EditInstruction::new(
            Section::FreeText,
            InstructionTarget::FreeText,
            format!("**Special Instructions:** {free_text}"),
        ));
    }

    debug!(
        target: "cake_customizer::prompt",
        instructions = out.len(),
        "Prompt synthesized"
    );
    Ok(out)
}
