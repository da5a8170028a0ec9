//! Full rendered prompts for representative edit sessions.

use crate::customization::{AnalysisPass, EditingSession};
use crate::prompt::{render_prompt, NO_CHANGES, PROMPT_HEADER};
use crate::types::{
    kind, AnalyzedItem, AnalyzedMessage, BaselineAnalysis, CakeInfoUpdate, CakeType,
    DecorationPatch, IcingColorKey, MessageKind, MessagePatch, MessagePosition,
};

fn birthday_cake() -> EditingSession {
    let mut bear = AnalyzedItem::new(kind::EDIBLE_3D_ORDINARY, "teddy bear");
    bear.color = Some("#78350F".to_string());
    let analysis = BaselineAnalysis {
        main_toppers: vec![bear],
        support_elements: vec![AnalyzedItem::new(kind::EDIBLE_3D_SUPPORT, "stars")],
        cake_messages: vec![AnalyzedMessage {
            kind: MessageKind::IcingScript,
            text: "Happy Birthday".to_string(),
            position: MessagePosition::Top,
            color: "#000000".to_string(),
            x: None,
            y: None,
        }],
        ..Default::default()
    };
    let mut session = EditingSession::new();
    session.apply_analysis(analysis, AnalysisPass::Full);
    session
}

fn prompt_of(session: &EditingSession) -> String {
    render_prompt(&session.synthesize_prompt().unwrap())
}

#[test]
fn test_untouched_design() {
    let session = birthday_cake();
    assert_eq!(prompt_of(&session), format!("{PROMPT_HEADER}{NO_CHANGES}"));
}

#[test]
fn test_recolours_text_and_instructions() {
    let mut session = birthday_cake();
    let bear = session.state().toppers[0].id;
    let msg = session.state().messages[0].id;

    session
        .update_topper(bear, DecorationPatch::color("#EF4444"))
        .unwrap();
    let mut icing = session.state().icing.clone();
    icing.drip = true;
    icing.colors.insert(IcingColorKey::Drip, "#78350F".to_string());
    icing.colors.insert(IcingColorKey::Side, "#3B82F6".to_string());
    session.set_icing(icing);
    session
        .update_message(msg, MessagePatch::text("Happy 30th"))
        .unwrap();
    session.set_free_text("  make the bear a bit more pastel ");

    let expected = [
        "- For the main topper \"teddy bear\": recolor it to **Red (#EF4444)**.",
        "- **Add a drip effect**. Make it look realistic on the existing cake texture. The drip color should be **Brown (#78350F)**.",
        "- **Recolor the side icing** to **Blue (#3B82F6)**. Preserve all original textures and decorations on this surface.",
        "- **Find the message \"Happy Birthday\" on the cake and completely replace the text** with \"Happy 30th\", using the **exact same style (e.g., piped icing, gumpaste letters) and color** as the original message. Preserve the original text's general location and size.",
        "- **Special Instructions:** make the bear a bit more pastel",
    ]
    .join("\n");
    assert_eq!(prompt_of(&session), format!("{PROMPT_HEADER}{expected}"));
}

#[test]
fn test_removal_and_additions() {
    let mut session = birthday_cake();
    let stars = session.state().support_elements[0].id;
    session.remove_support_element(stars).unwrap();

    let mut balloon = AnalyzedItem::new(kind::PRINTOUT, "balloon cluster");
    balloon.color = Some("#EC4899".to_string());
    session.add_topper(&balloon);
    session.add_message(&AnalyzedMessage {
        kind: MessageKind::GumpasteLetters,
        text: "Congrats".to_string(),
        position: MessagePosition::Side,
        color: "#EC4899".to_string(),
        x: None,
        y: None,
    });

    let expected = [
        "- **Add a new main topper**: \"balloon cluster\" made as **printout** in **Pink (#EC4899)**. Place it naturally on the top of the cake.",
        "- **Remove the support element** described as: \"stars\".",
        "- **Add the message** \"Congrats\" on the side of the cake as gumpaste_letters in Pink (#EC4899).",
    ]
    .join("\n");
    assert_eq!(prompt_of(&session), format!("{PROMPT_HEADER}{expected}"));
}

#[test]
fn test_tier_change_leads_prompt() {
    let mut session = birthday_cake();
    session.set_cake_info(CakeInfoUpdate::cake_type(CakeType::TwoTier));
    session.set_icing_color(IcingColorKey::Top, "#FBCFE8");

    let expected = [
        "- **Reconstruct the cake as a 2-tier cake** (it is currently 1-tier). The new cake type is \"2 Tier\", the size is \"6\"/8\" Round\" and the thickness is \"4 in\". Redistribute the existing decorations naturally across the tiers and keep the original style, colours and theme.",
        "- **Recolor the top icing** to **Light Pink (#FBCFE8)**. Preserve all original textures and decorations on this surface.",
    ]
    .join("\n");
    assert_eq!(prompt_of(&session), format!("{PROMPT_HEADER}{expected}"));
}

#[test]
fn test_base_board_message_replacement() {
    let analysis = BaselineAnalysis {
        cake_messages: vec![AnalyzedMessage {
            kind: MessageKind::IcingScript,
            text: "Happy Birthday".to_string(),
            position: MessagePosition::BaseBoard,
            color: "#000000".to_string(),
            x: None,
            y: None,
        }],
        ..Default::default()
    };
    let mut session = EditingSession::new();
    session.apply_analysis(analysis, AnalysisPass::Full);
    let msg = session.state().messages[0].id;
    session
        .update_message(
            msg,
            MessagePatch {
                text: Some("Love, Mom".to_string()),
                color: Some("#FFFFFF".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(
        prompt_of(&session),
        format!(
            "{PROMPT_HEADER}- **On the cake's base board, replace the existing text** with the message: \"Love, Mom\". The text should be written in an 'icing_script' style with the color White (#FFFFFF)."
        )
    );
}

#[test]
fn test_moved_message() {
    let mut session = birthday_cake();
    let msg = session.state().messages[0].id;
    session
        .update_message(
            msg,
            MessagePatch {
                position: Some(MessagePosition::Side),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(
        prompt_of(&session),
        format!(
            "{PROMPT_HEADER}- **Move the message** \"Happy Birthday\" from the top of the cake to the side. Render it as icing_script in its original color, and leave no trace of it at its old location."
        )
    );

    session
        .update_message(
            msg,
            MessagePatch {
                text: Some("Love, Mom".to_string()),
                position: Some(MessagePosition::BaseBoard),
                color: Some("#FFFFFF".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(
        prompt_of(&session),
        format!(
            "{PROMPT_HEADER}- **Move the message** \"Happy Birthday\" from the top of the cake to the base board, rewriting it as \"Love, Mom\". Render it as icing_script in White (#FFFFFF), and leave no trace of it at its old location."
        )
    );
}

#[test]
fn test_restyled_message() {
    let mut session = birthday_cake();
    let msg = session.state().messages[0].id;
    session
        .update_message(
            msg,
            MessagePatch {
                kind: Some(MessageKind::GumpasteLetters),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(
        prompt_of(&session),
        format!(
            "{PROMPT_HEADER}- **Find the message \"Happy Birthday\" on the cake and recreate it as gumpaste_letters**, in its original color. Preserve the original text's general location and size."
        )
    );
}
