use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ItemId;

/// Header every rendered prompt starts with.
pub const PROMPT_HEADER: &str = "---\n### List of Changes to Apply\n---\n";

/// Line emitted when the diff is empty.
pub const NO_CHANGES: &str = "- No changes were requested. The image should remain exactly the same.";

/// Prompt section, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Section {
    Structural,
    Item,
    Icing,
    Message,
    FreeText,
}

/// What an instruction is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum InstructionTarget {
    Cake,
    Item(ItemId),
    Icing,
    Message(ItemId),
    FreeText,
}

/// One line of the edit script sent to the render provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EditInstruction {
    pub section: Section,
    pub target: InstructionTarget,
    pub text: String,
}

impl EditInstruction {
    pub fn new(section: Section, target: InstructionTarget, text: impl Into<String>) -> Self {
        Self {
            section,
            target,
            text: text.into(),
        }
    }
}

impl fmt::Display for EditInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {}", self.text)
    }
}

/// Join the instruction list into the prose prompt.
pub fn render_prompt(instructions: &[EditInstruction]) -> String {
    let mut prompt = String::from(PROMPT_HEADER);
    if instructions.is_empty() {
        prompt.push_str(NO_CHANGES);
        return prompt;
    }
    let lines: Vec<String> = instructions.iter().map(ToString::to_string).collect();
    prompt.push_str(&lines.join("\n"));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prompt() {
        let prompt = render_prompt(&[]);
        assert!(prompt.starts_with(PROMPT_HEADER));
        assert!(prompt.ends_with(NO_CHANGES));
    }

    #[test]
    fn test_lines_joined_in_order() {
        let prompt = render_prompt(&[
            EditInstruction::new(Section::Icing, InstructionTarget::Icing, "**Remove the drip effect**."),
            EditInstruction::new(Section::FreeText, InstructionTarget::FreeText, "Special instructions: soft pastel look"),
        ]);
        assert_eq!(
            prompt,
            format!(
                "{PROMPT_HEADER}- **Remove the drip effect**.\n- Special instructions: soft pastel look"
            )
        );
    }

    #[test]
    fn test_sections_order() {
        assert!(Section::Structural < Section::Item);
        assert!(Section::Message < Section::FreeText);
    }
}
