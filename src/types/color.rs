//! Named colour palette used when describing colours to the render provider.

/// A palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
    pub name: &'static str,
    pub hex: &'static str,
}

pub const PALETTE: [NamedColor; 19] = [
    NamedColor { name: "Red", hex: "#EF4444" },
    NamedColor { name: "Light Red", hex: "#FCA5A5" },
    NamedColor { name: "Orange", hex: "#F97316" },
    NamedColor { name: "Yellow", hex: "#EAB308" },
    NamedColor { name: "Green", hex: "#16A34A" },
    NamedColor { name: "Light Green", hex: "#4ADE80" },
    NamedColor { name: "Teal", hex: "#14B8A6" },
    NamedColor { name: "Blue", hex: "#3B82F6" },
    NamedColor { name: "Light Blue", hex: "#93C5FD" },
    NamedColor { name: "Purple", hex: "#8B5CF6" },
    NamedColor { name: "Light Purple", hex: "#C4B5FD" },
    NamedColor { name: "Pink", hex: "#EC4899" },
    NamedColor { name: "Light Pink", hex: "#FBCFE8" },
    NamedColor { name: "Brown", hex: "#78350F" },
    NamedColor { name: "Light Brown", hex: "#B45309" },
    NamedColor { name: "Gray", hex: "#64748B" },
    NamedColor { name: "Cream", hex: "#F5E6D3" },
    NamedColor { name: "White", hex: "#FFFFFF" },
    NamedColor { name: "Black", hex: "#000000" },
];

/// Look up a palette entry by hex, case-insensitively.
pub fn palette_lookup(hex: &str) -> Option<NamedColor> {
    PALETTE
        .iter()
        .copied()
        .find(|c| c.hex.eq_ignore_ascii_case(hex.trim()))
}

/// Human-readable colour for prompts: `"Name (#HEX)"`, the raw value when it
/// is not in the palette, or `"not specified"` when absent.
pub fn describe_color(hex: Option<&str>) -> String {
    match hex {
        None => "not specified".to_string(),
        Some(h) => match palette_lookup(h) {
            Some(c) => format!("{} ({})", c.name, h),
            None => h.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_color() {
        assert_eq!(describe_color(Some("#ef4444")), "Red (#ef4444)");
        assert_eq!(describe_color(Some("#FFFFFF")), "White (#FFFFFF)");
    }

    #[test]
    fn test_describe_unknown_or_missing_color() {
        assert_eq!(describe_color(Some("#123456")), "#123456");
        assert_eq!(describe_color(None), "not specified");
    }
}
