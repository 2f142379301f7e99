use std::fmt;
use std::str::FromStr;

const PLAIN_TEXT_TEMPLATE: &str = "<image>\nFree OCR.";
const MARKDOWN_TEMPLATE: &str = "<image>\n<|grounding|>Convert the document to markdown.";
const TABLE_TEMPLATE: &str = "<image>\n<|grounding|>OCR this image.";
const FIGURE_TEMPLATE: &str = "<image>\nParse the figure.";

/// Recognition mode offered by the prompt selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    #[default]
    PlainText,
    MarkdownWithLayout,
    TableExtraction,
    FigureParsing,
    Custom,
}

impl PromptMode {
    /// Selector order.
    pub const ALL: [PromptMode; 5] = [
        PromptMode::PlainText,
        PromptMode::MarkdownWithLayout,
        PromptMode::TableExtraction,
        PromptMode::FigureParsing,
        PromptMode::Custom,
    ];

    /// Fixed template for this mode; `None` for `Custom`.
    pub fn fixed_template(self) -> Option<&'static str> {
        match self {
            PromptMode::PlainText => Some(PLAIN_TEXT_TEMPLATE),
            PromptMode::MarkdownWithLayout => Some(MARKDOWN_TEMPLATE),
            PromptMode::TableExtraction => Some(TABLE_TEMPLATE),
            PromptMode::FigureParsing => Some(FIGURE_TEMPLATE),
            PromptMode::Custom => None,
        }
    }

    /// Short tag used on the command line and in config files.
    pub fn tag(self) -> &'static str {
        match self {
            PromptMode::PlainText => "free",
            PromptMode::MarkdownWithLayout => "markdown",
            PromptMode::TableExtraction => "table",
            PromptMode::FigureParsing => "figure",
            PromptMode::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PromptMode::PlainText => "Plain OCR",
            PromptMode::MarkdownWithLayout => "Document to Markdown",
            PromptMode::TableExtraction => "Table extraction",
            PromptMode::FigureParsing => "Figure parsing",
            PromptMode::Custom => "Custom prompt",
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown prompt mode '{0}' (expected free, markdown, table, figure or custom)")]
pub struct UnknownPromptMode(pub String);

impl FromStr for PromptMode {
    type Err = UnknownPromptMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PromptMode::ALL
            .into_iter()
            .find(|mode| mode.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPromptMode(s.to_string()))
    }
}

/// Prompt mode plus the user's free-text template for `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptSpec {
    pub mode: PromptMode,
    pub custom_template: String,
}

impl PromptSpec {
    pub fn new(mode: PromptMode) -> Self {
        Self {
            mode,
            custom_template: String::new(),
        }
    }

    pub fn custom(template: impl Into<String>) -> Self {
        Self {
            mode: PromptMode::Custom,
            custom_template: template.into(),
        }
    }

    /// Prompt text sent to the OCR engine. Both branches are verbatim.
    pub fn resolve(&self) -> &str {
        match self.mode.fixed_template() {
            Some(template) => template,
            None => &self.custom_template,
        }
    }

    /// A custom prompt must carry non-blank text before it can be submitted.
    pub fn is_submittable(&self) -> bool {
        self.mode != PromptMode::Custom || !self.custom_template.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for mode in PromptMode::ALL {
            assert_eq!(mode.tag().parse::<PromptMode>(), Ok(mode));
        }
        assert_eq!("MARKDOWN".parse::<PromptMode>(), Ok(PromptMode::MarkdownWithLayout));
        assert!("layout".parse::<PromptMode>().is_err());
    }

    #[test]
    fn only_custom_lacks_a_fixed_template() {
        let without: Vec<_> = PromptMode::ALL
            .into_iter()
            .filter(|mode| mode.fixed_template().is_none())
            .collect();
        assert_eq!(without, vec![PromptMode::Custom]);
    }

    #[test]
    fn blank_custom_prompt_is_not_submittable() {
        assert!(!PromptSpec::custom("  \n").is_submittable());
        assert!(PromptSpec::custom("<image>\nRead it.").is_submittable());
        assert!(PromptSpec::new(PromptMode::FigureParsing).is_submittable());
    }
}
