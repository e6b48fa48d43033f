//! Assembled prompt representation.
//!
//! A prompt is an ordered list of role-tagged text blocks under a declared
//! length budget. The assembler in `hrdesk-core` enforces the budget
//! invariant; this type only carries the data and renders it.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Role of a block within an assembled prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// Standing instructions. Never dropped.
    System,
    /// A retrieved corpus fragment.
    Grounding,
    /// A prior conversation turn.
    History,
    /// The current (resolved) user query. Never dropped.
    Query,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::System => write!(f, "system"),
            BlockKind::Grounding => write!(f, "grounding"),
            BlockKind::History => write!(f, "history"),
            BlockKind::Query => write!(f, "query"),
        }
    }
}

/// One tagged text block of an assembled prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptBlock {
    pub kind: BlockKind,
    pub text: String,
}

impl PromptBlock {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// An assembled prompt: ordered blocks plus the budget they were packed under.
///
/// Invariant (enforced by the assembler): `len() <= budget`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub blocks: Vec<PromptBlock>,
    /// Maximum total block length, in characters.
    pub budget: usize,
}

impl Prompt {
    /// Total character length across all blocks.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.text.chars().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether the packed length respects the declared budget.
    pub fn within_budget(&self) -> bool {
        self.len() <= self.budget
    }

    /// Concatenated text of all blocks of one kind, in order.
    pub fn text_of(&self, kind: BlockKind) -> String {
        self.blocks
            .iter()
            .filter(|b| b.kind == kind)
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render the non-system blocks into the single user-facing prompt body.
    pub fn render_body(&self) -> String {
        self.blocks
            .iter()
            .filter(|b| b.kind != BlockKind::System)
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Prompt {
        Prompt {
            blocks: vec![
                PromptBlock::new(BlockKind::System, "Be factual."),
                PromptBlock::new(BlockKind::Grounding, "Leave is 16 days."),
                PromptBlock::new(BlockKind::Query, "How much leave do I get?"),
            ],
            budget: 200,
        }
    }

    #[test]
    fn test_len_counts_all_blocks() {
        let prompt = sample();
        let expected: usize = prompt.blocks.iter().map(|b| b.text.chars().count()).sum();
        assert_eq!(prompt.len(), expected);
        assert!(prompt.within_budget());
    }

    #[test]
    fn test_text_of_filters_by_kind() {
        let prompt = sample();
        assert_eq!(prompt.text_of(BlockKind::System), "Be factual.");
        assert_eq!(prompt.text_of(BlockKind::History), "");
    }

    #[test]
    fn test_render_body_excludes_system() {
        let body = sample().render_body();
        assert!(!body.contains("Be factual."));
        assert!(body.contains("Leave is 16 days."));
        assert!(body.contains("How much leave do I get?"));
    }

    #[test]
    fn test_over_budget_detected() {
        let mut prompt = sample();
        prompt.budget = 10;
        assert!(!prompt.within_budget());
    }
}
