//! Grounded prompt assembly under a length budget.
//!
//! Greedy packing: system instructions and the resolved query are always
//! included; retrieved fragments pack in retrieval order; recent turns pack
//! newest-first with the oldest dropped. If instructions and query alone
//! exceed the budget, the query text itself is truncated -- a last resort,
//! logged as a degraded-answer condition.

use tracing::warn;

use hrdesk_types::prompt::{BlockKind, Prompt, PromptBlock};
use hrdesk_types::retrieval::RetrievedFragment;
use hrdesk_types::session::{Turn, TurnRole};

/// Note injected when retrieval produced nothing above the relevance floor.
pub const NO_GROUNDING_NOTE: &str =
    "No grounding found in the HR knowledge base for this question. \
     Say that the information is not available rather than guessing.";

/// An assembled prompt plus the conditions under which it was packed.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub prompt: Prompt,
    /// True when assembly hit a recoverable failure (no grounding, or the
    /// query had to be truncated). The answer is tagged accordingly.
    pub degraded: bool,
    /// True only for the query-truncation last resort.
    pub truncated_query: bool,
}

/// Builds grounded prompts for the reasoning model.
pub struct PromptAssembler {
    budget: usize,
    org_name: String,
    hr_contact: String,
}

impl PromptAssembler {
    pub fn new(budget: usize, org_name: impl Into<String>, hr_contact: impl Into<String>) -> Self {
        Self {
            budget,
            org_name: org_name.into(),
            hr_contact: hr_contact.into(),
        }
    }

    /// Standing instructions; never dropped from a prompt.
    fn system_instructions(&self) -> String {
        format!(
            "You are the HR assistant for {}. Answer only from the HR knowledge \
             provided below. If the information is not available, state that \
             clearly and refer the employee to {}. Never invent or assume \
             information. Answer directly, without greetings, in clear and \
             professional workplace language.",
            self.org_name, self.hr_contact
        )
    }

    /// Pack (query, fragments, recent turns) into a prompt within budget.
    ///
    /// Invariants: total length never exceeds the budget; system and query
    /// blocks are always present.
    pub fn assemble(
        &self,
        query: &str,
        fragments: &[RetrievedFragment],
        recent_turns: &[Turn],
    ) -> AssembledPrompt {
        let system = self.system_instructions();
        let system_len = system.chars().count();

        let query_prefix = "QUESTION: ";
        let mut query_text = format!("{query_prefix}{query}");
        let mut truncated_query = false;

        // Last resort: system + query alone exceed the budget.
        if system_len + query_text.chars().count() > self.budget {
            let allowed = self
                .budget
                .saturating_sub(system_len + query_prefix.chars().count());
            let clipped: String = query.chars().take(allowed).collect();
            query_text = format!("{query_prefix}{clipped}");
            truncated_query = true;
            warn!(
                budget = self.budget,
                query_chars = query.chars().count(),
                "prompt budget forced query truncation"
            );
        }

        let mut used = system_len + query_text.chars().count();
        let mut degraded = truncated_query;

        // Grounding fragments, retrieval order, while they fit.
        let mut grounding_blocks: Vec<PromptBlock> = Vec::new();
        if fragments.is_empty() {
            degraded = true;
            let note_len = NO_GROUNDING_NOTE.chars().count();
            if used + note_len <= self.budget {
                grounding_blocks.push(PromptBlock::new(BlockKind::Grounding, NO_GROUNDING_NOTE));
                used += note_len;
            }
        } else {
            for fragment in fragments {
                let text = format!("[{}] {}", fragment.document_id, fragment.text.trim());
                let len = text.chars().count();
                if used + len > self.budget {
                    break;
                }
                used += len;
                grounding_blocks.push(PromptBlock::new(BlockKind::Grounding, text));
            }
        }

        // Recent turns, newest first into the remaining budget, then
        // restored to chronological order.
        let mut history_blocks: Vec<PromptBlock> = Vec::new();
        for turn in recent_turns.iter().rev() {
            let speaker = match turn.role {
                TurnRole::User => "User",
                TurnRole::Assistant => "Assistant",
            };
            let text = format!("{speaker}: {}", turn.text.trim());
            let len = text.chars().count();
            if used + len > self.budget {
                break;
            }
            used += len;
            history_blocks.push(PromptBlock::new(BlockKind::History, text));
        }
        history_blocks.reverse();

        let mut blocks = Vec::with_capacity(2 + grounding_blocks.len() + history_blocks.len());
        blocks.push(PromptBlock::new(BlockKind::System, system));
        blocks.extend(grounding_blocks);
        blocks.extend(history_blocks);
        blocks.push(PromptBlock::new(BlockKind::Query, query_text));

        AssembledPrompt {
            prompt: Prompt {
                blocks,
                budget: self.budget,
            },
            degraded,
            truncated_query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrdesk_types::retrieval::Corpus;

    fn assembler(budget: usize) -> PromptAssembler {
        PromptAssembler::new(budget, "Acme AI Ltd.", "people@acmeai.tech")
    }

    fn frag(id: &str, text: &str) -> RetrievedFragment {
        RetrievedFragment {
            document_id: id.to_string(),
            text: text.to_string(),
            score: 0.8,
            corpus: Corpus::Policy,
        }
    }

    #[test]
    fn test_system_and_query_always_present() {
        let assembled = assembler(6000).assemble("How much leave do I get?", &[], &[]);
        let kinds: Vec<BlockKind> = assembled.prompt.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds.first(), Some(&BlockKind::System));
        assert_eq!(kinds.last(), Some(&BlockKind::Query));
        assert!(assembled.prompt.within_budget());
    }

    #[test]
    fn test_fragments_packed_in_retrieval_order() {
        let fragments = vec![frag("a", "First fragment."), frag("b", "Second fragment.")];
        let assembled = assembler(6000).assemble("leave?", &fragments, &[]);
        let grounding: Vec<&str> = assembled
            .prompt
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Grounding)
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(grounding.len(), 2);
        assert!(grounding[0].starts_with("[a]"));
        assert!(grounding[1].starts_with("[b]"));
        assert!(!assembled.degraded);
    }

    #[test]
    fn test_budget_stops_fragment_packing() {
        let system_len = assembler(6000).system_instructions().chars().count();
        // Budget fits system + query + one ~60-char fragment but not two
        let budget = system_len + "QUESTION: leave?".len() + 70;
        let fragments = vec![
            frag("a", &"x".repeat(50)),
            frag("b", &"y".repeat(50)),
        ];
        let assembled = assembler(budget).assemble("leave?", &fragments, &[]);
        let grounding_count = assembled
            .prompt
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Grounding)
            .count();
        assert_eq!(grounding_count, 1);
        assert!(assembled.prompt.within_budget());
    }

    #[test]
    fn test_no_grounding_note_when_fragments_empty() {
        let assembled = assembler(6000).assemble("obscure question", &[], &[]);
        assert!(assembled.degraded);
        assert!(!assembled.truncated_query);
        let grounding = assembled.prompt.text_of(BlockKind::Grounding);
        assert!(grounding.contains("No grounding found"));
    }

    #[test]
    fn test_history_drops_oldest_first() {
        let turns = vec![
            Turn::user("oldest question about onboarding procedures", None),
            Turn::assistant("oldest answer text", vec![]),
            Turn::user("newest question", None),
        ];
        let system_len = assembler(6000).system_instructions().chars().count();
        // Room for roughly one short history line only
        let budget = system_len + "QUESTION: leave?".len() + NO_GROUNDING_NOTE.len() + 30;
        let assembled = assembler(budget).assemble("leave?", &[], &turns);
        let history: Vec<&str> = assembled
            .prompt
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::History)
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(history, vec!["User: newest question"]);
        assert!(assembled.prompt.within_budget());
    }

    #[test]
    fn test_history_kept_in_chronological_order() {
        let turns = vec![
            Turn::user("first", None),
            Turn::assistant("second", vec![]),
            Turn::user("third", None),
        ];
        let assembled = assembler(6000).assemble("q", &[frag("a", "ctx")], &turns);
        let history: Vec<&str> = assembled
            .prompt
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::History)
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(
            history,
            vec!["User: first", "Assistant: second", "User: third"]
        );
    }

    #[test]
    fn test_query_truncated_as_last_resort() {
        let system_len = assembler(6000).system_instructions().chars().count();
        let budget = system_len + 30;
        let long_query = "x".repeat(500);
        let assembled = assembler(budget).assemble(&long_query, &[frag("a", "ctx")], &[]);
        assert!(assembled.truncated_query);
        assert!(assembled.degraded);
        assert!(assembled.prompt.within_budget());
        // Query block survives, clipped
        let query = assembled.prompt.text_of(BlockKind::Query);
        assert!(query.starts_with("QUESTION: "));
        assert!(query.chars().count() < 500);
    }
}
