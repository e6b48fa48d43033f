//! Top-level conversation orchestrator.
//!
//! `Orchestrator::handle` sequences one incoming message: load/create the
//! session, classify intent, then branch -- greeting template, deterministic
//! calculator, or resolve -> retrieve -> assemble -> generate. Every branch,
//! including every error branch, appends exactly one user turn and one
//! assistant turn so the history stays a faithful log of what the user saw.
//!
//! Nothing here is fatal: retrieval failures proceed ungrounded, rejected
//! calculations reroute to the knowledge path, and generation failures
//! degrade to a fixed apology after a bounded retry budget.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, info, warn};

use hrdesk_types::answer::{AnswerResult, Confidence, Intent};
use hrdesk_types::calc::CalculationRequest;
use hrdesk_types::config::EngineConfig;
use hrdesk_types::llm::{CompletionRequest, CompletionResponse, LlmError};
use hrdesk_types::session::{EntityClass, Session, Turn};

use crate::calculator;
use crate::intent;
use crate::prompt::PromptAssembler;
use crate::reasoning::{ReasoningClient, completion_request_from_prompt};
use crate::resolver::{ReferenceResolver, extract_person_names};
use crate::retrieval::{RetrievalStore, top_k_for};
use crate::session::SessionStore;

/// Fixed answer when generation fails after the retry budget.
pub const APOLOGY_TEXT: &str =
    "I apologize, but I'm temporarily unable to process your request. \
     Please try again in a moment.";

/// Fixed answer when the model produced an empty or unusable response.
pub const FALLBACK_TEXT: &str =
    "I apologize, but I couldn't generate a proper response. \
     Could you please rephrase your question?";

/// Base backoff between generation retries; doubles per attempt.
const RETRY_BACKOFF_MS: u64 = 250;

/// Turns of history offered to the prompt assembler.
const HISTORY_WINDOW: usize = 6;

/// A generated answer shorter than this is treated as unusable.
const MIN_ANSWER_CHARS: usize = 5;

/// Greeting boilerplate the model sometimes prepends despite instructions.
static LEADING_GREETING_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^hello[!,.\s][^.\n]*(?:\.|\n)\s*",
        r"(?i)^hi[!,.\s][^.\n]*(?:\.|\n)\s*",
        r"(?i)^good (?:morning|afternoon|evening)[^.\n]*(?:\.|\n)\s*",
        r"(?i)^how can i (?:help|assist) you[^?\n]*\?\s*",
        r"(?i)^i'd be happy to help[^.\n]*(?:\.|\n)\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// The single state-dependent entry point of the engine.
///
/// Generic over the reasoning and retrieval collaborators so the decision
/// logic is testable with in-process mocks; `hrdesk-api` pins the generics
/// to the concrete infra implementations.
pub struct Orchestrator<R: ReasoningClient, S: RetrievalStore> {
    config: EngineConfig,
    reasoning: R,
    retrieval: S,
    sessions: SessionStore,
    resolver: ReferenceResolver,
    assembler: PromptAssembler,
}

impl<R: ReasoningClient, S: RetrievalStore> Orchestrator<R, S> {
    pub fn new(config: EngineConfig, reasoning: R, retrieval: S) -> Self {
        let sessions = SessionStore::new(
            config.history_cap,
            config.idle_timeout_secs,
            config.retention_timeout_secs,
        );
        let resolver = ReferenceResolver::new(&config.anaphors);
        let assembler = PromptAssembler::new(
            config.prompt_budget,
            config.org_name.clone(),
            config.hr_contact.clone(),
        );
        Self {
            config,
            reasoning,
            retrieval,
            sessions,
            resolver,
            assembler,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle one message for one session and return the final answer.
    ///
    /// The session entry is locked for the duration of the call: one request
    /// in flight per session, full parallelism across sessions. External
    /// calls inside carry tight timeouts, so the lock cannot be starved.
    pub async fn handle(&self, session_id: &str, message: &str) -> AnswerResult {
        let handle = self.sessions.checkout(session_id);
        let mut session = handle.lock().await;

        // Expiry is transparent: same identifier, fresh history.
        self.sessions.refresh_expired(&mut session, Utc::now());

        let has_history = session.has_history();
        let classified = intent::classify(message, has_history);
        debug!(session_id, intent = %classified, "message classified");

        match classified {
            Intent::Greeting => self.answer_greeting(&mut session, message, has_history),
            Intent::Calculator => match calculator::parse(message) {
                Some(request) => self.answer_calculation(&mut session, message, &request),
                None => {
                    // Incomplete operands: correctness over availability for
                    // financial figures -- reroute to the knowledge path.
                    debug!(session_id, "calculation rejected, rerouting to knowledge");
                    self.answer_knowledge(&mut session, message).await
                }
            },
            Intent::Knowledge => self.answer_knowledge(&mut session, message).await,
        }
    }

    fn answer_greeting(
        &self,
        session: &mut Session,
        message: &str,
        has_history: bool,
    ) -> AnswerResult {
        let text = if has_history {
            "Hello! How can I assist you?".to_string()
        } else {
            format!(
                "Hello! I'm the HR assistant for {}. How can I help you with \
                 HR-related questions today?",
                self.config.org_name
            )
        };
        let answer = AnswerResult::direct(text);
        self.sessions.append_exchange(
            session,
            Turn::user(message, None),
            Turn::assistant(answer.text.clone(), vec![]),
        );
        answer
    }

    fn answer_calculation(
        &self,
        session: &mut Session,
        message: &str,
        request: &CalculationRequest,
    ) -> AnswerResult {
        let result = calculator::evaluate(request);
        info!(
            operation = %request.operation,
            value = result.value,
            "calculator answered deterministically"
        );
        let answer = AnswerResult::direct(result.summary);
        self.sessions.append_exchange(
            session,
            Turn::user(message, None),
            Turn::assistant(answer.text.clone(), vec![]),
        );
        answer
    }

    async fn answer_knowledge(&self, session: &mut Session, message: &str) -> AnswerResult {
        let resolved = self.resolver.resolve(message, session);
        let resolved_for_turn = (resolved != message).then(|| resolved.clone());
        if resolved_for_turn.is_some() {
            debug!(original = message, resolved = %resolved, "references resolved");
        }

        let k = top_k_for(&resolved, self.config.retrieval_k);
        let retrieval_timeout = Duration::from_millis(self.config.retrieval_timeout_ms);
        let fragments =
            match tokio::time::timeout(retrieval_timeout, self.retrieval.search(&resolved, k))
                .await
            {
                Ok(Ok(fragments)) => fragments,
                Ok(Err(err)) => {
                    warn!(error = %err, "retrieval unavailable, proceeding ungrounded");
                    Vec::new()
                }
                Err(_) => {
                    warn!("retrieval timed out, proceeding ungrounded");
                    Vec::new()
                }
            };
        let sources: Vec<String> = fragments.iter().map(|f| f.document_id.clone()).collect();

        let assembled = {
            let turns = &session.turns;
            let recent = &turns[turns.len().saturating_sub(HISTORY_WINDOW)..];
            self.assembler.assemble(&resolved, &fragments, recent)
        };
        let request = completion_request_from_prompt(
            &assembled.prompt,
            &self.config.model,
            self.config.max_tokens,
            self.config.temperature,
        );

        let (text, confidence, sources_used) = match self.generate_with_retries(&request).await {
            Ok(response) => {
                let cleaned = clean_response(&response.content);
                if cleaned.chars().count() < MIN_ANSWER_CHARS {
                    warn!("generation produced an unusable answer, using fallback");
                    (FALLBACK_TEXT.to_string(), Confidence::Degraded, sources)
                } else if assembled.degraded {
                    (cleaned, Confidence::Degraded, sources)
                } else {
                    (cleaned, Confidence::Grounded, sources)
                }
            }
            Err(err) => {
                warn!(error = %err, "generation failed after retries, apologizing");
                (APOLOGY_TEXT.to_string(), Confidence::Unavailable, Vec::new())
            }
        };

        let answer = AnswerResult {
            text,
            sources: sources_used,
            confidence,
        };
        self.sessions.append_exchange(
            session,
            Turn::user(message, resolved_for_turn),
            Turn::assistant(answer.text.clone(), answer.sources.clone()),
        );

        // The single entity-map update point: names introduced by this
        // exchange become referents for later pronouns.
        let mut names = extract_person_names(&resolved);
        names.extend(extract_person_names(&answer.text));
        if !names.is_empty() {
            self.sessions
                .record_entities(session, &names, EntityClass::Person);
        }

        answer
    }

    /// Generate with a bounded retry budget and exponential backoff.
    ///
    /// The reasoning call has no side effects, so retrying is idempotent.
    async fn generate_with_retries(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let timeout = Duration::from_secs(self.config.generation_timeout_secs);
        let attempts = self.config.max_retries + 1;
        let mut last_error = LlmError::Timeout;

        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = Duration::from_millis(RETRY_BACKOFF_MS << (attempt - 1));
                tokio::time::sleep(backoff).await;
            }
            match tokio::time::timeout(timeout, self.reasoning.generate(request)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(err)) => {
                    warn!(attempt, error = %err, "generation attempt failed");
                    last_error = err;
                }
                Err(_) => {
                    warn!(attempt, "generation attempt timed out");
                    last_error = LlmError::Timeout;
                }
            }
        }

        Err(last_error)
    }
}

/// Strip greeting boilerplate the model prepended despite instructions.
fn clean_response(text: &str) -> String {
    let mut out = text.trim().to_string();
    loop {
        let before = out.clone();
        for re in LEADING_GREETING_RES.iter() {
            out = re.replace(&out, "").trim_start().to_string();
        }
        if out == before {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hrdesk_types::error::RetrievalError;
    use hrdesk_types::llm::Usage;
    use hrdesk_types::retrieval::{Corpus, RetrievedFragment};

    struct MockReasoning {
        response: String,
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockReasoning {
        fn answering(response: &str) -> Self {
            Self {
                response: response.to_string(),
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: String::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ReasoningClient for MockReasoning {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(LlmError::Timeout)
            } else {
                Ok(CompletionResponse {
                    content: self.response.clone(),
                    model: "mock".to_string(),
                    usage: Usage::default(),
                })
            }
        }
    }

    struct MockRetrieval {
        fragments: Vec<RetrievedFragment>,
        fail: bool,
        calls: AtomicUsize,
        last_query: StdMutex<Option<String>>,
    }

    impl MockRetrieval {
        fn with_fragments(fragments: Vec<RetrievedFragment>) -> Self {
            Self {
                fragments,
                fail: false,
                calls: AtomicUsize::new(0),
                last_query: StdMutex::new(None),
            }
        }

        fn empty() -> Self {
            Self::with_fragments(vec![])
        }

        fn failing() -> Self {
            Self {
                fragments: vec![],
                fail: true,
                calls: AtomicUsize::new(0),
                last_query: StdMutex::new(None),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_query(&self) -> Option<String> {
            self.last_query.lock().unwrap().clone()
        }
    }

    impl RetrievalStore for MockRetrieval {
        async fn search(
            &self,
            query: &str,
            _k: usize,
        ) -> Result<Vec<RetrievedFragment>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.to_string());
            if self.fail {
                Err(RetrievalError::Unavailable("index offline".to_string()))
            } else {
                Ok(self.fragments.clone())
            }
        }
    }

    fn frag(id: &str) -> RetrievedFragment {
        RetrievedFragment {
            document_id: id.to_string(),
            text: format!("text of {id}"),
            score: 0.8,
            corpus: Corpus::Policy,
        }
    }

    fn engine(
        reasoning: MockReasoning,
        retrieval: MockRetrieval,
    ) -> Orchestrator<MockReasoning, MockRetrieval> {
        Orchestrator::new(EngineConfig::default(), reasoning, retrieval)
    }

    #[tokio::test]
    async fn test_greeting_short_circuits_collaborators() {
        let engine = engine(MockReasoning::answering("unused"), MockRetrieval::empty());

        let answer = engine.handle("s-1", "Hi").await;

        assert_eq!(answer.confidence, Confidence::Direct);
        assert!(answer.sources.is_empty());
        assert!(answer.text.contains("HR assistant for Acme AI Ltd."));
        assert_eq!(engine.reasoning.call_count(), 0);
        assert_eq!(engine.retrieval.call_count(), 0);

        let session = engine.sessions().snapshot("s-1").await.unwrap();
        assert_eq!(session.turns.len(), 2);
    }

    #[tokio::test]
    async fn test_second_greeting_uses_short_form() {
        let engine = engine(MockReasoning::answering("unused"), MockRetrieval::empty());

        engine.handle("s-1", "Hi").await;
        let answer = engine.handle("s-1", "hello").await;

        assert_eq!(answer.text, "Hello! How can I assist you?");
    }

    #[tokio::test]
    async fn test_calculator_answers_deterministically() {
        let engine = engine(MockReasoning::answering("unused"), MockRetrieval::empty());

        let message = "Project my salary of 50000 at 5% for 1 year";
        let first = engine.handle("s-1", message).await;
        let second = engine.handle("s-1", message).await;

        assert_eq!(first.confidence, Confidence::Direct);
        assert!(first.text.contains("52500.00"));
        assert_eq!(first.text, second.text);
        assert_eq!(engine.reasoning.call_count(), 0);
        assert_eq!(engine.retrieval.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_calculation_reroutes_to_knowledge() {
        let engine = engine(
            MockReasoning::answering("The bonus policy depends on service length."),
            MockRetrieval::with_fragments(vec![frag("policy-bonus")]),
        );

        // Calculator keyword + number, but no parseable operation
        let answer = engine.handle("s-1", "Calculate 42 things for the bonus").await;

        assert_eq!(answer.confidence, Confidence::Grounded);
        assert_eq!(engine.retrieval.call_count(), 1);
        assert_eq!(engine.reasoning.call_count(), 1);
    }

    #[tokio::test]
    async fn test_knowledge_answer_carries_sources() {
        let engine = engine(
            MockReasoning::answering("The notice period is 30 days."),
            MockRetrieval::with_fragments(vec![frag("policy-notice"), frag("faq-2")]),
        );

        let answer = engine.handle("s-1", "What is the notice period?").await;

        assert_eq!(answer.confidence, Confidence::Grounded);
        assert_eq!(answer.sources, vec!["policy-notice", "faq-2"]);
        assert_eq!(answer.text, "The notice period is 30 days.");

        let session = engine.sessions().snapshot("s-1").await.unwrap();
        assert_eq!(session.turns[1].sources, vec!["policy-notice", "faq-2"]);
    }

    #[tokio::test]
    async fn test_empty_retrieval_degrades_but_still_generates() {
        let engine = engine(
            MockReasoning::answering("That information is not available."),
            MockRetrieval::empty(),
        );

        let answer = engine.handle("s-1", "What is the dress code on Mars?").await;

        assert_eq!(answer.confidence, Confidence::Degraded);
        assert!(answer.sources.is_empty());
        assert_eq!(engine.reasoning.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_nonfatal() {
        let engine = engine(
            MockReasoning::answering("Answering without grounding."),
            MockRetrieval::failing(),
        );

        let answer = engine.handle("s-1", "What is the leave policy?").await;

        assert_eq!(answer.confidence, Confidence::Degraded);
        assert_eq!(engine.reasoning.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_failure_exhausts_retries_then_apologizes() {
        let mut config = EngineConfig::default();
        config.max_retries = 1;
        let engine = Orchestrator::new(config, MockReasoning::failing(), MockRetrieval::empty());

        let answer = engine.handle("s-1", "What is the leave policy?").await;

        assert_eq!(answer.text, APOLOGY_TEXT);
        assert_eq!(answer.confidence, Confidence::Unavailable);
        assert!(answer.sources.is_empty());
        assert_eq!(engine.reasoning.call_count(), 2);

        // The apology is logged in history like any other answer
        let session = engine.sessions().snapshot("s-1").await.unwrap();
        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[1].text, APOLOGY_TEXT);
    }

    #[tokio::test]
    async fn test_pronoun_resolution_rewrites_retrieval_query() {
        let engine = engine(
            MockReasoning::answering("John Smith has 11 days remaining."),
            MockRetrieval::with_fragments(vec![frag("emp-john")]),
        );

        engine
            .handle("s-1", "Employee John Smith is on the engineering team")
            .await;
        engine.handle("s-1", "What is his leave balance?").await;

        assert_eq!(
            engine.retrieval.last_query().unwrap(),
            "What is John Smith's leave balance?"
        );

        let session = engine.sessions().snapshot("s-1").await.unwrap();
        let follow_up = &session.turns[2];
        assert_eq!(follow_up.text, "What is his leave balance?");
        assert_eq!(
            follow_up.resolved_text.as_deref(),
            Some("What is John Smith's leave balance?")
        );
    }

    #[tokio::test]
    async fn test_response_cleanup_strips_model_greeting() {
        let engine = engine(
            MockReasoning::answering(
                "Hello! I'm the HR assistant. How can I assist you? The notice period is 30 days.",
            ),
            MockRetrieval::with_fragments(vec![frag("policy-notice")]),
        );

        let answer = engine.handle("s-1", "What is the notice period?").await;

        assert_eq!(answer.text, "The notice period is 30 days.");
    }

    #[tokio::test]
    async fn test_unusable_generation_falls_back() {
        let engine = engine(
            MockReasoning::answering("  \n "),
            MockRetrieval::with_fragments(vec![frag("policy-1")]),
        );

        let answer = engine.handle("s-1", "What is the leave policy?").await;

        assert_eq!(answer.text, FALLBACK_TEXT);
        assert_eq!(answer.confidence, Confidence::Degraded);
    }

    #[tokio::test]
    async fn test_distinct_sessions_have_distinct_history() {
        let engine = engine(
            MockReasoning::answering("Answer."),
            MockRetrieval::with_fragments(vec![frag("a")]),
        );

        engine.handle("s-1", "What is the leave policy?").await;
        engine.handle("s-2", "What is the bonus policy?").await;

        let first = engine.sessions().snapshot("s-1").await.unwrap();
        let second = engine.sessions().snapshot("s-2").await.unwrap();
        assert_eq!(first.turns.len(), 2);
        assert_eq!(second.turns.len(), 2);
        assert_ne!(first.turns[0].text, second.turns[0].text);
    }

    #[test]
    fn test_clean_response_plain_text_untouched() {
        let text = "The probation period is six months.";
        assert_eq!(clean_response(text), text);
    }
}
