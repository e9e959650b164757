//! Conversation memory as context chunks.
//!
//! Two disciplines, one output shape. [`FullHistory`] hands prior turns to
//! the fitter verbatim; [`SummarizedHistory`] condenses them first with the
//! same summarization capability the fitter uses. Either way the fitter
//! just sees another [`ContextChunk`].

use ragskills_core::chunk::ContextChunk;
use ragskills_core::error::SummarizerError;
use ragskills_core::message::Message;
use ragskills_core::summarizer::Summarizer;
use tracing::debug;

use crate::context::token::TokenEstimator;

/// Source label on chunks produced from conversation memory.
pub const HISTORY_SOURCE: &str = "history";

/// Query handed to the summarizer when condensing a conversation.
const HISTORY_QUERY: &str =
    "What has been discussed so far, including facts stated and questions still open?";

/// Render messages as a `Role: content` transcript, one message per line.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prior turns kept verbatim, optionally limited to the last `k` exchanges.
///
/// With a window set, the oldest messages are dropped as new ones arrive,
/// so at most `2 * k` messages are ever held.
#[derive(Debug, Clone, Default)]
pub struct FullHistory {
    messages: Vec<Message>,
    /// Number of user/assistant exchanges to keep; `None` keeps all.
    window: Option<usize>,
}

impl FullHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the last `exchanges` user/assistant pairs.
    pub fn with_window(mut self, exchanges: usize) -> Self {
        self.window = Some(exchanges);
        self.evict();
        self
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.evict();
    }

    /// Record one completed exchange.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(Message::user(user));
        self.messages.push(Message::assistant(assistant));
        self.evict();
    }

    /// Held messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn evict(&mut self) {
        let Some(exchanges) = self.window else {
            return;
        };
        let keep = exchanges.saturating_mul(2);
        if self.messages.len() > keep {
            let excess = self.messages.len() - keep;
            self.messages.drain(..excess);
        }
    }

    /// Render the held turns as a transcript.
    pub fn transcript(&self) -> String {
        render_transcript(&self.messages)
    }

    /// The transcript as a single chunk; `None` when there is nothing to show.
    pub fn to_chunk(&self, estimator: &dyn TokenEstimator) -> Option<ContextChunk> {
        let transcript = self.transcript();
        if transcript.is_empty() {
            return None;
        }
        let tokens = estimator.estimate(&transcript);
        Some(ContextChunk::new(transcript, tokens).with_source(HISTORY_SOURCE))
    }
}

/// A running summary of prior turns.
#[derive(Debug, Clone, Default)]
pub struct SummarizedHistory {
    summary: Option<String>,
    turns_summarized: usize,
}

impl SummarizedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously stored summary.
    pub fn from_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            turns_summarized: 0,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Messages folded into the summary by this instance.
    pub fn turns_summarized(&self) -> usize {
        self.turns_summarized
    }

    /// Fold `turns` into the running summary with one summarizer call.
    ///
    /// The existing summary and the new turns are condensed together and
    /// the result replaces the summary. On error the summary is unchanged.
    pub async fn update(
        &mut self,
        summarizer: &dyn Summarizer,
        turns: &[Message],
        target_tokens: usize,
    ) -> Result<(), SummarizerError> {
        if turns.is_empty() {
            return Ok(());
        }

        let mut text = String::new();
        if let Some(existing) = &self.summary {
            text.push_str("=== EXISTING SUMMARY ===\n");
            text.push_str(existing);
            text.push_str("\n\n=== NEW MESSAGES ===\n");
        }
        text.push_str(&render_transcript(turns));

        let condensed = summarizer
            .summarize(HISTORY_QUERY, &text, target_tokens)
            .await?;

        self.turns_summarized += turns.len();
        debug!(
            turns = turns.len(),
            total = self.turns_summarized,
            "Conversation summary updated"
        );
        self.summary = Some(condensed);
        Ok(())
    }

    /// The running summary as a single chunk; `None` before the first update.
    pub fn to_chunk(&self, estimator: &dyn TokenEstimator) -> Option<ContextChunk> {
        let summary = self.summary.as_deref().filter(|s| !s.is_empty())?;
        let tokens = estimator.estimate(summary);
        Some(ContextChunk::new(summary, tokens).with_source(HISTORY_SOURCE))
    }
}
