//! Prompt templates and context budget derivation.
//!
//! Templates use `{name}` placeholders. The fitter's budget is whatever the
//! model window leaves after the filled-in template (minus the `{context}`
//! slot) and the answer reserve.

use std::collections::HashMap;

pub use ragskills_core::error::PromptError;

use crate::context::token::TokenEstimator;

/// Placeholder the fitted context is rendered into.
pub const CONTEXT_VAR: &str = "context";
pub const QUESTION_VAR: &str = "question";
pub const HISTORY_VAR: &str = "history";

const QA_TEMPLATE: &str = "\
Use the following pieces of context to answer the question at the end.
If the answer is not contained in the context, say that you don't know; \
do not make up an answer.

Context:
{context}

Question: {question}
Helpful answer:";

const CONDENSE_QUESTION_TEMPLATE: &str = "\
Given the following conversation and a follow-up question, rephrase the \
follow-up question to be a standalone question that can be understood \
without the conversation.

Chat history:
{history}

Follow-up question: {question}
Standalone question:";

/// A prompt template with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

/// Template for answering from the fitted context.
///
/// Conversation history has no slot of its own: it reaches the model as a
/// chunk inside `{context}`.
pub fn qa_template() -> PromptTemplate {
    PromptTemplate::new(QA_TEMPLATE)
}

/// Template for turning a follow-up into a standalone retrieval question.
pub fn condense_question_template() -> PromptTemplate {
    PromptTemplate::new(CONDENSE_QUESTION_TEMPLATE)
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else { break };
            let name = &after[..close];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
            rest = &after[close + 1..];
        }
        names
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables().iter().any(|v| v == name)
    }

    /// Substitute every placeholder. Unknown placeholders are an error.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> Result<String, PromptError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        let mut offset = 0;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or(PromptError::UnclosedPlaceholder(offset + open))?;
            let name = &after[..close];
            let value = vars
                .get(name)
                .ok_or_else(|| PromptError::MissingVariable(name.to_string()))?;
            out.push_str(value);

            let consumed = open + 1 + close + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// The model context window split between prompt and answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    /// Total tokens the model accepts.
    pub total: usize,
    /// Tokens held back for the generated answer.
    pub answer_reserve: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            total: 4096,
            answer_reserve: 512,
        }
    }
}

impl ContextWindow {
    pub fn from_config(config: &ragskills_config::ContextConfig) -> Self {
        Self {
            total: config.context_window,
            answer_reserve: config.answer_reserve,
        }
    }

    /// Tokens available for the prompt, answer reserve excluded.
    pub fn prompt_tokens(&self) -> usize {
        self.total.saturating_sub(self.answer_reserve)
    }

    /// Tokens left for the `{context}` slot once the template is filled
    /// with `vars` and the slot itself left empty. Saturates at zero.
    pub fn context_budget(
        &self,
        estimator: &dyn TokenEstimator,
        template: &PromptTemplate,
        vars: &HashMap<&str, &str>,
    ) -> Result<usize, PromptError> {
        let mut without_context = vars.clone();
        without_context.insert(CONTEXT_VAR, "");
        let skeleton = template.render(&without_context)?;
        Ok(self
            .prompt_tokens()
            .saturating_sub(estimator.estimate(&skeleton)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::token::CharEstimator;

    #[test]
    fn renders_all_placeholders() {
        let template = PromptTemplate::new("Q: {question}\nC: {context}");
        let vars = HashMap::from([("question", "why?"), ("context", "because")]);
        assert_eq!(template.render(&vars).unwrap(), "Q: why?\nC: because");
    }

    #[test]
    fn repeated_placeholder_is_substituted_each_time() {
        let template = PromptTemplate::new("{x} and {x}");
        let vars = HashMap::from([("x", "a")]);
        assert_eq!(template.render(&vars).unwrap(), "a and a");
    }

    #[test]
    fn missing_variable_is_error() {
        let template = PromptTemplate::new("Q: {question}");
        let err = template.render(&HashMap::new()).unwrap_err();
        assert_eq!(err, PromptError::MissingVariable("question".into()));
    }

    #[test]
    fn unclosed_placeholder_is_error() {
        let template = PromptTemplate::new("ok {oops");
        let err = template.render(&HashMap::new()).unwrap_err();
        assert_eq!(err, PromptError::UnclosedPlaceholder(3));
    }

    #[test]
    fn lists_variables_once_in_order() {
        let template = PromptTemplate::new("{b} {a} {b}");
        assert_eq!(template.variables(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn builtin_templates_have_expected_slots() {
        let qa = qa_template();
        assert!(qa.has_variable(CONTEXT_VAR));
        assert!(qa.has_variable(QUESTION_VAR));
        assert!(!qa.has_variable(HISTORY_VAR));
        assert!(!qa.as_str().contains("Conversation so far"));

        let condense = condense_question_template();
        assert!(condense.has_variable(QUESTION_VAR));
        assert!(condense.has_variable(HISTORY_VAR));
        assert!(!condense.has_variable(CONTEXT_VAR));
    }

    #[test]
    fn context_budget_subtracts_skeleton_and_reserve() {
        let window = ContextWindow {
            total: 100,
            answer_reserve: 20,
        };
        let template = PromptTemplate::new("{question}{context}");
        let vars = HashMap::from([("question", "abcdefgh")]); // 2 tokens
        let budget = window
            .context_budget(&CharEstimator::default(), &template, &vars)
            .unwrap();
        assert_eq!(budget, 78);
    }

    #[test]
    fn context_budget_ignores_supplied_context() {
        let window = ContextWindow::default();
        let template = PromptTemplate::new("{context}");
        let vars = HashMap::from([("context", "this should not count")]);
        let budget = window
            .context_budget(&CharEstimator::default(), &template, &vars)
            .unwrap();
        assert_eq!(budget, window.prompt_tokens());
    }

    #[test]
    fn context_budget_saturates_at_zero() {
        let window = ContextWindow {
            total: 10,
            answer_reserve: 5,
        };
        let long = "x".repeat(400);
        let template = PromptTemplate::new("{question}{context}");
        let vars = HashMap::from([("question", long.as_str())]);
        let budget = window
            .context_budget(&CharEstimator::default(), &template, &vars)
            .unwrap();
        assert_eq!(budget, 0);
    }
}
