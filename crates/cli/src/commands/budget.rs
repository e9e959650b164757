//! `ragskills budget` — Show how much of the window a template leaves for context.

use std::collections::HashMap;

use ragskills::prompt::{ContextWindow, PromptTemplate, HISTORY_VAR, QUESTION_VAR};
use ragskills::CharEstimator;
use ragskills_config::SkillsConfig;

/// Tokens left for `{context}` once `template` is filled with `question`.
pub fn context_budget(
    config: &SkillsConfig,
    template: &PromptTemplate,
    question: &str,
) -> Result<usize, ragskills::PromptError> {
    let window = ContextWindow::from_config(&config.context);
    let estimator = CharEstimator::new(config.context.chars_per_token);
    let vars = HashMap::from([(QUESTION_VAR, question), (HISTORY_VAR, "")]);
    window.context_budget(&estimator, template, &vars)
}

pub fn run(
    config: &SkillsConfig,
    template: &PromptTemplate,
    question: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let budget = context_budget(config, template, question)?;

    println!("Context window:  {}", config.context.context_window);
    println!("Answer reserve:  {}", config.context.answer_reserve);
    println!("Context budget:  {budget}");
    if budget == 0 {
        println!("Warning: the template and question leave no room for context");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragskills::prompt::qa_template;

    #[test]
    fn budget_is_below_prompt_tokens() {
        let config = SkillsConfig::default();
        let budget = context_budget(&config, &qa_template(), "Why is the sky blue?").unwrap();
        let prompt_tokens = config.context.context_window - config.context.answer_reserve;
        assert!(budget > 0);
        assert!(budget < prompt_tokens);
    }

    #[test]
    fn longer_questions_leave_less_room() {
        let config = SkillsConfig::default();
        let short = context_budget(&config, &qa_template(), "Why?").unwrap();
        let long = context_budget(&config, &qa_template(), &"why ".repeat(100)).unwrap();
        assert!(long < short);
    }
}
