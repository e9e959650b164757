//! `ragskills config` — Configuration management commands.

use ragskills_config::SkillsConfig;

pub fn show(config: &SkillsConfig) {
    print!("{}", config.to_toml());
}

/// Print a summary and any warnings. Hard errors were already caught while
/// loading.
pub fn validate(config: &SkillsConfig) {
    println!("Config parsed successfully");

    let warnings = warnings(config);
    if warnings.is_empty() {
        println!("All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("  warning: {w}");
        }
    }

    println!();
    println!("  Model:           {}", config.default_model);
    println!(
        "  Summarizer:      {}",
        if config.summarizer.enabled {
            config.summarizer.model_or(&config.default_model)
        } else {
            "disabled"
        }
    );
    println!("  Context window:  {}", config.context.context_window);
    println!("  Answer reserve:  {}", config.context.answer_reserve);
    println!("  Fallback:        {:?}", config.context.fallback);
    println!("  Top k:           {}", config.retrieval.top_k);
}

fn warnings(config: &SkillsConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();

    if !config.has_api_key() {
        warnings.push("No API key set (set RAGSKILLS_API_KEY or OPENAI_API_KEY)");
    }

    if config.context.separator.is_empty() {
        warnings.push("Empty chunk separator: chunk texts will run together");
    }

    if config.context.answer_reserve * 2 > config.context.context_window {
        warnings.push("Answer reserve takes more than half of the context window");
    }

    warnings
}
