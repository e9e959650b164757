//! `ragskills fit` — Fit a JSON chunk list into a token budget.
//!
//! No language model is wired up here, so overflow either truncates the raw
//! concatenation or fails, depending on the fallback policy.

use std::io::Read;
use std::path::Path;

use ragskills::context::token::TokenEstimator;
use ragskills::{ContextFitter, FallbackPolicy};
use ragskills_config::SkillsConfig;
use ragskills_core::chunk::ContextChunk;
use serde::Deserialize;
use tracing::info;

/// A chunk as written in the input file. The token count is optional and
/// computed with the configured estimator when missing.
#[derive(Debug, Deserialize)]
pub struct ChunkInput {
    pub text: String,
    #[serde(default)]
    pub estimated_token_count: Option<usize>,
    #[serde(default)]
    pub source_relevance_score: Option<f32>,
    #[serde(default)]
    pub source: Option<String>,
}

impl ChunkInput {
    fn into_chunk(self, estimator: &dyn TokenEstimator) -> ContextChunk {
        let tokens = self
            .estimated_token_count
            .unwrap_or_else(|| estimator.estimate(&self.text));
        ContextChunk {
            text: self.text,
            estimated_token_count: tokens,
            source_relevance_score: self.source_relevance_score,
            source: self.source,
        }
    }
}

/// Parse a JSON array of chunks.
pub fn parse_chunks(
    json: &str,
    estimator: &dyn TokenEstimator,
) -> Result<Vec<ContextChunk>, serde_json::Error> {
    let inputs: Vec<ChunkInput> = serde_json::from_str(json)?;
    Ok(inputs.into_iter().map(|c| c.into_chunk(estimator)).collect())
}

fn read_input(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

pub async fn run(
    config: &SkillsConfig,
    query: &str,
    budget: usize,
    chunks_path: &Path,
    policy: Option<FallbackPolicy>,
) -> Result<(), Box<dyn std::error::Error>> {
    let fitter = ContextFitter::from_config(&config.context);
    let policy = policy.unwrap_or_else(|| config.context.fallback.into());

    let raw = read_input(chunks_path)
        .map_err(|e| format!("Failed to read chunks from {}: {e}", chunks_path.display()))?;
    let chunks = parse_chunks(&raw, fitter.estimator())
        .map_err(|e| format!("Invalid chunk JSON: {e}"))?;

    info!(chunks = chunks.len(), budget, ?policy, "Fitting context");

    let fitted = fitter
        .fit_with_fallback(query, &chunks, budget, None, policy)
        .await?;

    println!("{}", serde_json::to_string_pretty(&fitted)?);
    Ok(())
}
