//! Cost reporting from the assistant's `stats-cache.json`.
//!
//! The cache is maintained by the assistant itself; this module only reads it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{calculate_cost, normalize_model_name, TokenCounts};

/// Share of a daily token total attributed to input when no split is recorded.
const DAILY_INPUT_SHARE: f64 = 0.3;
const DAILY_OUTPUT_SHARE: f64 = 0.7;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsCache {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub last_computed_date: Option<String>,
    #[serde(default)]
    pub daily_model_tokens: Vec<DailyModelTokens>,
    #[serde(default)]
    pub model_usage: BTreeMap<String, ModelUsage>,
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub total_messages: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyModelTokens {
    pub date: String,
    #[serde(default)]
    pub tokens_by_model: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
}

impl From<ModelUsage> for TokenCounts {
    fn from(u: ModelUsage) -> Self {
        TokenCounts {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
            cache_read_tokens: u.cache_read_input_tokens,
            cache_write_tokens: u.cache_creation_input_tokens,
        }
    }
}

/// Cost attributed to one normalised model name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCost {
    pub model: String,
    pub tokens: TokenCounts,
    pub cost_usd: f64,
}

/// Estimated cost for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCost {
    pub date: String,
    pub total_tokens: u64,
    pub cost_usd: f64,
    pub tokens_by_model: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    pub total_cost_usd: f64,
    pub total_tokens: u64,
    pub by_model: Vec<ModelCost>,
    pub daily: Vec<DailyCost>,
    pub last_computed_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsCacheInfo {
    pub exists: bool,
    pub path: PathBuf,
    pub last_updated: Option<String>,
    pub total_sessions: Option<u64>,
    pub models: Vec<String>,
}

impl StatsCache {
    /// Load the cache. `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let cache: StatsCache = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Some(cache))
    }

    /// Per-model totals from `modelUsage` and per-day estimates from
    /// `dailyModelTokens`.
    pub fn cost_report(&self) -> CostReport {
        let mut merged: BTreeMap<String, (TokenCounts, f64)> = BTreeMap::new();
        for (model, usage) in &self.model_usage {
            let tokens = TokenCounts::from(*usage);
            let cost = calculate_cost(model, &tokens);
            let entry = merged.entry(normalize_model_name(model)).or_default();
            entry.0.add(&tokens);
            entry.1 += cost;
        }

        let mut by_model: Vec<ModelCost> = merged
            .into_iter()
            .map(|(model, (tokens, cost_usd))| ModelCost {
                model,
                tokens,
                cost_usd,
            })
            .collect();
        by_model.sort_by(|a, b| b.cost_usd.total_cmp(&a.cost_usd));

        let daily = self.daily_model_tokens.iter().map(estimate_day).collect();

        CostReport {
            total_cost_usd: by_model.iter().map(|m| m.cost_usd).sum(),
            total_tokens: by_model
                .iter()
                .map(|m| m.tokens.input_tokens + m.tokens.output_tokens)
                .sum(),
            by_model,
            daily,
            last_computed_date: self.last_computed_date.clone(),
        }
    }
}

fn estimate_day(day: &DailyModelTokens) -> DailyCost {
    let mut tokens_by_model: BTreeMap<String, u64> = BTreeMap::new();
    let mut cost_usd = 0.0;

    for (model, &tokens) in &day.tokens_by_model {
        let split = TokenCounts {
            input_tokens: (tokens as f64 * DAILY_INPUT_SHARE).floor() as u64,
            output_tokens: (tokens as f64 * DAILY_OUTPUT_SHARE).floor() as u64,
            ..Default::default()
        };
        cost_usd += calculate_cost(model, &split);
        *tokens_by_model.entry(normalize_model_name(model)).or_insert(0) += tokens;
    }

    DailyCost {
        date: day.date.clone(),
        total_tokens: tokens_by_model.values().sum(),
        cost_usd,
        tokens_by_model,
    }
}

/// Describe the cache file without failing on a bad one.
pub fn stats_cache_info(path: &Path) -> StatsCacheInfo {
    match StatsCache::load(path) {
        Ok(cache) => StatsCacheInfo::describe(path, cache.as_ref()),
        Err(e) => {
            tracing::warn!("{:#}", e);
            StatsCacheInfo::describe(path, None)
        }
    }
}

impl StatsCacheInfo {
    /// Metadata for a cache that has already been loaded from `path`.
    pub fn describe(path: &Path, cache: Option<&StatsCache>) -> Self {
        Self {
            exists: path.exists(),
            path: path.to_path_buf(),
            last_updated: cache.and_then(|c| c.last_computed_date.clone()),
            total_sessions: cache.map(|c| c.total_sessions),
            models: cache
                .map(|c| c.model_usage.keys().cloned().collect())
                .unwrap_or_default(),
        }
    }
}
