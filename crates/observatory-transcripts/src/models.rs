use serde::{Deserialize, Serialize};

/// Collapse a model identifier to its family name.
///
/// Identifiers mentioning opus, sonnet or haiku become that short name;
/// anything else passes through unchanged and forms its own bucket.
pub fn normalize_model_name(model: &str) -> String {
    for family in ["opus", "sonnet", "haiku"] {
        if model.contains(family) {
            return family.to_string();
        }
    }
    model.to_string()
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
    pub cache_read: f64,
    pub cache_write: f64,
}

pub const OPUS_PRICING: ModelPricing = ModelPricing {
    input: 15.0,
    output: 75.0,
    cache_read: 1.5,
    cache_write: 18.75,
};

pub const SONNET_PRICING: ModelPricing = ModelPricing {
    input: 3.0,
    output: 15.0,
    cache_read: 0.3,
    cache_write: 3.75,
};

pub const HAIKU_PRICING: ModelPricing = ModelPricing {
    input: 0.8,
    output: 4.0,
    cache_read: 0.08,
    cache_write: 1.0,
};

/// Used for any model outside the known families.
pub const DEFAULT_PRICING: ModelPricing = SONNET_PRICING;

pub fn pricing_for(model: &str) -> ModelPricing {
    match normalize_model_name(model).as_str() {
        "opus" => OPUS_PRICING,
        "sonnet" => SONNET_PRICING,
        "haiku" => HAIKU_PRICING,
        _ => DEFAULT_PRICING,
    }
}

/// Token totals for one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCounts {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
}

impl TokenCounts {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_read_tokens + self.cache_write_tokens
    }

    pub fn add(&mut self, other: &TokenCounts) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
        self.cache_write_tokens += other.cache_write_tokens;
    }
}

pub fn calculate_cost(model: &str, tokens: &TokenCounts) -> f64 {
    let pricing = pricing_for(model);
    let per_million = |count: u64, rate: f64| (count as f64 / 1_000_000.0) * rate;

    per_million(tokens.input_tokens, pricing.input)
        + per_million(tokens.output_tokens, pricing.output)
        + per_million(tokens.cache_read_tokens, pricing.cache_read)
        + per_million(tokens.cache_write_tokens, pricing.cache_write)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_families() {
        assert_eq!(normalize_model_name("claude-opus-4-5-20251101"), "opus");
        assert_eq!(normalize_model_name("opus-anything"), "opus");
        assert_eq!(normalize_model_name("claude-sonnet-4-5-20250929"), "sonnet");
        assert_eq!(normalize_model_name("claude-3-5-haiku-20241022"), "haiku");
    }

    #[test]
    fn test_normalize_unknown_passes_through() {
        assert_eq!(normalize_model_name("gpt-5-codex"), "gpt-5-codex");
        assert_eq!(normalize_model_name("<synthetic>"), "<synthetic>");
        assert_eq!(normalize_model_name(""), "");
    }

    #[test]
    fn test_pricing_falls_back_to_default() {
        assert_eq!(pricing_for("claude-opus-4-1"), OPUS_PRICING);
        assert_eq!(pricing_for("mystery-model"), DEFAULT_PRICING);
    }

    #[test]
    fn test_calculate_cost() {
        let tokens = TokenCounts {
            input_tokens: 1_000_000,
            output_tokens: 1_000_000,
            cache_read_tokens: 1_000_000,
            cache_write_tokens: 1_000_000,
        };
        let cost = calculate_cost("claude-opus-4-5-20251101", &tokens);
        assert!((cost - (15.0 + 75.0 + 1.5 + 18.75)).abs() < 1e-9);

        let cost = calculate_cost("claude-haiku-4-5", &TokenCounts::default());
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_token_counts_total_and_add() {
        let mut a = TokenCounts {
            input_tokens: 1,
            output_tokens: 2,
            cache_read_tokens: 3,
            cache_write_tokens: 4,
        };
        let b = a;
        a.add(&b);
        assert_eq!(a.total(), 20);
    }
}
