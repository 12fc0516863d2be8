// Assistant configuration type definitions

use serde::Deserialize;

fn default_debounce_ms() -> u64 {
    2000
}

fn default_min_length() -> usize {
    100
}

fn default_context_chars() -> usize {
    150
}

fn default_max_concurrent() -> usize {
    2
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_abort_superseded() -> bool {
    true
}

fn default_ttl_ms() -> u64 {
    5 * 60 * 1000
}

fn default_capacity() -> usize {
    50
}

fn default_key_chars() -> usize {
    200
}

fn default_sweep_interval_ms() -> u64 {
    60_000
}

fn default_max_requests() -> usize {
    15
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_cooldown_ms() -> u64 {
    2000
}

/// Suggestions are short continuations, so the response budget stays small
fn default_max_tokens() -> u32 {
    256
}

/// Generation provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Anthropic,
    OpenAi,
    /// Any JSON endpoint answering `{ "text": ..., "confidence": ... }`
    Endpoint,
}

/// Anthropic-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        AnthropicConfig {
            api_key: None,
            model: None,
            max_tokens: default_max_tokens(),
        }
    }
}

/// OpenAI-specific configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Generic generation endpoint configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointConfig {
    pub url: Option<String>,
    /// Sent as a bearer token when present
    pub api_key: Option<String>,
}

/// `[assist.cache]`
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Entries older than this are treated as absent
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    /// Maximum number of cached suggestions
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Trailing characters of the document that feed the cache key
    #[serde(default = "default_key_chars")]
    pub key_chars: usize,
    /// How often expired entries are swept
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_ms: default_ttl_ms(),
            capacity: default_capacity(),
            key_chars: default_key_chars(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

/// `[assist.rate_limit]`
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

/// `[assist.tracking]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingConfig {
    /// Base URL of the tracking API; records stay local when unset
    pub endpoint: Option<String>,
    /// Report a superseded suggestion as an implicit rejection
    #[serde(default)]
    pub report_superseded: bool,
}

/// Writing assistant configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct AssistConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Which generation provider to use (required when enabled)
    #[serde(default)]
    pub provider: Option<ProviderType>,
    /// Quiet period after the last edit before a suggestion is evaluated
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Documents shorter than this (in characters) never trigger
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Characters of context taken on each side of the cursor
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
    /// Maximum generation calls in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Cancel superseded in-flight calls instead of letting them finish
    #[serde(default = "default_abort_superseded")]
    pub abort_superseded: bool,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub anthropic: AnthropicConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

impl Default for AssistConfig {
    fn default() -> Self {
        AssistConfig {
            enabled: false,
            provider: None,
            debounce_ms: default_debounce_ms(),
            min_length: default_min_length(),
            context_chars: default_context_chars(),
            max_concurrent: default_max_concurrent(),
            request_timeout_ms: default_request_timeout_ms(),
            abort_superseded: default_abort_superseded(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tracking: TrackingConfig::default(),
            anthropic: AnthropicConfig::default(),
            openai: OpenAiConfig::default(),
            endpoint: EndpointConfig::default(),
        }
    }
}

#[cfg(test)]
#[path = "assist_types_tests.rs"]
mod assist_types_tests;
