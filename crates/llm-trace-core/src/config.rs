//! Configuration for trace handling.
//!
//! Values come from defaults, environment variables or the builder.

/// Default number of characters kept in request/response previews.
pub const DEFAULT_PREVIEW_MAX_LENGTH: usize = 1000;

/// Trace handling configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// Maximum characters kept when building previews during legacy upgrade
    pub preview_max_length: usize,

    /// Pretty-print JSON output
    pub pretty_json: bool,

    /// Include the trace payload in display bundles
    pub display_enabled: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            preview_max_length: DEFAULT_PREVIEW_MAX_LENGTH,
            pretty_json: false,
            display_enabled: true,
        }
    }
}

impl TraceConfig {
    /// Create a new config builder
    pub fn builder() -> TraceConfigBuilder {
        TraceConfigBuilder::new()
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            preview_max_length: std::env::var("TRACE_PREVIEW_MAX_LENGTH")
                .map(|v| v.parse().unwrap_or(DEFAULT_PREVIEW_MAX_LENGTH))
                .unwrap_or(DEFAULT_PREVIEW_MAX_LENGTH),
            pretty_json: std::env::var("TRACE_PRETTY_JSON")
                .map(|v| v.parse().unwrap_or(false))
                .unwrap_or(false),
            display_enabled: std::env::var("TRACE_DISPLAY_ENABLED")
                .map(|v| v.parse().unwrap_or(true))
                .unwrap_or(true),
        }
    }
}

/// Builder for TraceConfig
pub struct TraceConfigBuilder {
    config: TraceConfig,
}

impl TraceConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            config: TraceConfig::default(),
        }
    }

    /// Set the preview length used by legacy upgrades
    pub fn preview_max_length(mut self, length: usize) -> Self {
        self.config.preview_max_length = length;
        self
    }

    /// Enable or disable pretty JSON output
    pub fn pretty_json(mut self, enabled: bool) -> Self {
        self.config.pretty_json = enabled;
        self
    }

    /// Enable or disable the trace payload in display bundles
    pub fn display_enabled(mut self, enabled: bool) -> Self {
        self.config.display_enabled = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TraceConfig {
        self.config
    }
}

impl Default for TraceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
