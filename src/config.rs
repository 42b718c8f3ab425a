//! Configuration types for the stencil workflow.
//!
//! All behaviour is controlled through [`StencilConfig`], built via its
//! [`StencilConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across workflows, serialise the scalar parts for logging,
//! and diff two runs to understand why their outcomes differ.
//!
//! The defaults reproduce the deployment this client was written against:
//! the ChromaStudio effects API, the `stencilMaker` effect, a 2-second poll
//! interval with a 60-attempt budget (120 s total wait).

use crate::api::EffectsApi;
use crate::error::StencilError;
use crate::progress::WorkflowHooks;
use std::fmt;
use std::sync::Arc;

/// Default effects-API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.chromastudio.ai";

/// Default public base URL of the content storage uploads land in.
pub const DEFAULT_CONTENTS_BASE: &str = "https://contents.maxstudio.ai";

/// Owner identifier this deployment submits jobs under.
pub const DEFAULT_USER_ID: &str = "DObRu1vyStbUynoQmTcHBlhs55z2";

/// Default transformation effect.
pub const DEFAULT_EFFECT_ID: &str = "stencilMaker";

/// Configuration for a stencil workflow.
///
/// Built via [`StencilConfig::builder()`] or [`StencilConfig::default()`].
///
/// # Example
/// ```rust
/// use img2stencil::StencilConfig;
///
/// let config = StencilConfig::builder()
///     .effect_id("stencilMaker")
///     .poll_interval_ms(2000)
///     .max_polls(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct StencilConfig {
    /// Base URL of the effects API (upload-URL issuing, job submission,
    /// status, download proxy).
    pub api_base: String,

    /// Public base URL under which uploaded storage keys are reachable.
    /// The upload stage derives the asset URL as `<contents_base>/<key>`
    /// without verifying retrievability.
    pub contents_base: String,

    /// Owner identifier sent with submissions and status queries.
    pub user_id: String,

    /// Named effect applied by the transformation job.
    pub effect_id: String,

    /// Model selector in the submission body. Fixed per tool family.
    pub model: String,

    /// Tool-type selector in the submission body.
    pub tool_type: String,

    /// Ask the service to omit its watermark. Default: true.
    pub remove_watermark: bool,

    /// Keep the job out of public galleries. Default: true.
    pub is_private: bool,

    /// Delay between status polls in milliseconds. Default: 2000.
    ///
    /// The wait is passive (`tokio::time::sleep`), not busy polling.
    pub poll_interval_ms: u64,

    /// Maximum number of status queries before giving up. Default: 60.
    ///
    /// Together with `poll_interval_ms` this bounds the total wait:
    /// 60 × 2000 ms = 120 seconds at the defaults.
    pub max_polls: u32,

    /// Timeout for the raw-byte PUT to storage, in seconds. Default: 120.
    pub upload_timeout_secs: u64,

    /// Per-request timeout for API calls (signed URL, submit, status),
    /// in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Timeout for result-asset fetches (proxy and direct), in seconds.
    /// Default: 120.
    pub download_timeout_secs: u64,

    /// Pre-constructed API client. Takes precedence over `api_base` when the
    /// workflow resolves its transport; inject a mock here in tests.
    pub api: Option<Arc<dyn EffectsApi>>,

    /// Presentation hooks. None means no events are delivered.
    pub hooks: Option<WorkflowHooks>,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            contents_base: DEFAULT_CONTENTS_BASE.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            effect_id: DEFAULT_EFFECT_ID.to_string(),
            model: "image-effects".to_string(),
            tool_type: "image-effects".to_string(),
            remove_watermark: true,
            is_private: true,
            poll_interval_ms: 2000,
            max_polls: 60,
            upload_timeout_secs: 120,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            api: None,
            hooks: None,
        }
    }
}

impl fmt::Debug for StencilConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StencilConfig")
            .field("api_base", &self.api_base)
            .field("contents_base", &self.contents_base)
            .field("user_id", &self.user_id)
            .field("effect_id", &self.effect_id)
            .field("model", &self.model)
            .field("tool_type", &self.tool_type)
            .field("remove_watermark", &self.remove_watermark)
            .field("is_private", &self.is_private)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .field("api", &self.api.as_ref().map(|_| "<dyn EffectsApi>"))
            .field("hooks", &self.hooks.as_ref().map(|_| "<dyn WorkflowCallback>"))
            .finish()
    }
}

impl StencilConfig {
    /// Create a new builder for `StencilConfig`.
    pub fn builder() -> StencilConfigBuilder {
        StencilConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`StencilConfig`].
pub struct StencilConfigBuilder {
    config: StencilConfig,
}

impl StencilConfigBuilder {
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into();
        self
    }

    pub fn contents_base(mut self, url: impl Into<String>) -> Self {
        self.config.contents_base = url.into();
        self
    }

    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.config.user_id = id.into();
        self
    }

    pub fn effect_id(mut self, id: impl Into<String>) -> Self {
        self.config.effect_id = id.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn tool_type(mut self, tool_type: impl Into<String>) -> Self {
        self.config.tool_type = tool_type.into();
        self
    }

    pub fn remove_watermark(mut self, v: bool) -> Self {
        self.config.remove_watermark = v;
        self
    }

    pub fn is_private(mut self, v: bool) -> Self {
        self.config.is_private = v;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms.max(1);
        self
    }

    pub fn max_polls(mut self, n: u32) -> Self {
        self.config.max_polls = n.max(1);
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api(mut self, api: Arc<dyn EffectsApi>) -> Self {
        self.config.api = Some(api);
        self
    }

    pub fn hooks(mut self, hooks: WorkflowHooks) -> Self {
        self.config.hooks = Some(hooks);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StencilConfig, StencilError> {
        let c = &self.config;
        for (name, value) in [
            ("api_base", &c.api_base),
            ("contents_base", &c.contents_base),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(StencilError::InvalidConfig(format!(
                    "{name} must be an http(s) URL, got '{value}'"
                )));
            }
        }
        if c.user_id.is_empty() {
            return Err(StencilError::InvalidConfig("user_id must be set".into()));
        }
        if c.effect_id.is_empty() {
            return Err(StencilError::InvalidConfig("effect_id must be set".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let c = StencilConfig::default();
        assert_eq!(c.api_base, DEFAULT_API_BASE);
        assert_eq!(c.effect_id, "stencilMaker");
        assert_eq!(c.poll_interval_ms, 2000);
        assert_eq!(c.max_polls, 60);
        assert!(c.remove_watermark);
        assert!(c.is_private);
    }

    #[test]
    fn builder_clamps_poll_budget() {
        let c = StencilConfig::builder()
            .max_polls(0)
            .poll_interval_ms(0)
            .build()
            .unwrap();
        assert_eq!(c.max_polls, 1);
        assert_eq!(c.poll_interval_ms, 1);
    }

    #[test]
    fn build_rejects_non_http_base() {
        let err = StencilConfig::builder()
            .api_base("ftp://nope")
            .build()
            .unwrap_err();
        assert!(matches!(err, StencilError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_empty_user_id() {
        let err = StencilConfig::builder().user_id("").build().unwrap_err();
        assert!(matches!(err, StencilError::InvalidConfig(_)));
    }
}
