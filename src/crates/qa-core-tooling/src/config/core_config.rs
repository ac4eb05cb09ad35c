//! Core configuration shared across the orchestration crates.
//!
//! `CoreConfig` is the single entry point through which every environment
//! variable named by the external interface is read. It is built with
//! [`ConfigBuilder::from_env_with_defaults`] so that defaults, env overrides
//! and validation all go through one path.

use crate::config::{get_env_bool, get_env_or, get_env_parse_or, ConfigBuilder};
use crate::{Result, ToolingError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which chat-model provider a given role (doc parsing, UI analysis, ...)
/// should use. Selection happens per spec.md's model-client key list; when
/// a provider's API key is absent and `AI_MOCK_MODE` is set, callers fall
/// back to the mock provider regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    Qwen,
    QwenVl,
    Glm,
    DeepSeek,
    UiTars,
    OpenAi,
    Mock,
}

impl Default for ModelProvider {
    fn default() -> Self {
        ModelProvider::Mock
    }
}

/// Message bus tuning: mailbox capacity and default stream-collector flush cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusSettings {
    pub mailbox_capacity: usize,
    pub stream_flush_interval_ms: u64,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            mailbox_capacity: 256,
            stream_flush_interval_ms: 300,
        }
    }
}

/// Script executor workspace and timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorSettings {
    pub workspace_root: Option<PathBuf>,
    pub execution_timeout_secs: u64,
    pub batch_id: Option<String>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            workspace_root: None,
            execution_timeout_secs: 600,
            batch_id: None,
        }
    }
}

/// Browser sandbox settings, mirroring the `ADSP_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxSettings {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub max_concurrency: usize,
    pub delete_profile_on_exit: bool,
    pub grid_cols: u32,
    pub grid_rows: u32,
    pub tile_index: Option<u32>,
    pub screen_resolution: Option<String>,
    pub rate_limit_delay_ms: u64,
    pub force_adspower_only: bool,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            max_concurrency: 15,
            delete_profile_on_exit: true,
            grid_cols: 4,
            grid_rows: 4,
            tile_index: None,
            screen_resolution: None,
            rate_limit_delay_ms: 0,
            force_adspower_only: false,
        }
    }
}

/// Top-level configuration for the orchestration core.
///
/// Every environment variable named in the external interface is read through
/// [`CoreConfig::from_env`] (via [`ConfigBuilder`]), never scattered across
/// individual modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub model_provider: ModelProvider,
    pub mock_mode: bool,
    pub bus: BusSettings,
    pub executor: ExecutorSettings,
    pub sandbox: SandboxSettings,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            model_provider: ModelProvider::default(),
            mock_mode: true,
            bus: BusSettings::default(),
            executor: ExecutorSettings::default(),
            sandbox: SandboxSettings::default(),
        }
    }
}

impl ConfigBuilder for CoreConfig {
    fn validate(&self) -> Result<()> {
        if self.sandbox.max_concurrency == 0 {
            return Err(ToolingError::General(
                "ADSP_MAX_CONCURRENCY must be non-zero".to_string(),
            ));
        }
        if self.sandbox.grid_cols == 0 || self.sandbox.grid_rows == 0 {
            return Err(ToolingError::General(
                "ADSP_GRID_COLS and ADSP_GRID_ROWS must be non-zero".to_string(),
            ));
        }
        if self.executor.execution_timeout_secs == 0 {
            return Err(ToolingError::General(
                "execution timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    fn from_env(_prefix: &str) -> Result<Self> {
        let mock_mode = get_env_bool("AI_MOCK_MODE")?.unwrap_or(true);

        let workspace_root = match get_env_or("PLAYWRIGHT_WORKSPACE", "")? {
            s if s.is_empty() => None,
            s => Some(PathBuf::from(s)),
        };

        let batch_id = match get_env_or("EXECUTION_BATCH_ID", "")? {
            s if s.is_empty() => match get_env_or("BATCH_ID", "")? {
                s if s.is_empty() => None,
                s => Some(s),
            },
            s => Some(s),
        };

        let base_url = match get_env_or("ADSP_BASE_URL", "")? {
            s if s.is_empty() => None,
            s => Some(s),
        };
        let token = match get_env_or("ADSP_TOKEN", "")? {
            s if s.is_empty() => None,
            s => Some(s),
        };
        let tile_index = get_env_parse_or::<i64>("ADSP_TILE_INDEX", -1)?;
        let tile_index = if tile_index < 0 {
            None
        } else {
            Some(tile_index as u32)
        };
        let screen_resolution = match get_env_or("ADSP_SCREEN_RES", "")? {
            s if s.is_empty() => None,
            s => Some(s),
        };

        Ok(Self {
            model_provider: ModelProvider::default(),
            mock_mode,
            bus: BusSettings::default(),
            executor: ExecutorSettings {
                workspace_root,
                execution_timeout_secs: get_env_parse_or("EXECUTION_TIMEOUT_SECS", 600)?,
                batch_id,
            },
            sandbox: SandboxSettings {
                base_url,
                token,
                max_concurrency: get_env_parse_or("ADSP_MAX_CONCURRENCY", 15)?,
                delete_profile_on_exit: get_env_bool("ADSP_DELETE_PROFILE_ON_EXIT")?
                    .unwrap_or(true),
                grid_cols: get_env_parse_or("ADSP_GRID_COLS", 4)?,
                grid_rows: get_env_parse_or("ADSP_GRID_ROWS", 4)?,
                tile_index,
                screen_resolution,
                rate_limit_delay_ms: get_env_parse_or("ADSP_RATE_LIMIT_DELAY_MS", 0)?,
                force_adspower_only: get_env_bool("FORCE_ADSPOWER_ONLY")?.unwrap_or(false),
            },
        })
    }

    // `from_env_with_defaults` calls this with `other` set to `Self::default()`.
    // Every field `from_env` can populate is already concrete, so defaults only
    // fill in the genuinely optional ones that env did not set.
    fn merge(&mut self, other: Self) -> &mut Self {
        if self.executor.workspace_root.is_none() {
            self.executor.workspace_root = other.executor.workspace_root;
        }
        if self.executor.batch_id.is_none() {
            self.executor.batch_id = other.executor.batch_id;
        }
        if self.sandbox.base_url.is_none() {
            self.sandbox.base_url = other.sandbox.base_url;
        }
        if self.sandbox.token.is_none() {
            self.sandbox.token = other.sandbox.token;
        }
        if self.sandbox.tile_index.is_none() {
            self.sandbox.tile_index = other.sandbox.tile_index;
        }
        if self.sandbox.screen_resolution.is_none() {
            self.sandbox.screen_resolution = other.sandbox.screen_resolution;
        }
        self
    }
}

impl CoreConfig {
    /// Load configuration from environment variables, falling back to defaults
    /// and validating the result. This is the single constructor every
    /// environment variable named in the external interface passes through.
    pub fn from_environment() -> Result<Self> {
        Self::from_env_with_defaults("")
    }

    /// Per-key API key lookup for a model provider, per the spec's
    /// `QWEN_API_KEY` / `QWEN_VL_API_KEY` / `GLM_API_KEY` / `DEEPSEEK_API_KEY`
    /// / `UI_TARS_API_KEY` / `OPENAI_API_KEY` env vars.
    pub fn api_key_for(provider: ModelProvider) -> Result<Option<String>> {
        let var = match provider {
            ModelProvider::Qwen => "QWEN_API_KEY",
            ModelProvider::QwenVl => "QWEN_VL_API_KEY",
            ModelProvider::Glm => "GLM_API_KEY",
            ModelProvider::DeepSeek => "DEEPSEEK_API_KEY",
            ModelProvider::UiTars => "UI_TARS_API_KEY",
            ModelProvider::OpenAi => "OPENAI_API_KEY",
            ModelProvider::Mock => return Ok(None),
        };
        crate::config::get_env(var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_are_valid() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sandbox.max_concurrency, 15);
        assert_eq!(config.bus.mailbox_capacity, 256);
    }

    #[test]
    fn test_from_env_reads_mock_mode() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("AI_MOCK_MODE", "true");
        env::set_var("ADSP_MAX_CONCURRENCY", "8");
        let config = CoreConfig::from_environment().unwrap();
        assert!(config.mock_mode);
        assert_eq!(config.sandbox.max_concurrency, 8);
        env::remove_var("AI_MOCK_MODE");
        env::remove_var("ADSP_MAX_CONCURRENCY");
    }

    #[test]
    fn test_invalid_concurrency_rejected() {
        let mut config = CoreConfig::default();
        config.sandbox.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_for_mock_is_none() {
        assert!(CoreConfig::api_key_for(ModelProvider::Mock)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_tile_index_unset_is_none() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("ADSP_TILE_INDEX");
        let config = CoreConfig::from_environment().unwrap();
        assert!(config.sandbox.tile_index.is_none());
    }
}
