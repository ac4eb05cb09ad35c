//! Remote LLM provider implementations.
//!
//! All providers speak an OpenAI-compatible chat-completions HTTP surface
//! and require an API key from the environment.
//!
//! # Providers
//!
//! - **Qwen** / **Qwen-VL** - Alibaba's Qwen models (text and vision)
//! - **GLM** - Zhipu's GLM models
//! - **Deepseek** - Deepseek models including R1 (thinking model)
//! - **UI-TARS** - ByteDance's UI-grounding vision-language model
//! - **OpenAI** - OpenAI models (GPT-4, o1, etc.)
//! - **Mock** - in-memory stand-in, used under `AI_MOCK_MODE`

pub mod deepseek;
pub mod glm;
pub mod mock;
pub mod openai;
pub mod qwen;
pub mod qwen_vl;
pub mod ui_tars;

pub use deepseek::DeepseekClient;
pub use glm::GlmClient;
pub use mock::MockChatModel;
pub use openai::OpenAiClient;
pub use qwen::QwenClient;
pub use qwen_vl::QwenVlClient;
pub use ui_tars::UiTarsClient;
