//! 答题后端客户端
//!
//! 封装对 OpenAI 兼容答题端点的单次调用。
//! 所有配置的后端共用同一个端点（如 OpenRouter），以模型名区分。

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;

/// 固定的系统指令（所有后端一致）
pub const SYSTEM_INSTRUCTION: &str =
    "You are a precise answering system that follows instructions exactly.";

/// 采样温度（固定）
const TEMPERATURE: f32 = 0.3;

/// 答题后端边界
///
/// 一次调用 = 把一条 prompt 发给一个指定后端模型，返回自由文本答案
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    async fn answer(&self, backend: &str, prompt: &str) -> Result<String>;
}

/// 基于 async-openai 的答题客户端
pub struct ChatAnswerClient {
    client: Client<OpenAIConfig>,
}

impl ChatAnswerClient {
    /// 创建新的答题客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.answer_api_key)
            .with_api_base(&config.answer_api_base_url);

        Self {
            client: Client::with_config(openai_config),
        }
    }
}

#[async_trait]
impl AnswerBackend for ChatAnswerClient {
    async fn answer(&self, backend: &str, prompt: &str) -> Result<String> {
        debug!("调用答题后端: {}", backend);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_INSTRUCTION)
            .build()?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(backend)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(TEMPERATURE)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("后端 {} 调用失败: {}", backend, e);
            anyhow::anyhow!("后端调用失败: {}", e)
        })?;

        debug!("后端 {} 调用成功", backend);

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("后端返回内容为空"))?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试答题端点连通性
    ///
    /// 运行方式：
    /// ```bash
    /// OPENROUTER_API_KEY=... cargo test test_answer_api_connectivity -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_answer_api_connectivity() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        let client = ChatAnswerClient::new(&config);
        let backend = &config.backends[0];

        let result = client
            .answer(backend, "Answer with a single word: what is the capital of France?")
            .await;

        match result {
            Ok(answer) => {
                println!("✅ 后端 {} 返回: {}", backend, answer);
                assert!(!answer.is_empty());
            }
            Err(e) => {
                panic!("❌ 后端调用失败: {}", e);
            }
        }
    }
}
