//! 识别服务客户端
//!
//! 把临时图像发给识别服务，要求按固定格式返回题目文本。
//! 图像以 base64 data URL 的形式放进 Vision 请求的内容分片。

use std::path::Path;

use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::fs;
use tracing::{debug, warn};

use crate::config::Config;

/// 固定的提取指令
///
/// 要求识别服务返回两种文本形态之一：一行 `Question:`，
/// 选择题时再加一行 `Options:`。
pub const EXTRACTION_INSTRUCTION: &str = "Extract text from this image:
If it's a multiple choice question, format as:
Question: <question>
Options: <options>

If it's a regular question, format as:
Question: <question>

ONLY return a Question: line if you detect an actual question in the image.
If no question is detected, return empty string.";

/// 识别服务边界
///
/// 一次调用 = 一张图像 + 固定指令，返回识别服务的原始文本回复
#[async_trait]
pub trait QuestionRecognizer: Send + Sync {
    async fn recognize(&self, image_path: &Path) -> Result<String>;
}

/// 基于 async-openai Vision 请求的识别客户端
pub struct VisionRecognitionClient {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl VisionRecognitionClient {
    /// 创建新的识别客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.recognition_api_key)
            .with_api_base(&config.recognition_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.recognition_model.clone(),
        }
    }
}

#[async_trait]
impl QuestionRecognizer for VisionRecognitionClient {
    async fn recognize(&self, image_path: &Path) -> Result<String> {
        debug!("调用识别服务，模型: {}", self.model_name);

        let image_bytes = fs::read(image_path)
            .await
            .with_context(|| format!("无法读取图像文件: {}", image_path.display()))?;
        let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(&image_bytes));

        let content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: EXTRACTION_INSTRUCTION.to_string(),
                },
            ),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: data_url,
                        detail: Some(ImageDetail::Auto),
                    },
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("识别服务调用失败: {}", e);
            anyhow::anyhow!("识别服务调用失败: {}", e)
        })?;

        debug!("识别服务调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("识别服务返回内容为空"))?;

        Ok(content.trim().to_string())
    }
}
