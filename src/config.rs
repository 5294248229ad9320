use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// 程序配置
///
/// 全部在进程启动时固定，运行期不支持重新配置。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 答题后端列表，顺序即快照中的条目顺序
    pub backends: Vec<String>,
    /// 识别服务模型
    pub recognition_model: String,
    /// 识别服务 API 密钥
    pub recognition_api_key: String,
    /// 识别服务 API 基础 URL（OpenAI 兼容端点）
    pub recognition_api_base_url: String,
    /// 答题后端 API 密钥（所有后端共用同一端点，以模型名区分）
    pub answer_api_key: String,
    /// 答题后端 API 基础 URL
    pub answer_api_base_url: String,
    /// 两次接受提交之间的最小冷却间隔（秒）
    pub cooldown_secs: f64,
    /// 每个后端的最大重试次数（总尝试次数 = max_retries + 1）
    pub max_retries: u32,
    /// 调用失败后重试前的退避时长（秒）
    pub retry_backoff_secs: f64,
    /// 采集分辨率与帧率（由采集协作方使用）
    pub capture_width: u32,
    pub capture_height: u32,
    pub capture_fps: u32,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backends: vec![
                "deepseek/deepseek-chat:free".to_string(),
                "qwen/qwq-32b:free".to_string(),
                "google/gemini-2.0-pro-exp-02-05:free".to_string(),
            ],
            recognition_model: "gemini-2.0-flash-001".to_string(),
            recognition_api_key: String::new(),
            recognition_api_base_url:
                "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            answer_api_key: String::new(),
            answer_api_base_url: "https://openrouter.ai/api/v1".to_string(),
            cooldown_secs: 1.0,
            max_retries: 2,
            retry_backoff_secs: 1.0,
            capture_width: 1280,
            capture_height: 720,
            capture_fps: 30,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载（未设置的项使用默认值）
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            backends: std::env::var("ANSWER_BACKENDS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                })
                .filter(|v| !v.is_empty())
                .unwrap_or(default.backends),
            recognition_model: std::env::var("RECOGNITION_MODEL")
                .unwrap_or(default.recognition_model),
            recognition_api_key: std::env::var("GEMINI_API_KEY")
                .unwrap_or(default.recognition_api_key),
            recognition_api_base_url: std::env::var("RECOGNITION_API_BASE_URL")
                .unwrap_or(default.recognition_api_base_url),
            answer_api_key: std::env::var("OPENROUTER_API_KEY")
                .unwrap_or(default.answer_api_key),
            answer_api_base_url: std::env::var("ANSWER_API_BASE_URL")
                .unwrap_or(default.answer_api_base_url),
            cooldown_secs: std::env::var("CAPTURE_COOLDOWN_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.cooldown_secs),
            max_retries: std::env::var("MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_retries),
            retry_backoff_secs: std::env::var("RETRY_BACKOFF_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.retry_backoff_secs),
            capture_width: std::env::var("CAPTURE_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.capture_width),
            capture_height: std::env::var("CAPTURE_HEIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.capture_height),
            capture_fps: std::env::var("CAPTURE_FPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.capture_fps),
            verbose_logging: std::env::var("VERBOSE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.verbose_logging),
        }
    }

    /// 从 TOML 文件加载（文件中省略的项使用默认值）
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.backends.len(), 3);
        assert_eq!(config.cooldown_secs, 1.0);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.capture_width, 1280);
        assert_eq!(config.capture_height, 720);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            backends = ["mock/alpha", "mock/beta"]
            cooldown_secs = 2.5
            "#,
        )
        .expect("应当能解析部分配置");

        assert_eq!(config.backends, vec!["mock/alpha", "mock/beta"]);
        assert_eq!(config.cooldown_secs, 2.5);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.recognition_model, "gemini-2.0-flash-001");
    }
}
