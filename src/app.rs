//! 前台驱动 - 编排层
//!
//! 采集协作方的无头替身：从命令行参数读取图像文件作为帧，经提交
//! 门控送入后台工作者，按渲染节拍非阻塞排空事件并以日志形式渲染。
//!
//! 摄像头采集与叠加渲染不在本仓库范围内；真实采集循环的接入方式
//! 与此处相同：`try_submit` 提交帧，`drain_events` 渲染状态。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::clients::answer_client::ChatAnswerClient;
use crate::clients::recognition_client::VisionRecognitionClient;
use crate::config::Config;
use crate::models::result::{backend_display_name, AnswerState};
use crate::models::{Frame, ResultEvent, ResultSnapshot};
use crate::orchestrator::job_worker::{JobWorker, WorkerHandle};
use crate::utils::logging::truncate_text;

/// 渲染节拍（约 30fps）
const RENDER_TICK: Duration = Duration::from_millis(33);

/// 应用主结构
pub struct App {
    config: Config,
    handle: WorkerHandle,
}

impl App {
    /// 初始化应用：创建客户端并启动后台工作者
    pub fn initialize(config: Config) -> Self {
        log_startup(&config);

        let recognizer = Arc::new(VisionRecognitionClient::new(&config));
        let backend_client = Arc::new(ChatAnswerClient::new(&config));
        let handle = JobWorker::spawn(&config, recognizer, backend_client);

        Self { config, handle }
    }

    /// 依次处理给定的图像文件，每个文件一帧一个任务
    pub async fn run(mut self, image_paths: Vec<PathBuf>) -> Result<()> {
        if image_paths.is_empty() {
            warn!("⚠️ 没有待处理的图像文件，程序结束");
            self.handle.shutdown().await;
            return Ok(());
        }

        let total = image_paths.len();
        let mut processed = 0usize;
        let mut failed = 0usize;

        for (index, path) in image_paths.iter().enumerate() {
            info!("\n{}", "─".repeat(60));
            info!("📷 [{}/{}] 处理图像: {}", index + 1, total, path.display());

            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("⚠️ 无法读取图像 {}: {}", path.display(), e);
                    failed += 1;
                    continue;
                }
            };
            let frame = Frame::from_bytes(&bytes);

            // 等到门控放行（冷却已过且无在途任务）
            while !self.handle.try_submit(&frame) {
                tokio::time::sleep(RENDER_TICK).await;
            }

            if self.wait_for_terminal().await {
                processed += 1;
            } else {
                failed += 1;
            }
        }

        print_final_stats(processed, failed, total);

        self.handle.shutdown().await;
        Ok(())
    }

    /// 模拟渲染循环：每个节拍非阻塞排空一次事件，直到任务终结
    async fn wait_for_terminal(&mut self) -> bool {
        loop {
            tokio::time::sleep(RENDER_TICK).await;
            for event in self.handle.drain_events() {
                let terminal = event.is_terminal();
                let succeeded = !matches!(event, ResultEvent::Error(_));
                render_event(&event, self.config.verbose_logging);
                if terminal {
                    return succeeded;
                }
            }
        }
    }
}

/// 以日志形式渲染一条事件（叠加渲染的替身）
fn render_event(event: &ResultEvent, verbose: bool) {
    match event {
        ResultEvent::Question(question) => {
            info!("Q: {}", question.question);
            if question.is_multiple_choice() {
                info!("   {}", question.options);
            }
            if verbose {
                info!("OCR: {}", truncate_text(&question.raw_text, 120));
            }
        }
        ResultEvent::Partial(snapshot) => render_snapshot(snapshot, false),
        ResultEvent::Complete(snapshot) => {
            render_snapshot(snapshot, true);
            info!("✅ 本帧处理完成");
        }
        ResultEvent::Error(message) => {
            warn!("❌ 任务失败: {}", message);
        }
    }
}

/// 渲染一份快照
fn render_snapshot(snapshot: &ResultSnapshot, is_final: bool) {
    if is_final {
        info!("📊 最终结果:");
    }
    for result in snapshot.iter() {
        let name = backend_display_name(&result.backend);
        match result.state {
            AnswerState::Pending => {
                info!("  {}: {} (Processing...)", name, result.answer)
            }
            AnswerState::Succeeded => {
                info!("  {}: {} ({:.2}s)", name, result.answer, result.elapsed_secs)
            }
            AnswerState::Failed => info!("  {}: {}", name, result.answer),
        }
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 拍题答题助手");
    info!("📊 答题后端: {} 个", config.backends.len());
    for backend in &config.backends {
        info!("   - {}", backend);
    }
    info!("🔍 识别模型: {}", config.recognition_model);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(processed: usize, failed: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("✅ 成功: {}/{}", processed, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
}
