//! # Camera Quiz Helper
//!
//! 拍题答题助手：按需抓拍一帧图像，识别出题目后并发请求多个答题
//! 后端，把增量结果流式送回前台渲染循环，全程不阻塞采集。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 对外部服务的单次调用能力
//! - `ChatAnswerClient` - 向一个答题后端发送一条 prompt
//! - `VisionRecognitionClient` - 把图像发给识别服务
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 单个后端维度的处理能力
//! - `validator` - 答案可接受性判定
//! - `dispatcher` - 有界重试 + 校验的单后端调度
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/extraction` - 一帧图像的提取流程（落盘 → 识别 → 解析）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/answer_orchestrator` - 单任务内的多后端并发编排
//! - `orchestrator/job_worker` - 后台任务队列与前台句柄
//!
//! 前后台只通过两条通道通信：入站帧队列和出站事件队列。

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::answer_client::{AnswerBackend, ChatAnswerClient};
pub use clients::recognition_client::{QuestionRecognizer, VisionRecognitionClient};
pub use config::Config;
pub use error::ExtractionError;
pub use models::{AnswerState, ExtractedQuestion, Frame, ModelResult, ResultEvent, ResultSnapshot};
pub use orchestrator::job_worker::{JobWorker, WorkerHandle};
