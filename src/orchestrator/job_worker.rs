//! 任务工作者
//!
//! 独占一条后台任务队列：一次拉一帧，先提取后并发答题，把带标签的
//! 事件发往出站通道。前后台只通过入站（帧）/出站（事件）两条通道
//! 通信，不共享任何直接调用状态。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::clients::answer_client::AnswerBackend;
use crate::clients::recognition_client::QuestionRecognizer;
use crate::config::Config;
use crate::models::{Frame, ResultEvent};
use crate::orchestrator::answer_orchestrator::{self, emit};
use crate::workflow::extraction;

/// 单个任务的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Extracting,
    Answering,
    Done,
}

/// 后台任务工作者
///
/// 同一时刻至多处理一个任务；提取失败的任务直接终结，
/// 不会触碰任何答题后端。
pub struct JobWorker {
    recognizer: Arc<dyn QuestionRecognizer>,
    backend_client: Arc<dyn AnswerBackend>,
    backends: Vec<String>,
    max_retries: u32,
    backoff: Duration,
    frame_rx: mpsc::Receiver<Frame>,
    event_tx: mpsc::UnboundedSender<ResultEvent>,
}

impl JobWorker {
    /// 启动后台工作者，返回前台句柄
    pub fn spawn(
        config: &Config,
        recognizer: Arc<dyn QuestionRecognizer>,
        backend_client: Arc<dyn AnswerBackend>,
    ) -> WorkerHandle {
        // 提交门控保证同时至多一帧在途，容量 1 足够
        let (frame_tx, frame_rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let worker = JobWorker {
            recognizer,
            backend_client,
            backends: config.backends.clone(),
            max_retries: config.max_retries,
            backoff: Duration::from_secs_f64(config.retry_backoff_secs),
            frame_rx,
            event_tx,
        };
        let join = tokio::spawn(worker.run());

        WorkerHandle {
            frame_tx,
            event_rx,
            join,
            cooldown: Duration::from_secs_f64(config.cooldown_secs),
            last_submit: None,
            job_active: false,
        }
    }

    /// 工作者主循环：一次只处理一个任务
    async fn run(mut self) {
        info!("任务工作者已启动，后端数量: {}", self.backends.len());

        while let Some(frame) = self.frame_rx.recv().await {
            self.process_job(frame).await;
            debug!("任务阶段: {:?}", JobPhase::Idle);
        }

        info!("帧通道已关闭，任务工作者退出");
    }

    /// 处理一个任务：Idle → Extracting → Answering → Done
    async fn process_job(&self, frame: Frame) {
        let job_start = Instant::now();
        let mut phase = JobPhase::Extracting;
        debug!("任务阶段: {:?}", phase);

        let extracted = match extraction::extract(&frame, self.recognizer.as_ref()).await {
            Ok(extracted) => extracted,
            Err(e) => {
                error!("提取失败: {}", e);
                phase = JobPhase::Done;
                debug!("任务阶段: {:?}", phase);
                emit(&self.event_tx, ResultEvent::Error(e.to_string()));
                return;
            }
        };

        emit(&self.event_tx, ResultEvent::Question(extracted.clone()));

        phase = JobPhase::Answering;
        debug!("任务阶段: {:?}", phase);

        answer_orchestrator::run_all(
            self.backend_client.as_ref(),
            &extracted.question,
            &extracted.options,
            &self.backends,
            self.max_retries,
            self.backoff,
            &self.event_tx,
        )
        .await;

        phase = JobPhase::Done;
        debug!("任务阶段: {:?}", phase);
        info!("✓ 任务完成，总耗时 {:.2}s", job_start.elapsed().as_secs_f64());
    }
}

/// 前台句柄
///
/// 前台线程独占使用：提交帧、非阻塞排空事件、优雅停机。
/// 前台永远不会在后端调用上阻塞。
pub struct WorkerHandle {
    frame_tx: mpsc::Sender<Frame>,
    event_rx: mpsc::UnboundedReceiver<ResultEvent>,
    join: JoinHandle<()>,
    cooldown: Duration,
    last_submit: Option<Instant>,
    job_active: bool,
}

impl WorkerHandle {
    /// 尝试提交一帧
    ///
    /// 仅当没有任务在途、且距上次接受的提交已超过冷却间隔时才接受；
    /// 否则静默丢弃本帧并返回 false，不做排队。
    pub fn try_submit(&mut self, frame: &Frame) -> bool {
        if self.job_active {
            debug!("已有任务在途，丢弃本帧");
            return false;
        }
        if let Some(last) = self.last_submit {
            if last.elapsed() < self.cooldown {
                debug!("冷却中，丢弃本帧");
                return false;
            }
        }

        // 工作者持有自己的拷贝，采集侧可立即复用缓冲区
        match self.frame_tx.try_send(frame.clone()) {
            Ok(()) => {
                self.last_submit = Some(Instant::now());
                self.job_active = true;
                true
            }
            Err(e) => {
                warn!("帧提交失败: {}", e);
                false
            }
        }
    }

    /// 非阻塞排空当前可用的全部事件
    ///
    /// 观察到终态事件（`Complete` / `Error`）即认为任务结束，
    /// 句柄重新允许提交。
    pub fn drain_events(&mut self) -> Vec<ResultEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            if event.is_terminal() {
                self.job_active = false;
            }
            events.push(event);
        }
        events
    }

    /// 是否有任务在途
    pub fn is_job_active(&self) -> bool {
        self.job_active
    }

    /// 关闭入站通道并等待工作者退出
    pub async fn shutdown(self) {
        info!("正在停止任务工作者...");
        drop(self.frame_tx);
        if let Err(e) = self.join.await {
            warn!("任务工作者异常退出: {}", e);
        }
        info!("任务工作者已停止");
    }
}
