//! 多后端并发编排
//!
//! 对一次任务，把带重试的调度并发铺开到所有配置的后端，
//! 每完成一个后端就发布一份完整的增量快照。

use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::clients::answer_client::AnswerBackend;
use crate::models::result::{AnswerState, ModelResult, ResultEvent, ResultSnapshot};
use crate::services::dispatcher;

/// 发送事件；前台若已退出只记警告，不影响任务
pub(crate) fn emit(events: &UnboundedSender<ResultEvent>, event: ResultEvent) {
    if events.send(event).is_err() {
        warn!("事件通道已关闭，事件被丢弃");
    }
}

/// 并发请求所有后端
///
/// 事件流：先发一份全 Pending 的 `Partial`（前台可以立即渲染），
/// 之后每个后端完成时各发一份 `Partial`，全部完成后发 `Complete`。
/// 不支持取消：一旦开始，每个后端都会跑到完成或重试耗尽；
/// 单个后端挂起只会推迟 `Complete`，不会阻塞兄弟调度。
pub async fn run_all(
    client: &dyn AnswerBackend,
    question: &str,
    options: &str,
    backends: &[String],
    max_retries: u32,
    backoff: Duration,
    events: &UnboundedSender<ResultEvent>,
) {
    let initial = ResultSnapshot::all_pending(backends);
    emit(events, ResultEvent::Partial(initial.clone()));

    let snapshot = Mutex::new(initial);

    let dispatches = backends.iter().map(|backend| {
        let snapshot = &snapshot;
        async move {
            let outcome =
                dispatcher::dispatch(client, question, options, backend, max_retries, backoff)
                    .await;

            let state = if outcome.status.is_success() {
                AnswerState::Succeeded
            } else {
                AnswerState::Failed
            };
            if state == AnswerState::Failed {
                warn!("后端 {} 彻底失败: {}", backend, outcome.answer);
            }

            let partial = {
                // 只写自己的槽位；拷贝在锁内完成，锁不跨 I/O
                let mut guard = snapshot.lock().await;
                guard.update(ModelResult {
                    backend: backend.clone(),
                    answer: outcome.answer,
                    elapsed_secs: outcome.elapsed_secs,
                    state,
                });
                guard.clone()
            };
            emit(events, ResultEvent::Partial(partial));
        }
    });

    join_all(dispatches).await;

    info!("✓ 全部 {} 个后端已完成", backends.len());
    emit(events, ResultEvent::Complete(snapshot.into_inner()));
}
