//! 答题结果数据模型
//!
//! 快照按配置顺序覆盖所有后端，任务启动后任何时刻每个后端都有一个
//! 条目；条目状态只会从 Pending 单调迁移到终态一次。

use crate::models::question::ExtractedQuestion;

/// Pending 状态的占位答案
pub const PENDING_ANSWER: &str = "-";

/// 选择题校验耗尽后的占位答案
pub const INVALID_ANSWER: &str = "Invalid response";

/// 简答题校验耗尽后的占位答案
pub const UNKNOWN_ANSWER: &str = "Unknown";

/// 单个后端的答题状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerState {
    Pending,
    Succeeded,
    Failed,
}

/// 单个后端的答题结果
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResult {
    /// 后端标识（配置中的模型名）
    pub backend: String,
    /// 答案文本；Failed 时为带后端短名的错误描述
    pub answer: String,
    /// 从调度开始到返回的耗时（含重试与退避）
    pub elapsed_secs: f64,
    pub state: AnswerState,
}

impl ModelResult {
    /// 任务启动时的初始条目
    pub fn pending(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            answer: PENDING_ANSWER.to_string(),
            elapsed_secs: 0.0,
            state: AnswerState::Pending,
        }
    }
}

/// 一次任务中所有后端的答题快照
///
/// 条目顺序 = 配置中的后端顺序
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSnapshot {
    entries: Vec<ModelResult>,
}

impl ResultSnapshot {
    /// 按配置顺序初始化全 Pending 快照
    pub fn all_pending(backends: &[String]) -> Self {
        Self {
            entries: backends.iter().map(ModelResult::pending).collect(),
        }
    }

    /// 覆盖指定后端的条目（后端不在快照中时忽略）
    pub fn update(&mut self, result: ModelResult) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.backend == result.backend)
        {
            *entry = result;
        }
    }

    pub fn get(&self, backend: &str) -> Option<&ModelResult> {
        self.entries.iter().find(|entry| entry.backend == backend)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否所有条目都已到达终态
    pub fn is_settled(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.state != AnswerState::Pending)
    }
}

/// 后台任务发往前台的事件
///
/// 每个任务恰好一条 `Question` 先于任何 `Partial`，
/// 且恰好一条终态事件（`Complete` 或 `Error`）。
#[derive(Debug, Clone)]
pub enum ResultEvent {
    /// 提取成功，附带题目
    Question(ExtractedQuestion),
    /// 增量快照（完整拷贝，不是差分）
    Partial(ResultSnapshot),
    /// 终态：所有后端完成
    Complete(ResultSnapshot),
    /// 终态：任务失败
    Error(String),
}

impl ResultEvent {
    /// 是否为终态事件
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResultEvent::Complete(_) | ResultEvent::Error(_))
    }
}

/// 后端短名（最后一个 `/` 之后的部分），用于错误信息
pub fn backend_short_name(backend: &str) -> &str {
    backend.rsplit('/').next().unwrap_or(backend)
}

/// 后端显示名（第一个 `/` 之前的部分），用于渲染
pub fn backend_display_name(backend: &str) -> &str {
    backend.split('/').next().unwrap_or(backend)
}
