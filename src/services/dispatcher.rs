//! 带重试的单后端调度
//!
//! 把一次后端调用包装成有界重试 + 答案校验，产出终态结果。
//! 两类耗尽必须在返回类型里保持可区分：调用失败耗尽（ExhaustedError）
//! 是错误，校验失败耗尽（ExhaustedInvalid）不是。

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clients::answer_client::AnswerBackend;
use crate::models::result::{backend_short_name, INVALID_ANSWER, UNKNOWN_ANSWER};
use crate::services::validator::is_acceptable;

/// 单次调度的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// 答案通过校验
    Accepted,
    /// 每次尝试都拿到了答案但都未通过校验，给占位答案
    ExhaustedInvalid,
    /// 每次尝试调用本身都失败
    ExhaustedError,
}

impl DispatchStatus {
    /// 是否计为成功（ExhaustedInvalid 明确不算错误）
    pub fn is_success(self) -> bool {
        !matches!(self, DispatchStatus::ExhaustedError)
    }
}

/// 单次调度的结果
#[derive(Debug)]
pub struct DispatchOutcome {
    pub status: DispatchStatus,
    pub answer: String,
    /// 从调度开始到返回的耗时，含重试与退避
    pub elapsed_secs: f64,
}

/// 每次尝试的判定
enum AttemptVerdict {
    Accepted(String),
    Rejected,
    CallFailed(anyhow::Error),
}

/// 向单个后端请求答案，带有界重试与校验
///
/// 调用失败在重试前退避一个固定间隔；校验失败立即重试。
pub async fn dispatch(
    client: &dyn AnswerBackend,
    question: &str,
    options: &str,
    backend: &str,
    max_retries: u32,
    backoff: Duration,
) -> DispatchOutcome {
    let start = Instant::now();
    let is_mcq = !options.is_empty();
    let prompt = build_prompt(question, options);
    let total_attempts = max_retries + 1;

    info!("开始向后端请求答案: {}", backend);

    let mut last_error: Option<anyhow::Error> = None;

    for attempt in 1..=total_attempts {
        debug!("后端 {} 第 {}/{} 次尝试", backend, attempt, total_attempts);

        let verdict = match client.answer(backend, &prompt).await {
            Ok(raw) => {
                if is_acceptable(&raw, is_mcq) {
                    AttemptVerdict::Accepted(normalize_answer(&raw, is_mcq))
                } else {
                    AttemptVerdict::Rejected
                }
            }
            Err(e) => AttemptVerdict::CallFailed(e),
        };

        match verdict {
            AttemptVerdict::Accepted(answer) => {
                let elapsed = start.elapsed().as_secs_f64();
                info!("✓ 后端 {} 在 {:.2}s 内返回有效答案", backend, elapsed);
                return DispatchOutcome {
                    status: DispatchStatus::Accepted,
                    answer,
                    elapsed_secs: elapsed,
                };
            }
            AttemptVerdict::Rejected => {
                if attempt < total_attempts {
                    // 校验失败重试不等待
                    debug!("后端 {} 答案未通过校验，立即重试", backend);
                    continue;
                }
                let elapsed = start.elapsed().as_secs_f64();
                warn!("后端 {} 所有答案均未通过校验，使用占位答案", backend);
                let answer = if is_mcq { INVALID_ANSWER } else { UNKNOWN_ANSWER };
                return DispatchOutcome {
                    status: DispatchStatus::ExhaustedInvalid,
                    answer: answer.to_string(),
                    elapsed_secs: elapsed,
                };
            }
            AttemptVerdict::CallFailed(e) => {
                warn!("后端 {} 第 {} 次调用失败: {}", backend, attempt, e);
                last_error = Some(e);
                if attempt < total_attempts {
                    // 只有调用失败才在重试前退避
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let description = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "调用失败".to_string());

    DispatchOutcome {
        status: DispatchStatus::ExhaustedError,
        answer: format!("Error ({}): {}", backend_short_name(backend), description),
        elapsed_secs: elapsed,
    }
}

/// 接受后的答案规范化：选择题统一大写，简答题去除首尾空白
fn normalize_answer(raw: &str, is_mcq: bool) -> String {
    if is_mcq {
        raw.trim().to_uppercase()
    } else {
        raw.trim().to_string()
    }
}

/// 按题型构建 prompt 模板
fn build_prompt(question: &str, options: &str) -> String {
    if !options.is_empty() {
        format!(
            r#"Multiple Choice Question:
{question}
{options}

Instructions:
1. ONLY respond with the letter (A, B, C, or D) of the correct option
2. Do not write the full answer or any explanation
3. Just the letter, nothing else

You must respond with just A, B, C, or D."#
        )
    } else {
        format!(
            r#"Answer this question concisely:
{question}

Instructions:
1. If it's a factual question (like capitals, dates, names), give the exact correct answer
2. The answer must be brief and to the point - avoid explanations or unnecessary words
3. Proper nouns should be capitalized (e.g., Delhi, Paris, Einstein)
4. Keep your response very short and focused

Your response must be clear and concise."#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;

    /// 按脚本返回应答的后端替身；脚本耗尽后视为调用失败
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<&'static str, &'static str>>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<&'static str, &'static str>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self::new(Vec::new())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnswerBackend for ScriptedBackend {
        async fn answer(&self, _backend: &str, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(answer)) => Ok(answer.to_string()),
                Some(Err(message)) => anyhow::bail!("{}", message),
                None => anyhow::bail!("连接失败"),
            }
        }
    }

    const MCQ_OPTIONS: &str = "A) 3 B) 4 C) 5 D) 6";
    const BACKOFF: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_call_failures_exhaust_to_error() {
        let backend = ScriptedBackend::failing();

        let outcome = dispatch(&backend, "2+2?", MCQ_OPTIONS, "mock/alpha:free", 2, BACKOFF).await;

        assert_eq!(outcome.status, DispatchStatus::ExhaustedError);
        assert!(!outcome.status.is_success());
        assert!(outcome.answer.starts_with("Error (alpha:free):"));
        assert_eq!(backend.calls(), 3);
        // 两次退避都计入耗时
        assert!(outcome.elapsed_secs >= 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_once_then_succeed() {
        let backend = ScriptedBackend::new(vec![Err("网络抖动"), Ok("B")]);

        let outcome = dispatch(&backend, "2+2?", MCQ_OPTIONS, "mock/alpha", 2, BACKOFF).await;

        assert_eq!(outcome.status, DispatchStatus::Accepted);
        assert_eq!(outcome.answer, "B");
        assert_eq!(backend.calls(), 2);
        // 一次退避计入耗时
        assert!(outcome.elapsed_secs >= 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_mcq_answers_exhaust_to_sentinel() {
        let backend = ScriptedBackend::new(vec![
            Ok("The answer is B"),
            Ok("Definitely B"),
            Ok("B is correct"),
        ]);

        let outcome = dispatch(&backend, "2+2?", MCQ_OPTIONS, "mock/alpha", 2, BACKOFF).await;

        assert_eq!(outcome.status, DispatchStatus::ExhaustedInvalid);
        assert!(outcome.status.is_success());
        assert_eq!(outcome.answer, INVALID_ANSWER);
        assert_eq!(backend.calls(), 3);
        // 校验失败重试不退避
        assert!(outcome.elapsed_secs < 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_free_form_answers_exhaust_to_unknown() {
        let backend = ScriptedBackend::new(vec![Ok(""), Ok(""), Ok("")]);

        let outcome = dispatch(&backend, "法国的首都？", "", "mock/alpha", 2, BACKOFF).await;

        assert_eq!(outcome.status, DispatchStatus::ExhaustedInvalid);
        assert_eq!(outcome.answer, UNKNOWN_ANSWER);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lowercase_letter_uppercased() {
        let backend = ScriptedBackend::new(vec![Ok("b")]);

        let outcome = dispatch(&backend, "2+2?", MCQ_OPTIONS, "mock/alpha", 2, BACKOFF).await;

        assert_eq!(outcome.status, DispatchStatus::Accepted);
        assert_eq!(outcome.answer, "B");
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_accepted_free_form_answer() {
        let backend = ScriptedBackend::new(vec![Ok("  Paris  ")]);

        let outcome = tokio_test::block_on(dispatch(
            &backend,
            "Capital of France?",
            "",
            "mock/alpha",
            2,
            BACKOFF,
        ));

        assert_eq!(outcome.status, DispatchStatus::Accepted);
        assert_eq!(outcome.answer, "Paris");
    }

    #[test]
    fn test_prompt_templates() {
        let mcq = build_prompt("2+2?", MCQ_OPTIONS);
        assert!(mcq.starts_with("Multiple Choice Question:"));
        assert!(mcq.contains(MCQ_OPTIONS));
        assert!(mcq.contains("ONLY respond with the letter"));

        let free = build_prompt("Capital of France?", "");
        assert!(free.starts_with("Answer this question concisely:"));
        assert!(free.contains("Proper nouns should be capitalized"));
    }
}
