//! 提取阶段
//!
//! 把一帧图像落盘为临时文件，交给识别服务，解析其结构化文本回复。

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::clients::recognition_client::QuestionRecognizer;
use crate::error::ExtractionError;
use crate::models::{ExtractedQuestion, Frame};
use crate::utils::logging::truncate_text;

/// 临时图像文件守卫
///
/// 无论提取走哪条路径退出，Drop 时都会尽力删除文件；
/// 删除失败只记日志，不影响任务结果。
struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    /// 把帧字节写入系统临时目录
    async fn create(frame: &Frame) -> std::io::Result<Self> {
        let filename = format!("capture_{}.jpg", Local::now().format("%Y%m%d_%H%M%S"));
        let path = std::env::temp_dir().join(filename);
        fs::write(&path, frame.bytes()).await?;
        debug!("已保存临时图像: {}", path.display());
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("临时图像删除失败 {}: {}", self.path.display(), e);
        }
    }
}

/// 提取一帧图像中的题目
///
/// 帧先落盘为临时文件再交给识别服务；临时文件在成功、解析失败、
/// 调用出错的任何一条退出路径上都会被删除。
pub async fn extract(
    frame: &Frame,
    recognizer: &dyn QuestionRecognizer,
) -> Result<ExtractedQuestion, ExtractionError> {
    info!("开始处理帧 ({} 字节)", frame.len());

    let artifact = TempArtifact::create(frame)
        .await
        .map_err(ExtractionError::SaveImage)?;

    let reply = recognizer
        .recognize(artifact.path())
        .await
        .map_err(ExtractionError::Recognition)?;

    let extracted = parse_recognized_text(&reply)?;
    info!("✓ 提取到题目: {}", truncate_text(&extracted.question, 80));

    Ok(extracted)
}

/// 解析识别服务的文本回复
///
/// 逐行扫描 `Question:` / `Options:` 前缀；同一前缀出现多次时，
/// 后面的行覆盖前面的捕获。
pub fn parse_recognized_text(raw: &str) -> Result<ExtractedQuestion, ExtractionError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ExtractionError::EmptyReply);
    }
    if !raw.contains("Question:") {
        return Err(ExtractionError::MissingQuestionMarker);
    }

    let mut question = String::new();
    let mut options = String::new();
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("Question:") {
            question = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Options:") {
            options = rest.trim().to_string();
        }
    }

    if question.is_empty() {
        return Err(ExtractionError::EmptyQuestion);
    }

    Ok(ExtractedQuestion {
        question,
        options,
        raw_text: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_question_with_options() {
        let extracted =
            parse_recognized_text("Question: What is 2+2?\nOptions: A) 3 B) 4").unwrap();

        assert_eq!(extracted.question, "What is 2+2?");
        assert_eq!(extracted.options, "A) 3 B) 4");
        assert!(extracted.is_multiple_choice());
    }

    #[test]
    fn test_parse_question_without_options() {
        let extracted = parse_recognized_text("Question: Capital of France?").unwrap();

        assert_eq!(extracted.question, "Capital of France?");
        assert!(extracted.options.is_empty());
        assert!(!extracted.is_multiple_choice());
    }

    #[test]
    fn test_parse_ignores_unmarked_lines() {
        let extracted = parse_recognized_text(
            "some preamble\nQuestion: What is 2+2?\ntrailing noise\nOptions: A) 3 B) 4",
        )
        .unwrap();

        assert_eq!(extracted.question, "What is 2+2?");
        assert_eq!(extracted.options, "A) 3 B) 4");
    }

    #[test]
    fn test_parse_last_duplicate_line_wins() {
        let extracted = parse_recognized_text(
            "Question: first version?\nQuestion: second version?\nOptions: A) 1\nOptions: B) 2",
        )
        .unwrap();

        assert_eq!(extracted.question, "second version?");
        assert_eq!(extracted.options, "B) 2");
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            parse_recognized_text(""),
            Err(ExtractionError::EmptyReply)
        ));
        assert!(matches!(
            parse_recognized_text("   \n  "),
            Err(ExtractionError::EmptyReply)
        ));
        assert!(matches!(
            parse_recognized_text("no markers here"),
            Err(ExtractionError::MissingQuestionMarker)
        ));
        assert!(matches!(
            parse_recognized_text("Question: \n"),
            Err(ExtractionError::EmptyQuestion)
        ));
    }

    #[tokio::test]
    async fn test_temp_artifact_removed_on_drop() {
        let frame = Frame::from_bytes(b"fake jpeg bytes");

        let artifact = TempArtifact::create(&frame).await.unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }
}
