//! 应用程序错误类型

use thiserror::Error;

/// 提取阶段错误
///
/// 提取失败整体作为一条 `Error` 事件上报，不做重试；
/// 提取失败的任务不会触碰任何答题后端。
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 临时图像落盘失败
    #[error("图像保存失败: {0}")]
    SaveImage(#[source] std::io::Error),

    /// 识别服务调用失败
    #[error("识别服务调用失败: {0}")]
    Recognition(anyhow::Error),

    /// 识别服务返回空文本
    #[error("图像中未检测到题目")]
    EmptyReply,

    /// 返回文本中没有 Question: 标记
    #[error("图像中未找到题目结构")]
    MissingQuestionMarker,

    /// 解析后题干为空
    #[error("题干提取失败")]
    EmptyQuestion,
}
