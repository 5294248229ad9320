//! 题目数据模型

/// 识别服务从图像中提取出的题目
///
/// 不变式：`question` 永远非空。提取不到题目用 `ExtractionError`
/// 表示，而不是空字符串。
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedQuestion {
    /// 题干内容
    pub question: String,
    /// 选项文本（非选择题时为空）
    pub options: String,
    /// 识别服务返回的原始文本
    pub raw_text: String,
}

impl ExtractedQuestion {
    /// 是否为选择题（选项非空）
    pub fn is_multiple_choice(&self) -> bool {
        !self.options.is_empty()
    }
}
