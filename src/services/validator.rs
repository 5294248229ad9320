//! 答案校验
//!
//! 判断后端返回的原始答案对当前题型是否可接受

/// 校验答案是否可接受
///
/// - 空白答案一律拒绝
/// - 选择题：去除空白后恰好一个字符，且（不区分大小写）是 A/B/C/D 之一
/// - 简答题：至少包含一个非空白 token
pub fn is_acceptable(answer: &str, is_multiple_choice: bool) -> bool {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return false;
    }

    if is_multiple_choice {
        trimmed.chars().count() == 1
            && matches!(trimmed.to_ascii_uppercase().as_str(), "A" | "B" | "C" | "D")
    } else {
        trimmed.split_whitespace().next().is_some()
    }
}
