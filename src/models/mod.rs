//! 数据模型

pub mod frame;
pub mod question;
pub mod result;

pub use frame::Frame;
pub use question::ExtractedQuestion;
pub use result::{AnswerState, ModelResult, ResultEvent, ResultSnapshot};
