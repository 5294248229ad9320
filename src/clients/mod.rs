//! 外部服务客户端

pub mod answer_client;
pub mod recognition_client;

pub use answer_client::{AnswerBackend, ChatAnswerClient};
pub use recognition_client::{QuestionRecognizer, VisionRecognitionClient};
