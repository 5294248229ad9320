//! 帧数据模型

/// 一帧已编码的静态图像
///
/// 对管线而言是不透明的字节缓冲：提交时从采集侧复制一份，
/// 采集循环可以立即复用自己的缓冲区。
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
}

impl Frame {
    /// 复制采集缓冲区，生成一帧
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// 帧的原始字节
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// 帧大小（字节）
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
