//! 统一错误类型定义.
//!
//! 编解码核心只报告具体哪一项检查失败, 不做重试或静默恢复.

use thiserror::Error;

/// SBC 编解码错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SbcError {
    /// 无效参数 (非法的子带数/块数, 超出范围的 bitpool 等)
    #[error("无效参数: {0}")]
    InvalidParameter(String),

    /// 编码输入的采样数与帧几何不符
    #[error("采样数不匹配: 期望 {expected}, 实际 {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// 帧数据不足
    #[error("帧数据不足: 需要 {needed} 字节, 实际 {actual} 字节")]
    TruncatedFrame { needed: usize, actual: usize },

    /// CRC 校验失败
    #[error("CRC 校验失败: 帧内 0x{expected:02X}, 计算 0x{computed:02X}")]
    CorruptFrame { expected: u8, computed: u8 },

    /// 期望位置上没有合法的同步字
    #[error("无法识别的同步字: 0x{0:02X}")]
    UnrecognizedSync(u8),

    /// 比特流读取越界
    #[error("已到达比特流末尾")]
    Eof,
}

/// SBC 统一 Result 类型
pub type SbcResult<T> = Result<T, SbcError>;
