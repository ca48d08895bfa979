//! # sbc-core
//!
//! SBC 子带音频编解码器的基础库, 提供统一错误类型、比特流读写和 CRC 校验.
//!
//! 编解码核心 (`sbc-codec`) 只依赖本 crate, 不涉及任何 I/O.

pub mod bitreader;
pub mod bitwriter;
pub mod crc;
pub mod error;

// 重导出常用类型
pub use bitreader::BitReader;
pub use bitwriter::BitWriter;
pub use error::{SbcError, SbcResult};
