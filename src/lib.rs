//! # sbc
//!
//! 纯 Rust 实现的 SBC (Low Complexity Subband Codec) 音频编解码器.
//!
//! SBC 是蓝牙 A2DP 的强制音频编码, 其宽带语音变体 mSBC 用于 HFP.
//! 编码器把 16 位 PCM 块变换为定长帧, 解码器按帧还原 PCM.
//!
//! # 快速开始
//!
//! ```rust
//! use sbc::codec::{ChannelMode, SbcConfig, SbcDecoder, SbcEncoder};
//!
//! let config = SbcConfig::default()
//!     .with_channel_mode(ChannelMode::JointStereo)
//!     .with_bitpool(53);
//! let mut encoder = SbcEncoder::new(&config).unwrap();
//! let mut decoder = SbcDecoder::new(&config).unwrap();
//!
//! let pcm = vec![0i16; encoder.geometry().pcm_samples()];
//! let frame = encoder.encode(&pcm).unwrap();
//! println!("帧长 {} 字节, 码率 {} bps", frame.len(), encoder.bitrate());
//!
//! let decoded = decoder.decode(&frame).unwrap();
//! assert_eq!(decoded.len(), pcm.len());
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `sbc-core` | 错误类型, 位读写, CRC-8 |
//! | `sbc-codec` | 帧参数, 滤波器组, 比特分配, 编码器/解码器, 帧切分 |

/// 核心类型与工具
pub use sbc_core as core;

/// 编解码器
pub use sbc_codec as codec;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
