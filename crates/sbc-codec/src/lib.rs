//! # sbc-codec
//!
//! SBC (Low Complexity Subband Codec) 编解码核心.
//!
//! 把 16 位线性 PCM 块变换为定长的压缩帧并还原. 编码端与解码端各自根据
//! 帧头和比例因子独立计算比特分配, 分配表不需要在码流中传输.
//!
//! 编码: PCM 块 -> 分析滤波器组 -> 比例因子 (+ 联合立体声判决) -> 比特分配
//! -> 量化 -> 码流打包.
//!
//! 解码: 帧字节 -> 码流解析 (同步字, CRC) -> 比特分配 -> 反量化
//! -> 联合立体声还原 -> 合成滤波器组 -> PCM 块.
//!
//! ## 使用示例
//!
//! ```rust
//! use sbc_codec::{SbcConfig, SbcDecoder, SbcEncoder};
//!
//! let config = SbcConfig::default();
//! let mut encoder = SbcEncoder::new(&config).unwrap();
//! let mut decoder = SbcDecoder::new(&config).unwrap();
//!
//! let pcm = vec![0i16; encoder.frame_samples()];
//! let frame = encoder.encode(&pcm).unwrap();
//! assert_eq!(frame.len(), encoder.frame_size());
//!
//! let geometry = sbc_codec::probe(&frame).unwrap();
//! assert_eq!(geometry.bitpool(), 32);
//!
//! let decoded = decoder.decode(&frame).unwrap();
//! assert_eq!(decoded.len(), pcm.len());
//! ```

pub mod allocation;
pub mod bitstream;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod filterbank;
pub mod geometry;
pub mod parser;
pub mod probe;
pub mod quantizer;

// 重导出常用类型
pub use config::{
    AllocationMethod, ChannelMode, SamplingFrequency, SbcConfig, UNKNOWN_SAMPLE_RATE,
    sample_rate_hz,
};
pub use decoder::SbcDecoder;
pub use encoder::SbcEncoder;
pub use geometry::{FrameGeometry, bitpool_range};
pub use parser::FrameParser;
pub use probe::probe;
pub use sbc_core::{SbcError, SbcResult};
