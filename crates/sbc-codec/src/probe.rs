//! 帧头探测.
//!
//! 只读取帧头、联合立体声标志位和比例因子, 校验 CRC 后返回帧几何参数,
//! 不触及样本数据. 用于在解码前判断码流参数, 以及在字节流中寻找帧边界.

use sbc_core::SbcResult;

use crate::bitstream::{Coverage, validate_header};
use crate::geometry::FrameGeometry;

/// 探测一帧的几何参数
///
/// 可能的错误:
/// - `TruncatedFrame`: 不足 4 字节, 或 CRC 覆盖区域不完整
/// - `UnrecognizedSync`: 首字节不是 0x9C / 0xAD
/// - `CorruptFrame`: CRC 不匹配
/// - `InvalidParameter`: CRC 正确但参数非法 (如 bitpool 越界)
pub fn probe(data: &[u8]) -> SbcResult<FrameGeometry> {
    validate_header(data, Coverage::CrcRegion)
}
