//! 帧切分器.
//!
//! 从任意分块到达的字节流中切出完整的 SBC 帧. 每个候选边界都用
//! [`probe`](crate::probe::probe) 校验 (同步字 + CRC), 校验失败时
//! 向后寻找下一个同步字重新对齐.

use bytes::{Buf, Bytes, BytesMut};
use log::{debug, warn};
use sbc_core::{SbcError, SbcResult};

use crate::bitstream::{MSBC_SYNCWORD, SBC_SYNCWORD};
use crate::probe::probe;

/// SBC 帧切分器
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: BytesMut,
    /// 重新同步时丢弃的字节数
    skipped: usize,
    /// 已输出的帧数
    frames: u64,
    /// 当前是否处于失步状态 (避免重复告警)
    lost_sync: bool,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加输入数据
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// 重新同步时丢弃的字节数
    pub fn skipped_bytes(&self) -> usize {
        self.skipped
    }

    /// 已输出的帧数
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// 缓冲区中尚未消费的字节数
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// 取出下一帧, 数据不足时返回 None
    pub fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            if self.buffer.is_empty() {
                return None;
            }
            match probe(&self.buffer) {
                Ok(geometry) => {
                    let size = geometry.frame_size();
                    if self.buffer.len() < size {
                        return None;
                    }
                    if self.lost_sync {
                        debug!("SBC 重新同步, 累计丢弃 {} 字节", self.skipped);
                        self.lost_sync = false;
                    }
                    self.frames += 1;
                    return Some(self.buffer.split_to(size).freeze());
                }
                Err(SbcError::TruncatedFrame { .. }) => return None,
                Err(e) => {
                    if !self.lost_sync {
                        warn!("SBC 帧 #{} 处失步: {}", self.frames, e);
                        self.lost_sync = true;
                    }
                    self.resync();
                }
            }
        }
    }

    /// 跳过当前字节, 前进到下一个可能的同步字
    fn resync(&mut self) {
        let skip = self.buffer[1..]
            .iter()
            .position(|&b| b == SBC_SYNCWORD || b == MSBC_SYNCWORD)
            .map_or(self.buffer.len(), |pos| pos + 1);
        self.buffer.advance(skip);
        self.skipped += skip;
    }

    /// 输入结束后检查残留数据
    ///
    /// 应在 `next_frame` 返回 None 之后调用. 缓冲区为空时返回 Ok,
    /// 残留不完整的帧时返回 `TruncatedFrame`.
    pub fn finish(&self) -> SbcResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let geometry = probe(&self.buffer)?;
        Err(SbcError::TruncatedFrame {
            needed: geometry.frame_size(),
            actual: self.buffer.len(),
        })
    }
}
