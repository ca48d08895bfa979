//! sbc-probe - SBC 码流信息探测工具
//!
//! 逐帧扫描 SBC / mSBC 裸码流, 报告首帧参数、帧数、时长、码率以及失步情况.

use clap::Parser;
use log::{debug, warn};
use serde::Serialize;
use std::path::Path;
use std::process;

use sbc_codec::{FrameGeometry, FrameParser, SbcResult, probe};

/// SBC 码流信息探测工具
#[derive(Parser, Debug)]
#[command(name = "sbc-probe", version, about = "SBC 码流信息探测工具")]
struct Cli {
    /// 输入文件路径
    input: Option<String>,

    /// 输出每一帧的参数
    #[arg(long)]
    show_frames: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 静默模式 (只输出探测结果)
    #[arg(short, long)]
    quiet: bool,
}

// ============================================================
// 输出结构体
// ============================================================

/// 完整探测结果
#[derive(Serialize)]
struct ProbeOutput {
    filename: String,
    file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<StreamInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<Vec<FrameInfo>>,
}

/// 码流信息 (以首帧参数为准)
#[derive(Serialize)]
struct StreamInfo {
    codec_name: String,
    sample_rate: u32,
    channels: usize,
    channel_mode: String,
    subbands: usize,
    blocks: usize,
    allocation_method: String,
    bitpool: u8,
    frame_size: usize,
    bit_rate: u32,
    nb_frames: u64,
    duration: f64,
    skipped_bytes: usize,
    trailing_bytes: usize,
    geometry_changes: u64,
}

/// 单帧信息
#[derive(Serialize)]
struct FrameInfo {
    index: u64,
    offset: u64,
    size: usize,
    bitpool: u8,
    channel_mode: String,
}

fn codec_name(geometry: &FrameGeometry) -> &'static str {
    if geometry.is_msbc() { "msbc" } else { "sbc" }
}

// ============================================================
// 主逻辑
// ============================================================

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let Some(input_path) = cli.input.as_deref() else {
        print_banner();
        return;
    };

    if !cli.quiet {
        eprintln!(
            "sbc-probe 版本 {} -- SBC 码流探测工具",
            env!("CARGO_PKG_VERSION")
        );
        eprintln!("输入文件: {input_path}");
    }

    let data = match std::fs::read(input_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("错误: 无法打开文件 '{input_path}': {e}");
            process::exit(1);
        }
    };

    let output = match scan(input_path, &data, cli.show_frames) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("错误: 无法解析 SBC 码流: {e}");
            process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("错误: JSON 序列化失败: {e}");
                process::exit(1);
            }
        }
    } else {
        print_text(&output);
    }
}

/// 扫描整个码流
fn scan(filename: &str, data: &[u8], show_frames: bool) -> SbcResult<ProbeOutput> {
    let mut parser = FrameParser::new();
    parser.push(data);

    let mut first: Option<FrameGeometry> = None;
    let mut last: Option<FrameGeometry> = None;
    let mut geometry_changes = 0u64;
    let mut total_samples = 0u64;
    let mut total_bytes = 0u64;
    let mut frames = Vec::new();

    while let Some(frame) = parser.next_frame() {
        let geometry = probe(&frame)?;
        let offset = (parser.skipped_bytes() as u64) + total_bytes;
        if let Some(prev) = last.filter(|g| *g != geometry) {
            debug!(
                "帧 #{} (偏移 {}) 参数变化: {} 子带/{}/bitpool {} -> {} 子带/{}/bitpool {}",
                parser.frame_count() - 1,
                offset,
                prev.subbands(),
                prev.channel_mode(),
                prev.bitpool(),
                geometry.subbands(),
                geometry.channel_mode(),
                geometry.bitpool(),
            );
            geometry_changes += 1;
        }
        first.get_or_insert(geometry);
        last = Some(geometry);

        if show_frames {
            frames.push(FrameInfo {
                index: parser.frame_count() - 1,
                offset,
                size: frame.len(),
                bitpool: geometry.bitpool(),
                channel_mode: geometry.channel_mode().to_string(),
            });
        }
        total_samples += geometry.frame_samples() as u64;
        total_bytes += frame.len() as u64;
    }

    debug!(
        "扫描完成: {} 帧, {} 字节有效数据",
        parser.frame_count(),
        total_bytes
    );
    if parser.skipped_bytes() > 0 {
        warn!("失步共丢弃 {} 字节", parser.skipped_bytes());
    }
    if let Err(e) = parser.finish() {
        warn!("码流末尾残留 {} 字节: {}", parser.buffered(), e);
    }

    let stream = first.map(|g| {
        let duration = total_samples as f64 / f64::from(g.sample_rate_hz());
        StreamInfo {
            codec_name: codec_name(&g).to_string(),
            sample_rate: g.sample_rate_hz(),
            channels: g.channels(),
            channel_mode: g.channel_mode().to_string(),
            subbands: g.subbands(),
            blocks: g.blocks(),
            allocation_method: g.allocation_method().to_string(),
            bitpool: g.bitpool(),
            frame_size: g.frame_size(),
            bit_rate: g.bitrate(),
            nb_frames: parser.frame_count(),
            duration,
            skipped_bytes: parser.skipped_bytes(),
            trailing_bytes: parser.buffered(),
            geometry_changes,
        }
    });

    Ok(ProbeOutput {
        filename: Path::new(filename)
            .file_name()
            .map_or_else(|| filename.to_string(), |n| n.to_string_lossy().into_owned()),
        file_size: data.len() as u64,
        stream,
        frames: show_frames.then_some(frames),
    })
}

// ============================================================
// 文本输出
// ============================================================

fn print_text(output: &ProbeOutput) {
    println!("[FORMAT]");
    println!("  文件名       : {}", output.filename);
    println!("  文件大小     : {} 字节", output.file_size);
    println!("[/FORMAT]");
    println!();

    match &output.stream {
        Some(stream) => print_stream_text(stream),
        None => {
            println!("未找到有效的 SBC 帧");
            println!();
        }
    }

    if let Some(frames) = &output.frames {
        println!("[FRAMES]");
        for f in frames {
            println!(
                "  #{:<6} 偏移 {:<10} {} 字节  bitpool {:<3} {}",
                f.index, f.offset, f.size, f.bitpool, f.channel_mode
            );
        }
        println!("[/FRAMES]");
        println!();
    }
}

fn print_stream_text(stream: &StreamInfo) {
    println!("[STREAM]");
    println!("  编解码器     : {}", stream.codec_name);
    println!("  采样率       : {} Hz", stream.sample_rate);
    println!("  声道数       : {}", stream.channels);
    println!("  声道模式     : {}", stream.channel_mode);
    println!("  子带数       : {}", stream.subbands);
    println!("  块数         : {}", stream.blocks);
    println!("  分配方法     : {}", stream.allocation_method);
    println!("  bitpool      : {}", stream.bitpool);
    println!("  帧长         : {} 字节", stream.frame_size);
    println!("  码率         : {} kbps", stream.bit_rate / 1000);
    println!("  帧数         : {}", stream.nb_frames);
    println!("  时长         : {:.3} 秒", stream.duration);
    if stream.skipped_bytes > 0 {
        println!("  丢弃字节     : {}", stream.skipped_bytes);
    }
    if stream.trailing_bytes > 0 {
        println!("  尾部残留     : {} 字节", stream.trailing_bytes);
    }
    if stream.geometry_changes > 0 {
        println!("  参数变化     : {} 次", stream.geometry_changes);
    }
    println!("[/STREAM]");
    println!();
}

/// 打印版本横幅
fn print_banner() {
    println!(
        "sbc-probe 版本 {} -- SBC 码流探测工具",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("用法: sbc-probe [选项] <输入文件>");
    println!();
    println!("选项:");
    println!("  --show-frames     输出每一帧的参数");
    println!("  --json            以 JSON 格式输出");
    println!("  -q, --quiet       静默模式");
    println!();
    println!("使用 --help 查看完整用法.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbc_codec::{ChannelMode, SbcConfig, SbcEncoder};
    use std::io::Write;

    fn init_test_logger() {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .try_init();
    }

    fn encode_frames(config: &SbcConfig, frames: usize) -> Vec<u8> {
        let mut enc = SbcEncoder::new(config).unwrap();
        let pcm = vec![500i16; enc.geometry().pcm_samples()];
        (0..frames).flat_map(|_| enc.encode(&pcm).unwrap()).collect()
    }

    #[test]
    fn test_扫描码流统计() {
        init_test_logger();
        let config = SbcConfig::default().with_channel_mode(ChannelMode::JointStereo);
        let mut data = vec![0x00, 0x11];
        data.extend(encode_frames(&config, 10));
        data.extend_from_slice(&[0x9C, 0x31]);

        let output = scan("a.sbc", &data, true).unwrap();
        let stream = output.stream.unwrap();
        assert_eq!(stream.codec_name, "sbc");
        assert_eq!(stream.nb_frames, 10);
        assert_eq!(stream.channels, 2);
        assert_eq!(stream.skipped_bytes, 2);
        assert_eq!(stream.trailing_bytes, 2);
        assert_eq!(stream.geometry_changes, 0);
        assert!((stream.duration - 0.08).abs() < 1e-9);

        let frames = output.frames.unwrap();
        assert_eq!(frames.len(), 10);
        assert_eq!(frames[0].offset, 2);
        assert_eq!(frames[1].offset, 2 + stream.frame_size as u64);
    }

    #[test]
    fn test_geometry_change_count() {
        init_test_logger();
        let mut data = encode_frames(&SbcConfig::default(), 2);
        data.extend(encode_frames(&SbcConfig::msbc(), 3));
        let output = scan("mixed.sbc", &data, false).unwrap();
        let stream = output.stream.unwrap();
        assert_eq!(stream.nb_frames, 5);
        assert_eq!(stream.geometry_changes, 1);
        assert!(output.frames.is_none());
    }

    #[test]
    fn test_read_temp_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&encode_frames(&SbcConfig::msbc(), 4)).unwrap();
        let data = std::fs::read(file.path()).unwrap();
        let output = scan(&file.path().to_string_lossy(), &data, false).unwrap();
        let stream = output.stream.as_ref().unwrap();
        assert_eq!(stream.codec_name, "msbc");
        assert_eq!(stream.frame_size, 60);

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["stream"]["nb_frames"], 4);
        assert!(json.get("frames").is_none());
    }

    #[test]
    fn test_no_valid_frames() {
        let output = scan("empty.sbc", &[1, 2, 3, 4, 5], false).unwrap();
        assert!(output.stream.is_none());
    }
}
