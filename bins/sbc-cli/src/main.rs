//! sbc-cli - SBC 编解码命令行工具
//!
//! - `encode`: 原始 s16le PCM -> SBC / mSBC 码流
//! - `decode`: SBC / mSBC 码流 -> 原始 s16le PCM

mod decode;
mod encode;
mod logging;
mod pcm;

use clap::{Parser, Subcommand};
use std::process;

use sbc_codec::{ChannelMode, bitpool_range};

use decode::DecodeArgs;
use encode::EncodeArgs;

#[derive(Parser, Debug)]
#[command(name = "sbc-cli", version, about = "SBC 编解码命令行工具")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// 显示版本和编译信息
    #[arg(long)]
    build_info: bool,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 编码原始 PCM
    Encode(EncodeArgs),
    /// 解码 SBC 码流
    Decode(DecodeArgs),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init("sbc-cli", cli.verbose) {
        eprintln!("警告: 日志初始化失败: {e:#}");
    }

    if cli.build_info {
        print_build_info();
        return;
    }

    let result = match &cli.command {
        Some(Command::Encode(args)) => encode::run(args),
        Some(Command::Decode(args)) => decode::run(args),
        None => {
            print_banner();
            return;
        }
    };

    if let Err(e) = result {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

fn print_banner() {
    eprintln!(
        "sbc-cli 版本 {} -- SBC 编解码命令行工具",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!("用法:");
    eprintln!("  sbc-cli encode -i <PCM> -o <SBC> [-c 声道数] [-r 采样率] [--bitpool N]");
    eprintln!("  sbc-cli decode -i <SBC> -o <PCM>");
    eprintln!();
    eprintln!("使用 --help 查看完整用法.");
}

fn print_build_info() {
    println!("sbc-cli 版本 {}", env!("CARGO_PKG_VERSION"));
    println!("  构建目标: {}", std::env::consts::ARCH);
    println!("  操作系统: {}", std::env::consts::OS);
    println!(
        "  构建配置: {}",
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );
    println!();
    println!("支持的编码参数:");
    println!("  采样率  : 16000, 32000, 44100, 48000 Hz");
    println!("  子带数  : 4, 8");
    println!("  块数    : 4, 8, 12, 16");
    println!("  声道模式: mono, dual, stereo, joint");
    println!("  bitpool 上限 (8 子带, 16 块):");
    for mode in [
        ChannelMode::Mono,
        ChannelMode::DualChannel,
        ChannelMode::Stereo,
        ChannelMode::JointStereo,
    ] {
        let (min, max) = bitpool_range(8, 16, mode);
        println!("    {mode}: {min}..={max}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_encode_args() {
        let cli = Cli::parse_from([
            "sbc-cli", "-vv", "encode", "-i", "a.pcm", "-o", "a.sbc", "-c", "2", "--mode",
            "stereo", "--bitpool", "53", "--snr",
        ]);
        assert_eq!(cli.verbose, 2);
        let Some(Command::Encode(args)) = cli.command else {
            panic!("应解析为 encode");
        };
        assert_eq!(args.input_channels, 2);
        assert_eq!(args.mode, Some(ChannelMode::Stereo));
        assert_eq!(args.bitpool, 53);
        assert!(args.snr);
        assert_eq!(args.rate, 16000);
    }
}
