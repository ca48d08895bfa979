//! 日志初始化模块.
//!
//! 双输出 (统一级别):
//! - console: 彩色, 输出到 stderr
//! - file: 无色, 无 target
//!
//! 级别体系 (优先级: SBC_LOG 环境变量 > 命令行 > 默认):
//! - 默认:   info  (打开/关闭文件, 统计)
//! - `-v`:   debug (编解码器参数, 参数变化, 失步)
//! - `-vv`:  trace (仅 sbc 项目 crate, 第三方依赖保持 info)
//! - `-vvv`: trace (全局)
//!
//! 日志文件输出到 $cwd/logs/{prefix}.{date}.log

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Timelike};
use std::sync::OnceLock;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 覆盖日志级别的环境变量
const LOG_ENV: &str = "SBC_LOG";

/// 本项目所有 crate 的 target 前缀
const SBC_CRATE_TARGETS: &[&str] = &["sbc", "sbc_core", "sbc_codec", "sbc_cli", "sbc_probe"];

/// 根据 verbosity 构建 EnvFilter
fn build_filter(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        2 => {
            let mut directives = SBC_CRATE_TARGETS
                .iter()
                .map(|t| format!("{t}=trace"))
                .collect::<Vec<_>>();
            directives.push("info".to_string());
            EnvFilter::new(directives.join(","))
        }
        _ => EnvFilter::new("trace"),
    }
}

fn filter_from_env_or(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| build_filter(verbosity))
}

/// 初始化日志系统
///
/// - `file_prefix`: 日志文件前缀 (如 "sbc-cli")
/// - `verbosity`: 0=info, 1=debug, 2=trace(sbc), 3+=trace(all)
pub fn init(file_prefix: &str, verbosity: u8) -> Result<()> {
    std::fs::create_dir_all("logs").context("创建日志目录失败")?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .build("logs")
        .context("创建日志文件失败")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .event_format(LineFormat::CONSOLE)
        .with_filter(filter_from_env_or(verbosity));

    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(LineFormat::FILE)
        .with_filter(filter_from_env_or(verbosity));

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("初始化日志订阅器失败")
}

/// 日志行格式
///
/// console: `[时:分:秒.毫秒] 级别 > 消息`, 级别着色.
/// file: `[年-月-日 时:分:秒.毫秒] 级别 模块 > 消息`, 无色.
#[derive(Clone, Copy)]
struct LineFormat {
    console: bool,
}

impl LineFormat {
    const CONSOLE: Self = Self { console: true };
    const FILE: Self = Self { console: false };

    fn level_color(level: tracing::Level) -> &'static str {
        match level {
            tracing::Level::ERROR => "\x1b[31m",
            tracing::Level::WARN => "\x1b[33m",
            tracing::Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        let meta = event.metadata();
        let clock = format!(
            "{:02}:{:02}:{:02}.{:03}",
            now.hour(),
            now.minute(),
            now.second(),
            now.timestamp_subsec_millis()
        );

        if self.console {
            let color = Self::level_color(*meta.level());
            write!(writer, "[{clock}] {color}{:5}\x1b[0m > ", meta.level())?;
        } else {
            write!(
                writer,
                "[{}-{:02}-{:02} {clock}] {:5} {} > ",
                now.year(),
                now.month(),
                now.day(),
                meta.level(),
                meta.module_path().unwrap_or_else(|| meta.target()),
            )?;
        }
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
