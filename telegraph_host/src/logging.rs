//! 日志初始化。
//!
//! 日志器需要在读取配置文件之前就可用 (配置模块本身会输出日志)，
//! 因此先以 Info 级别初始化，读取配置后再调整全局最大级别。
//! 设置了 `RUST_LOG` 环境变量时以环境变量为准。

use log::{info, LevelFilter};
use std::env;

const RUST_LOG: &str = "RUST_LOG";

pub fn init_logging() {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Trace).format_timestamp_millis();
    if let Ok(filters) = env::var(RUST_LOG) {
        builder.parse_filters(&filters);
    }
    if builder.try_init().is_err() {
        return;
    }
    if env::var(RUST_LOG).is_err() {
        log::set_max_level(LevelFilter::Info);
    }
    info!("[主程序] 日志系统已成功初始化 (env_logger)。");
}

/// 按配置调整日志级别。`RUST_LOG` 存在时不做改动。
pub fn apply_level(level: LevelFilter) {
    if env::var(RUST_LOG).is_ok() {
        return;
    }
    log::set_max_level(level);
    info!("[主程序] 日志级别已设置为: {}", level);
}
