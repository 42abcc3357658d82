use crate::error::AppError;
use log::{info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use telegraph_ws::ServerOptions;

/// WebSocket 服务的默认主机地址
pub const DEFAULT_WS_HOST: &str = "0.0.0.0";
/// WebSocket 服务的默认端口号
pub const DEFAULT_WS_PORT: u16 = 8088;
/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "telegraph_settings.json";

/// 内嵌服务器配置
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务绑定的主机地址
    pub host: String,
    /// 服务监听的端口号，0 表示由系统分配
    pub port: u16,
    /// WebSocket 握手超时（单位：秒）
    pub handshake_timeout_seconds: u64,
    /// 关闭会话时等待 Close 帧发出的时长（单位：秒）
    pub close_timeout_seconds: u64,
    /// 每个客户端的出站队列容量
    pub outbound_buffer: usize,
    /// 连续 accept 失败的上限，0 表示不限制
    pub accept_error_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let options = ServerOptions::default();
        Self {
            host: DEFAULT_WS_HOST.to_string(),
            port: DEFAULT_WS_PORT,
            handshake_timeout_seconds: options.handshake_timeout.as_secs(),
            close_timeout_seconds: options.close_timeout.as_secs(),
            outbound_buffer: options.outbound_buffer,
            accept_error_limit: options.accept_error_limit,
        }
    }
}

impl ServerConfig {
    pub fn to_options(&self) -> ServerOptions {
        ServerOptions {
            handshake_timeout: Duration::from_secs(self.handshake_timeout_seconds),
            close_timeout: Duration::from_secs(self.close_timeout_seconds),
            outbound_buffer: self.outbound_buffer,
            accept_error_limit: self.accept_error_limit,
        }
    }
}

/// 日志配置
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别：off / error / warn / info / debug / trace
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 无法识别的级别回退为 Info。
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or_else(|_| {
            warn!("[配置模块] 无法识别的日志级别 '{}'，使用 info。", self.level);
            LevelFilter::Info
        })
    }
}

/// 应用的主配置结构体
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// 是否把收到的文本原样回发给发送方
    pub echo_text: bool,
}

// 全局静态应用配置实例
static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 加载配置文件；文件不存在或已损坏时使用默认配置并写回文件。
pub fn load_or_create_config(config_file_path: &Path) -> AppConfig {
    match fs::read_to_string(config_file_path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("[配置模块] 已成功从配置文件 {:?} 加载应用配置。", config_file_path);
                config
            }
            Err(e) => {
                warn!(
                    "[配置模块] 从 {:?} 反序列化配置失败: {}. 文件可能已损坏，将使用默认配置并覆盖。",
                    config_file_path, e
                );
                write_default(config_file_path)
            }
        },
        Err(e) => {
            info!(
                "[配置模块] 未在 {:?} 找到配置文件或读取失败 (错误: {}). 将使用默认配置并创建新文件。",
                config_file_path, e
            );
            write_default(config_file_path)
        }
    }
}

fn write_default(config_file_path: &Path) -> AppConfig {
    let default_config = AppConfig::default();
    if let Err(e) = save_config(&default_config, config_file_path) {
        warn!("[配置模块] 保存默认配置到 {:?} 失败: {}", config_file_path, e);
    }
    default_config
}

/// 获取配置文件路径：当前目录可写时使用当前目录，否则使用用户配置目录。
pub fn get_config_file_path() -> PathBuf {
    let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config_file_path = current_dir.join(CONFIG_FILE_NAME);

    let current_dir_writable = fs::metadata(&current_dir)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false);
    if config_file_path.exists() || current_dir_writable {
        return config_file_path;
    }

    if let Ok(home) = env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("telegraph_host")
            .join(CONFIG_FILE_NAME);
    } else if let Ok(userprofile) = env::var("USERPROFILE") {
        // Windows
        return PathBuf::from(userprofile)
            .join("AppData")
            .join("Local")
            .join("telegraph_host")
            .join(CONFIG_FILE_NAME);
    }

    config_file_path
}

/// 保存配置到文件，必要时创建父目录。
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    info!("[配置模块] 已将配置保存到 {:?}.", path);
    Ok(())
}

/// 初始化全局应用配置。`path` 为空时按 `get_config_file_path` 的规则查找。
pub fn init_config(path: Option<PathBuf>) {
    let config_file_path = path.unwrap_or_else(get_config_file_path);
    let loaded_config = load_or_create_config(&config_file_path);
    if APP_CONFIG.set(loaded_config).is_err() {
        warn!("[配置模块] 全局应用配置 APP_CONFIG 已被初始化，本次 init_config 调用未覆盖已有配置。");
    }
    info!("[配置模块] 应用配置已成功初始化完毕。");
}

/// 获取已加载的全局应用配置
pub fn get_config() -> Result<&'static AppConfig, AppError> {
    APP_CONFIG
        .get()
        .ok_or_else(|| AppError::ConfigError("全局应用配置尚未初始化，请先调用 init_config()".to_string()))
}
