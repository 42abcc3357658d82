use log::{error, info};
use std::io::Write;
use std::path::PathBuf;
use telegraph_host::config;
use telegraph_host::logging;
use telegraph_host::runner::HostRunner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    // 可选的第一个命令行参数：配置文件路径
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    config::init_config(config_path);
    let app_config = config::get_config()?;
    logging::apply_level(app_config.logging.level_filter());

    let runner = HostRunner::start(app_config).await?;
    info!("[主程序] 服务器监听于 {}，按 Ctrl-C 停止。", runner.local_addr());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("[主程序] 监听 Ctrl-C 信号失败: {}", e);
        }
    };

    let stdout = std::io::stdout();
    let result = runner
        .run_until(shutdown, |record| match record.to_json() {
            Ok(line) => {
                let mut out = stdout.lock();
                let _ = writeln!(out, "{}", line);
            }
            Err(e) => error!("[主程序] 事件序列化失败: {}", e),
        })
        .await;

    match &result {
        Ok(()) => info!("[主程序] 服务器已停止，程序退出。"),
        Err(e) => error!("[主程序] 服务器异常停止: {}", e),
    }
    result.map_err(anyhow::Error::from)
}
