use super::LoggingConfig;
use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// 启动时清理一次, 之后在当前 tokio 运行时中按间隔清理
///
/// 间隔为 0 或不在 tokio 运行时中时只清理一次, 返回 `None`.
pub(super) fn spawn_log_maintenance(config: LoggingConfig) -> Option<JoinHandle<()>> {
    if let Err(err) = cleanup_logs(&config) {
        error!("启动时清理日志失败: {}", err);
    }
    if config.cleanup_interval_seconds == 0 {
        return None;
    }
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(runtime) => runtime,
        Err(_) => {
            warn!("不在 tokio 运行时中, 日志只在初始化时清理");
            return None;
        }
    };
    Some(runtime.spawn(async move {
        let mut cleanup_interval =
            tokio::time::interval(Duration::from_secs(config.cleanup_interval_seconds));
        // 第一次 tick 立即完成
        cleanup_interval.tick().await;
        loop {
            cleanup_interval.tick().await;
            if let Err(err) = cleanup_logs(&config) {
                error!("清理日志失败: {}", err);
            }
        }
    }))
}

/// 删除超过保留天数的日志, 并按配置压缩往日日志
pub fn cleanup_logs(config: &LoggingConfig) -> Result<()> {
    cleanup_logs_at(config, Local::now().date_naive())
}

fn cleanup_logs_at(config: &LoggingConfig, today: NaiveDate) -> Result<()> {
    let directory = Path::new(&config.directory);
    if !directory.exists() {
        return Ok(());
    }

    let cutoff = today - ChronoDuration::days(config.retention_days);

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        let file_path = entry.path();

        let (date, compressed) = match parse_rotated_log_name(&file_name, &config.file_prefix) {
            Some(value) => value,
            None => continue,
        };

        if date < cutoff {
            let _ = fs::remove_file(&file_path);
            continue;
        }

        if config.compress_history && !compressed && date < today {
            if let Err(err) = compress_to_gz(&file_path) {
                error!("压缩日志失败: {}", err);
            }
        }
    }

    Ok(())
}

fn compress_to_gz(path: &Path) -> Result<()> {
    let gz_path = PathBuf::from(format!("{}.gz", path.display()));
    if gz_path.exists() {
        return Ok(());
    }

    let mut input =
        File::open(path).with_context(|| format!("打开待压缩日志失败, path={}", path.display()))?;
    let output = File::create(&gz_path)
        .with_context(|| format!("创建压缩日志失败, path={}", gz_path.display()))?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;
    fs::remove_file(path)
        .with_context(|| format!("删除已压缩日志失败, path={}", path.display()))?;
    Ok(())
}

fn parse_rotated_log_name(file_name: &str, prefix: &str) -> Option<(NaiveDate, bool)> {
    let with_dot = file_name.strip_prefix(prefix)?.strip_prefix('.')?;

    if let Some(date_part) = with_dot.strip_suffix(".log") {
        return parse_date(date_part).map(|date| (date, false));
    }
    if let Some(date_part) = with_dot.strip_suffix(".log.gz") {
        return parse_date(date_part).map(|date| (date, true));
    }
    None
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
