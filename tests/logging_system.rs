use aacenc::codec::{AacEncoder, InitFlags, MemoryTransport, default_config};
use aacenc::core::TransportType;
use aacenc::logging::{LoggingConfig, cleanup_logs, init};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// 注意: 由于 tracing 的全局订阅器只能初始化一次,
// 涉及 init() 的测试必须单独运行或使用 #[ignore] 标记

fn test_config(dir: &Path, prefix: &str, level: &str) -> LoggingConfig {
    LoggingConfig {
        level: level.to_string(),
        directory: dir.to_string_lossy().to_string(),
        file_prefix: prefix.to_string(),
        console: false,
        retention_days: 7,
        compress_history: false,
        cleanup_interval_seconds: 0,
    }
}

/// 获取当前日期的日志文件路径
fn get_today_log_path(dir: &Path, prefix: &str) -> PathBuf {
    let today = chrono::Local::now().date_naive();
    dir.join(format!("{}.{}.log", prefix, today.format("%Y-%m-%d")))
}

#[test]
#[ignore] // 需要单独运行: cargo test --test logging_system test_logging_encoder_output -- --ignored
fn test_logging_encoder_output() {
    let temp_dir = TempDir::new().expect("创建临时目录失败");
    let log_dir = temp_dir.path().join("nested").join("logs");
    let config = test_config(&log_dir, "aacenc-test", "debug");

    init(config.clone()).expect("日志初始化失败");
    assert!(log_dir.exists(), "嵌套日志目录应该被创建");
    // 重复初始化报错
    assert!(init(config).is_err());

    // 编码器通过 log 门面输出
    let mut transport = MemoryTransport::new(TransportType::Adts);
    let mut encoder = AacEncoder::open(1, 2, 1).expect("打开编码实例失败");
    encoder
        .initialize(&default_config(), &mut transport, InitFlags::all())
        .expect("初始化失败");
    tracing::info!("编码测试消息_12345");
    tracing::trace!("跟踪日志_TRACE_MSG");

    std::thread::sleep(std::time::Duration::from_millis(200));

    let log_file = get_today_log_path(&log_dir, "aacenc-test");
    let content = fs::read_to_string(&log_file)
        .unwrap_or_else(|e| panic!("读取日志文件失败: {:?}, 错误: {}", log_file, e));
    assert!(content.contains("编码测试消息_12345"));
    assert!(content.contains("INFO"));
    assert!(content.contains("DEBUG"), "应该包含编码器的调试日志:\n{}", content);
    assert!(!content.contains("跟踪日志_TRACE_MSG"), "trace 日志应该被过滤掉");
}

#[test]
fn test_logging_config_from_json() {
    let config: LoggingConfig =
        serde_json::from_str(r#"{"directory": "/var/log/aacenc", "console": false}"#)
            .expect("解析日志配置失败");
    assert_eq!(config.level, "info");
    assert_eq!(config.directory, "/var/log/aacenc");
    assert_eq!(config.file_prefix, "aacenc");
    assert!(!config.console);
    assert_eq!(config.retention_days, 30, "默认保留天数应该是 30");
    assert!(config.compress_history, "默认应该开启压缩");
    assert_eq!(config.cleanup_interval_seconds, 3600, "默认清理间隔应该是 3600 秒");
}

#[test]
fn test_logging_cleanup_retention() {
    let temp_dir = TempDir::new().expect("创建临时目录失败");
    let config = test_config(temp_dir.path(), "aacenc", "info");
    let today = chrono::Local::now().date_naive();

    let expired = temp_dir.path().join(format!(
        "aacenc.{}.log",
        (today - chrono::Duration::days(10)).format("%Y-%m-%d")
    ));
    let current = get_today_log_path(temp_dir.path(), "aacenc");
    fs::write(&expired, "旧日志").unwrap();
    fs::write(&current, "当前日志").unwrap();

    cleanup_logs(&config).expect("清理日志失败");
    assert!(!expired.exists(), "过期日志应该被删除");
    assert!(current.exists(), "当前日志应该保留");

    // 目录不存在时直接返回
    let missing = test_config(&temp_dir.path().join("missing"), "aacenc", "info");
    assert!(cleanup_logs(&missing).is_ok());
}
