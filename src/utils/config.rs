use dotenv::dotenv;
use log::LevelFilter;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_MAX_ARGS: usize = 255;
const DEFAULT_MAX_JOBS: usize = 128;

pub struct Config {
    /// 同时也是日志过滤使用的 crate 名
    pub name: String,
    pub theme: String,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub log_to_stderr: bool,
    pub max_args: usize,
    pub max_jobs: usize,
}

impl Config {
    fn get_home_dir() -> PathBuf {
        match env::var("HOME") {
            Ok(home) if !home.is_empty() => PathBuf::from(home),
            _ => PathBuf::from("."),
        }
    }

    fn default() -> Self {
        let home = Self::get_home_dir();
        Config {
            name: String::from("homura"),
            theme: String::from("default"),
            history_file: home.join(".homura_search_history"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("warn"),
            logger_dir: home.join(".config/homura/logs"),
            log_to_stderr: false,
            max_args: DEFAULT_MAX_ARGS,
            max_jobs: DEFAULT_MAX_JOBS,
        }
    }

    pub fn new() -> io::Result<Self> {
        // 优先加载环境变量
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(theme) = env::var("HOMURA_THEME") {
            config.theme = theme;
        }

        if let Ok(editor) = env::var("HOMURA_EDITOR") {
            config.editor_mode = editor;
        }

        if let Ok(history) = env::var("HOMURA_HISTORY") {
            config.history_file = PathBuf::from(history);
        }

        if let Ok(level) = env::var("HOMURA_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("HOMURA_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        if let Ok(flag) = env::var("HOMURA_LOG_STDERR") {
            config.log_to_stderr = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        config.max_args = parse_limit("HOMURA_MAX_ARGS", config.max_args);
        config.max_jobs = parse_limit("HOMURA_MAX_JOBS", config.max_jobs);

        // 确保历史文件目录存在
        if let Some(parent) = config.history_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(config)
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }

    pub fn get_log_level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.logger_level).unwrap_or(LevelFilter::Warn)
    }
}

// 日志尚未初始化，解析失败只能直接提示
fn parse_limit(var: &str, default: usize) -> usize {
    match env::var(var) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            eprintln!("homura: invalid {}={}, using {}", var, value, default);
            default
        }),
        Err(_) => default,
    }
}
