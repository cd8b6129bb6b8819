use crate::utils::config::Config;
use log::{debug, warn};
pub use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use rustyline::{CompletionType, Config as RLConfig};

/// 只负责行编辑与上下键回溯，持久化由 History 完成
pub struct ReadlineManager {
    editor: Editor<(), FileHistory>,
}

impl ReadlineManager {
    pub fn new(config: &Config) -> Result<Self, ReadlineError> {
        let rl_config = RLConfig::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(config.get_edit_mode())
            .build();

        let editor = Editor::with_config(rl_config)?;
        Ok(Self { editor })
    }

    /// 把启动时读入的历史记录放进编辑器
    pub fn seed_history(&mut self, lines: &[String]) {
        for line in lines {
            if let Err(err) = self.editor.add_history_entry(line.as_str()) {
                warn!("无法加入历史记录: {}", err);
                return;
            }
        }
        debug!("编辑器历史记录 {} 条", lines.len());
    }

    pub fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.editor.readline(prompt)
    }

    pub fn add_history(&mut self, line: &str) -> Result<bool, ReadlineError> {
        self.editor.add_history_entry(line)
    }
}
