use log::{debug, error, warn};
use std::error::Error;
use std::fmt::Display;
use std::io::{self, Write};

use crate::shell::executor::builtins::{self, Builtin};
use crate::shell::executor::{self, RunOutcome};
use crate::shell::error::ShellError;
use crate::shell::history::History;
use crate::shell::parser::parse_line;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::signals;
use crate::shell::state::ShellState;
use crate::utils::config::Config;
use crate::utils::theme::Theme;

pub struct Shell {
    theme: Theme,
    readline: ReadlineManager,
    state: ShellState,
}

impl Shell {
    pub fn new(config: &Config, theme: Theme) -> Result<Self, Box<dyn Error>> {
        let history = History::load(&config.history_file).unwrap_or_else(|err| {
            warn!(
                "无法加载历史记录: {} {}",
                config.history_file.display(),
                err
            );
            History::default()
        });
        let mut readline = ReadlineManager::new(config)?;
        readline.seed_history(history.entries());

        Ok(Self {
            theme,
            readline,
            state: ShellState::new(config, history),
        })
    }

    /// 返回 shell 的退出码
    pub fn run(&mut self) -> Result<i32, Box<dyn Error>> {
        debug!("初始化 homura...");

        // Ctrl-C / Ctrl-Z 只打印换行，子进程中会恢复默认处理
        if let Err(err) = signals::ignore_block_signals() {
            warn!("无法安装信号处理: {}", err);
        }

        println!("{}", (self.theme.success_style)(self.theme.welcome()));
        debug!("homura 准备就绪...");

        let code = self.run_loop()?;
        debug!("退出 homura, 退出码 {}", code);
        Ok(code)
    }

    fn run_loop(&mut self) -> Result<i32, Box<dyn Error>> {
        loop {
            io::stdout().flush()?;

            match self.readline.readline(&self.theme.prompt) {
                Ok(line) => {
                    if let Some(code) = self.handle_input(&line) {
                        println!("{}", self.theme.exit_message);
                        return Ok(code);
                    }
                }
                Err(ReadlineError::Eof) => {
                    debug!("接收到 EOF，退出 homura...");
                    println!();
                    return Ok(0);
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("接收到中断信号...");
                    println!();
                }
                Err(err) => {
                    error!("读取输入失败: {}", err);
                    self.report(&err);
                }
            }
        }
    }

    /// 处理一行输入，返回 Some(code) 表示需要退出 shell
    fn handle_input(&mut self, line: &str) -> Option<i32> {
        if line.trim().is_empty() {
            return None;
        }

        if let Err(err) = self.state.history.append(line) {
            error!("写入历史记录失败: {}", err);
        }
        if let Err(err) = self.readline.add_history(line) {
            warn!("无法加入编辑器历史: {}", err);
        }

        let parsed = match parse_line(line, &self.state.aliases, self.state.max_args) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!("语法错误: {} <- {:?}", err, line);
                self.report(&err);
                return None;
            }
        };
        debug!("解析结果: {:?}", parsed);

        if let Some(command) = parsed.pipeline.single() {
            match builtins::dispatch(&mut self.state, command, &mut io::stdout()) {
                Ok(Builtin::Unhandled) => {}
                Ok(Builtin::Handled(_)) => return None,
                Ok(Builtin::Exit(code)) => return Some(code),
                Err(err) => {
                    self.report(&err);
                    return None;
                }
            }
        }

        match executor::run(&mut self.state, &parsed.pipeline, parsed.background, line) {
            Ok(RunOutcome::Foreground(0)) => {}
            Ok(RunOutcome::Foreground(status)) => {
                eprintln!(
                    "{} {}",
                    self.theme.error_symbol,
                    (self.theme.error_style)(format!("exit {}", status))
                );
            }
            Ok(RunOutcome::Background {
                pid,
                slot: Some(slot),
            }) => {
                debug!("后台任务数: {}", self.state.jobs.len());
                println!("[{}] {}", slot, pid);
            }
            Ok(RunOutcome::Background { pid, slot: None }) => {
                debug!("后台进程 {} 未被跟踪", pid);
                eprintln!(
                    "{}",
                    (self.theme.warning_style)(format!("{} [{}]", ShellError::JobTableFull, pid))
                );
            }
            Err(err) => {
                error!("执行失败: {}", err);
                self.report(&err);
            }
        }
        None
    }

    fn report(&self, err: &dyn Display) {
        eprintln!(
            "{} {}",
            self.theme.error_symbol,
            (self.theme.error_style)(format!("homura: {}", err))
        );
    }
}
