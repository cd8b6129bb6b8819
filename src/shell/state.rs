use log::debug;

use crate::shell::error::ShellError;
use crate::shell::executor::job_manager::JobManager;
use crate::shell::history::History;
use crate::shell::parser::alias::AliasTable;
use crate::utils::config::Config;

/// 一次 shell 会话的全部可变状态，显式传给执行器与内建命令
#[derive(Debug)]
pub struct ShellState {
    pub jobs: JobManager,
    pub last_status: i32,
    pub aliases: AliasTable,
    pub history: History,
    pub max_args: usize,
}

impl ShellState {
    pub fn new(config: &Config, history: History) -> Self {
        Self::with_limits(history, config.max_args, config.max_jobs)
    }

    pub fn with_limits(history: History, max_args: usize, max_jobs: usize) -> Self {
        Self {
            jobs: JobManager::new(max_jobs),
            last_status: 0,
            aliases: AliasTable::default(),
            history,
            max_args,
        }
    }

    /// 恢复后台任务并把它的退出状态记为 last_status
    pub fn resume_job(&mut self, slot: usize) -> Result<i32, ShellError> {
        let status = self.jobs.resume(slot)?;
        debug!("任务 [{}] 结束，状态 {}", slot, status);
        self.last_status = status;
        Ok(status)
    }
}
