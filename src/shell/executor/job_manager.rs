use std::fmt;

use log::{debug, error, warn};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::shell::error::ShellError;

/// 后台任务：管道最后一个阶段的 pid 与原始命令行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub pid: Pid,
    pub command: String,
}

impl Job {
    pub fn new(pid: Pid, command: impl Into<String>) -> Self {
        Self {
            pid,
            command: command.into(),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pid, self.command)
    }
}

/// 容量有限的任务表，下标即任务编号（从 0 开始）
#[derive(Debug)]
pub struct JobManager {
    jobs: Vec<Job>,
    capacity: usize,
}

impl JobManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            jobs: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// 任务表已满时返回错误，不会覆盖已有任务
    pub fn register(&mut self, job: Job) -> Result<usize, ShellError> {
        if self.jobs.len() >= self.capacity {
            warn!("任务表已满 ({}), 无法记录 pid {}", self.capacity, job.pid);
            return Err(ShellError::JobTableFull);
        }
        debug!("记录后台任务 [{}] {}", self.jobs.len(), job);
        self.jobs.push(job);
        Ok(self.jobs.len() - 1)
    }

    /// 只读快照，可以多次 clone 重新遍历
    pub fn list(&self) -> impl Iterator<Item = (usize, &Job)> + Clone + '_ {
        self.jobs.iter().enumerate()
    }

    fn take(&mut self, slot: usize) -> Result<Job, ShellError> {
        if slot >= self.jobs.len() {
            return Err(ShellError::NoSuchJob(slot.to_string()));
        }
        Ok(self.jobs.remove(slot))
    }

    /// 先从任务表移除，再发送 SIGCONT 并同步等待其结束
    pub fn resume(&mut self, slot: usize) -> Result<i32, ShellError> {
        let job = self.take(slot)?;
        debug!("恢复后台任务到前台: {}", job);
        kill(job.pid, Signal::SIGCONT).map_err(|e| ShellError::resource("kill", e))?;
        wait_for(job.pid)
    }

    /// 向任务发送信号并移出任务表，只做非阻塞回收
    pub fn kill(&mut self, slot: usize, signal: Signal) -> Result<Job, ShellError> {
        let job = self.take(slot)?;
        debug!("向任务 {} 发送 {}", job, signal);
        kill(job.pid, signal).map_err(|e| ShellError::resource("kill", e))?;
        match waitpid(job.pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => debug!("任务 {} 尚未退出", job.pid),
            Ok(status) => debug!("任务 {} 已回收: {:?}", job.pid, status),
            Err(e) => warn!("回收任务 {} 失败: {}", job.pid, e),
        }
        Ok(job)
    }
}

/// 阻塞等待单个子进程结束，返回退出码，被信号终止时为 128 + 信号值
pub fn wait_for(pid: Pid) -> Result<i32, ShellError> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, sig, _core_dumped)) => return Ok(128 + sig as i32),
            Ok(status) => debug!("忽略等待状态: {:?}", status),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ShellError::resource("waitpid", e)),
        }
    }
}

/// 按顺序等待管道中所有阶段，结果只取最后一个阶段
pub fn wait_fg_job(pids: &[Pid]) -> i32 {
    let mut last_status = 0;
    for (i, pid) in pids.iter().enumerate() {
        let status = match wait_for(*pid) {
            Ok(status) => status,
            Err(e) => {
                error!("等待子进程 {} 失败: {}", pid, e);
                1
            }
        };
        if i == pids.len() - 1 {
            last_status = status;
        }
    }
    last_status
}
