use log::{debug, error};
use nix::unistd::Pid;

use super::job_manager::{wait_fg_job, Job};
use super::launch::{Endpoint, PipeSet, Stage};
use crate::shell::error::ShellError;
use crate::shell::parser::ast::{Command, Pipeline};
use crate::shell::state::ShellState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 前台管道最后一个阶段的状态
    Foreground(i32),
    /// 后台任务；slot 为 None 表示任务表已满，进程未被跟踪
    Background { pid: Pid, slot: Option<usize> },
}

/// 启动整个管道；前台等待全部阶段结束，后台只登记最后一个阶段
pub fn run(
    state: &mut ShellState,
    pipeline: &Pipeline,
    background: bool,
    line: &str,
) -> Result<RunOutcome, ShellError> {
    let pids = spawn_pipeline(pipeline)?;
    let last = match pids.last() {
        Some(pid) => *pid,
        None => return Ok(RunOutcome::Foreground(0)),
    };

    if background {
        let slot = match state.jobs.register(Job::new(last, line)) {
            Ok(slot) => Some(slot),
            Err(e) => {
                error!("后台任务无法记录: {}", e);
                None
            }
        };
        return Ok(RunOutcome::Background { pid: last, slot });
    }

    let status = wait_fg_job(&pids);
    debug!("前台管道结束，状态 {}", status);
    state.last_status = status;
    Ok(RunOutcome::Foreground(status))
}

fn spawn_pipeline(pipeline: &Pipeline) -> Result<Vec<Pid>, ShellError> {
    let commands = pipeline.commands();
    let pipes = PipeSet::new(pipeline.len())?;
    if pipes.is_empty() {
        debug!("启动单个命令: {:?}", commands[0].args);
    } else {
        debug!("启动管道: {} 个阶段, {} 条管道", pipeline.len(), pipes.len());
    }

    let stages = commands
        .iter()
        .enumerate()
        .map(|(i, command)| plan_stage(command, i, commands.len(), &pipes))
        .collect::<Result<Vec<_>, _>>()?;

    let pipe_fds = pipes.raw_fds();
    let mut pids = Vec::with_capacity(stages.len());
    for stage in &stages {
        match stage.spawn(&pipe_fds) {
            Ok(pid) => pids.push(pid),
            Err(e) => {
                // 先关闭管道让已启动的阶段拿到 EOF，再回收它们
                drop(pipes);
                wait_fg_job(&pids);
                return Err(e);
            }
        }
    }

    // 父进程不读写管道数据
    drop(pipes);
    Ok(pids)
}

/// 文件重定向优先于管道连接
fn plan_stage(
    command: &Command,
    index: usize,
    count: usize,
    pipes: &PipeSet,
) -> Result<Stage, ShellError> {
    let stdin = match &command.input {
        Some(path) => Endpoint::input_file(path)?,
        None if index > 0 => Endpoint::Pipe(pipes.read_end(index - 1)),
        None => Endpoint::Inherit,
    };
    let stdout = match &command.output {
        Some(path) => Endpoint::output_file(path, command.append)?,
        None if index + 1 < count => Endpoint::Pipe(pipes.write_end(index)),
        None => Endpoint::Inherit,
    };
    debug!("阶段 {}: {:?} stdin={:?} stdout={:?}", index, command.args, stdin, stdout);
    Stage::new(&command.args, stdin, stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::executor::job_manager::wait_for;
    use crate::shell::history::History;
    use crate::shell::parser::alias::AliasTable;
    use crate::shell::parser::parse_line;
    use nix::unistd::{fork, ForkResult};
    use std::path::PathBuf;
    use std::{env, fs, panic, process};

    fn state(max_jobs: usize) -> ShellState {
        ShellState::with_limits(History::default(), 255, max_jobs)
    }

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("homura-exec-{}-{}", process::id(), name))
    }

    #[allow(clippy::unwrap_used)]
    fn run_line(state: &mut ShellState, line: &str) -> RunOutcome {
        let parsed = parse_line(line, &AliasTable::default(), 255).unwrap();
        run(state, &parsed.pipeline, parsed.background, line).unwrap()
    }

    #[test]
    fn test_last_stage_status_wins() {
        let mut state = state(8);
        assert_eq!(run_line(&mut state, "false | true"), RunOutcome::Foreground(0));
        assert_eq!(state.last_status, 0);
        assert_eq!(run_line(&mut state, "true | false"), RunOutcome::Foreground(1));
        assert_eq!(state.last_status, 1);
    }

    #[test]
    fn test_exit_code_and_signal() {
        let mut state = state(8);
        assert_eq!(
            run_line(&mut state, "sh -c 'exit 7'"),
            RunOutcome::Foreground(7)
        );
        assert_eq!(
            run_line(&mut state, "sh -c 'kill -9 $$'"),
            RunOutcome::Foreground(128 + 9)
        );
    }

    #[test]
    fn test_command_not_found() {
        let mut state = state(8);
        assert_eq!(
            run_line(&mut state, "homura-no-such-program --version"),
            RunOutcome::Foreground(127)
        );
        assert_eq!(state.last_status, 127);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_three_stage_pipeline_reaches_eof() {
        // 父进程若残留写端，最后的 cat 会一直阻塞
        let out = temp_path("three-stage");
        let mut state = state(8);
        let line = format!("echo hello | cat | cat > {}", out.display());
        assert_eq!(run_line(&mut state, &line), RunOutcome::Foreground(0));
        assert_eq!(fs::read_to_string(&out).unwrap(), "hello\n");
        fs::remove_file(&out).unwrap();
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_file_redirection_beats_pipe() {
        let middle = temp_path("middle");
        let last = temp_path("last");
        let mut state = state(8);
        let line = format!(
            "echo data | cat > {} | cat > {}",
            middle.display(),
            last.display()
        );
        assert_eq!(run_line(&mut state, &line), RunOutcome::Foreground(0));
        assert_eq!(fs::read_to_string(&middle).unwrap(), "data\n");
        assert_eq!(fs::read_to_string(&last).unwrap(), "");
        fs::remove_file(&middle).unwrap();
        fs::remove_file(&last).unwrap();
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_input_redirection_and_append() {
        let input = temp_path("input");
        let output = temp_path("append");
        fs::write(&input, "b\na\n").unwrap();
        fs::write(&output, "first\n").unwrap();

        let mut state = state(8);
        let line = format!("sort < {} >> {}", input.display(), output.display());
        assert_eq!(run_line(&mut state, &line), RunOutcome::Foreground(0));
        assert_eq!(fs::read_to_string(&output).unwrap(), "first\na\nb\n");

        let line = format!("echo again > {}", output.display());
        run_line(&mut state, &line);
        assert_eq!(fs::read_to_string(&output).unwrap(), "again\n");

        fs::remove_file(&input).unwrap();
        fs::remove_file(&output).unwrap();
    }

    #[test]
    fn test_missing_input_file_fails_stage() {
        let mut state = state(8);
        assert_eq!(
            run_line(&mut state, "cat < /nonexistent/homura/input.txt"),
            RunOutcome::Foreground(1)
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection_only_creates_file() {
        let out = temp_path("touch");
        let mut state = state(8);
        let line = format!("> {}", out.display());
        assert_eq!(run_line(&mut state, &line), RunOutcome::Foreground(0));
        assert!(out.exists());
        fs::remove_file(&out).unwrap();
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_background_then_resume() {
        let mut state = state(8);
        let line = "sh -c 'exit 3' &";
        let outcome = run_line(&mut state, line);
        let pid = match outcome {
            RunOutcome::Background { pid, slot } => {
                assert_eq!(slot, Some(0));
                pid
            }
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(state.last_status, 0);
        let (slot, job) = state.jobs.list().next().unwrap();
        assert_eq!((slot, job.pid, job.command.as_str()), (0, pid, line));

        assert_eq!(state.resume_job(0).unwrap(), 3);
        assert_eq!(state.last_status, 3);
        assert!(state.jobs.is_empty());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_background_when_job_table_full() {
        let mut state = state(0);
        match run_line(&mut state, "true &") {
            RunOutcome::Background { pid, slot } => {
                assert_eq!(slot, None);
                assert_eq!(wait_for(pid).unwrap(), 0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(state.jobs.is_empty());
    }

    #[allow(clippy::unwrap_used)]
    fn fd_count() -> usize {
        fs::read_dir("/proc/self/fd").unwrap().count()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_parent_closes_every_pipe() {
        // 在只有一个线程的子进程里计数，避免并行测试打开的描述符干扰
        match unsafe { fork() }.unwrap() {
            ForkResult::Child => {
                let leaked = panic::catch_unwind(|| {
                    let mut state = state(8);
                    let before = fd_count();
                    run_line(&mut state, "true | true | true");
                    run_line(&mut state, "cat < /nonexistent/homura/in.txt | cat | true");
                    run_line(&mut state, "echo hi | cat > /nonexistent/homura/out.txt");
                    fd_count() != before
                });
                let code = match leaked {
                    Ok(false) => 0,
                    _ => 1,
                };
                unsafe { libc::_exit(code) }
            }
            ForkResult::Parent { child } => assert_eq!(wait_for(child).unwrap(), 0),
        }
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_resume_middle_job() {
        let mut state = state(8);
        let lines = ["sh -c 'exit 4' &", "sh -c 'exit 5' &", "sh -c 'exit 6' &"];
        for line in lines {
            run_line(&mut state, line);
        }
        assert_eq!(state.jobs.len(), 3);

        assert_eq!(state.resume_job(1).unwrap(), 5);
        assert_eq!(state.last_status, 5);
        let left: Vec<String> = state
            .jobs
            .list()
            .map(|(slot, job)| format!("{}:{}", slot, job.command))
            .collect();
        assert_eq!(left, vec![format!("0:{}", lines[0]), format!("1:{}", lines[2])]);

        assert_eq!(state.resume_job(0).unwrap(), 4);
        assert_eq!(state.resume_job(0).unwrap(), 6);
        assert!(state.jobs.is_empty());
    }
}
