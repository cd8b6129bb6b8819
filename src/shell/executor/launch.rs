use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::ptr;

use libc::c_char;
use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2, fork, pipe, ForkResult, Pid};

use crate::shell::error::ShellError;
use crate::shell::signals;

/// 子进程打不开重定向文件时的退出码
const REDIRECT_FAILURE: i32 = 1;
const COMMAND_NOT_FOUND: i32 = 127;

/// 一次 run 调用持有的全部管道，drop 时在父进程中关闭
pub struct PipeSet {
    pipes: Vec<(OwnedFd, OwnedFd)>,
}

impl PipeSet {
    /// N 个阶段对应 N-1 条管道
    pub fn new(stages: usize) -> Result<Self, ShellError> {
        let mut pipes = Vec::with_capacity(stages.saturating_sub(1));
        for _ in 1..stages {
            pipes.push(pipe().map_err(|e| ShellError::resource("pipe", e))?);
        }
        Ok(Self { pipes })
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    pub fn read_end(&self, index: usize) -> RawFd {
        self.pipes[index].0.as_raw_fd()
    }

    pub fn write_end(&self, index: usize) -> RawFd {
        self.pipes[index].1.as_raw_fd()
    }

    pub fn raw_fds(&self) -> Vec<RawFd> {
        self.pipes
            .iter()
            .flat_map(|(read, write)| [read.as_raw_fd(), write.as_raw_fd()])
            .collect()
    }
}

/// 子进程标准输入/输出的来源
#[derive(Debug)]
pub enum Endpoint {
    Inherit,
    Pipe(RawFd),
    File {
        path: CString,
        flags: OFlag,
        /// 预先拼好的 "path: "，子进程里不再分配内存
        error_prefix: Vec<u8>,
    },
}

impl Endpoint {
    pub fn input_file(path: &str) -> Result<Self, ShellError> {
        Self::file(path, OFlag::O_RDONLY)
    }

    pub fn output_file(path: &str, append: bool) -> Result<Self, ShellError> {
        let mode = if append {
            OFlag::O_APPEND
        } else {
            OFlag::O_TRUNC
        };
        Self::file(path, OFlag::O_WRONLY | OFlag::O_CREAT | mode)
    }

    fn file(path: &str, flags: OFlag) -> Result<Self, ShellError> {
        Ok(Endpoint::File {
            path: CString::new(path).map_err(io::Error::from)?,
            flags,
            error_prefix: format!("{}: ", path).into_bytes(),
        })
    }

    fn pipe_fd(&self) -> Option<RawFd> {
        match self {
            Endpoint::Pipe(fd) => Some(*fd),
            _ => None,
        }
    }

    /// 只在 fork 出的子进程中调用
    fn attach(&self, target: RawFd) -> Result<(), ()> {
        match self {
            Endpoint::Inherit => Ok(()),
            Endpoint::Pipe(fd) => dup2(*fd, target)
                .map(drop)
                .map_err(|e| report_errno(b"dup2: ", e)),
            Endpoint::File {
                path,
                flags,
                error_prefix,
            } => {
                let mode = Mode::from_bits_truncate(0o644);
                let fd = open(path.as_c_str(), *flags, mode)
                    .map_err(|e| report_errno(error_prefix, e))?;
                let result = dup2(fd, target)
                    .map(drop)
                    .map_err(|e| report_errno(b"dup2: ", e));
                let _ = close(fd);
                result
            }
        }
    }
}

/// 管道中一个待启动的阶段，fork 之前准备好子进程需要的全部数据
#[derive(Debug)]
pub struct Stage {
    argv: Vec<CString>,
    stdin: Endpoint,
    stdout: Endpoint,
    not_found: Vec<u8>,
}

impl Stage {
    pub fn new(args: &[String], stdin: Endpoint, stdout: Endpoint) -> Result<Self, ShellError> {
        let argv = args
            .iter()
            .map(|arg| CString::new(arg.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(io::Error::from)?;
        let not_found = match args.first() {
            Some(program) => format!("homura: command not found: {}\n", program).into_bytes(),
            None => Vec::new(),
        };
        Ok(Self {
            argv,
            stdin,
            stdout,
            not_found,
        })
    }

    /// fork 出子进程，父进程拿到 pid 后立即返回
    pub fn spawn(&self, pipe_fds: &[RawFd]) -> Result<Pid, ShellError> {
        let mut argv: Vec<*const c_char> = self.argv.iter().map(|arg| arg.as_ptr()).collect();
        argv.push(ptr::null());

        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => Ok(child),
            Ok(ForkResult::Child) => self.exec_child(&argv, pipe_fds),
            Err(e) => Err(ShellError::resource("fork", e)),
        }
    }

    fn exec_child(&self, argv: &[*const c_char], pipe_fds: &[RawFd]) -> ! {
        signals::reset_for_child();

        // 关闭与本阶段无关的管道端
        let wired = [self.stdin.pipe_fd(), self.stdout.pipe_fd()];
        for &fd in pipe_fds {
            if !wired.contains(&Some(fd)) {
                let _ = close(fd);
            }
        }

        if self.stdin.attach(libc::STDIN_FILENO).is_err()
            || self.stdout.attach(libc::STDOUT_FILENO).is_err()
        {
            exit_child(REDIRECT_FAILURE);
        }
        for fd in wired.into_iter().flatten() {
            if fd > libc::STDERR_FILENO {
                let _ = close(fd);
            }
        }

        // 只有重定向没有命令，例如 `> out.txt`
        if self.argv.is_empty() {
            exit_child(0);
        }

        unsafe { libc::execvp(argv[0], argv.as_ptr()) };
        write_stderr(&[self.not_found.as_slice()]);
        exit_child(COMMAND_NOT_FOUND);
    }
}

/// 不执行 atexit 回调，也不刷新父进程继承来的缓冲区
fn exit_child(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}

fn write_stderr(parts: &[&[u8]]) {
    for part in parts {
        let _ = unsafe { libc::write(libc::STDERR_FILENO, part.as_ptr().cast(), part.len()) };
    }
}

fn report_errno(prefix: &[u8], errno: Errno) {
    write_stderr(&[prefix, errno.desc().as_bytes(), &b"\n"[..]]);
}
