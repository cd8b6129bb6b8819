use libc::c_int;
use log::debug;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

/// 交互中断与交互停止，shell 自身只打印换行
const PROMPT_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGTSTP];

extern "C" fn print_newline(_sig: c_int) {
    // 信号处理函数里只能使用 async-signal-safe 的调用
    let newline = b"\n";
    unsafe {
        libc::write(libc::STDOUT_FILENO, newline.as_ptr().cast(), newline.len());
    }
}

/// 安装 shell 的信号处理：Ctrl-C / Ctrl-Z 不会结束 shell，等待前台任务时也不会打断 waitpid
pub fn ignore_block_signals() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(print_newline),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in PROMPT_SIGNALS {
        unsafe { signal::sigaction(sig, &action) }?;
    }
    debug!("已安装 SIGINT/SIGTSTP 处理函数");
    Ok(())
}

/// 子进程中 exec 之前调用，恢复默认处理，不做任何内存分配
pub fn reset_for_child() {
    for sig in PROMPT_SIGNALS {
        let _ = unsafe { signal::signal(sig, SigHandler::SigDfl) };
    }
}
