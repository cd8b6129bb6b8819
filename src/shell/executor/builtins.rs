use std::collections::HashMap;
use std::env;
use std::io::Write;
use std::str::FromStr;

use log::debug;
use nix::sys::signal::Signal;
use once_cell::sync::Lazy;

use crate::shell::error::ShellError;
use crate::shell::parser::ast::Command;
use crate::shell::state::ShellState;

/// 内建命令处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// 不是内建命令（或参数不匹配），交给执行器启动子进程
    Unhandled,
    Handled(i32),
    /// 请求退出 shell
    Exit(i32),
}

type Handler = fn(&mut ShellState, &[String], &mut dyn Write) -> Result<Builtin, ShellError>;

const SAVE_HISTORY_DATA: &[(&str, &str)] = &[
    ("folders", "directories"),
    ("networks", "ipv4"),
    ("browser-history", "user-history"),
    ("user-data", "data-packets"),
    ("user-browsing", "user-system-data"),
    ("user-system-info", "user-credentials"),
    ("user-system-passwords", "user-important-data"),
];

static BUILTINS: Lazy<HashMap<&'static str, Handler>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, Handler> = HashMap::new();
    table.insert("cd", builtin_cd);
    table.insert("path", builtin_cd);
    table.insert("pwd", builtin_pwd);
    table.insert("check", builtin_check);
    table.insert("clear", builtin_clear);
    table.insert("history", builtin_history);
    table.insert("save", builtin_save);
    table.insert("save-history-data", builtin_save_history_data);
    table.insert("builtins", builtin_builtins);
    table.insert("jobs", builtin_jobs);
    table.insert("fg", builtin_fg);
    table.insert("kill", builtin_kill);
    table.insert("export", builtin_export);
    table.insert("transfer", builtin_export);
    table.insert("unset", builtin_unset);
    table.insert("deselect", builtin_unset);
    table.insert("status", builtin_status);
    table.insert("exit", builtin_exit);
    table
});

/// 只用于单命令管道，内建命令不处理重定向
pub fn dispatch(
    state: &mut ShellState,
    command: &Command,
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    let handler = match command.program().and_then(|name| BUILTINS.get(name)) {
        Some(handler) => handler,
        None => return Ok(Builtin::Unhandled),
    };
    let result = handler(state, &command.args, out)?;
    if result != Builtin::Unhandled {
        debug!("执行内建命令: {:?}", command.args);
    }
    Ok(result)
}

fn builtin_cd(
    _state: &mut ShellState,
    args: &[String],
    _out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    let target = match args.get(1) {
        Some(path) => path.clone(),
        None => env::var("HOME").unwrap_or_else(|_| "/".to_string()),
    };
    let path = shellexpand::tilde(&target);
    env::set_current_dir(&*path).map_err(|source| ShellError::ChangeDir {
        path: target.clone(),
        source,
    })?;
    Ok(Builtin::Handled(0))
}

fn builtin_pwd(
    _state: &mut ShellState,
    _args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    let cwd = env::current_dir()?;
    writeln!(out, "{}", cwd.display())?;
    Ok(Builtin::Handled(0))
}

fn builtin_check(
    state: &mut ShellState,
    args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    match args.get(1).map(String::as_str) {
        Some("dir") => builtin_pwd(state, args, out),
        _ => Ok(Builtin::Unhandled),
    }
}

fn builtin_clear(
    state: &mut ShellState,
    args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    match args.get(1).map(String::as_str) {
        Some("commands") => builtin_pwd(state, args, out),
        _ => Ok(Builtin::Unhandled),
    }
}

fn builtin_history(
    state: &mut ShellState,
    _args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    state.history.print(out)?;
    Ok(Builtin::Handled(0))
}

fn builtin_save(
    _state: &mut ShellState,
    args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    if args.get(1).map(String::as_str) != Some("history") {
        return Ok(Builtin::Unhandled);
    }
    for (i, (key, _)) in SAVE_HISTORY_DATA.iter().enumerate() {
        writeln!(out, "{}: {}", i + 1, key)?;
    }
    Ok(Builtin::Handled(0))
}

fn builtin_save_history_data(
    _state: &mut ShellState,
    _args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    writeln!(out, "This is for saving history data")?;
    Ok(Builtin::Handled(0))
}

fn builtin_builtins(
    _state: &mut ShellState,
    _args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    writeln!(
        out,
        "Added builtins in the new Shell Terminal Version Upgrade"
    )?;
    let mut names: Vec<&str> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    writeln!(out, "{}", names.join(" "))?;
    Ok(Builtin::Handled(0))
}

fn builtin_jobs(
    state: &mut ShellState,
    _args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    if state.jobs.is_empty() {
        debug!("没有后台任务");
        return Ok(Builtin::Handled(0));
    }
    for (slot, job) in state.jobs.list() {
        writeln!(out, "{}: {}", slot, job)?;
    }
    Ok(Builtin::Handled(0))
}

fn parse_slot(arg: &str) -> Result<usize, ShellError> {
    arg.trim_start_matches('%')
        .parse()
        .map_err(|_| ShellError::NoSuchJob(arg.to_string()))
}

fn builtin_fg(
    state: &mut ShellState,
    args: &[String],
    _out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    let slot = match args.get(1) {
        Some(arg) => parse_slot(arg)?,
        None => return Err(ShellError::Usage("fg INDEX")),
    };
    let status = state.resume_job(slot)?;
    Ok(Builtin::Handled(status))
}

/// `kill %N [SIGNAL]` 结束后台任务，其他形式交给系统的 kill
fn builtin_kill(
    state: &mut ShellState,
    args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    let slot = match args.get(1) {
        Some(arg) if arg.starts_with('%') => parse_slot(arg)?,
        _ => return Ok(Builtin::Unhandled),
    };
    let signal = match args.get(2) {
        Some(name) => parse_signal(name)?,
        None => Signal::SIGTERM,
    };
    let job = state.jobs.kill(slot, signal)?;
    writeln!(out, "[{}] {} {}", slot, signal, job)?;
    Ok(Builtin::Handled(0))
}

fn parse_signal(name: &str) -> Result<Signal, ShellError> {
    let name = name.trim_start_matches('-').to_uppercase();
    if let Ok(number) = name.parse::<i32>() {
        return Signal::try_from(number).map_err(|_| ShellError::Usage("kill %INDEX [SIGNAL]"));
    }
    let full = if name.starts_with("SIG") {
        name
    } else {
        format!("SIG{}", name)
    };
    Signal::from_str(&full).map_err(|_| ShellError::Usage("kill %INDEX [SIGNAL]"))
}

fn builtin_export(
    _state: &mut ShellState,
    args: &[String],
    _out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    for pair in args.iter().skip(1) {
        if let Some((name, value)) = pair.split_once('=') {
            if name.is_empty() {
                continue;
            }
            debug!("设置环境变量: {}={}", name, value);
            env::set_var(name, value);
        }
    }
    Ok(Builtin::Handled(0))
}

fn builtin_unset(
    _state: &mut ShellState,
    args: &[String],
    _out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    for name in args.iter().skip(1) {
        if !name.is_empty() && !name.contains('=') {
            env::remove_var(name);
        }
    }
    Ok(Builtin::Handled(0))
}

fn builtin_status(
    state: &mut ShellState,
    _args: &[String],
    out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    writeln!(out, "{}", state.last_status)?;
    Ok(Builtin::Handled(0))
}

fn builtin_exit(
    _state: &mut ShellState,
    args: &[String],
    _out: &mut dyn Write,
) -> Result<Builtin, ShellError> {
    match args.get(1).map(String::as_str) {
        None | Some("shell") => Ok(Builtin::Exit(0)),
        Some(code) => code
            .parse()
            .map(Builtin::Exit)
            .map_err(|_| ShellError::Usage("exit [N]")),
    }
}
