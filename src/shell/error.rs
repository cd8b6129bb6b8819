use std::io;
use thiserror::Error;

/// 解析管道时的语法错误，整行输入会被丢弃
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("syntax error: empty command before pipe")]
    EmptyCommandBeforePipe,
    #[error("syntax error: redirection without target")]
    RedirectionWithoutTarget,
    #[error("too many arguments (limit {0})")]
    TooManyArguments(usize),
    #[error("empty pipeline")]
    EmptyPipeline,
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// 系统调用失败（pipe、fork、waitpid、kill 等）
    #[error("{context}: {}", .source.desc())]
    Resource {
        context: &'static str,
        #[source]
        source: nix::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("cd: {path}: {source}")]
    ChangeDir {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("no such job: {0}")]
    NoSuchJob(String),
    #[error("jobs: job list full")]
    JobTableFull,
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl ShellError {
    pub fn resource(context: &'static str, source: nix::Error) -> Self {
        ShellError::Resource { context, source }
    }
}
