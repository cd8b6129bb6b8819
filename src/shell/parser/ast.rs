/// 管道中的一个阶段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub args: Vec<String>,
    pub input: Option<String>,
    pub output: Option<String>,
    /// true 表示 `>>` 追加写入，false 表示 `>` 截断
    pub append: bool,
}

impl Command {
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.input.is_none() && self.output.is_none()
    }
}

/// 至少包含一个 Command，只能由 Parser 构造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    commands: Vec<Command>,
}

impl Pipeline {
    pub(super) fn new(commands: Vec<Command>) -> Self {
        debug_assert!(!commands.is_empty());
        Self { commands }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// 单命令管道才会交给内建命令处理
    pub fn single(&self) -> Option<&Command> {
        match self.commands.as_slice() {
            [command] => Some(command),
            _ => None,
        }
    }
}

/// 一行输入解析后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub pipeline: Pipeline,
    pub background: bool,
}
