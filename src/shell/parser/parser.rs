use std::vec::IntoIter;

use super::ast::{Command, Pipeline};
use super::lexer::{RedirectOp, Token};
use crate::shell::error::SyntaxError;

pub struct Parser {
    tokens: IntoIter<Token>,
    max_args: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, max_args: usize) -> Self {
        Parser {
            tokens: tokens.into_iter(),
            max_args,
        }
    }

    pub fn parse_pipeline(mut self) -> Result<Pipeline, SyntaxError> {
        let mut commands = Vec::new();
        let mut current = Command::default();

        while let Some(token) = self.tokens.next() {
            match token {
                Token::Pipe => {
                    if current.args.is_empty() {
                        return Err(SyntaxError::EmptyCommandBeforePipe);
                    }
                    commands.push(std::mem::take(&mut current));
                }
                Token::Redirect(op) => self.parse_redirection(op, &mut current)?,
                // 行中间的 `&` 按普通参数处理
                Token::Background => self.push_arg(&mut current, "&".to_string())?,
                Token::Word(word) => self.push_arg(&mut current, word)?,
            }
        }

        if !current.is_empty() {
            commands.push(current);
        }
        if commands.is_empty() {
            return Err(SyntaxError::EmptyPipeline);
        }
        Ok(Pipeline::new(commands))
    }

    fn push_arg(&self, command: &mut Command, arg: String) -> Result<(), SyntaxError> {
        if command.args.len() >= self.max_args {
            return Err(SyntaxError::TooManyArguments(self.max_args));
        }
        command.args.push(arg);
        Ok(())
    }

    fn parse_redirection(
        &mut self,
        operator: RedirectOp,
        command: &mut Command,
    ) -> Result<(), SyntaxError> {
        let target = match self.tokens.next() {
            Some(Token::Word(target)) => target,
            _ => return Err(SyntaxError::RedirectionWithoutTarget),
        };

        // 同方向的重定向后者覆盖前者
        match operator {
            RedirectOp::Input => command.input = Some(target),
            RedirectOp::Output | RedirectOp::Append => {
                command.output = Some(target);
                command.append = operator == RedirectOp::Append;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parser::lexer::tokenize;

    const MAX_ARGS: usize = 255;

    fn parse(line: &str) -> Result<Pipeline, SyntaxError> {
        Parser::new(tokenize(line), MAX_ARGS).parse_pipeline()
    }

    fn words(items: &[&str]) -> Vec<Token> {
        items.iter().map(|s| Token::Word(s.to_string())).collect()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let pipeline = Parser::new(words(&["cat", "file.txt"]), MAX_ARGS)
            .parse_pipeline()
            .unwrap();
        assert_eq!(pipeline.len(), 1);
        let cmd = pipeline.single().unwrap();
        assert_eq!(cmd.args, vec!["cat", "file.txt"]);
        assert!(cmd.input.is_none());
        assert!(cmd.output.is_none());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_pipeline() {
        let pipeline = parse("ls -l | grep foo | wc -l").unwrap();
        let cmds = pipeline.commands();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[0].args, vec!["ls", "-l"]);
        assert_eq!(cmds[1].args, vec!["grep", "foo"]);
        assert_eq!(cmds[2].args, vec!["wc", "-l"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection() {
        let pipeline = parse("sort < in.txt > out.txt").unwrap();
        let cmd = pipeline.single().unwrap();
        assert_eq!(cmd.args, vec!["sort"]);
        assert_eq!(cmd.input.as_deref(), Some("in.txt"));
        assert_eq!(cmd.output.as_deref(), Some("out.txt"));
        assert!(!cmd.append);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_last_redirection_wins() {
        let pipeline = parse("echo hi >> a.txt > b.txt").unwrap();
        let cmd = pipeline.single().unwrap();
        assert_eq!(cmd.output.as_deref(), Some("b.txt"));
        assert!(!cmd.append);

        let pipeline = parse("echo hi > a.txt >> b.txt").unwrap();
        let cmd = pipeline.single().unwrap();
        assert_eq!(cmd.output.as_deref(), Some("b.txt"));
        assert!(cmd.append);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection_only_command() {
        let pipeline = parse("> out.txt").unwrap();
        let cmd = pipeline.single().unwrap();
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.output.as_deref(), Some("out.txt"));
    }

    #[test]
    fn test_empty_command_before_pipe() {
        let mut tokens = vec![Token::Pipe];
        tokens.extend(words(&["ls"]));
        assert_eq!(
            Parser::new(tokens, MAX_ARGS).parse_pipeline(),
            Err(SyntaxError::EmptyCommandBeforePipe)
        );
        assert_eq!(parse("ls | | wc"), Err(SyntaxError::EmptyCommandBeforePipe));
    }

    #[test]
    fn test_redirection_without_target() {
        assert_eq!(parse("echo hi >"), Err(SyntaxError::RedirectionWithoutTarget));
        assert_eq!(parse("cat < | wc"), Err(SyntaxError::RedirectionWithoutTarget));
    }

    #[test]
    fn test_empty_pipeline() {
        assert_eq!(parse(""), Err(SyntaxError::EmptyPipeline));
        // 行尾多余的 `|` 被容忍
        assert!(parse("ls |").is_ok());
    }

    #[test]
    fn test_too_many_arguments() {
        let tokens = words(&["echo", "a", "b", "c"]);
        assert_eq!(
            Parser::new(tokens, 3).parse_pipeline(),
            Err(SyntaxError::TooManyArguments(3))
        );
        let tokens = words(&["echo", "a", "b"]);
        assert!(Parser::new(tokens, 3).parse_pipeline().is_ok());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_inner_background_is_an_argument() {
        let pipeline = parse("echo & done").unwrap();
        assert_eq!(pipeline.single().unwrap().args, vec!["echo", "&", "done"]);
    }
}
