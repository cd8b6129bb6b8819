pub mod alias;
pub mod ast;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

use crate::shell::error::SyntaxError;
use alias::AliasTable;
use ast::ParsedLine;
use lexer::{tokenize, Token};
use parser::Parser;

/// 去掉行尾的 `&`，返回是否后台运行
pub fn split_background(tokens: &mut Vec<Token>) -> bool {
    if tokens.last() == Some(&Token::Background) {
        tokens.pop();
        true
    } else {
        false
    }
}

/// 分词 → 后台标记 → 别名展开 → 构建管道
pub fn parse_line(
    line: &str,
    aliases: &AliasTable,
    max_args: usize,
) -> Result<ParsedLine, SyntaxError> {
    let mut tokens = tokenize(line);
    let background = split_background(&mut tokens);
    let tokens = aliases.expand(tokens);
    let pipeline = Parser::new(tokens, max_args).parse_pipeline()?;
    Ok(ParsedLine {
        pipeline,
        background,
    })
}
