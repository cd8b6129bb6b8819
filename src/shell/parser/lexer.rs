use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Word(String),
    Pipe,
    Redirect(RedirectOp),
    /// 未加引号的单独 `&`，只有位于行尾时才表示后台运行
    Background,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum RedirectOp {
    Input,  // <
    Output, // >
    Append, // >>
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace();

            let token = match self.peek_char()? {
                '|' => {
                    self.read_char();
                    Some(Token::Pipe)
                }
                '<' => {
                    self.read_char();
                    Some(Token::Redirect(RedirectOp::Input))
                }
                '>' => {
                    self.read_char();
                    if self.peek_char() == Some('>') {
                        self.read_char();
                        Some(Token::Redirect(RedirectOp::Append))
                    } else {
                        Some(Token::Redirect(RedirectOp::Output))
                    }
                }
                _ => self.read_word(),
            };

            // 空单词（例如 `''`）直接丢弃，继续读下一个
            if token.is_some() {
                return token;
            }
        }
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }

    fn read_word(&mut self) -> Option<Token> {
        let mut word = String::new();
        // 出现过引号或转义的单词永远不会被当作 `&`
        let mut literal = false;

        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || is_operator(c) {
                break;
            }
            self.read_char();
            match c {
                '\'' => {
                    literal = true;
                    self.read_single_quoted(&mut word);
                }
                '"' => {
                    literal = true;
                    self.read_double_quoted(&mut word);
                }
                '\\' => match self.read_char() {
                    Some(escaped) => {
                        literal = true;
                        word.push(escaped);
                    }
                    None => word.push('\\'),
                },
                c => word.push(c),
            }
        }

        if word.is_empty() {
            None
        } else if !literal && word == "&" {
            Some(Token::Background)
        } else {
            Some(Token::Word(word))
        }
    }

    // 未闭合的引号以行尾作为结束
    fn read_single_quoted(&mut self, word: &mut String) {
        while let Some(c) = self.read_char() {
            if c == '\'' {
                break;
            }
            word.push(c);
        }
    }

    fn read_double_quoted(&mut self, word: &mut String) {
        while let Some(c) = self.read_char() {
            match c {
                '"' => break,
                '\\' => match self.read_char() {
                    Some(escaped) => word.push(escaped),
                    None => word.push('\\'),
                },
                c => word.push(c),
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

fn is_operator(c: char) -> bool {
    matches!(c, '|' | '<' | '>')
}

pub fn tokenize(line: &str) -> Vec<Token> {
    Lexer::new(line).collect()
}
