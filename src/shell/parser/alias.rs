use super::lexer::{tokenize, Token};

// 与原版一致，install 重复出现，查找时第一个生效
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("install", "fvp install"),
    ("remove", "fvp remove"),
    ("update", "fvp update"),
    ("upgrade", "fvp upgrade"),
    ("search", "fvp search"),
    ("install", "fvp install"),
];

/// 启动后只读的别名表
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

impl AliasTable {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// 只展开首个单词一次，替换结果不会再次展开
    pub fn expand(&self, tokens: Vec<Token>) -> Vec<Token> {
        let value = match tokens.first() {
            Some(Token::Word(first)) => match self.lookup(first) {
                Some(value) => value,
                None => return tokens,
            },
            _ => return tokens,
        };

        let mut expanded = tokenize(value);
        expanded.extend(tokens.into_iter().skip(1));
        expanded
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALIASES
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(items: &[&str]) -> Vec<Token> {
        items.iter().map(|s| Token::Word(s.to_string())).collect()
    }

    #[test]
    fn test_expand_leading_word() {
        let aliases = AliasTable::default();
        let tokens = aliases.expand(words(&["install", "vim", "git"]));
        assert_eq!(tokens, words(&["fvp", "install", "vim", "git"]));
    }

    #[test]
    fn test_only_first_word_is_expanded() {
        let aliases = AliasTable::default();
        let tokens = aliases.expand(words(&["echo", "install"]));
        assert_eq!(tokens, words(&["echo", "install"]));
    }

    #[test]
    fn test_first_match_wins() {
        let aliases = AliasTable::new(vec![
            ("ll".to_string(), "ls -l".to_string()),
            ("ll".to_string(), "ls -la".to_string()),
        ]);
        assert_eq!(aliases.lookup("ll"), Some("ls -l"));
    }

    #[test]
    fn test_no_recursive_expansion() {
        let aliases = AliasTable::new(vec![
            ("a".to_string(), "b x".to_string()),
            ("b".to_string(), "c y".to_string()),
        ]);
        assert_eq!(aliases.expand(words(&["a"])), words(&["b", "x"]));
    }

    #[test]
    fn test_operators_are_kept() {
        let aliases = AliasTable::default();
        let mut input = words(&["search", "vim"]);
        input.push(Token::Pipe);
        input.extend(words(&["head"]));
        let tokens = aliases.expand(input);
        assert_eq!(tokens[..3], words(&["fvp", "search", "vim"])[..]);
        assert_eq!(tokens[3], Token::Pipe);
    }
}
