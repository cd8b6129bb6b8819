use colored::Colorize;
use rand::seq::SliceRandom;

pub struct Theme {
    pub prompt: String,
    pub error_symbol: String,
    pub welcome_messages: Vec<String>,
    pub exit_message: String,
    pub error_style: Box<dyn Fn(String) -> String>,
    pub warning_style: Box<dyn Fn(String) -> String>,
    pub success_style: Box<dyn Fn(String) -> String>,
}

impl Theme {
    /// 随机挑一句欢迎语
    pub fn welcome(&self) -> String {
        self.welcome_messages
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt: "homura$ ".bright_cyan().to_string(),
            error_symbol: "✗".red().to_string(),
            welcome_messages: vec![
                "homura shell ready.".bright_magenta().to_string(),
                "Welcome back to homura.".bright_magenta().to_string(),
                "homura: pipes connected, jobs waiting.".bright_magenta().to_string(),
            ],
            exit_message: "bye.".bright_blue().to_string(),
            error_style: Box::new(|s| s.bright_red().to_string()),
            warning_style: Box::new(|s| s.yellow().to_string()),
            success_style: Box::new(|s| s.bright_magenta().to_string()),
        }
    }
}

pub fn load_theme(theme_name: &str) -> Theme {
    match theme_name {
        "default" => Theme::default(),
        "dark" => Theme {
            prompt: "homura➤ ".bright_purple().to_string(),
            error_symbol: "✗".red().to_string(),
            welcome_messages: vec![
                "homura (dark) ready.".magenta().to_string(),
                "The night shell is listening.".magenta().to_string(),
            ],
            exit_message: "see you in the dark.".bright_purple().to_string(),
            error_style: Box::new(|s| s.red().to_string()),
            warning_style: Box::new(|s| s.bright_yellow().to_string()),
            success_style: Box::new(|s| s.magenta().to_string()),
        },
        _ => Theme::default(),
    }
}
