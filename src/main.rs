use log::debug;

use crate::shell::Shell;
use crate::utils::config::Config;
use crate::utils::log::init_logger;
use crate::utils::theme;

mod shell;
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new()?;
    if let Err(err) = init_logger(&config) {
        eprintln!("homura: 日志不可用: {}", err);
    }
    debug!("配置加载成功 {}", config.history_file.display());
    let theme = theme::load_theme(&config.theme);

    let mut shell = Shell::new(&config, theme)?;
    let code = shell.run()?;
    std::process::exit(code)
}
