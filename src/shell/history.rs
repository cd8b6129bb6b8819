use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::debug;

/// 只追加的历史记录，每行一条，内存与文件同步
#[derive(Debug, Default)]
pub struct History {
    lines: Vec<String>,
    path: Option<PathBuf>,
}

impl History {
    /// 启动时整体读入，文件不存在时视为空
    pub fn load(path: &Path) -> io::Result<Self> {
        let mut history = Self {
            lines: Vec::new(),
            path: Some(path.to_path_buf()),
        };

        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("历史记录文件不存在: {}", path.display());
                return Ok(history);
            }
            Err(err) => return Err(err),
        };

        for line in BufReader::new(file).lines() {
            let line = line?;
            if !line.is_empty() {
                history.lines.push(line);
            }
        }
        debug!("读取历史记录 {} 条", history.lines.len());
        Ok(history)
    }

    pub fn append(&mut self, line: &str) -> io::Result<()> {
        if line.is_empty() {
            return Ok(());
        }
        self.lines.push(line.to_string());

        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[String] {
        &self.lines
    }

    pub fn print(&self, out: &mut dyn Write) -> io::Result<()> {
        for (i, line) in self.lines.iter().enumerate() {
            writeln!(out, "{}: {}", i + 1, line)?;
        }
        Ok(())
    }
}
