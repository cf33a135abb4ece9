use std::{
    fmt::Write as _,
    sync::Mutex,
    thread,
    time::Duration,
};

use chrono::{format::DelayedFormat, DateTime, Local};
use concat_string::concat_string;
use crossbeam_channel::{bounded, unbounded, Sender};
use once_cell::sync::Lazy;

use crate::logging::rotate::Rotate;

pub mod rotate;

/// 日誌檔存放目錄
const LOG_DIR: &str = "log";
/// 累積到這個長度就寫出一次
const BATCH_SIZE: usize = 4096;
/// flush 等待背景執行緒的上限
const FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

/// 所有 Logger 的通道，flush 時逐一通知
static WRITERS: Lazy<Mutex<Vec<Sender<Command>>>> = Lazy::new(|| Mutex::new(Vec::new()));

enum Command {
    Write(LogMessage),
    Flush(Sender<()>),
}

pub struct Logger {
    writer: Sender<Command>,
}

impl Logger {
    /// 建立一個寫入 `log/<log_name>_<日期>.log` 的 Logger
    pub fn new(log_name: &str) -> Self {
        let (tx, rx) = unbounded::<Command>();
        let pattern = format!("{}/{}_%Y-%m-%d.log", LOG_DIR, log_name);

        // 寫入檔案的操作使用另一個線程處理
        let spawned = thread::Builder::new()
            .name(format!("logger-{}", log_name))
            .spawn(move || {
                let mut rotate = Rotate::new(pattern);
                let mut line = String::with_capacity(BATCH_SIZE);

                while let Ok(command) = rx.recv() {
                    match command {
                        Command::Write(received) => {
                            if writeln!(
                                &mut line,
                                "{} {} {}",
                                received.created_at.format("%F %X%.6f"),
                                received.level,
                                received.msg
                            )
                            .is_err()
                            {
                                continue;
                            }

                            if rx.is_empty() || line.len() >= BATCH_SIZE {
                                write_batch(&mut rotate, &mut line);
                            }
                        }
                        Command::Flush(ack) => {
                            write_batch(&mut rotate, &mut line);
                            let _ = ack.send(());
                        }
                    }
                }
            });

        if let Err(why) = spawned {
            error_console(format!("Failed to spawn logger thread because {:?}", why));
        }

        if let Ok(mut writers) = WRITERS.lock() {
            writers.push(tx.clone());
        }

        Logger { writer: tx }
    }

    pub fn debug(&self, log: String) {
        self.send(log::Level::Debug, log);
    }

    pub fn info(&self, log: String) {
        self.send(log::Level::Info, log);
    }

    pub fn warn(&self, log: String) {
        self.send(log::Level::Warn, log);
    }

    pub fn error(&self, log: String) {
        self.send(log::Level::Error, log);
    }

    fn send(&self, level: log::Level, msg: String) {
        if let Err(why) = self.writer.send(Command::Write(LogMessage::new(level, msg))) {
            error_console(why.to_string());
        }
    }
}

fn write_batch(rotate: &mut Rotate, line: &mut String) {
    if line.is_empty() {
        return;
    }

    if let Err(why) = rotate.write_msg(Local::now(), line.as_bytes()) {
        error_console(format!("Failed to write log because {:?}", why));
        info_console(line.clone());
    }

    rotate.flush();
    line.clear();
}

pub struct LogMessage {
    pub level: log::Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: log::Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn warn_file_async(log: String) {
    LOGGER.warn(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

/// 等待所有 Logger 把佇列中的訊息寫入檔案，程式結束前呼叫
pub fn flush() {
    let writers = match WRITERS.lock() {
        Ok(writers) => writers.clone(),
        Err(_) => return,
    };

    for writer in writers {
        let (ack_tx, ack_rx) = bounded::<()>(1);
        if writer.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv_timeout(FLUSH_TIMEOUT);
        }
    }
}

pub fn info_console(log: String) {
    println!(
        "{}",
        concat_string!(
            Local::now().format("%Y-%m-%d %H:%M:%S.%3f").to_string(),
            " Info ",
            log
        )
    );
}

pub fn error_console(log: String) {
    eprintln!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_logger_writes_after_flush() {
        let logger = Logger::new("logging-test");
        logger.info("first line".to_string());
        logger.error("second line".to_string());
        flush();

        let path = format!(
            "{}/logging-test_{}.log",
            LOG_DIR,
            Local::now().format("%Y-%m-%d")
        );
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("INFO first line"));
        assert!(content.contains("ERROR second line"));
    }
}
