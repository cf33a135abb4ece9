use std::process::ExitCode;

use crate::{
    config::SETTINGS,
    crawler::{Fetcher, HttpFetcher, SnapshotFetcher},
};

pub mod calculation;
pub mod config;
pub mod crawler;
pub mod declare;
pub mod error;
pub mod event;
pub mod logging;
pub mod storage;
pub mod util;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let fetcher: Box<dyn Fetcher> = match &SETTINGS.source.snapshot_file {
        Some(path) => {
            logging::info_file_async(format!("Replaying snapshot {}", path.display()));
            Box::new(SnapshotFetcher::new(path.clone()))
        }
        None => Box::new(HttpFetcher::new(SETTINGS.source.timeout())),
    };

    let today = util::datetime::today_in(SETTINGS.source.utc_offset_hours);
    logging::info_file_async(format!(
        "Start crawling {} for {}",
        SETTINGS.source.url, today
    ));

    let code = match event::daily_price::execute(
        fetcher.as_ref(),
        &SETTINGS.source.url,
        today,
        &SETTINGS.output.dir,
    )
    .await
    {
        Ok(summary) => {
            logging::info_console(format!(
                "done. candidates={} appended={} total={}",
                summary.candidates, summary.appended, summary.total
            ));
            ExitCode::SUCCESS
        }
        Err(why) => {
            logging::error_file_async(format!("Failed to execute because {:?}", why));
            logging::error_console(format!("{:#}", why));
            ExitCode::FAILURE
        }
    };

    logging::flush();

    code
}
