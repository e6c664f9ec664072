use chrono::Utc;
use log::{info, LevelFilter};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::error::{ClientError, Result};

pub fn init_file_logger(log_dir: &str) -> Result<()> {
    let current_date = Utc::now().date_naive().to_string();
    let path = format!("{}/{}.log", log_dir.trim_end_matches('/'), current_date);

    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S)(utc)} {l} - {m}\n",
        )))
        .build(&path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(LevelFilter::Info))
        .map_err(|error| ClientError::Logger(error.to_string()))?;

    log4rs::init_config(config).map_err(|error| ClientError::Logger(error.to_string()))?;
    info!("File logger initialized at {}", path);

    Ok(())
}
