use chrono::prelude::*;

use simplelog::*;

use std::fs::{File, create_dir_all};
use std::path::PathBuf;

/// Initializes terminal plus file logging for an integration test and
/// returns the path of the log file.
pub fn init_test_logging(test_name: &str) -> PathBuf {
    let mut path = PathBuf::from("test_output");
    create_dir_all(&path).expect("Test output directory could not be created");

    path.push(format!("{}-{}", filename_timestamp(), test_name));
    path.set_extension("log");

    let log_file = File::create(&path).expect("Log file could not be created");

    CombinedLogger::init(
        vec![
            TermLogger::new(LogLevelFilter::Info, Config::default()).unwrap(),
            WriteLogger::new(LogLevelFilter::Trace, Config::default(), log_file),
        ]
    ).unwrap();

    info!("Initialized logging to {:?}", path);

    path
}

/// Returns the current time formatted like "2014-11-28T120009+0000", i.e.
/// an ISO 8601 timestamp with the colons removed, since colons are traditionally
/// used as directory separators on mac and linux
fn filename_timestamp() -> String {
    Utc::now()
        .to_rfc3339()
        .replace(":", "")
}
