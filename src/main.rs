mod aggregate;
mod args;
mod config;
mod entry;
mod error;
mod logger;
mod monitor;
mod shutdown;
mod sinks;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
