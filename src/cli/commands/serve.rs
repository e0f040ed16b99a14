//! Serve Command
//!
//! Expose the pipeline trigger over HTTP and run it on schedule.
//!
//! Usage:
//!   digestpipe serve [--host 127.0.0.1] [--port 3100] [--no-schedule]

use crate::config::ConfigLoader;
use crate::server;
use crate::types::Result;

pub async fn run(host: Option<String>, port: Option<u16>, no_schedule: bool) -> Result<()> {
    // fail fast on a broken config; runs reload it anyway
    let config = ConfigLoader::load()?;
    let schedule = config.pipe.schedule()?;

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let scheduled = config.server.schedule && !no_schedule;

    if scheduled {
        println!("Scheduler: {}", schedule.describe());
    }
    server::serve(&host, port, scheduled, server::config_factory()).await
}
