use std::process::ExitCode;
use std::rc::Rc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use blub_station::radio::{Clock, HostSerial, SystemClock, XBeeRadio};
use blub_station::{Config, LogDisplay, Result, Station};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Station stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => {
            let config = Config::default();
            config.validate()?;
            config
        }
    };

    let clock: Rc<dyn Clock> = Rc::new(SystemClock::new());
    let serial = HostSerial::open(&config.serial)?;
    let radio = XBeeRadio::new(serial, clock.clone());
    let mut station = Station::new(&config, radio, LogDisplay::new(), clock)?;

    let mut ticker = interval(config.station.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                station.tick();
            }
            result = &mut shutdown => {
                result?;
                info!(ticks = station.ticks(), "Shutting down");
                return Ok(());
            }
        }
    }
}
