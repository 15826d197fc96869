use std::error::Error;

use clap::Parser;
use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady, Write};
use serde::Serialize;
use sps_core::utils::{
    link::dispatcher::{received_line, sent_line},
    run_handshake, CommandFrame, Exchange, HandshakeObserver, LinkError, SerialDispatcher,
    SimulatedSensor,
};
use tracing::{error, info};

mod clock;
mod config;
mod port;

use clock::ThreadDelay;
use config::SerialSettings;
use port::SerialLink;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// talk to an in-memory sensor instead of the serial device
    #[clap(long)]
    simulate: bool,
    /// print each exchange as one JSON object per line
    #[clap(long)]
    json: bool,
}

#[derive(Serialize)]
struct ExchangeRecord {
    frame: Option<CommandFrame>,
    sent: String,
    received: String,
}

impl From<&Exchange> for ExchangeRecord {
    fn from(exchange: &Exchange) -> Self {
        ExchangeRecord {
            frame: exchange.frame,
            sent: exchange.sent_hex(),
            received: exchange.received_hex(),
        }
    }
}

/// Writes console output for each frame.
///
/// Text mode prints the sent line before the write and the received line after
/// the drain. JSON mode prints one object per completed exchange.
struct Console<W> {
    out: W,
    json: bool,
}

impl<W: std::io::Write> Console<W> {
    fn emit(
        &mut self,
        line: &str,
    ) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            error!("could not write console output: {}", e);
        }
    }
}

impl<W: std::io::Write> HandshakeObserver for Console<W> {
    fn on_sent(
        &mut self,
        _frame: CommandFrame,
        bytes: &[u8],
    ) {
        if !self.json {
            self.emit(&sent_line(bytes));
        }
    }

    fn on_exchange(
        &mut self,
        exchange: &Exchange,
    ) {
        if !self.json {
            self.emit(&received_line(&exchange.received));
            return;
        }
        match serde_json::to_string(&ExchangeRecord::from(exchange)) {
            Ok(line) => self.emit(&line),
            Err(e) => error!("could not serialize exchange: {}", e),
        }
    }
}

fn run<P, D, W>(
    dispatcher: &mut SerialDispatcher<P, D>,
    console: &mut Console<W>,
) -> Result<usize, LinkError<P::Error>>
where
    P: Read + Write + ReadReady,
    D: DelayNs,
    W: std::io::Write,
{
    let exchanges = run_handshake(dispatcher, console)?;
    Ok(exchanges.len())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts: Opts = Opts::parse();
    let mut console = Console {
        out: std::io::stdout(),
        json: opts.json,
    };

    let count = if opts.simulate {
        info!("using simulated sensor");
        let mut dispatcher = SerialDispatcher::new(SimulatedSensor::new(), ThreadDelay);
        run(&mut dispatcher, &mut console)?
    } else {
        let settings = SerialSettings::fixed();
        let link = SerialLink::open(&settings).inspect_err(|e| {
            error!(path = %settings.path, "failed to open serial port: {}", e);
        })?;
        let mut dispatcher = SerialDispatcher::new(link, ThreadDelay);
        run(&mut dispatcher, &mut console)?
    };

    info!(frames = count, "done");
    Ok(())
}
