// src/logging.rs
// CSV sinks over the EventBus: reference external collaborators that
// subscribe only, never call back into the simulator, never block.

use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::events::{EventListener, SimEvent};

fn open_csv_with_header(dir: &Path, filename: &str, header: &str) -> std::io::Result<std::fs::File> {
    create_dir_all(dir)?;
    let path: PathBuf = dir.join(filename);
    let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
    file.write_all(header.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(file)
}

/// Order-mutation logger: logs/orders.csv
pub struct CsvOrderLogger {
    file: std::fs::File,
}

impl CsvOrderLogger {
    pub fn new<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let header = "ts,from,to,msg_type,symbol,side,price,qty";
        let file = open_csv_with_header(dir.as_ref(), "orders.csv", header)?;
        Ok(Self { file })
    }
}

impl EventListener for CsvOrderLogger {
    fn on_event(&mut self, event: &SimEvent) {
        if let SimEvent::OrderLog { ts, from, to, msg_type, symbol, side, price, qty } = event {
            let symbol_str = symbol.as_deref().unwrap_or("");
            let side_str = side.map(|s| format!("{s:?}")).unwrap_or_default();
            let price_str = price.map(|p| p.to_string()).unwrap_or_default();
            let qty_str = qty.map(|q| q.to_string()).unwrap_or_default();

            let line = format!("{ts},{from},{to},{msg_type:?},{symbol_str},{side_str},{price_str},{qty_str}\n");
            if let Err(e) = self.file.write_all(line.as_bytes()) {
                warn!(error = %e, "CsvOrderLogger write failed");
            }
        }
    }
}

/// Trade logger: logs/trades.csv
pub struct CsvTradeLogger {
    file: std::fs::File,
}

impl CsvTradeLogger {
    pub fn new<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let header = "ts,symbol,price,qty,maker_agent,taker_agent,maker_side";
        let file = open_csv_with_header(dir.as_ref(), "trades.csv", header)?;
        Ok(Self { file })
    }
}

impl EventListener for CsvTradeLogger {
    fn on_event(&mut self, event: &SimEvent) {
        if let SimEvent::Trade { ts, symbol, price, qty, maker_agent, taker_agent, maker_side } = event {
            let line = format!("{ts},{symbol},{price},{qty},{maker_agent},{taker_agent},{maker_side:?}\n");
            if let Err(e) = self.file.write_all(line.as_bytes()) {
                warn!(error = %e, "CsvTradeLogger write failed");
            }
        }
    }
}

/// Oracle fundamental-value logger: logs/oracle.csv
pub struct CsvOracleLogger {
    file: std::fs::File,
}

impl CsvOracleLogger {
    pub fn new<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let header = "ts,symbol,fundamental";
        let file = open_csv_with_header(dir.as_ref(), "oracle.csv", header)?;
        Ok(Self { file })
    }
}

impl EventListener for CsvOracleLogger {
    fn on_event(&mut self, event: &SimEvent) {
        if let SimEvent::OracleTick { ts, symbol, fundamental } = event {
            let line = format!("{ts},{symbol},{fundamental}\n");
            if let Err(e) = self.file.write_all(line.as_bytes()) {
                warn!(error = %e, "CsvOracleLogger write failed");
            }
        }
    }
}

/// Rejection logger: logs/rejections.csv
pub struct CsvRejectionLogger {
    file: std::fs::File,
}

impl CsvRejectionLogger {
    pub fn new<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let header = "ts,agent,order_id,reason";
        let file = open_csv_with_header(dir.as_ref(), "rejections.csv", header)?;
        Ok(Self { file })
    }
}

impl EventListener for CsvRejectionLogger {
    fn on_event(&mut self, event: &SimEvent) {
        if let SimEvent::OrderRejected { ts, agent, reason, order_id } = event {
            let order_id_str = order_id.clone().unwrap_or_default();
            let line = format!("{ts},{agent},{order_id_str},{reason}\n");
            if let Err(e) = self.file.write_all(line.as_bytes()) {
                warn!(error = %e, "CsvRejectionLogger write failed");
            }
        }
    }
}

/// Attaches every CSV sink to `bus`, logging (not panicking) on a file that
/// fails to open.
pub fn attach_csv_loggers(bus: &mut crate::events::EventBus, dir: &Path) {
    match CsvOrderLogger::new(dir) {
        Ok(l) => bus.subscribe(Box::new(l)),
        Err(e) => warn!(error = %e, "failed to open orders.csv"),
    }
    match CsvTradeLogger::new(dir) {
        Ok(l) => bus.subscribe(Box::new(l)),
        Err(e) => warn!(error = %e, "failed to open trades.csv"),
    }
    match CsvOracleLogger::new(dir) {
        Ok(l) => bus.subscribe(Box::new(l)),
        Err(e) => warn!(error = %e, "failed to open oracle.csv"),
    }
    match CsvRejectionLogger::new(dir) {
        Ok(l) => bus.subscribe(Box::new(l)),
        Err(e) => warn!(error = %e, "failed to open rejections.csv"),
    }
}
