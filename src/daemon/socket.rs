//! JSON socket client for gpsd
//!
//! A thin session: connect, send `?WATCH`, read one newline-delimited
//! report per call. Only TPV reports carry a fix; every other report
//! class leaves the session without one.

use crate::core::{Altitude, FixMode, FixRecord, Motion, Position, DEFAULT_GPSD_HOST, DEFAULT_GPSD_PORT};
use crate::daemon::{
    DaemonError, DaemonOpener, DaemonResult, DaemonSession, GpsData, SessionStatus, NL_BADREPORT,
    NL_CLOSED, NL_NOCONNECT, NL_NOHOST, NL_NOSERVICE,
};
use chrono::DateTime;
use log::debug;
use serde::Deserialize;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::os::unix::io::{AsRawFd, RawFd};

const WATCH_ENABLE: &str = "?WATCH={\"enable\":true,\"json\":true};\n";

/// Subset of a gpsd report needed to build a fix
#[derive(Debug, Deserialize)]
struct Report {
    class: String,
    #[serde(default)]
    mode: Option<u8>,
    #[serde(default)]
    status: Option<i32>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    ept: Option<f64>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    epy: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    epx: Option<f64>,
    #[serde(default)]
    track: Option<f64>,
    #[serde(default)]
    epd: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    eps: Option<f64>,
    #[serde(default)]
    alt: Option<f64>,
    #[serde(default, rename = "altHAE")]
    alt_hae: Option<f64>,
    #[serde(default)]
    epv: Option<f64>,
    #[serde(default)]
    climb: Option<f64>,
    #[serde(default)]
    epc: Option<f64>,
}

/// Decode one JSON report line into session data
pub fn decode_report(line: &str) -> DaemonResult<GpsData> {
    let report: Report = serde_json::from_str(line)
        .map_err(|e| DaemonError::new(NL_BADREPORT, format!("malformed report: {}", e)))?;

    if report.class != "TPV" {
        return Ok(GpsData::default());
    }

    let mode = FixMode::from_u8(report.mode.unwrap_or(0)).ok_or_else(|| {
        DaemonError::new(NL_BADREPORT, format!("invalid mode {:?}", report.mode))
    })?;

    let status = match report.status {
        Some(0) => SessionStatus::NoFix,
        Some(2) => SessionStatus::DgpsFix,
        _ => SessionStatus::Fix,
    };

    let time = match report.time.as_deref() {
        Some(text) => parse_time(text)?,
        None => f64::NAN,
    };

    let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);
    let position = Position::new(nan(report.lat), nan(report.lon))
        .with_uncertainty(nan(report.epy), nan(report.epx));
    let motion = Motion::new(nan(report.track), nan(report.speed))
        .with_uncertainty(nan(report.epd), nan(report.eps));
    let altitude = Altitude::new(nan(report.alt_hae.or(report.alt)), nan(report.climb))
        .with_uncertainty(nan(report.epv), nan(report.epc));

    let fix = FixRecord::from_parts(mode, time, nan(report.ept), position, motion, altitude);
    Ok(GpsData::new(status, fix))
}

/// ISO 8601 report time to fractional seconds since the Unix epoch
fn parse_time(text: &str) -> DaemonResult<f64> {
    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|e| DaemonError::new(NL_BADREPORT, format!("invalid time {:?}: {}", text, e)))?;
    Ok(parsed.timestamp() as f64 + f64::from(parsed.timestamp_subsec_nanos()) / 1e9)
}

/// Session with gpsd over its TCP socket
pub struct GpsdSocket {
    reader: BufReader<TcpStream>,
    data: GpsData,
    line: String,
    closed: bool,
}

impl GpsdSocket {
    /// Connect to gpsd; empty or missing host and port use the defaults
    pub fn connect(host: Option<&str>, port: Option<&str>) -> DaemonResult<Self> {
        let host = host.filter(|h| !h.is_empty()).unwrap_or(DEFAULT_GPSD_HOST);
        let port = port.filter(|p| !p.is_empty()).unwrap_or(DEFAULT_GPSD_PORT);
        let port: u16 = port
            .parse()
            .map_err(|_| DaemonError::new(NL_NOSERVICE, format!("can't get service entry for {:?}", port)))?;

        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| DaemonError::new(NL_NOHOST, format!("can't get host entry for {}: {}", host, e)))?
            .collect();
        if addrs.is_empty() {
            return Err(DaemonError::from_code(NL_NOHOST));
        }

        let stream = TcpStream::connect(&addrs[..]).map_err(|e| {
            DaemonError::new(NL_NOCONNECT, format!("can't connect to {}:{}: {}", host, port, e))
        })?;
        debug!("connected to gpsd at {}:{}", host, port);

        Ok(Self {
            reader: BufReader::new(stream),
            data: GpsData::default(),
            line: String::with_capacity(1024),
            closed: false,
        })
    }
}

impl DaemonSession for GpsdSocket {
    fn enable_streaming(&mut self) -> DaemonResult<()> {
        self.reader
            .get_mut()
            .write_all(WATCH_ENABLE.as_bytes())
            .map_err(|e| DaemonError::io(&e))
    }

    fn read(&mut self) -> DaemonResult<()> {
        self.line.clear();
        let n = self
            .reader
            .read_line(&mut self.line)
            .map_err(|e| DaemonError::io(&e))?;
        if n == 0 {
            return Err(DaemonError::from_code(NL_CLOSED));
        }

        self.data = decode_report(self.line.trim_end())?;
        Ok(())
    }

    fn data(&self) -> &GpsData {
        &self.data
    }

    fn has_pending(&self) -> bool {
        self.reader.buffer().contains(&b'\n')
    }

    fn fd(&self) -> RawFd {
        self.reader.get_ref().as_raw_fd()
    }

    fn close(&mut self) -> DaemonResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        match self.reader.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(DaemonError::io(&e)),
        }
    }
}

/// Opens [`GpsdSocket`] sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct GpsdSocketOpener;

impl DaemonOpener for GpsdSocketOpener {
    fn open(&self, host: Option<&str>, port: Option<&str>) -> DaemonResult<Box<dyn DaemonSession>> {
        Ok(Box::new(GpsdSocket::connect(host, port)?))
    }
}
