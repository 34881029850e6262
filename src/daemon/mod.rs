//! Positioning daemon access
//!
//! The session trait abstracts the gpsd client library; the connection
//! owns one session for the lifetime of a started source.

pub mod session;
pub mod socket;
pub mod mock;
pub mod connection;
pub mod error;

pub use session::{DaemonOpener, DaemonSession, GpsData, SessionStatus};
pub use socket::{GpsdSocket, GpsdSocketOpener};
pub use mock::{MockDaemon, MockSession};
pub use connection::DaemonConnection;
pub use error::{
    DaemonError, DaemonResult, NL_BADREPORT, NL_CLOSED, NL_NOCONNECT, NL_NOHOST, NL_NOSERVICE, NL_NOSOCK,
};
