//! Shared utilities for finsight
//!
//! Logging setup and environment loading used by every crate in the workspace.
//! Nothing here knows about market data; the binary calls [`init_tracing`] and
//! [`load_dotenv`] once at startup and the library crates only consume the
//! typed readers in [`env`].

pub mod env;
pub mod logging;

pub use env::{EnvError, load_dotenv};
pub use logging::{LogFormat, init_tracing};
