//! # SortOfRemote NG – Synology File Station
//!
//! Session-managed client for the Synology DSM File Station web API.
//!
//! ## Features
//!
//! - **Login** – `SYNO.API.Auth` v6 with optional TOTP second factor
//! - **Session Cache** – one token per account, single-flight login,
//!   transparent re-authentication on expired sessions
//! - **Upload** – multipart `SYNO.FileStation.Upload` with binary or text payloads
//! - **Batches** – sequential uploads with abort / continue-on-fail policies
//!   and cancellation
//! - **Connection Test** – `SYNO.FileStation.Info` probe
//! - **Error Tables** – DSM error codes mapped to readable messages

pub mod error;
pub mod totp;
pub mod types;
pub mod envelope;
pub mod upload;
pub mod request;
pub mod transport;
pub mod auth;
pub mod session;
pub mod client;
pub mod batch;

pub use batch::{BatchEntry, BatchReport, ItemOutcome};
pub use client::FileStationClient;
pub use error::{SynologyError, SynologyErrorKind, SynologyResult};
pub use types::{BatchPolicy, FileStationInfo, SynologyConfig, UploadPayload, UploadRequest};
