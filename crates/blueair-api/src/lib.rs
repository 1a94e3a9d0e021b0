// blueair-api: Async Rust client for the Blueair AWS cloud API.
//
// Authentication is a three-leg exchange (Gigya account login -> Gigya JWT ->
// gateway access token); device operations go through the AWS execute-api
// gateway with the resulting bearer token. `blueair-core` builds the
// per-device polling layer on top of this crate.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod region;
pub mod transport;

pub use auth::{Credentials, SessionManager};
pub use client::ApiClient;
pub use error::{AuthLeg, Error};
pub use models::{CommandValue, DeviceInfoRecord, DeviceSummary};
pub use region::{Region, RegionEndpoints};
pub use transport::TransportConfig;
