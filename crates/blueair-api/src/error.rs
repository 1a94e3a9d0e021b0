use thiserror::Error;

/// One leg of the three-step identity exchange.
///
/// Carried inside [`Error::Authentication`] so callers can tell which
/// service rejected them (Gigya account login, Gigya JWT issuance, or the
/// AWS gateway token exchange).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthLeg {
    /// `accounts.login`: username/password against the Gigya identity provider.
    AccountLogin,
    /// `accounts.getJWT`: session token/secret exchanged for an identity token.
    JwtExchange,
    /// `/prod/c/login`: identity token exchanged for a gateway access token.
    GatewayLogin,
}

impl std::fmt::Display for AuthLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AccountLogin => "account login",
            Self::JwtExchange => "JWT exchange",
            Self::GatewayLogin => "gateway login",
        };
        f.write_str(name)
    }
}

/// Top-level error type for the `blueair-api` crate.
///
/// Covers every failure mode across the API surface: region resolution,
/// the three-leg identity exchange, transport, and the device endpoints.
/// `blueair-core` maps these into domain-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Region string not present in the static region table.
    /// Raised at construction time, before any network call.
    #[error("Unknown region '{0}' (expected 'us' or 'eu')")]
    UnknownRegion(String),

    // ── Authentication ──────────────────────────────────────────────
    /// One of the three identity-exchange legs failed (non-success
    /// status, Gigya error code, or a missing expected field).
    #[error("Authentication failed at {leg}: {message}")]
    Authentication { leg: AuthLeg, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Device API ──────────────────────────────────────────────────
    /// A device endpoint returned a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The device-info query did not match exactly one record.
    #[error("Device not found: {uuid}")]
    DeviceNotFound { uuid: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "device not found" error, so callers
    /// can distinguish a removed device from a broken service.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DeviceNotFound { .. })
    }

    /// Returns `true` if this error came from the identity exchange.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
