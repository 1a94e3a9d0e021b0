// Session management for the Blueair AWS cloud.
//
// Authentication is a three-leg exchange:
//   1. `accounts.login`  (Gigya)   username/password -> session token + secret
//   2. `accounts.getJWT` (Gigya)   session token/secret -> identity (JWT) token
//   3. `/prod/c/login`   (gateway) identity token -> access token + expiry
//
// There is no partial refresh path -- an expired session always re-runs the
// full exchange. The session mutex is held across the whole check-and-renew
// so concurrent expired callers converge on a single exchange.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AuthLeg, Error};
use crate::region::{Region, RegionEndpoints};
use crate::transport::TransportConfig;

/// Account credentials plus the region they belong to.
///
/// Immutable after construction. The region selects the Gigya tenant and
/// gateway from the static region table.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub region: Region,
}

impl Credentials {
    /// Build credentials from a region string.
    ///
    /// Fails fast with [`Error::UnknownRegion`] before any network call.
    pub fn new(
        username: impl Into<String>,
        password: SecretString,
        region: &str,
    ) -> Result<Self, Error> {
        Ok(Self {
            username: username.into(),
            password,
            region: region.parse()?,
        })
    }
}

/// An authenticated gateway session.
///
/// Owned exclusively by the [`SessionManager`]; renewed in place on expiry.
#[derive(Debug)]
struct Session {
    access_token: SecretString,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is usable only while `now < expires_at`.
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Header set for authenticated gateway requests.
    fn headers(&self) -> Result<HeaderMap, Error> {
        let token = self.access_token.expose_secret();
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::Authentication {
                leg: AuthLeg::GatewayLogin,
                message: format!("access token is not a valid header value: {e}"),
            })?;
        let mut idtoken = HeaderValue::from_str(token).map_err(|e| Error::Authentication {
            leg: AuthLeg::GatewayLogin,
            message: format!("access token is not a valid header value: {e}"),
        })?;
        idtoken.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(HeaderName::from_static("idtoken"), idtoken);
        Ok(headers)
    }
}

/// Owns the credential exchange and the session lifecycle.
///
/// One instance per account; hand it to [`ApiClient`](crate::ApiClient) via
/// `Arc`. The password never leaves this type except inside the
/// account-login form body, and tokens are never logged.
pub struct SessionManager {
    http: reqwest::Client,
    credentials: Credentials,
    endpoints: RegionEndpoints,
    session: Mutex<Option<Session>>,
}

impl SessionManager {
    /// Create a manager with the region's production endpoints.
    pub fn new(credentials: Credentials) -> Result<Self, Error> {
        let endpoints = credentials.region.endpoints();
        Self::with_endpoints(credentials, endpoints, &TransportConfig::default())
    }

    /// Create a manager against explicit endpoints (tests point these at a
    /// mock server).
    pub fn with_endpoints(
        credentials: Credentials,
        endpoints: RegionEndpoints,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            credentials,
            endpoints,
            session: Mutex::new(None),
        })
    }

    /// The shared HTTP client (the device client reuses it).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The resolved gateway base URL.
    pub(crate) fn gateway_url(&self) -> &url::Url {
        &self.endpoints.gateway_url
    }

    /// Ensure a valid session and return the authenticated header set.
    ///
    /// Called by every device operation before it touches the network.
    /// If the stored session is absent or at/past its expiry, the full
    /// three-leg exchange runs in place. The mutex is held for the whole
    /// check-and-renew, so at most one exchange is in flight per manager;
    /// concurrent callers wait on it and then reuse its result.
    pub async fn authorize(&self) -> Result<HeaderMap, Error> {
        let mut guard = self.session.lock().await;

        let needs_renewal = match guard.as_ref() {
            Some(session) => session.is_expired(Utc::now()),
            None => true,
        };

        if needs_renewal {
            let session = self.authenticate().await?;
            *guard = Some(session);
        }

        guard
            .as_ref()
            .map(Session::headers)
            .transpose()?
            .ok_or_else(|| Error::Authentication {
                leg: AuthLeg::GatewayLogin,
                message: "session missing after renewal".into(),
            })
    }

    // ── Three-leg exchange ───────────────────────────────────────────

    /// Run the full identity exchange and return the new session.
    async fn authenticate(&self) -> Result<Session, Error> {
        debug!(region = %self.credentials.region, "starting identity exchange");

        // Leg 1: username/password -> Gigya session token + secret.
        let login_url = self
            .endpoints
            .accounts_url
            .join("/accounts.login")
            .map_err(Error::InvalidUrl)?;

        let login: GigyaLoginResponse = self
            .post_form(
                AuthLeg::AccountLogin,
                login_url,
                &[
                    ("apikey", self.endpoints.api_key.as_str()),
                    ("loginID", self.credentials.username.as_str()),
                    ("password", self.credentials.password.expose_secret()),
                    ("targetEnv", "mobile"),
                ],
            )
            .await?;

        if login.error_code != 0 {
            return Err(auth_error(
                AuthLeg::AccountLogin,
                format!(
                    "Gigya error {}: {}",
                    login.error_code,
                    login.error_message.as_deref().unwrap_or("login rejected")
                ),
            ));
        }
        let session_info = login.session_info.ok_or_else(|| {
            auth_error(AuthLeg::AccountLogin, "response missing sessionInfo")
        })?;
        debug!("account login succeeded");

        // Leg 2: session token/secret -> identity (JWT) token.
        let jwt_url = self
            .endpoints
            .accounts_url
            .join("/accounts.getJWT")
            .map_err(Error::InvalidUrl)?;

        let jwt: GigyaJwtResponse = self
            .post_form(
                AuthLeg::JwtExchange,
                jwt_url,
                &[
                    ("oauth_token", session_info.session_token.as_str()),
                    ("secret", session_info.session_secret.as_str()),
                    ("targetEnv", "mobile"),
                ],
            )
            .await?;

        if jwt.error_code != 0 {
            return Err(auth_error(
                AuthLeg::JwtExchange,
                format!("Gigya error {}", jwt.error_code),
            ));
        }
        let id_token = jwt
            .id_token
            .ok_or_else(|| auth_error(AuthLeg::JwtExchange, "response missing id_token"))?;
        debug!("JWT exchange succeeded");

        // Leg 3: identity token -> gateway access token + expiry.
        let gateway_login_url = self
            .endpoints
            .gateway_url
            .join("/prod/c/login")
            .map_err(Error::InvalidUrl)?;

        let resp = self
            .http
            .post(gateway_login_url)
            .header(AUTHORIZATION, format!("Bearer {id_token}"))
            .header("idtoken", &id_token)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(auth_error(
                AuthLeg::GatewayLogin,
                format!("HTTP {status}: {body}"),
            ));
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let gateway: GatewayLoginResponse = serde_json::from_str(&body)
            .map_err(|e| auth_error(AuthLeg::GatewayLogin, format!("malformed body: {e}")))?;

        let access_token = gateway.access_token.ok_or_else(|| {
            auth_error(AuthLeg::GatewayLogin, "response missing access_token")
        })?;
        let expires_in = gateway.expires_in.ok_or_else(|| {
            auth_error(AuthLeg::GatewayLogin, "response missing expires_in")
        })?;

        let expires_at = Utc::now() + ChronoDuration::seconds(expires_in);
        debug!(%expires_at, "identity exchange complete");

        Ok(Session {
            access_token: SecretString::from(access_token),
            expires_at,
        })
    }

    /// POST a form to a Gigya endpoint and decode the JSON body.
    ///
    /// Gigya reports failures both as HTTP errors and as 200-status bodies
    /// carrying a non-zero `errorCode`; the caller checks the latter.
    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        leg: AuthLeg,
        url: url::Url,
        form: &[(&str, &str)],
    ) -> Result<T, Error> {
        debug!(%leg, "POST {}", url);

        let resp = self
            .http
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(auth_error(leg, format!("HTTP {status}: {body}")));
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body)
            .map_err(|e| auth_error(leg, format!("malformed body: {e}")))
    }
}

fn auth_error(leg: AuthLeg, message: impl Into<String>) -> Error {
    Error::Authentication {
        leg,
        message: message.into(),
    }
}

// ── Wire types for the exchange legs ────────────────────────────────

#[derive(Debug, Deserialize)]
struct GigyaLoginResponse {
    #[serde(default, rename = "errorCode")]
    error_code: i64,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
    #[serde(default, rename = "sessionInfo")]
    session_info: Option<GigyaSessionInfo>,
}

#[derive(Debug, Deserialize)]
struct GigyaSessionInfo {
    #[serde(rename = "sessionToken")]
    session_token: String,
    #[serde(rename = "sessionSecret")]
    session_secret: String,
}

#[derive(Debug, Deserialize)]
struct GigyaJwtResponse {
    #[serde(default, rename = "errorCode")]
    error_code: i64,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayLoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}
