//! Portal specifics
//!
//! Phases:
//! 1. use login & password submitted to `generateToken` to get a token
//! 2. pass the token along with every subsequent request
//!
//! Every endpoint answers JSON.  Errors come back either as an HTTP status or, more often, as a
//! `200 OK` with an `{"error": {...}}` payload so every reply goes through `decode_reply()`.
//!

use portal_common::{Config, PortalArgs, DEF_EXPIRATION};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tap::Tap;
use tracing::{debug, trace, warn};

use crate::{http_get_auth, http_post_form, http_post_form_auth};
use crate::{AuthError, Expirable, PortalError, PortalToken};

/// Client tuning, usually from the command line and the configuration file.
///
#[derive(Clone, Debug)]
pub struct PortalOpts {
    /// Accept any certificate
    pub skip_ssl_verification: bool,
    /// Referer used for the token, defaults to the portal url
    pub referer: Option<String>,
    /// Token lifetime in minutes
    pub expiration: u32,
    /// Override the default `<crate>/<version>`
    pub user_agent: Option<String>,
}

impl Default for PortalOpts {
    fn default() -> Self {
        PortalOpts {
            skip_ssl_verification: false,
            referer: None,
            expiration: DEF_EXPIRATION,
            user_agent: None,
        }
    }
}

impl PortalOpts {
    /// Merge the command line and the configuration file
    ///
    pub fn new(args: &PortalArgs, cfg: &Config) -> Self {
        PortalOpts {
            skip_ssl_verification: args.skip_ssl_verification,
            referer: cfg.referer.clone(),
            expiration: cfg.expiration,
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// Error payload
///
#[derive(Debug, Deserialize)]
struct RemoteError {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Option<Vec<String>>,
}

impl From<RemoteError> for PortalError {
    fn from(e: RemoteError) -> Self {
        PortalError::Remote {
            code: e.code,
            message: e.message,
            details: e.details.unwrap_or_default(),
        }
    }
}

/// Portal represent what is needed to connect & auth to and talk with the portal.
///
#[derive(Clone, Debug)]
pub struct Portal {
    /// Base url of the org/portal, no trailing `/`
    pub base_url: String,
    /// Referer for the token
    referer: String,
    /// Token lifetime in minutes
    expiration: u32,
    /// Sent with every request
    pub(crate) user_agent: String,
    /// Current token, if any
    token: Option<PortalToken>,
    /// reqwest blocking client
    pub(crate) client: Client,
}

impl Portal {
    /// Prepare the client, nothing is sent yet.
    ///
    #[tracing::instrument]
    pub fn new(url: &str, opts: &PortalOpts) -> Result<Self, PortalError> {
        trace!("portal::new");

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(PortalError::BadUrl(url.to_string()));
        }
        let base_url = url.trim_end_matches('/').to_string();

        if opts.skip_ssl_verification {
            warn!("SSL certificate verification disabled for {base_url}");
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(opts.skip_ssl_verification)
            .build()?;

        Ok(Portal {
            referer: opts.referer.clone().unwrap_or_else(|| base_url.clone()),
            expiration: opts.expiration,
            user_agent: opts
                .user_agent
                .clone()
                .unwrap_or_else(crate::version),
            token: None,
            base_url,
            client,
        })
    }

    /// Create the client and authenticate in one go.
    ///
    #[tracing::instrument(skip(args, cfg), fields(org = %args.org_url, user = %args.username))]
    pub fn connect(args: &PortalArgs, cfg: &Config) -> Result<Self, PortalError> {
        let mut portal = Portal::new(&args.org_url, &PortalOpts::new(args, cfg))?;
        portal.login(&args.username, &args.password)?;
        Ok(portal)
    }

    /// Return the full url for an endpoint of the REST API
    ///
    #[inline]
    pub fn rest(&self, path: &str) -> String {
        format!("{}/sharing/rest/{}", self.base_url, path)
    }

    /// Authenticate to the portal using the supplied credentials and keep the token
    ///
    #[tracing::instrument(skip(self, password))]
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        trace!("authenticate as ({username:?})");

        let url = self.rest("generateToken");
        let expiration = self.expiration.to_string();
        let form = [
            ("username", username),
            ("password", password),
            ("client", "referer"),
            ("referer", self.referer.as_str()),
            ("expiration", expiration.as_str()),
            ("f", "json"),
        ];

        trace!("Fetching token through {}…", url);
        let resp = http_post_form!(self, &url, &form).map_err(|e| AuthError::HTTP(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().map_err(|e| AuthError::HTTP(e.to_string()))?;
        if !status.is_success() {
            return Err(AuthError::HTTP(format!("status {} from {}", status, url)));
        }

        let mut token = decode_reply::<PortalToken>(&url, &text).map_err(|e| match e {
            PortalError::Remote { code, message, .. } => AuthError::Rejected { code, message },
            e => AuthError::Decoding(e.to_string()),
        })?;
        token.username = username.to_string();

        debug!("token for {} valid until {:?}", token.key(), token.expires_at());
        self.set_token(token);
        Ok(())
    }

    /// Use an already obtained token
    ///
    pub fn set_token(&mut self, token: PortalToken) {
        self.token = Some(token);
    }

    /// Return the current token if it is still usable
    ///
    pub fn token(&self) -> Result<&str, AuthError> {
        match &self.token {
            None => Err(AuthError::NoToken),
            Some(t) if t.is_expired() => {
                warn!("token for {} has expired", t.key());
                Err(AuthError::Expired)
            }
            Some(t) => Ok(t.token.as_str()),
        }
    }

    /// GET with token and decode the JSON reply
    ///
    #[tracing::instrument(skip(self))]
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PortalError> {
        let token = self.token()?;
        let resp = http_get_auth!(self, url, token, query)?;
        read_reply(url, resp)
    }

    /// POST a form with token and decode the JSON reply
    ///
    #[tracing::instrument(skip(self, form))]
    pub(crate) fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, PortalError> {
        let token = self.token()?;
        let resp = http_post_form_auth!(self, url, token, form)?;
        read_reply(url, resp)
    }

    /// GET with token, no decoding.  Status is checked.
    ///
    #[tracing::instrument(skip(self))]
    pub(crate) fn get_raw(&self, url: &str) -> Result<Response, PortalError> {
        let token = self.token()?;
        let resp = http_get_auth!(self, url, token)?.tap(|r| debug!("resp={:?}", r));

        if !resp.status().is_success() {
            return Err(PortalError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

/// Check the status then decode
///
fn read_reply<T: DeserializeOwned>(url: &str, resp: Response) -> Result<T, PortalError> {
    let status = resp.status();
    let text = resp.text()?;
    trace!("resp={}", text);

    if !status.is_success() {
        return Err(PortalError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    decode_reply(url, &text)
}

/// Decode a JSON reply, turning `{"error": {...}}` into `PortalError::Remote`.
///
/// An empty body is taken as an empty object (items without data answer that way).
///
pub fn decode_reply<T: DeserializeOwned>(url: &str, text: &str) -> Result<T, PortalError> {
    let text = if text.trim().is_empty() { "{}" } else { text };

    let v: Value =
        serde_json::from_str(text).map_err(|e| PortalError::Decoding(url.to_string(), e.to_string()))?;
    if let Some(err) = v.get("error") {
        let err: RemoteError = serde_json::from_value(err.clone())
            .map_err(|e| PortalError::Decoding(url.to_string(), e.to_string()))?;
        return Err(err.into());
    }
    serde_json::from_value(v).map_err(|e| PortalError::Decoding(url.to_string(), e.to_string()))
}
