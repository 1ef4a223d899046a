/// HTTP client for the identity provider's API: access-token issuance,
/// QR artifact minting, and authorization-code exchange.
///
/// No retry layer — a failed call propagates immediately and the caller
/// owns any retry policy.
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::config::Config;
use crate::errors::AppError;

/// Successful client-credentials grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Declared lifetime in seconds.
    pub expires_in: u64,
}

/// Structured failure body the provider uses across all endpoints.
#[derive(Debug, Deserialize)]
struct UpstreamFailure {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Raw response shape of the token endpoint. The provider answers
/// HTTP 200 either way; the fields tell success from failure.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    launch_page: String,
}

impl IdentityClient {
    pub fn new(cfg: &Config) -> Self {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: cfg.upstream_base_url.trim_end_matches('/').to_string(),
            app_id: cfg.app_id.clone(),
            app_secret: cfg.app_secret.clone(),
            launch_page: cfg.launch_page.clone(),
        }
    }

    /// Client-credentials grant: `GET /cgi-bin/token`.
    /// Returns the raw grant; caching is the credential provider's job.
    pub async fn issue_access_token(&self) -> Result<TokenGrant, AppError> {
        let url = format!("{}/cgi-bin/token", self.base_url);
        let resp: TokenResponse = self
            .client
            .get(&url)
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if let Some(code) = resp.errcode.filter(|&c| c != 0) {
            return Err(AppError::Upstream {
                code,
                message: resp.errmsg.unwrap_or_default(),
            });
        }
        match (resp.access_token, resp.expires_in) {
            (Some(access_token), Some(expires_in)) => Ok(TokenGrant {
                access_token,
                expires_in,
            }),
            _ => Err(AppError::Upstream {
                code: -1,
                message: "token endpoint returned no usable access_token".into(),
            }),
        }
    }

    /// Mint a QR artifact bound to `scene`: `POST /wxa/getwxacodeunlimit`.
    ///
    /// The provider answers HTTP 200 for both outcomes and signals failure
    /// with a JSON content type; anything else is the raw image bytes.
    /// Do not switch this to status-code checks.
    pub async fn mint_qr_artifact(
        &self,
        access_token: &str,
        scene: &str,
    ) -> Result<Bytes, AppError> {
        let url = format!("{}/wxa/getwxacodeunlimit", self.base_url);
        let resp = self
            .client
            .post(&url)
            .query(&[("access_token", access_token)])
            .json(&serde_json::json!({
                "page": self.launch_page,
                "scene": scene,
            }))
            .send()
            .await?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = resp.bytes().await?;

        if content_type.contains("application/json") {
            let failure: UpstreamFailure = serde_json::from_slice(&body)
                .map_err(|e| AppError::UpstreamUnavailable(format!("unparseable error body: {e}")))?;
            return Err(AppError::Upstream {
                code: failure.errcode,
                message: failure.errmsg,
            });
        }
        Ok(body)
    }

    /// Redeem a single-use authorization code for the identity payload:
    /// `GET /sns/jscode2session`.
    pub async fn exchange_authorization_code(
        &self,
        access_token: &str,
        code: &str,
    ) -> Result<Map<String, Value>, AppError> {
        let url = format!("{}/sns/jscode2session", self.base_url);
        let payload: Map<String, Value> = self
            .client
            .get(&url)
            .query(&[
                ("access_token", access_token),
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.as_str()),
                ("js_code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if let Some(code) = payload.get("errcode").and_then(Value::as_i64) {
            // errcode 0 means success on some provider endpoints
            if code != 0 {
                let message = payload
                    .get("errmsg")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                return Err(AppError::Upstream { code, message });
            }
        }
        Ok(payload)
    }
}
