use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Application id registered with the identity provider.
    pub app_id: String,
    /// Client secret paired with `app_id`.
    pub app_secret: String,
    /// Base URL of the identity provider's API.
    /// Overridable so tests can point it at a mock server.
    pub upstream_base_url: String,
    /// Mini-app page the minted QR code launches into.
    pub launch_page: String,
    /// Scene lifetime in seconds. Default: 300 (5 minutes).
    pub scene_ttl_secs: u64,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let app_id = std::env::var("SCANGATE_APP_ID").unwrap_or_else(|_| "CHANGE_ME_APP_ID".into());
    let app_secret =
        std::env::var("SCANGATE_APP_SECRET").unwrap_or_else(|_| "CHANGE_ME_APP_SECRET".into());

    if app_id == "CHANGE_ME_APP_ID" || app_secret == "CHANGE_ME_APP_SECRET" {
        let env_mode = std::env::var("SCANGATE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "SCANGATE_APP_ID / SCANGATE_APP_SECRET are still placeholders. \
                 Set the identity-provider credentials before running in production."
            );
        }
        eprintln!("⚠️  SCANGATE_APP_ID / SCANGATE_APP_SECRET are not set — upstream calls will be rejected.");
    }

    Ok(Config {
        port: std::env::var("SCANGATE_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        app_id,
        app_secret,
        upstream_base_url: std::env::var("SCANGATE_UPSTREAM_BASE_URL")
            .unwrap_or_else(|_| "https://api.weixin.qq.com".into()),
        launch_page: std::env::var("SCANGATE_LAUNCH_PAGE").unwrap_or_default(),
        scene_ttl_secs: std::env::var("SCANGATE_SCENE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300),
    })
}
