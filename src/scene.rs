//! Scan-to-login state machine.
//!
//! One login attempt is a "scene": an unguessable id handed to the
//! browser together with the QR artifact. Possession of the id is the
//! only capability needed to poll or complete the scene, which is why
//! ids are uuid v4 and never sequential.
//!
//! Status moves WAITING → SCANNED → CONFIRMED and never backward.
//! CONFIRMED is terminal. An expired scene is gone — callers cannot
//! tell it apart from an id that was never issued.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::cache::TtlCache;
use crate::credentials::CredentialProvider;
use crate::errors::AppError;
use crate::upstream::IdentityClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    Waiting,
    Scanned,
    Confirmed,
}

/// Scene record as stored in the cache and returned to pollers.
/// `payload` is present iff `status` is `Confirmed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub status: SceneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
}

impl Scene {
    fn waiting() -> Self {
        Self {
            status: SceneStatus::Waiting,
            payload: None,
            created_at: Utc::now(),
        }
    }
}

pub struct SceneManager {
    cache: TtlCache,
    credentials: CredentialProvider,
    client: Arc<IdentityClient>,
    scene_ttl: Duration,
}

pub(crate) fn scene_key(scene_id: &str) -> String {
    format!("scene:{scene_id}")
}

impl SceneManager {
    pub fn new(
        cache: TtlCache,
        credentials: CredentialProvider,
        client: Arc<IdentityClient>,
        scene_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            credentials,
            client,
            scene_ttl,
        }
    }

    /// Start a login attempt: mint a QR artifact bound to a fresh scene
    /// id and record the scene as WAITING.
    ///
    /// The raw artifact bytes are returned as-is; data-URI encoding is
    /// the HTTP layer's concern.
    pub async fn start_login(&self) -> Result<(String, Bytes), AppError> {
        let access_token = self.credentials.get_access_token().await?;
        let scene_id = Uuid::new_v4().to_string();
        let artifact = self
            .client
            .mint_qr_artifact(&access_token, &scene_id)
            .await?;

        self.cache
            .set(&scene_key(&scene_id), &Scene::waiting(), self.scene_ttl)
            .map_err(AppError::Internal)?;
        tracing::debug!(%scene_id, "scene created, waiting for scan");
        Ok((scene_id, artifact))
    }

    /// Pure read; safe to poll at arbitrary frequency. Expired and
    /// never-issued ids both come back `SceneNotFound`.
    pub fn get_status(&self, scene_id: &str) -> Result<Scene, AppError> {
        self.cache
            .get::<Scene>(&scene_key(scene_id))
            .ok_or(AppError::SceneNotFound)
    }

    /// Record that the scanning device opened the code: WAITING → SCANNED.
    /// A CONFIRMED scene is left untouched; status never moves backward.
    pub fn mark_scanned(&self, scene_id: &str) -> Result<Scene, AppError> {
        let key = scene_key(scene_id);
        let mut scene: Scene = self.cache.get(&key).ok_or(AppError::SceneNotFound)?;
        if scene.status == SceneStatus::Waiting {
            scene.status = SceneStatus::Scanned;
            self.cache
                .set(&key, &scene, self.scene_ttl)
                .map_err(AppError::Internal)?;
        }
        Ok(scene)
    }

    /// Exchange the device-supplied authorization code and, if the
    /// scene is still live, confirm it with the identity payload.
    ///
    /// The exchange always runs, whatever the scene's current status.
    /// If the scene already expired the payload is still returned to
    /// the immediate caller and no scene state changes; the polling
    /// side keeps seeing not-found. Duplicate concurrent submissions
    /// race last-write-wins per the cache contract.
    pub async fn complete_login(
        &self,
        scene_id: &str,
        code: &str,
    ) -> Result<Map<String, Value>, AppError> {
        let access_token = self.credentials.get_access_token().await?;
        let payload = self
            .client
            .exchange_authorization_code(&access_token, code)
            .await?;

        let key = scene_key(scene_id);
        if let Some(mut scene) = self.cache.get::<Scene>(&key) {
            scene.status = SceneStatus::Confirmed;
            scene.payload = Some(payload.clone());
            self.cache
                .set(&key, &scene, self.scene_ttl)
                .map_err(AppError::Internal)?;
            tracing::debug!(%scene_id, "scene confirmed");
        } else {
            tracing::debug!(%scene_id, "scene expired before confirmation, state unchanged");
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_manager(cache: TtlCache) -> SceneManager {
        let cfg = Config {
            port: 0,
            app_id: "wx-test".into(),
            app_secret: "secret".into(),
            upstream_base_url: "http://127.0.0.1:1".into(),
            launch_page: String::new(),
            scene_ttl_secs: 300,
        };
        let client = Arc::new(IdentityClient::new(&cfg));
        let credentials = CredentialProvider::new(cache.clone(), client.clone(), &cfg.app_id);
        SceneManager::new(cache, credentials, client, Duration::from_secs(300))
    }

    fn seed_scene(cache: &TtlCache, id: &str, scene: &Scene) {
        cache
            .set(&scene_key(id), scene, Duration::from_secs(300))
            .unwrap();
    }

    #[test]
    fn test_get_status_unknown_id_is_not_found() {
        let manager = test_manager(TtlCache::new());
        assert!(matches!(
            manager.get_status("never-issued"),
            Err(AppError::SceneNotFound)
        ));
    }

    #[test]
    fn test_fresh_scene_is_waiting_without_payload() {
        let cache = TtlCache::new();
        let manager = test_manager(cache.clone());
        seed_scene(&cache, "s1", &Scene::waiting());

        let scene = manager.get_status("s1").unwrap();
        assert_eq!(scene.status, SceneStatus::Waiting);
        assert!(scene.payload.is_none());
    }

    #[test]
    fn test_mark_scanned_advances_waiting() {
        let cache = TtlCache::new();
        let manager = test_manager(cache.clone());
        seed_scene(&cache, "s1", &Scene::waiting());

        let scene = manager.mark_scanned("s1").unwrap();
        assert_eq!(scene.status, SceneStatus::Scanned);
        assert_eq!(manager.get_status("s1").unwrap().status, SceneStatus::Scanned);
    }

    #[test]
    fn test_mark_scanned_never_demotes_confirmed() {
        let cache = TtlCache::new();
        let manager = test_manager(cache.clone());
        let mut payload = Map::new();
        payload.insert("openid".into(), Value::String("o1".into()));
        seed_scene(
            &cache,
            "s1",
            &Scene {
                status: SceneStatus::Confirmed,
                payload: Some(payload),
                created_at: chrono::Utc::now(),
            },
        );

        let scene = manager.mark_scanned("s1").unwrap();
        assert_eq!(scene.status, SceneStatus::Confirmed);

        let after = manager.get_status("s1").unwrap();
        assert_eq!(after.status, SceneStatus::Confirmed);
        assert!(after.payload.is_some());
    }

    #[test]
    fn test_mark_scanned_expired_scene_is_not_found() {
        let manager = test_manager(TtlCache::new());
        assert!(matches!(
            manager.mark_scanned("gone"),
            Err(AppError::SceneNotFound)
        ));
    }

    #[test]
    fn test_scene_serializes_without_null_payload() {
        let json = serde_json::to_value(Scene::waiting()).unwrap();
        assert_eq!(json["status"], "waiting");
        assert!(json.get("payload").is_none());
    }
}
