//! Serve command - starts the moderation HTTP service
//!
//! Builds the storage backend, detector, and API key verifier from a YAML
//! service config, wires them into one `ModerationPipeline`, and serves it
//! until Ctrl+C.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use photoguard_core::{Detector, Label, ObjectStore, DEFAULT_BUCKET};
use photoguard_detect::{HttpDetector, HttpDetectorConfig, StaticDetector};
use photoguard_runtime::{ModerationPipeline, PipelineConfig, Sha256KeyVerifier};
use photoguard_server::{ModerationServer, ServerConfig};
use photoguard_store::{FileStore, InMemoryStore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Service configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// API version (photoguard.dev/v1)
    #[serde(rename = "apiVersion")]
    pub api_version: Option<String>,

    /// Kind (ServiceConfig)
    pub kind: Option<String>,

    #[serde(default)]
    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub name: Option<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub detection: DetectionSettings,

    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_true")]
    pub cors: bool,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors: true,
            max_body_size: default_max_body_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Bucket name (falls back to BUCKET_NAME, then the built-in default)
    pub bucket: Option<String>,
    pub bucket_env: Option<String>,

    /// Root directory for the file backend
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: None,
            bucket_env: None,
            root: default_storage_root(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionBackend {
    #[default]
    Http,
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    #[serde(default)]
    pub backend: DetectionBackend,

    /// Moderation endpoint URL (or env var name)
    pub endpoint: Option<String>,
    #[serde(default = "default_endpoint_env")]
    pub endpoint_env: Option<String>,

    /// Bearer token (or env var name)
    pub api_token: Option<String>,
    pub api_token_env: Option<String>,

    #[serde(default = "default_detection_timeout")]
    pub timeout_secs: u64,

    pub min_confidence: Option<f64>,

    /// Labels returned by the static backend
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            backend: DetectionBackend::default(),
            endpoint: None,
            endpoint_env: default_endpoint_env(),
            api_token: None,
            api_token_env: None,
            timeout_secs: default_detection_timeout(),
            min_confidence: None,
            labels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// SHA-256 hex digest of the shared API key (or env var name)
    pub api_key_hash: Option<String>,
    #[serde(default = "default_api_key_hash_env")]
    pub api_key_hash_env: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            api_key_hash: None,
            api_key_hash_env: default_api_key_hash_env(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_endpoint_env() -> Option<String> {
    Some("DETECTION_ENDPOINT".to_string())
}

fn default_detection_timeout() -> u64 {
    30
}

fn default_api_key_hash_env() -> Option<String> {
    Some("API_KEY_HASH".to_string())
}

impl ServiceConfig {
    /// Load a config file, reporting the exact field path on type errors
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let de = serde_yaml::Deserializer::from_str(content);
        let config: Self = serde_path_to_error::deserialize(de)
            .map_err(|e| anyhow!("{} (at {})", e.inner(), e.path()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot produce a working service
    pub fn validate(&self) -> anyhow::Result<()> {
        self.spec
            .pipeline
            .validate()
            .context("spec.pipeline.deadline_ms")?;
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_version: Some("photoguard.dev/v1".to_string()),
            kind: Some("ServiceConfig".to_string()),
            metadata: ConfigMetadata::default(),
            spec: ServiceSpec::default(),
        }
    }
}

/// Resolve a value from direct config or environment variable
fn resolve_env_value(direct: Option<&str>, env_name: Option<&str>) -> Option<String> {
    if let Some(val) = direct {
        return Some(val.to_string());
    }

    if let Some(env_var) = env_name {
        if let Ok(val) = std::env::var(env_var) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }

    None
}

fn resolve_bucket(settings: &StorageSettings) -> String {
    resolve_env_value(
        settings.bucket.as_deref(),
        Some(settings.bucket_env.as_deref().unwrap_or("BUCKET_NAME")),
    )
    .unwrap_or_else(|| DEFAULT_BUCKET.to_string())
}

async fn build_store(settings: &StorageSettings) -> anyhow::Result<Arc<dyn ObjectStore>> {
    let bucket = resolve_bucket(settings);
    let store: Arc<dyn ObjectStore> = match settings.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; uploads are lost on restart");
            Arc::new(InMemoryStore::new(bucket))
        }
        StorageBackend::File => Arc::new(
            FileStore::new(&settings.root, bucket)
                .await
                .context("Failed to initialize file storage")?,
        ),
    };
    info!(backend = store.backend_name(), bucket = store.bucket(), "Storage ready");
    Ok(store)
}

fn build_detector(settings: &DetectionSettings) -> anyhow::Result<Arc<dyn Detector>> {
    match settings.backend {
        DetectionBackend::Static => {
            warn!(labels = settings.labels.len(), "Using static detector");
            Ok(Arc::new(StaticDetector::new(settings.labels.clone())))
        }
        DetectionBackend::Http => {
            let endpoint = resolve_env_value(settings.endpoint.as_deref(), settings.endpoint_env.as_deref())
                .ok_or_else(|| {
                    anyhow!(
                        "Detection endpoint not configured: set spec.detection.endpoint or {}",
                        settings.endpoint_env.as_deref().unwrap_or("endpoint_env")
                    )
                })?;

            let mut config = HttpDetectorConfig::new(endpoint);
            config.api_token =
                resolve_env_value(settings.api_token.as_deref(), settings.api_token_env.as_deref());
            config.timeout_secs = settings.timeout_secs;
            config.min_confidence = settings.min_confidence;

            info!(endpoint = %config.endpoint, timeout_secs = config.timeout_secs, "HTTP detector ready");
            Ok(Arc::new(HttpDetector::new(config)?))
        }
    }
}

fn build_verifier(settings: &AuthSettings) -> anyhow::Result<Sha256KeyVerifier> {
    let hash = resolve_env_value(settings.api_key_hash.as_deref(), settings.api_key_hash_env.as_deref())
        .ok_or_else(|| {
            anyhow!(
                "API key hash not configured: set spec.auth.api_key_hash or {} (see `photoguardctl hash-key`)",
                settings.api_key_hash_env.as_deref().unwrap_or("api_key_hash_env")
            )
        })?;
    Ok(Sha256KeyVerifier::from_hex(&hash)?)
}

/// Execute the serve command
pub async fn execute(config_file: Option<&str>, port: Option<u16>, host: Option<&str>) -> anyhow::Result<()> {
    let config = match config_file {
        Some(path) => {
            println!("Loading configuration from: {}", path);
            ServiceConfig::load(Path::new(path))?
        }
        None => ServiceConfig::default(),
    };
    let spec = &config.spec;

    // Apply CLI overrides
    let server_port = port.unwrap_or(spec.server.port);
    let server_host = host.unwrap_or(&spec.server.host);
    let bind_addr: SocketAddr = format!("{}:{}", server_host, server_port)
        .parse()
        .map_err(|e| anyhow!("Invalid bind address: {}", e))?;

    let verifier = build_verifier(&spec.auth)?;
    let store = build_store(&spec.storage).await?;
    let detector = build_detector(&spec.detection)?;
    let pipeline = ModerationPipeline::with_config(
        Arc::new(verifier),
        store,
        detector,
        spec.pipeline.clone(),
    );

    let server = ModerationServer::with_config(
        Arc::new(pipeline),
        ServerConfig {
            bind_addr,
            enable_cors: spec.server.cors,
            max_body_size: spec.server.max_body_size,
        },
    );

    println!("Starting PhotoGuard moderation service");
    println!("  Bind address: {}", bind_addr);
    println!("  Classify endpoint: POST http://{}/", bind_addr);
    println!("  Health check: http://{}/health", bind_addr);
    println!("Press Ctrl+C to stop");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        println!("\nShutdown signal received, draining in-flight requests...");
    };

    server
        .serve_with_shutdown(shutdown_signal)
        .await
        .map_err(|e| anyhow!("Server error: {}", e))?;

    println!("Server stopped gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoguard_runtime::hash_api_key;

    #[test]
    fn test_defaults_without_file() {
        let config = ServiceConfig::default();
        assert_eq!(config.spec.server.port, 8080);
        assert_eq!(config.spec.server.host, "0.0.0.0");
        assert_eq!(config.spec.server.max_body_size, 10 * 1024 * 1024);
        assert_eq!(config.spec.pipeline.deadline_ms, 300_000);
        assert_eq!(config.spec.storage.backend, StorageBackend::Memory);
        assert_eq!(config.spec.detection.backend, DetectionBackend::Http);
        assert_eq!(config.spec.detection.timeout_secs, 30);
        assert_eq!(config.spec.auth.api_key_hash_env.as_deref(), Some("API_KEY_HASH"));
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
apiVersion: photoguard.dev/v1
kind: ServiceConfig
metadata:
  name: staging
spec:
  server:
    port: 9090
    cors: false
  pipeline:
    deadline_ms: 1500
  storage:
    backend: file
    bucket: uploads
    root: /var/lib/photoguard
  detection:
    backend: http
    endpoint: http://moderation.internal/detect
    api_token_env: DETECTION_TOKEN
    min_confidence: 50
  auth:
    api_key_hash: 62af8704764faf8ea82fc61ce9c4c3908b6cb97d463a634e9e587d7c885db0ef
"#;
        let config = ServiceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.metadata.name.as_deref(), Some("staging"));
        assert_eq!(config.spec.server.port, 9090);
        assert_eq!(config.spec.server.host, "0.0.0.0");
        assert!(!config.spec.server.cors);
        assert_eq!(config.spec.pipeline.deadline(), std::time::Duration::from_millis(1500));
        assert_eq!(config.spec.storage.backend, StorageBackend::File);
        assert_eq!(config.spec.storage.root, PathBuf::from("/var/lib/photoguard"));
        assert_eq!(config.spec.detection.min_confidence, Some(50.0));
        assert_eq!(config.spec.detection.endpoint_env.as_deref(), Some("DETECTION_ENDPOINT"));
    }

    #[test]
    fn test_type_error_reports_field_path() {
        let yaml = "spec:\n  pipeline:\n    deadline_ms: soon\n";
        let err = ServiceConfig::from_yaml(yaml).unwrap_err().to_string();
        assert!(err.contains("spec.pipeline.deadline_ms"), "{}", err);
    }

    #[test]
    fn test_zero_deadline_rejected_on_load() {
        let yaml = "spec:\n  pipeline:\n    deadline_ms: 0\n";
        let err = ServiceConfig::from_yaml(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("deadline"), "{:#}", err);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let yaml = "spec:\n  storage:\n    backend: s3\n";
        assert!(ServiceConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_resolve_env_value_prefers_direct() {
        assert_eq!(
            resolve_env_value(Some("direct"), Some("PATH")),
            Some("direct".to_string())
        );
        assert_eq!(
            resolve_env_value(None, Some("PHOTOGUARD_TEST_SURELY_UNSET_VAR")),
            None
        );
        assert_eq!(resolve_env_value(None, None), None);
    }

    #[test]
    fn test_direct_bucket_wins() {
        let settings = StorageSettings {
            bucket: Some("uploads".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_bucket(&settings), "uploads");
    }

    #[test]
    fn test_build_verifier() {
        let settings = AuthSettings {
            api_key_hash: Some(hash_api_key("s3cret")),
            api_key_hash_env: None,
        };
        assert!(build_verifier(&settings).is_ok());

        let missing = AuthSettings {
            api_key_hash: None,
            api_key_hash_env: Some("PHOTOGUARD_TEST_SURELY_UNSET_VAR".to_string()),
        };
        assert!(build_verifier(&missing).is_err());

        let bad = AuthSettings {
            api_key_hash: Some("zz".to_string()),
            api_key_hash_env: None,
        };
        assert!(build_verifier(&bad).is_err());
    }

    #[test]
    fn test_build_detector() {
        let static_settings = DetectionSettings {
            backend: DetectionBackend::Static,
            labels: vec![Label::new("Violence", 99.0)],
            ..Default::default()
        };
        assert_eq!(build_detector(&static_settings).unwrap().name(), "static");

        let unconfigured = DetectionSettings {
            endpoint_env: Some("PHOTOGUARD_TEST_SURELY_UNSET_VAR".to_string()),
            ..Default::default()
        };
        assert!(build_detector(&unconfigured).is_err());

        let http = DetectionSettings {
            endpoint: Some("http://127.0.0.1:9/detect".to_string()),
            ..Default::default()
        };
        assert!(build_detector(&http).is_ok());
    }

    #[tokio::test]
    async fn test_build_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StorageSettings {
            backend: StorageBackend::File,
            bucket: Some("uploads".to_string()),
            bucket_env: None,
            root: dir.path().to_path_buf(),
        };
        let store = build_store(&settings).await.unwrap();
        assert_eq!(store.bucket(), "uploads");
        assert!(dir.path().join("uploads").is_dir());
    }
}
