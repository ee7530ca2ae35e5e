use std::path::PathBuf;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// TCP port to listen on (default: 5000).
    pub port: u16,
    /// Directory for per-session uploaded images.
    pub upload_dir: PathBuf,
    /// Path to the SeetaFace detection model file.
    pub model_path: PathBuf,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from `VERIFACE_*` environment variables (and
    /// `PORT`) with defaults.
    pub fn from_env() -> Self {
        Self {
            port: env_u16("PORT", 5000),
            upload_dir: std::env::var("VERIFACE_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            model_path: std::env::var("VERIFACE_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models/seeta_fd_frontal_v1.0.bin")),
            max_upload_bytes: env_usize("VERIFACE_MAX_UPLOAD_BYTES", 16 * 1024 * 1024),
        }
    }
}

fn env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
