use serde::{Deserialize, Serialize};

use crate::camera::CameraConfig;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "wormgrid.ron";

/// External link shown in the bottom-right corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterLink {
    pub label: String,
    pub url: String,
}

impl FooterLink {
    fn new(label: &str, url: &str) -> Self {
        Self {
            label: label.to_string(),
            url: url.to_string(),
        }
    }
}

/// Viewer settings. Every field has a default, so a partial file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend root; `/api/rpc` and `/api/recent` are resolved against it.
    pub base_url: String,
    /// Seconds between polls.
    pub poll_interval_secs: u64,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    pub camera: CameraConfig,
    pub window_width: u32,
    pub window_height: u32,
    /// TrueType/OpenType font. Common system fonts are tried if this fails.
    pub font_path: String,
    /// PNG drawn at the agent position.
    pub agent_image_path: String,
    /// Target of the "whitepaper" link in the detail dialog.
    pub whitepaper_url: String,
    /// Transaction explorer; the signature is appended as a path segment.
    pub explorer_base: String,
    pub footer_links: Vec<FooterLink>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            poll_interval_secs: 60,
            request_timeout_secs: 10,
            camera: CameraConfig::default(),
            window_width: 1280,
            window_height: 800,
            font_path: "assets/fonts/DejaVuSans.ttf".to_string(),
            agent_image_path: "assets/worm.png".to_string(),
            whitepaper_url: "http://localhost:3000/whitepaper.pdf".to_string(),
            explorer_base: "https://solscan.io/tx".to_string(),
            footer_links: vec![
                FooterLink::new("GitHub", "https://github.com/deep-worm"),
                FooterLink::new("X", "https://x.com/thedeepworm_"),
                FooterLink::new("Telegram", "https://t.me/thedeepworm"),
                FooterLink::new("Chart", "https://dexscreener.com/"),
            ],
        }
    }
}

impl Config {
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Read `path`, falling back to defaults with a warning if it is missing
    /// or malformed.
    pub fn load(path: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("failed to read {}: {}, using default config", path, e);
                return Self::default();
            }
        };
        match Self::from_ron(&content) {
            Ok(config) => {
                log::info!("loaded config from {}", path);
                config
            }
            Err(e) => {
                log::warn!("failed to parse RON {}: {}, using default config", path, e);
                Self::default()
            }
        }
    }

    /// Config path from the first CLI argument, else `wormgrid.ron`.
    pub fn path_from_args(mut args: impl Iterator<Item = String>) -> String {
        args.nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = Config::from_ron(r#"(base_url: "https://worm.example", poll_interval_secs: 5)"#)
            .expect("parse");
        assert_eq!(cfg.base_url, "https://worm.example");
        assert_eq!(cfg.poll_interval_secs, 5);
        assert_eq!(cfg.explorer_base, "https://solscan.io/tx");
        assert_eq!(cfg.camera, CameraConfig::default());
    }

    #[test]
    fn nested_camera_section() {
        let cfg = Config::from_ron("(camera: (min_cell_size: 2.0, wheel_zoom_factor: 1.1))")
            .expect("parse");
        assert_eq!(cfg.camera.min_cell_size, 2.0);
        assert_eq!(cfg.camera.wheel_zoom_factor, 1.1);
        assert_eq!(cfg.camera.max_cell_size, 400.0);
    }

    #[test]
    fn footer_links_can_be_replaced() {
        let cfg = Config::from_ron(r#"(footer_links: [(label: "Docs", url: "https://docs.example")])"#)
            .expect("parse");
        assert_eq!(cfg.footer_links, vec![FooterLink::new("Docs", "https://docs.example")]);
        assert_eq!(Config::default().footer_links.len(), 4);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::from_ron("(base_url: 42").is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let cfg = Config::load("/nonexistent/wormgrid.ron");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn path_from_args_prefers_first_argument() {
        let args = ["wormgrid", "custom.ron"].into_iter().map(String::from);
        assert_eq!(Config::path_from_args(args), "custom.ron");
        let none = ["wormgrid"].into_iter().map(String::from);
        assert_eq!(Config::path_from_args(none), DEFAULT_CONFIG_PATH);
    }
}
