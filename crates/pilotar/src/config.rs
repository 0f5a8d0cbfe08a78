//! Harness configuration.

/// Environment variable overriding the base origin of the application under
/// test
pub const BASE_URL_ENV: &str = "PILOTAR_BASE_URL";

/// Environment variable pointing at a chromium executable
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

/// Default base origin of the application under test
pub const DEFAULT_BASE_URL: &str = "http://localhost:5138";

/// Configuration for a harness and the session it drives
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base origin of the application under test
    pub base_url: String,
    /// Run the browser headless
    pub headless: bool,
    /// Path to a chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headless: true,
            chromium_path: None,
            viewport_width: 1280,
            viewport_height: 800,
            sandbox: true,
        }
    }
}

impl HarnessConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config honoring `PILOTAR_BASE_URL` and `CHROMIUM_PATH`
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var(BASE_URL_ENV) {
            config.base_url = base;
        }
        if let Ok(path) = std::env::var(CHROMIUM_PATH_ENV) {
            config.chromium_path = Some(path);
        }
        config
    }

    /// Set the base origin
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the chromium binary path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Disable the sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Join a route path onto the base origin
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() || path == "/" {
            return base.to_string();
        }
        format!("{base}/{}", path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.headless);
        assert!(config.chromium_path.is_none());
        assert!(config.sandbox);
    }

    #[test]
    fn test_builder_chaining() {
        let config = HarnessConfig::new()
            .with_base_url("http://localhost:8080/")
            .with_headless(false)
            .with_chromium_path("/usr/bin/chromium")
            .with_viewport(800, 600)
            .with_no_sandbox();
        assert_eq!(config.base_url, "http://localhost:8080/");
        assert!(!config.headless);
        assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        assert_eq!(config.viewport_width, 800);
        assert!(!config.sandbox);
    }

    #[test]
    fn test_url_join() {
        let config = HarnessConfig::new().with_base_url("http://localhost:5138/");
        assert_eq!(
            config.url("/Spaceships/Create"),
            "http://localhost:5138/Spaceships/Create"
        );
        assert_eq!(config.url("Kindergarten"), "http://localhost:5138/Kindergarten");
        assert_eq!(config.url("/"), "http://localhost:5138");
        assert_eq!(config.url(""), "http://localhost:5138");
    }
}
