use std::env;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "imagen-4.0-generate-001";

/// Process configuration, read once at startup and handed to the components.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` switches the layout client into mock mode.
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            api_key: non_empty("API_KEY").or_else(|| non_empty("GEMINI_API_KEY")),
            api_base: non_empty("GEMINI_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            model: non_empty("IMAGEN_MODEL").unwrap_or(defaults.model),
            port: non_empty("PORT").and_then(|v| v.parse().ok()).unwrap_or(defaults.port),
        }
    }

    pub fn mock_mode(&self) -> bool {
        self.api_key.is_none()
    }
}
