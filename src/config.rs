use serde::{Deserialize, Serialize};

use crate::error::RenderResult;

/// Per-application rendering settings.
///
/// ```yaml
/// static_url: /static/shop
/// static_path: /srv/shop/static
/// url: /shop
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// URL prefix of the static contents (css, js, images)
    pub static_url: String,
    /// Filesystem directory of the static contents (templates)
    pub static_path: String,
    /// URL prefix of the application
    pub url: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            static_url: String::new(),
            static_path: String::new(),
            url: "/".to_string(),
        }
    }
}

impl RenderConfig {
    /// Parse a YAML configuration block. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> RenderResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RenderConfig::from_yaml("static_url: /static/app\n").unwrap();
        assert_eq!(config.static_url, "/static/app");
        assert_eq!(config.static_path, "");
        assert_eq!(config.url, "/");
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(RenderConfig::from_yaml("").unwrap(), RenderConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = RenderConfig::from_yaml("url: [unclosed");
        assert!(matches!(result, Err(RenderError::ConfigError(_))));
    }
}
