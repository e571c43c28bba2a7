use std::{fs, path::Path};

use serde::Deserialize;

use crate::{EdgeflowError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// how route names are chosen when a page is saved
    pub route_naming: RouteNaming,
    /// rendering hint for parallel routes
    pub curviness: CurvinessConfig,
    /// capacity of each view port queue, defaults to 256
    pub queue_size: usize,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteNaming {
    /// recompute `{source}To{target}` names on every save
    #[default]
    Derived,
    /// keep the manifest name of routes that were not edited
    Stable,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CurvinessConfig {
    pub base: u32,
    pub offset: u32,
}

impl Default for CurvinessConfig {
    fn default() -> Self {
        Self {
            base: 50,
            offset: 30,
        }
    }
}

impl CurvinessConfig {
    /// curviness of the `nth` parallel route between one source and target
    pub fn nth(
        &self,
        nth: usize,
    ) -> u32 {
        let nth = u32::try_from(nth).unwrap_or(u32::MAX);
        self.base.saturating_add(self.offset.saturating_mul(nth))
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            route_naming: RouteNaming::default(),
            curviness: CurvinessConfig::default(),
            queue_size: 256,
        }
    }
}

impl EditorConfig {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| EdgeflowError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<EditorConfig>(toml_str)?;
        if config.queue_size == 0 {
            return Err(EdgeflowError::Config("queue_size must be greater than 0".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use crate::{EditorConfig, RouteNaming};

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        route_naming = "stable"
        queue_size = 16
        [curviness]
        base = 80
        offset = 10
        "#;
        let config = EditorConfig::load_from_str(toml_str).unwrap();
        assert_eq!(config.route_naming, RouteNaming::Stable);
        assert_eq!(config.queue_size, 16);
        assert_eq!(config.curviness.nth(0), 80);
        assert_eq!(config.curviness.nth(2), 100);
    }

    #[test]
    fn test_config_defaults() {
        let config = EditorConfig::load_from_str("").unwrap();
        assert_eq!(config.route_naming, RouteNaming::Derived);
        assert_eq!(config.queue_size, 256);
        assert_eq!(config.curviness.nth(1), 80);
    }

    #[test]
    fn test_curviness_saturates() {
        let config = EditorConfig::load_from_str("[curviness]\noffset = 3000000000").unwrap();
        assert_eq!(config.curviness.nth(1), 3_000_000_050);
        assert_eq!(config.curviness.nth(2), u32::MAX);
        assert_eq!(config.curviness.nth(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(EditorConfig::load_from_str("route_naming = \"random\"").is_err());
        assert!(EditorConfig::load_from_str("queue_size = 0").is_err());
    }
}
