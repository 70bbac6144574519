use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub live: LiveConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_bands")]
    pub bands: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct LiveConfig {
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
        }
    }
}

fn default_bands() -> usize {
    8
}

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analysis.bands, 8);
        assert!(config.live.device.is_none());
    }

    #[test]
    fn parses_partial_sections() {
        let config: Config = toml::from_str(
            "[analysis]\nbands = 12\n\n[live]\ndevice = \"usb\"\n",
        )
        .unwrap();
        assert_eq!(config.analysis.bands, 12);
        assert_eq!(config.live.device.as_deref(), Some("usb"));
    }
}
