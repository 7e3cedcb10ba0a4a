//! Branding configuration: logo, wordmark and overlay colours.

use serde::{Deserialize, Serialize};

use crate::watermark::DEFAULT_WORDMARK;

fn default_logo() -> String {
    "assets/sourceable-logo.png".to_string()
}

fn default_wordmark() -> String {
    DEFAULT_WORDMARK.to_string()
}

fn default_text_color() -> String {
    "#FFFFFF".to_string()
}

fn default_shadow_color() -> String {
    "#000000".to_string()
}

fn default_opacity() -> f32 {
    0.6
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandingConfig {
    /// Logo source: file path, https:// URL or data: URI
    #[serde(default = "default_logo")]
    pub logo: String,
    #[serde(default = "default_wordmark")]
    pub wordmark: String,
    /// Overlay text colour (#RRGGBB)
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default = "default_shadow_color")]
    pub shadow_color: String,
    /// Overlay opacity, 0.0 - 1.0
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            logo: default_logo(),
            wordmark: default_wordmark(),
            text_color: default_text_color(),
            shadow_color: default_shadow_color(),
            opacity: default_opacity(),
        }
    }
}

impl BrandingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.logo.trim().is_empty() {
            return Err("branding.logo cannot be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!(
                "branding.opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            ));
        }
        for (field, value) in [
            ("text_color", &self.text_color),
            ("shadow_color", &self.shadow_color),
        ] {
            crate::watermark::parse_hex_color(value)
                .map_err(|e| format!("branding.{}: {}", field, e))?;
        }
        Ok(())
    }
}
