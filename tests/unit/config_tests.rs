// Configuration loading tests

use sourceable::config::{Config, ConfigError, LogFormat};
use sourceable::watermark::WatermarkCompositor;
use std::io::Write;

fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config_file() {
    let file = write_config(
        r##"
branding:
  logo: https://cdn.example.com/logo.png
  wordmark: Sourceable
  text_color: "#F0F0F0"
  opacity: 0.8
image:
  jpeg_quality: 90
video:
  max_long_edge: 1280
  max_short_edge: 720
  fallback_fps: 24
geocoding:
  enabled: true
  timeout_secs: 3
sources:
  allow_remote: true
  allow_insecure_http: true
verification:
  base_url: https://verify.example.com
logging:
  format: pretty
  level: debug
"##,
    );

    let config = Config::from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.branding.opacity, 0.8);
    assert_eq!(config.image.jpeg_quality, 90);
    assert_eq!(config.video.max_long_edge, 1280);
    assert_eq!(config.video.fallback_fps, 24.0);
    assert!(config.geocoding.enabled);
    assert!(config.sources.allow_insecure_http);
    assert_eq!(config.verification.base_url, "https://verify.example.com");
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_missing_file_is_read_error() {
    let err = Config::from_file("/nonexistent/sourceable.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("/nonexistent/sourceable.yaml"));
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let err = Config::from_yaml_with_env("video: [unclosed").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_load_without_path_uses_defaults() {
    let config = Config::load(None).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_validation_errors_name_the_field() {
    let config = Config::from_yaml_with_env("video:\n  fallback_fps: 0\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("fallback_fps"));

    let config = Config::from_yaml_with_env("branding:\n  shadow_color: black\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("shadow_color"));
}

/// Test: A compositor cannot be built from an invalid colour
#[test]
fn test_compositor_rejects_bad_branding() {
    let config = Config::from_yaml_with_env("branding:\n  text_color: white\n").unwrap();
    let err = WatermarkCompositor::new(&config).err().unwrap();
    assert_eq!(err.kind(), "config");
}

#[test]
fn test_effective_config_round_trips() {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    assert_eq!(Config::from_yaml_with_env(&yaml).unwrap(), config);
}
