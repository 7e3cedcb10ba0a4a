use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use sourceable::config::Config;
use sourceable::geo::{format_approx, format_coarse, format_coordinates, format_exact, format_fallback, PrecisionTier};
use sourceable::timestamp::{format_timestamp, parse_capture_time, CaptureTimestamps, TimestampStyle};
use sourceable::video::PlaybackHandle;
use sourceable::watermark::{
    verification_url, MediaKind, MediaSource, RenderedMedia, WatermarkCompositor, WatermarkSpec,
};
use std::path::PathBuf;

/// Sourceable - watermark verified photo and video captures
#[derive(Parser, Debug)]
#[command(name = "sourceable")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watermark an image or video
    Render(RenderArgs),

    /// Validate a configuration file and print the effective settings
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print every coordinate form for a location
    FormatCoords {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long, default_value = "exact")]
        precision: PrecisionTier,
    },
}

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("verify").required(true).args(["verification_url", "slug"])))]
struct RenderArgs {
    /// Source media: file path, https:// URL or data: URI
    #[arg(short, long)]
    input: String,

    /// Where to write the watermarked artifact
    #[arg(short, long)]
    output: PathBuf,

    /// Full verification URL
    #[arg(long)]
    verification_url: Option<String>,

    /// Verification slug, appended to verification.base_url
    #[arg(long)]
    slug: Option<String>,

    /// Timestamp text drawn as-is
    #[arg(long, conflicts_with = "captured_at")]
    timestamp: Option<String>,

    /// Capture instant (RFC 3339); defaults to now
    #[arg(long)]
    captured_at: Option<String>,

    /// Format the capture instant in UTC
    #[arg(long)]
    utc: bool,

    #[arg(long, default_value = "exact")]
    precision: PrecisionTier,

    #[arg(long)]
    radius_miles: Option<f64>,

    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    /// Place name to show instead of a geocoded one
    #[arg(long)]
    location: Option<String>,

    /// Logo override (defaults to branding.logo)
    #[arg(long)]
    logo: Option<String>,

    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write stills as a data: URI text file instead of raw JPEG
    #[arg(long)]
    data_uri: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Render(args) => render(args).await,
        Command::CheckConfig { config } => check_config(config),
        Command::FormatCoords {
            lat,
            lng,
            precision,
        } => {
            if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
                bail!("Coordinates out of range: {}, {}", lat, lng);
            }
            let summary = json!({
                "exact": format_exact(lat, lng),
                "coarse": format_coarse(lat, lng),
                "approx": format_approx(lat, lng),
                "fallback": format_fallback(lat, lng),
                "for_tier": format_coordinates(lat, lng, precision),
                "precision": precision,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

fn check_config(path: PathBuf) -> anyhow::Result<()> {
    let config = Config::from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    config.validate().context("Configuration is invalid")?;
    println!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

fn timestamp_text(args: &RenderArgs) -> anyhow::Result<String> {
    if let Some(text) = &args.timestamp {
        return Ok(text.clone());
    }
    let style = if args.utc {
        TimestampStyle::Utc
    } else {
        TimestampStyle::Local
    };
    match &args.captured_at {
        Some(value) => {
            let at = parse_capture_time(value)
                .with_context(|| format!("Invalid --captured-at '{}'", value))?;
            Ok(format_timestamp(&at, style))
        }
        None => {
            let now = CaptureTimestamps::now();
            Ok(match style {
                TimestampStyle::Utc => now.utc,
                TimestampStyle::Local => {
                    let at = parse_capture_time(&now.local)?;
                    format_timestamp(&at, style)
                }
            })
        }
    }
}

async fn render(args: RenderArgs) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Configuration is invalid")?;

    sourceable::logging::init_subscriber(&config.logging).map_err(anyhow::Error::msg)?;

    let url = match (&args.verification_url, &args.slug) {
        (Some(url), _) => url.clone(),
        (None, Some(slug)) => verification_url(&config.verification.base_url, slug),
        (None, None) => bail!("Either --verification-url or --slug is required"),
    };

    let logo = MediaSource::parse(args.logo.as_deref().unwrap_or(&config.branding.logo))?;
    let mut spec = WatermarkSpec::new(logo, url, timestamp_text(&args)?)
        .with_precision(args.precision)
        .with_wordmark(config.branding.wordmark.clone());
    if let Some(miles) = args.radius_miles {
        spec = spec.with_radius_miles(miles);
    }
    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        spec = spec.with_gps(lat, lng);
    }
    if let Some(label) = &args.location {
        spec = spec.with_location_label(label.clone());
    }

    let compositor = WatermarkCompositor::new(&config)?;
    let source = MediaSource::parse(&args.input)?;

    let rendered = if source.kind_hint() == Some(MediaKind::Video) {
        // Ctrl-C pauses recording; the partial stream is discarded below
        let playback = PlaybackHandle::new();
        let signal_handle = playback.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal_handle.pause();
            }
        });
        RenderedMedia::Video(compositor.process_video_with(&source, &spec, &playback).await?)
    } else {
        compositor.process(&source, &spec).await?
    };

    let (width, height) = rendered.dimensions();
    let mut summary = json!({
        "kind": rendered.kind(),
        "content_type": rendered.content_type(),
        "width": width,
        "height": height,
        "bytes": rendered.data().len(),
        "output": args.output.display().to_string(),
        "precision": spec.precision,
    });

    match &rendered {
        RenderedMedia::Image(image) if args.data_uri => {
            tokio::fs::write(&args.output, image.to_data_uri()).await?;
        }
        RenderedMedia::Image(image) => {
            tokio::fs::write(&args.output, &image.data).await?;
        }
        RenderedMedia::Video(video) => {
            if !video.complete {
                bail!("Recording was interrupted after {} frames; output discarded", video.frames);
            }
            video.persist(&args.output).await?;
            summary["codec"] = json!(video.codec);
            summary["frames"] = json!(video.frames);
        }
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
