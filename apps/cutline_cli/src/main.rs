use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use cutline_core::config::EngineConfig;
use cutline_core::types::{AssetOrigin, DropTime, SourceHandle, TrackId};
use cutline_core::{CoreError, Timeline};
use cutline_probe::ProbeQueue;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

/// Lay media files end to end on a track and print the edit decision list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media files, in timeline order
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Track to place the clips on
    #[arg(short = 't', long = "track", value_name = "ID", default_value_t = 0)]
    track: u32,

    /// Engine config (JSON); missing fields take their defaults
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Write the EDL here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print the effective config and exit
    #[arg(long = "print-config")]
    print_config: bool,
}

/// Import each asset and auto-place it on `track`. Assets too short to make
/// a clip are skipped. Returns the number of clips placed.
fn lay_out(
    timeline: &mut Timeline,
    assets: Vec<(Uuid, String)>,
    track: TrackId,
) -> Result<usize, CoreError> {
    let mut placed = 0;
    for (asset, name) in assets {
        let clip = match timeline.import_as_clip(asset, name.as_str()) {
            Ok(clip) => clip,
            Err(CoreError::AssetTooShort(_)) => {
                tracing::warn!("Skipping {}: shorter than the minimum clip duration", name);
                continue;
            }
            Err(e) => return Err(e),
        };
        timeline.place_on_timeline(clip, track, DropTime::Auto)?;
        placed += 1;
    }
    Ok(placed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let track = TrackId(args.track);
    if !config.has_track(track) {
        bail!("{track} is not configured");
    }
    if args.files.is_empty() {
        bail!("no input files");
    }

    let mut timeline = Timeline::new(config);
    let mut queue = ProbeQueue::new();
    let mut assets = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let asset = timeline.add_asset(SourceHandle::Path(path.clone()), &name, AssetOrigin::Imported);
        queue.submit(asset, path.clone());
        assets.push((asset, name));
    }

    let probed = queue.drain_into(&mut timeline).await;
    tracing::info!("Probed {} file(s)", probed);

    let placed = lay_out(&mut timeline, assets, track)?;
    if placed == 0 {
        bail!("no usable input files");
    }

    let edl = timeline.edit_decision_list(&[track])?;
    tracing::info!(
        "{} clip(s), total {}",
        edl.entries.len(),
        edl.total_duration()
    );

    let rendered = match args.format {
        Format::Json => edl.to_json()?,
        Format::Csv => edl.to_csv(),
    };
    match &args.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{rendered}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_core::types::TimeUs;

    #[test]
    fn lay_out_skips_assets_below_minimum() {
        let mut timeline = Timeline::default();
        let mut assets = Vec::new();
        for (name, seconds) in [("a.mp4", 2.0), ("blip.mp4", 0.04), ("b.mp4", 3.0)] {
            let id = timeline.add_asset(SourceHandle::Uri(name.into()), name, AssetOrigin::Imported);
            timeline.set_asset_duration(id, TimeUs::from_seconds(seconds));
            assets.push((id, name.to_string()));
        }

        assert_eq!(lay_out(&mut timeline, assets, TrackId::MAIN).unwrap(), 2);
        let edl = timeline.edit_decision_list(&[TrackId::MAIN]).unwrap();
        assert_eq!(edl.entries.len(), 2);
        assert_eq!(edl.total_duration(), TimeUs::from_seconds(5.0));
    }
}
