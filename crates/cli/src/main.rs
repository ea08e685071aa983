use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use gatekeeper_core::detection::infrastructure::replay_detection_adapter::ReplayDetectionAdapter;
use gatekeeper_core::detection::infrastructure::replay_recording::ReplayRecording;
use gatekeeper_core::events::domain::event_sink::EventSink;
use gatekeeper_core::events::infrastructure::channel_event_sink::{
    spawn_event_writer, ChannelEventSink, DEFAULT_EVENT_CHANNEL_CAPACITY,
};
use gatekeeper_core::events::infrastructure::json_lines_event_sink::JsonLinesEventSink;
use gatekeeper_core::events::infrastructure::log_event_sink::LogEventSink;
use gatekeeper_core::identity::domain::embedding::Embedding;
use gatekeeper_core::identity::domain::registry_cache::RegistryCache;
use gatekeeper_core::identity::infrastructure::json_registry_store::JsonRegistryStore;
use gatekeeper_core::pipeline::camera_pipeline::CameraPipeline;
use gatekeeper_core::pipeline::config::GatekeeperConfig;
use gatekeeper_core::pipeline::infrastructure::threaded_camera_supervisor::{
    CameraJob, ThreadedCameraSupervisor,
};
use gatekeeper_core::pipeline::pipeline_logger::LogPipelineLogger;
use gatekeeper_core::shared::ids::{CameraId, SubjectId};
use gatekeeper_core::video::infrastructure::replay_frame_source::ReplayFrameSource;

#[derive(Parser)]
#[command(
    name = "gatekeeper",
    about = "Track people at a gate, identify them against a face registry and emit access events"
)]
struct Cli {
    /// Config file (default: <config dir>/gatekeeper/config.json if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Registry file (default: <data dir>/gatekeeper/registry.json).
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one pipeline per camera over recorded detections.
    Watch {
        /// Camera as `<id>=<recording.jsonl>`. Repeat for several cameras.
        #[arg(long = "camera", value_parser = parse_camera, required = true)]
        cameras: Vec<(CameraId, PathBuf)>,

        /// Write events as JSON lines to this file instead of stdout.
        #[arg(long)]
        events: Option<PathBuf>,

        /// Send events to the log instead of JSON lines.
        #[arg(long, conflicts_with = "events")]
        log_events: bool,

        /// Skip identity resolution; every person ends up unknown.
        #[arg(long)]
        no_registry: bool,
    },
    /// Register a face embedding under a name.
    Register {
        name: String,

        /// JSON file holding the embedding as an array of numbers.
        #[arg(long)]
        embedding: PathBuf,

        /// Reference photo to keep alongside the subject.
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Remove a registered subject by id.
    Delete { id: u64 },
    /// List registered subjects.
    List,
    /// Print the effective configuration.
    Config,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = GatekeeperConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Watch {
            cameras,
            events,
            log_events,
            no_registry,
        } => {
            let registry = if no_registry {
                None
            } else {
                Some(open_registry(cli.registry, &config)?)
            };
            let output: Box<dyn EventSink> = match events {
                _ if log_events => Box::new(LogEventSink),
                Some(path) => Box::new(JsonLinesEventSink::new(BufWriter::new(File::create(path)?))),
                None => Box::new(JsonLinesEventSink::new(io::stdout())),
            };
            run_watch(&config, cameras, output, registry)
        }
        Command::Register {
            name,
            embedding,
            photo,
        } => {
            let registry = open_registry(cli.registry, &config)?;
            let embedding = read_embedding(&embedding)?;
            let id = registry.register(&name, &embedding, photo.as_deref())?;
            println!("Registered '{}' as subject {id}", name.trim());
            Ok(())
        }
        Command::Delete { id } => {
            let registry = open_registry(cli.registry, &config)?;
            registry.delete(SubjectId(id))?;
            println!("Deleted subject {id}");
            Ok(())
        }
        Command::List => {
            let registry = open_registry(cli.registry, &config)?;
            let subjects = registry.subjects()?;
            if subjects.is_empty() {
                println!("No registered subjects");
            }
            for subject in subjects {
                println!(
                    "{:>4}  {}  ({} template{})",
                    subject.id,
                    subject.name,
                    subject.embeddings.len(),
                    if subject.embeddings.len() == 1 { "" } else { "s" }
                );
            }
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn run_watch(
    config: &GatekeeperConfig,
    cameras: Vec<(CameraId, PathBuf)>,
    output: Box<dyn EventSink>,
    registry: Option<Arc<RegistryCache>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut recordings = Vec::with_capacity(cameras.len());
    for (camera_id, path) in cameras {
        let recording = Arc::new(ReplayRecording::load(&path)?);
        log::info!(
            "Camera {camera_id}: {} recorded frames from {}",
            recording.len(),
            path.display()
        );
        recordings.push((camera_id, recording));
    }

    let (sink, rx) = ChannelEventSink::bounded(DEFAULT_EVENT_CHANNEL_CAPACITY);
    let writer = spawn_event_writer(rx, output);

    let mut supervisor = ThreadedCameraSupervisor::new(config.runtime.reconnect_backoff);
    for (camera_id, recording) in recordings {
        let pipeline = CameraPipeline::new(
            camera_id.clone(),
            config,
            Box::new(ReplayDetectionAdapter::new(recording.clone())),
            registry.clone(),
            Box::new(sink.clone()),
            Box::new(LogPipelineLogger::new(
                camera_id.as_str(),
                config.runtime.progress_every_frames,
            )),
        );
        supervisor.spawn(CameraJob {
            pipeline,
            source: Box::new(ReplayFrameSource::new(recording)),
        })?;
    }
    drop(sink);

    let summaries = supervisor.join();
    let written = writer
        .join()
        .map_err(|_| "event writer thread panicked")?;

    let frames: usize = summaries.iter().map(|s| s.frames).sum();
    log::info!(
        "Processed {frames} frames on {} camera(s), wrote {written} events",
        summaries.len()
    );
    Ok(())
}

fn open_registry(
    path: Option<PathBuf>,
    config: &GatekeeperConfig,
) -> Result<Arc<RegistryCache>, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path,
        None => JsonRegistryStore::default_path().ok_or("cannot determine data directory")?,
    };
    log::debug!("Using registry {}", path.display());
    Ok(Arc::new(RegistryCache::new(
        Arc::new(JsonRegistryStore::new(path)),
        config.identity.registry_ttl,
        config.identity.duplicate_threshold,
    )))
}

fn read_embedding(path: &Path) -> Result<Embedding, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("cannot read embedding {}: {e}", path.display()))?;
    let values: Vec<f32> = serde_json::from_str(&json)
        .map_err(|e| format!("invalid embedding {}: {e}", path.display()))?;
    Ok(Embedding::new(values))
}

fn parse_camera(arg: &str) -> Result<(CameraId, PathBuf), String> {
    let (id, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <id>=<path>, got '{arg}'"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("camera id is empty in '{arg}'"));
    }
    if path.is_empty() {
        return Err(format!("recording path is empty in '{arg}'"));
    }
    Ok((CameraId::new(id), PathBuf::from(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camera_splits_on_first_equals() {
        let (id, path) = parse_camera("gate=/tmp/a=b.jsonl").unwrap();
        assert_eq!(id, CameraId::new("gate"));
        assert_eq!(path, PathBuf::from("/tmp/a=b.jsonl"));
    }

    #[test]
    fn test_parse_camera_rejects_missing_parts() {
        assert!(parse_camera("gate").is_err());
        assert!(parse_camera("=rec.jsonl").is_err());
        assert!(parse_camera("gate=").is_err());
    }

    #[test]
    fn test_cli_parses_watch_with_several_cameras() {
        let cli = Cli::try_parse_from([
            "gatekeeper",
            "--registry",
            "reg.json",
            "watch",
            "--camera",
            "north=n.jsonl",
            "--camera",
            "south=s.jsonl",
        ])
        .unwrap();
        assert_eq!(cli.registry, Some(PathBuf::from("reg.json")));
        match cli.command {
            Command::Watch { cameras, .. } => assert_eq!(cameras.len(), 2),
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_watch_requires_a_camera() {
        assert!(Cli::try_parse_from(["gatekeeper", "watch"]).is_err());
    }
}
