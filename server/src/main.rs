//! Server binary: thin wiring around the core.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bookwire_protocol::{Facility, FacilityType};
use bookwire_server::{
    BookingEngine, DedupCache, Dispatcher, FacilityCatalog, MonitoringService, Server,
    ServerConfig,
};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "bookwire-server", about = "Facility-booking server over UDP")]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::default(),
    };

    let catalog = Arc::new(FacilityCatalog::new());
    let engine = Arc::new(BookingEngine::new());
    for entry in catalog_entries(&config) {
        engine.add_facility(entry.id).await;
        catalog.insert(entry).await;
    }

    let monitoring = Arc::new(MonitoringService::new(Arc::clone(&catalog)).await?);
    let dispatcher = Arc::new(Dispatcher::new(engine, catalog, monitoring));
    let dedup = Arc::new(DedupCache::new());

    let server = Server::bind(&config, dispatcher, dedup).await?;
    server.run().await?;
    Ok(())
}

/// Catalog records from the config, or a small built-in set so the server
/// is usable without one.
fn catalog_entries(config: &ServerConfig) -> Vec<Facility> {
    if config.facilities.is_empty() {
        return vec![
            Facility::new(1, "Meeting Room 1", FacilityType::MeetingRoom),
            Facility::new(2, "Classroom 2A", FacilityType::StandardClassroom),
            Facility::new(3, "Lecture Theater East", FacilityType::LectureTheater),
            Facility::new(4, "Study Pod 12", FacilityType::StudyPod),
            Facility::new(5, "Football Court", FacilityType::FootballCourt),
            Facility::new(6, "Badminton Court 3", FacilityType::BadmintonCourt),
            Facility::new(7, "Badminton Court 4", FacilityType::BadmintonCourt),
        ];
    }
    config
        .facilities
        .iter()
        .map(|entry| Facility::new(entry.id, entry.name.clone(), FacilityType::from(entry.kind)))
        .collect()
}
