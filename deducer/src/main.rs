//! Deducer Main Entry Point
//!
//! Loads a seed database, runs the deduction and writes the resulting
//! database as JSON.

use anyhow::Context;
use deducer::{
    CachedIdGenerator, Deducer, DeducerConfig, ReduceMode, RunSettings, SeedFile,
};
use dotenv::dotenv;
use std::env;
use std::fs;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("deducer=info,incgraph=info"));

    if env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        // Logs go to stderr so the result can be piped from stdout
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .pretty(),
            )
            .init();
    }

    info!(
        service_name = "deducer",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

fn run(settings: RunSettings, config: DeducerConfig) -> anyhow::Result<()> {
    let seed = SeedFile::load(&settings.seed)
        .with_context(|| format!("failed to load seed {}", settings.seed.display()))?;
    let graph = seed.build().context("invalid seed")?;
    let table = seed.smallgraphs.table();

    let mut ids = match &settings.id_cache {
        Some(path) => CachedIdGenerator::load(path)?,
        None => CachedIdGenerator::default(),
    };
    for class in &seed.classes {
        ids.reserve(&class.id);
    }

    let mut deducer = Deducer::new(graph, &table, &mut ids, config);
    let report = deducer.find_trivial_inclusions()?;
    deducer.remove_temporaries()?;
    match settings.reduce {
        ReduceMode::None => 0,
        ReduceMode::Weighted => deducer.remove_superfluous_weighted()?,
        ReduceMode::Priority => deducer.remove_superfluous_by_priority()?,
        ReduceMode::Scc => deducer.remove_superfluous_between_sccs()?,
    };
    deducer.stamp_references()?;
    let graph = deducer.into_graph();

    let result = SeedFile::export(&graph, seed.smallgraphs.clone())?;
    let json = result.to_json()?;
    match &settings.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => println!("{json}"),
    }
    if let Some(path) = &settings.id_cache {
        ids.save(path)?;
    }

    info!(
        classes = graph.vertex_count(),
        inclusions = graph.edge_count(),
        warnings = report.len(),
        "Deduction finished"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let settings = RunSettings::from_env(env::args().nth(1))
        .context("no seed given: pass a path or set DEDUCER_SEED")?;
    let config = DeducerConfig::from_env();
    info!(seed = %settings.seed.display(), reduce = ?settings.reduce, trace = config.trace, "Starting deducer");

    run(settings, config).inspect_err(|e| error!(error = %e, "Deducer failed"))
}
