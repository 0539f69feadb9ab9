//! CLI command implementations

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use strata_context::{Bundle, BuiltBundle, ContextBuilder};
use strata_core::{ApiSurfaceClassifier, Edge, Registry, StrataConfig, UnitId};

pub struct BundleArgs {
    pub units: PathBuf,
    pub config: Option<PathBuf>,
    pub targets: Vec<String>,
    pub output: Option<PathBuf>,
    pub time_limit_ms: Option<u64>,
}

/// One output line of `strata bundle`.
#[derive(Serialize)]
struct BundleRecord<'a> {
    unit: &'a str,
    file_path: &'a Path,
    level: u8,
    size: usize,
    over_budget: bool,
    bundle: &'a Bundle,
}

impl<'a> From<&'a BuiltBundle> for BundleRecord<'a> {
    fn from(built: &'a BuiltBundle) -> Self {
        BundleRecord {
            unit: &built.unit,
            file_path: &built.file_path,
            level: built.compressed.level.ordinal(),
            size: built.compressed.size,
            over_budget: built.compressed.over_budget,
            bundle: &built.compressed.bundle,
        }
    }
}

pub fn bundle(args: BundleArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let registry = load_registry(&args.units)?;

    let mut builder = ContextBuilder::new(&registry, &config)
        .context("Failed to set up context builder")?;
    if let Some(ms) = args.time_limit_ms {
        builder = builder.with_time_limit(Duration::from_millis(ms));
    }

    let targets = resolve_targets(&registry, &args.targets)?;
    tracing::info!(
        "Building {} bundles (budget {}, measure {})",
        targets.len(),
        config.budget.budget,
        builder.compressor().measure_name()
    );

    let built = builder.build_all(&targets).context("Bundle scan aborted")?;

    let over = built.iter().filter(|b| b.compressed.over_budget).count();
    let compressed = built
        .iter()
        .filter(|b| b.compressed.level.ordinal() > 0)
        .count();
    tracing::info!(
        "Built {} bundles: {} compressed, {} over budget",
        built.len(),
        compressed,
        over
    );

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Cannot create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    for item in &built {
        serde_json::to_writer(&mut writer, &BundleRecord::from(item))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    Ok(())
}

#[derive(Serialize)]
struct InspectReport<'a> {
    unit: &'a str,
    file_path: &'a Path,
    lines: [u32; 2],
    surface: String,
    is_public_api: bool,
    relations: Vec<RelationView<'a>>,
}

#[derive(Serialize)]
struct RelationView<'a> {
    kind: String,
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
}

impl<'a> RelationView<'a> {
    fn new(registry: &'a Registry, edge: &'a Edge) -> Self {
        RelationView {
            kind: format!("{:?}", edge.kind),
            source: &registry.unit(edge.source).name,
            target: &registry.unit(edge.target).name,
            hint: edge.hint.as_deref(),
        }
    }
}

pub fn inspect(units: &Path, config: Option<&Path>, name: &str) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let registry = load_registry(units)?;
    let builder = ContextBuilder::new(&registry, &config)
        .context("Failed to set up context builder")?;

    let target = registry
        .resolve(name)
        .with_context(|| format!("No unit named '{name}'"))?;
    if registry.lookup_all(name).len() > 1 {
        tracing::warn!(
            "{} units are named '{}'; showing the first",
            registry.lookup_all(name).len(),
            name
        );
    }

    let assembly = builder.assemble(target)?;
    let edges = builder.relations(target)?;
    let unit = registry.unit(target);

    let report = InspectReport {
        unit: &unit.name,
        file_path: &unit.file_path,
        lines: [unit.start_line, unit.end_line],
        surface: format!("{:?}", assembly.surface),
        is_public_api: assembly.surface.is_public(),
        relations: edges.iter().map(|e| RelationView::new(&registry, e)).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

pub fn print_config() -> anyhow::Result<()> {
    let config = StrataConfig::default();
    // Fail early if the defaults ever stop compiling into a classifier.
    ApiSurfaceClassifier::new(&config.surface)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<StrataConfig> {
    match path {
        Some(path) => StrataConfig::load(path)
            .with_context(|| format!("Invalid configuration in {}", path.display())),
        None => Ok(StrataConfig::default()),
    }
}

fn load_registry(path: &Path) -> anyhow::Result<Registry> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read units from {}", path.display()))?;
    let registry = Registry::from_json_str(&text)
        .with_context(|| format!("Malformed unit list in {}", path.display()))?;
    tracing::info!("Loaded {} units from {}", registry.len(), path.display());
    Ok(registry)
}

/// Every unit when `names` is empty, otherwise every unit carrying one of
/// `names`, in registry order.
fn resolve_targets(registry: &Registry, names: &[String]) -> anyhow::Result<Vec<UnitId>> {
    if names.is_empty() {
        return Ok(registry.ids().collect());
    }
    for name in names {
        if registry.lookup_all(name).is_empty() {
            anyhow::bail!("No unit named '{name}'");
        }
    }
    Ok(registry
        .iter()
        .filter(|(_, unit)| names.contains(&unit.name))
        .map(|(id, _)| id)
        .collect())
}
