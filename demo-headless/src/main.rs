use clap::Parser;
use particle_field_core::{FieldConfig, FieldConfigError, FieldSet, ParticleField};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Headless particle field demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "particle-field-demo")]
#[command(about = "Runs snow and ember particle fields without a renderer", long_about = None)]
struct Args {
    /// Simulated duration in seconds
    #[arg(short, long, default_value_t = 60.0)]
    duration: f32,

    /// Fixed time step in seconds
    #[arg(long, default_value_t = 0.016)]
    dt: f32,

    /// Report interval in seconds
    #[arg(short, long, default_value_t = 5.0)]
    report_interval: f32,

    /// JSON file mapping field names to field configurations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for reproducible runs (each field gets its own stream)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of snow particles (ignored with --config)
    #[arg(long, default_value_t = 500)]
    snow_count: usize,

    /// Number of ember particles (ignored with --config)
    #[arg(long, default_value_t = 100)]
    nether_count: usize,

    /// Check floor containment after every frame
    #[arg(short, long)]
    validate: bool,
}

#[derive(Debug)]
enum DemoError {
    InvalidStep(f32),
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Field { name: String, source: FieldConfigError },
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStep(dt) => write!(f, "time step must be finite and positive, got {dt}"),
            Self::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse { path, source } => write!(f, "cannot parse {}: {source}", path.display()),
            Self::Field { name, source } => write!(f, "field '{name}': {source}"),
        }
    }
}

impl std::error::Error for DemoError {}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the scene and returns whether every frame passed validation.
fn run(args: &Args) -> Result<bool, DemoError> {
    if !args.dt.is_finite() || args.dt <= 0.0 {
        return Err(DemoError::InvalidStep(args.dt));
    }

    println!("=== Particle Field Demo ===\n");

    let configs = match &args.config {
        Some(path) => load_configs(path)?,
        None => default_configs(args),
    };
    let fields = build_fields(configs, args.seed)?;

    for (name, field) in fields.iter() {
        let bounds = field.bounds();
        println!(
            "{name}: {} {} particles, spread ({:.1}, {:.1}, {:.1}), floor {:.1}",
            field.count(),
            field.policy().label(),
            bounds.spread().x,
            bounds.spread().y,
            bounds.spread().z,
            bounds.floor(),
        );
    }
    println!("Total particles: {}\n", fields.total_particles());

    let passed = simulate(fields, args);

    if args.validate {
        if passed {
            println!("\n  ✓ PASS: every particle stayed above its floor");
        } else {
            println!("\n  ✗ FAIL: particles found below the floor");
        }
    }

    Ok(passed)
}

fn simulate(mut fields: FieldSet, args: &Args) -> bool {
    let steps = (args.duration.max(0.0) / args.dt).ceil() as usize;
    let report_every = if args.report_interval > 0.0 {
        ((args.report_interval / args.dt).round() as usize).max(1)
    } else {
        usize::MAX
    };

    info!(steps, dt = args.dt, "Starting simulation");

    let mut violations = 0usize;
    for step in 1..=steps {
        fields.update_all(args.dt);

        if args.validate {
            for (name, field) in fields.iter() {
                let below = count_below_floor(field);
                if below > 0 {
                    warn!(field = name, step, below, "Particles below floor");
                    violations += below;
                }
            }
        }

        if step % report_every == 0 || step == steps {
            report(&fields, step as f32 * args.dt);
        }
    }

    violations == 0
}

fn report(fields: &FieldSet, time: f32) {
    println!("--- t = {time:.1}s ---");
    for (name, field) in fields.iter() {
        let stats = field.stats();
        let mean_height = if field.is_empty() {
            0.0
        } else {
            field.positions().iter().map(|p| p.y).sum::<f32>() / field.count() as f32
        };
        println!(
            "  {name:<8} recycled {:>4} this step, {:>8} total, mean height {:>6.2}, generation {}",
            stats.recycled_last_step, stats.total_recycled, mean_height, stats.generation
        );
    }
}

fn count_below_floor(field: &ParticleField) -> usize {
    let bounds = field.bounds();
    field
        .positions()
        .iter()
        .filter(|p| bounds.is_below_floor(p))
        .count()
}

fn default_configs(args: &Args) -> BTreeMap<String, FieldConfig> {
    BTreeMap::from([
        (
            "nether".to_string(),
            FieldConfig::nether().with_count(args.nether_count),
        ),
        (
            "snow".to_string(),
            FieldConfig::snow().with_count(args.snow_count),
        ),
    ])
}

fn load_configs(path: &Path) -> Result<BTreeMap<String, FieldConfig>, DemoError> {
    let text = std::fs::read_to_string(path).map_err(|source| DemoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DemoError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn build_fields(
    configs: BTreeMap<String, FieldConfig>,
    seed: Option<u64>,
) -> Result<FieldSet, DemoError> {
    let mut fields = FieldSet::new();
    for (index, (name, mut config)) in configs.into_iter().enumerate() {
        if let Some(seed) = seed {
            config = config.with_seed(seed.wrapping_add(index as u64));
        }
        let field = ParticleField::try_new(config).map_err(|source| DemoError::Field {
            name: name.clone(),
            source,
        })?;
        fields.insert(name, field);
    }
    Ok(fields)
}
