mod logic;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    CatalogSource, RunRecord, SimulationConfig, aggregate, parse_strategies, resolve_seed_inputs,
    simulate,
};
use util::split_csv;
use wheelrun_game::{GameEngine, RunConfig};

#[derive(Debug, Parser)]
#[command(name = "wheelrun-tester", version)]
#[command(about = "Headless run simulator and catalog auditor for the Wheelrun game logic")]
struct Args {
    /// Seeds to run (comma-separated; ranges like 1..10 allowed)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Strategies to play (cautious,greedy,reviver,random or all)
    #[arg(long, default_value = "all")]
    strategy: String,

    /// Consecutive runs per seed and strategy
    #[arg(long, default_value_t = 10)]
    runs: u32,

    /// Last level of each run
    #[arg(long, default_value_t = 60)]
    max_level: u32,

    /// Zone catalog JSON to use instead of the bundled one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print every finished run
    #[arg(short, long)]
    verbose: bool,

    /// Audit the catalog and exit non-zero if it has defects
    #[arg(long)]
    audit: bool,
}

impl Args {
    fn catalog_source(&self) -> CatalogSource {
        self.catalog
            .clone()
            .map_or(CatalogSource::Bundled, CatalogSource::File)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    if args.audit {
        let clean = run_audit(&args)?;
        if !clean {
            std::process::exit(1);
        }
        return Ok(());
    }

    let start_time = Instant::now();
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let strategies = parse_strategies(&split_csv(&args.strategy))?;
    let catalog = args.catalog_source();

    println!(
        "{} {} seed(s) × {} strateg(ies) × {} run(s)",
        "🎲".bold(),
        seeds.len(),
        strategies.len(),
        args.runs
    );

    let mut records: Vec<RunRecord> = Vec::new();
    for &strategy in &strategies {
        for &seed in &seeds {
            let config = SimulationConfig::new(strategy, seed)
                .with_runs(args.runs)
                .with_max_level(args.max_level);
            let batch = simulate(&config, &catalog)
                .with_context(|| format!("simulating {strategy} with seed {seed}"))?;
            if args.verbose {
                for record in &batch {
                    println!(
                        "   [{} seed {}] run {} {:?} at level {} (banked {})",
                        strategy.label().green(),
                        seed,
                        record.run,
                        record.outcome,
                        record.final_level,
                        record.banked_total
                    );
                }
            }
            records.extend(batch);
        }
    }

    write_reports(&args, &records, start_time)
}

fn announce_banner() {
    println!("{}", "🎡 Wheelrun Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn run_audit(args: &Args) -> Result<bool> {
    let config = RunConfig {
        max_level: args.max_level,
        ..RunConfig::default()
    };
    let engine = GameEngine::new(args.catalog_source(), config);
    let issues = engine.audit_catalog()?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    if issues.is_empty() {
        writeln!(output_target.writer(), "✅ Catalog audit passed")?;
    } else {
        writeln!(
            output_target.writer(),
            "❌ Catalog audit found {} issue(s):",
            issues.len()
        )?;
        for issue in &issues {
            writeln!(output_target.writer(), "  • {issue}")?;
        }
    }
    output_target.flush_inner()?;
    Ok(issues.is_empty())
}

fn write_reports(args: &Args, records: &[RunRecord], start_time: Instant) -> Result<()> {
    let aggregates = aggregate(records);
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, records, &aggregates)?,
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, &aggregates)?,
        _ => {
            logic::reports::generate_console_report(&mut output_target, records, &aggregates)?;
            let duration = start_time.elapsed();
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
