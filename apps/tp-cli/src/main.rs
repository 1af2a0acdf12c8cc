use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tp_app::{
    AppResult, RunOptions, RunProgressEvent, RunRequest, query, run_service, study_service,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tp-cli")]
#[command(about = "tpload CLI - phosphorus load mitigation and network routing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a study file and its input tables
    Validate {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
    },
    /// Run every scenario of a study
    Run {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List cached runs for a study
    Runs {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
        /// Run ID to display
        run_id: String,
        /// Number of reaches listed per variant
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Export per-reach records of a run as CSV
    Export {
        /// Path to the study YAML or JSON file
        study_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only export this scenario
        #[arg(long)]
        scenario: Option<String>,
    },
}

fn main() -> AppResult<()> {
    // Logs go to stderr so CSV on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { study_path } => cmd_validate(&study_path),
        Commands::Run {
            study_path,
            no_cache,
        } => cmd_run(&study_path, !no_cache),
        Commands::Runs { study_path } => cmd_runs(&study_path),
        Commands::ShowRun {
            study_path,
            run_id,
            top,
        } => cmd_show_run(&study_path, &run_id, top),
        Commands::Export {
            study_path,
            run_id,
            output,
            scenario,
        } => cmd_export(&study_path, &run_id, output.as_deref(), scenario.as_deref()),
    }
}

fn cmd_validate(study_path: &Path) -> AppResult<()> {
    println!("Validating study: {}", study_path.display());
    let report = study_service::validate_study_file(study_path)?;
    println!("✓ Study '{}' is valid", report.name);
    println!("  Reach table rows: {}", report.table_reaches);
    println!(
        "  Network reaches:  {} ({} outlets)",
        report.network_reaches, report.outlet_count
    );
    if report.network_reaches > report.table_reaches {
        println!(
            "  Reaches without attributes: {}",
            report.network_reaches - report.table_reaches
        );
    }
    println!("  Removal factor rows: {}", report.removal_factor_rows);
    println!("  Coverage variants: {}", report.variants.join(", "));
    println!(
        "  Inundation comparison: {}",
        if report.inundation_comparison { "yes" } else { "no" }
    );
    Ok(())
}

fn cmd_run(study_path: &Path, use_cache: bool) -> AppResult<()> {
    println!("Running study: {}", study_path.display());

    let request = RunRequest {
        study_path,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };
    tracing::debug!(use_cache, engine = %request.options.engine_version, "Run requested");

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Run completed: {}", response.run_id);
    }

    print_timing_summary(&response.timing);
    print_manifest(&response.manifest);
    Ok(())
}

fn clear_progress_line() {
    eprint!("\r{}\r", " ".repeat(100));
    let _ = io::stderr().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    eprint!("{}", line);
    let _ = io::stderr().flush();
}

fn print_timing_summary(timing: &tp_app::RunTimingSummary) {
    let total = timing.total_time_s.max(1.0e-12);
    let pct = |t: f64| 100.0 * t / total;

    println!("\nTiming summary:");
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    } else {
        println!(
            "  Inputs:   {:.3}s ({:.1}%)",
            timing.load_inputs_time_s,
            pct(timing.load_inputs_time_s)
        );
        println!(
            "  Compile:  {:.3}s ({:.1}%)",
            timing.compile_time_s,
            pct(timing.compile_time_s)
        );
        println!(
            "  Pipeline: {:.3}s ({:.1}%)",
            timing.pipeline_time_s,
            pct(timing.pipeline_time_s)
        );
        println!(
            "  Save:     {:.3}s ({:.1}%)",
            timing.save_time_s,
            pct(timing.save_time_s)
        );
    }
    println!("  Total:    {:.3}s", timing.total_time_s);
}

fn print_manifest(manifest: &tp_app::RunManifest) {
    println!("\nScenarios (attenuation: {}):", manifest.attenuation_convention);
    println!(
        "  {:<20} {:>14} {:>14} {:>14}",
        "scenario", "generated", "routed", "outlets"
    );
    for s in &manifest.scenarios {
        println!(
            "  {:<20} {:>14.4} {:>14.4} {:>14.4}",
            s.scenario, s.generated_total, s.routed_total, s.outlet_routed_total
        );
    }

    if !manifest.comparisons.is_empty() {
        println!("\nReductions at the outlets:");
        for c in &manifest.comparisons {
            println!(
                "  {} -> {}: {:.4} ({:.2}%)",
                c.reference, c.scenario, c.outlet_absolute, c.outlet_percent
            );
        }
    }

    if !manifest.defaults_applied.is_empty() {
        println!("\nDefaults applied:");
        for (kind, count) in &manifest.defaults_applied {
            println!("  {}: {}", kind, count);
        }
    }
    if !manifest.validation_flags.is_empty() {
        println!("\n⚠ Validation flags:");
        for (kind, count) in &manifest.validation_flags {
            println!("  {}: {}", kind, count);
        }
    }
}

fn cmd_runs(study_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(study_path)?;

    if runs.is_empty() {
        println!("No cached runs found for study: {}", study_path.display());
    } else {
        println!("Cached runs for '{}':", study_path.display());
        for manifest in runs {
            println!(
                "  {} ({}, {} scenarios)",
                manifest.run_id,
                manifest.timestamp,
                manifest.scenarios.len()
            );
        }
    }
    Ok(())
}

fn cmd_show_run(study_path: &Path, run_id: &str, top: usize) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, records) = run_service::load_run(study_path, run_id)?;
    let summary = query::get_run_summary(&manifest, &records)?;

    println!("\nRun Summary:");
    println!("  Study: {}", summary.study_name);
    println!("  Timestamp: {}", summary.timestamp);
    println!("  Engine: {}", manifest.engine_version);
    println!("  Reaches: {}", summary.reach_count);
    println!("  Records: {}", summary.record_count);
    println!("  Scenarios: {}", summary.scenarios.join(", "));
    println!("  Defaults applied: {}", summary.defaults_applied);
    println!("  Validation flags: {}", summary.validation_flags);

    print_manifest(&manifest);

    for c in manifest.comparisons.iter().filter(|c| c.reference == "baseline") {
        let largest = query::largest_reductions(&records, &c.scenario, top)?;
        if largest.is_empty() {
            continue;
        }
        println!("\nLargest routed reductions ({}):", c.scenario);
        for r in largest {
            if let Some(red) = &r.reduction {
                println!(
                    "  reach {:>10}  {:.4} ({:.2}%)",
                    r.reach_id, red.routed_absolute, red.routed_percent
                );
            }
        }
    }

    Ok(())
}

fn cmd_export(
    study_path: &Path,
    run_id: &str,
    output: Option<&Path>,
    scenario: Option<&str>,
) -> AppResult<()> {
    if let Some(path) = output {
        let writer = BufWriter::new(File::create(path)?);
        let rows = query::export_run(study_path, run_id, scenario, writer)?;
        println!("✓ Exported {} rows to {}", rows, path.display());
    } else {
        query::export_run(study_path, run_id, scenario, io::stdout().lock())?;
    }
    Ok(())
}
