//! ttlmemo CLI
//!
//! Replays the memoization scenarios and stress-tests a memo cell from the
//! command line.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ttlmemo_cell::{Memoized, StatsSnapshot, TtlCell};
use ttlmemo_core::{Clock, ClockKind, ManualClock, MemoConfig, MonotonicClock, Ttl};

/// ttlmemo - single-flight TTL memoization
#[derive(Parser)]
#[command(name = "ttlmemo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the expiry and failure scenarios on a manual clock
    Scenario,

    /// Hammer one memoized counter from many threads
    Stress {
        /// Number of caller threads
        #[arg(short, long, default_value = "8")]
        threads: usize,
        /// How long to run, in milliseconds
        #[arg(short, long, default_value = "2000")]
        duration_ms: u64,
        /// TTL in seconds (overrides the config file and environment)
        #[arg(long)]
        ttl: Option<f64>,
        /// Fail every Nth computation (0 disables failures)
        #[arg(long, default_value = "10")]
        fail_every: u64,
        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "ttlmemo=debug,ttlmemo_cell=debug,info"
    } else {
        "ttlmemo=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Scenario => cmd_scenario(),
        Commands::Stress {
            threads,
            duration_ms,
            ttl,
            fail_every,
            config,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if ttl.is_some() {
                config.ttl_seconds = ttl;
            }
            let run = StressRun {
                threads,
                duration: Duration::from_millis(duration_ms),
                fail_every,
            };
            cmd_stress(&config, &run, json)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<MemoConfig> {
    match path {
        Some(path) => MemoConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => MemoConfig::from_env().context("Invalid TTLMEMO_TTL_SECONDS"),
    }
}

/// Counts up, failing whenever the count is a multiple of `fail_every`.
struct Counter {
    count: AtomicU64,
    fail_every: u64,
}

impl Counter {
    fn new(start: u64, fail_every: u64) -> Self {
        Self {
            count: AtomicU64::new(start),
            fail_every,
        }
    }

    fn next(&self) -> std::result::Result<u64, String> {
        let val = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_every != 0 && val % self.fail_every == 0 {
            Err(format!("bad value {val}"))
        } else {
            Ok(val)
        }
    }
}

/// A counter whose `value` is memoized for one second.
struct MemoCounter<'a> {
    counter: Counter,
    value: TtlCell<u64>,
    clock: &'a ManualClock,
}

impl MemoCounter<'_> {
    fn value(&self) -> std::result::Result<u64, String> {
        self.value.get(|| self.counter.next(), Ttl::from_secs(1), self.clock)
    }
}

fn print_call(clock: &ManualClock, outcome: std::result::Result<u64, String>) {
    let at = format!("t={:.2}s", clock.elapsed().as_secs_f64());
    match outcome {
        Ok(v) => println!("   {} {} {}", at.dimmed(), "→".green(), v),
        Err(e) => println!("   {} {} {}", at.dimmed(), "✗".red(), e),
    }
}

/// Replay the expiry and failure scenarios
fn cmd_scenario() -> Result<()> {
    println!("{}", "⏱  Expiry (ttl = 1s)".cyan().bold());
    let clock = ManualClock::new();
    let memo = MemoCounter {
        counter: Counter::new(0, 10),
        value: TtlCell::new(),
        clock: &clock,
    };
    print_call(&clock, memo.value());
    for tenth in 1..=9 {
        clock.set(Duration::from_millis(tenth * 100));
        print_call(&clock, memo.value());
    }
    clock.set(Duration::from_millis(1100));
    print_call(&clock, memo.value());

    println!("\n{}", "💥 Failure (counter starts at 9, fails on 10)".cyan().bold());
    let clock = ManualClock::with_step(Duration::from_micros(10));
    let memo = MemoCounter {
        counter: Counter::new(9, 10),
        value: TtlCell::new(),
        clock: &clock,
    };
    print_call(&clock, memo.value());
    print_call(&clock, memo.value());
    print_call(&clock, memo.value());
    clock.advance(Duration::from_secs(1));
    print_call(&clock, memo.value());

    let stats = memo.value.stats();
    println!(
        "\n   {} {} computations, {} failures, {} hits",
        "Stats:".dimmed(),
        stats.computations,
        stats.failures,
        stats.hits
    );

    Ok(())
}

struct StressRun {
    threads: usize,
    duration: Duration,
    fail_every: u64,
}

#[derive(Default)]
struct StressReport {
    calls: AtomicU64,
    errors: AtomicU64,
    regressions: AtomicU64,
    overlaps: AtomicU64,
}

/// Hammer one memoized counter from many threads
fn cmd_stress(config: &MemoConfig, run: &StressRun, json: bool) -> Result<()> {
    if run.threads == 0 {
        bail!("--threads must be at least 1");
    }
    let ttl = config.ttl().context("Invalid TTL")?;

    println!(
        "{} {} threads, ttl {}, {:?} clock, {:?}",
        "🔨 Stressing with".cyan().bold(),
        run.threads,
        ttl,
        config.clock,
        run.duration
    );

    let counter = Counter::new(0, run.fail_every);
    let in_flight = AtomicU64::new(0);
    let report = StressReport::default();
    let compute = || {
        if in_flight.fetch_add(1, Ordering::SeqCst) != 0 {
            report.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        let result = counter.next();
        in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    };

    let started = Instant::now();
    let stats = match config.clock {
        ClockKind::Monotonic => {
            let memo = Memoized::with_clock(compute, ttl, MonotonicClock);
            hammer(&memo, run, &report, |_| {});
            memo.stats()
        }
        ClockKind::Manual => {
            let clock = ManualClock::new();
            let step = ttl.as_duration().unwrap_or(Duration::from_secs(1));
            let memo = Memoized::with_clock(compute, ttl, &clock);
            hammer(&memo, run, &report, |_| clock.advance(step));
            memo.stats()
        }
    };
    let elapsed = started.elapsed();
    info!(?elapsed, "stress run finished");

    print_report(&report, &stats, elapsed, json)
}

/// Runs `run.threads` callers against `memo` until the run's duration elapses.
///
/// `tick` is invoked from the driving thread every 10ms.
fn hammer<F, C>(
    memo: &Memoized<u64, F, C>,
    run: &StressRun,
    report: &StressReport,
    tick: impl Fn(u64),
) where
    F: Fn() -> std::result::Result<u64, String> + Sync,
    C: Clock,
{
    let deadline = Instant::now() + run.duration;
    let ticks = (run.duration.as_millis() / 10).max(1) as u64;
    let pb = ProgressBar::new(ticks);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   [{bar:40.cyan/blue}] {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    thread::scope(|s| {
        for _ in 0..run.threads {
            s.spawn(|| {
                let mut last = 0;
                while Instant::now() < deadline {
                    report.calls.fetch_add(1, Ordering::Relaxed);
                    match memo.get() {
                        Ok(v) => {
                            if v < last {
                                report.regressions.fetch_add(1, Ordering::Relaxed);
                            }
                            last = v;
                        }
                        Err(_) => {
                            report.errors.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            });
        }

        for i in 0..ticks {
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(Duration::from_millis(10));
            tick(i);
            pb.inc(1);
        }
    });
    pb.finish();
}

fn print_report(
    report: &StressReport,
    stats: &StatsSnapshot,
    elapsed: Duration,
    json: bool,
) -> Result<()> {
    let calls = report.calls.load(Ordering::SeqCst);
    let errors = report.errors.load(Ordering::SeqCst);
    let regressions = report.regressions.load(Ordering::SeqCst);
    let overlaps = report.overlaps.load(Ordering::SeqCst);

    if json {
        let report_json = serde_json::json!({
            "calls": calls,
            "errors": errors,
            "regressions": regressions,
            "overlapping_computations": overlaps,
            "hits": stats.hits,
            "computations": stats.computations,
            "failures": stats.failures,
            "waits": stats.waits,
            "hit_ratio": stats.hit_ratio(),
            "elapsed_ms": elapsed.as_millis() as u64,
        });
        println!("{}", serde_json::to_string_pretty(&report_json)?);
    } else {
        let rate = calls as f64 / elapsed.as_secs_f64();
        println!("\n{}", "📈 Results:".green().bold());
        println!("   Calls: {} ({:.0}/sec)", calls, rate);
        println!(
            "   Computations: {} ({} failed), waits: {}",
            stats.computations, stats.failures, stats.waits
        );
        println!("   Hit ratio: {:.4}", stats.hit_ratio());
        println!("   Errors returned: {}", errors);
    }

    if errors != stats.failures {
        bail!("{errors} callers saw an error but {} computations failed", stats.failures);
    }
    if overlaps != 0 {
        bail!("{overlaps} computations overlapped another in-flight computation");
    }
    if regressions != 0 {
        bail!("{regressions} reads went backwards");
    }
    if !json {
        println!("   {} Single-flight and ordering held", "✅".green());
    }

    Ok(())
}
