//! Estimates page ranks from link information.
//!
//! Reads `source target` lines from a file or stdin, prints graph counts and
//! the top pages to stdout. Progress, timing and logs go to stderr.

use std::env;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use rapid_pagerank::edgelist::parse_edge_list;
use rapid_pagerank::pagerank::{Estimator, PageRankResult};
use rapid_pagerank::pipeline::observer::{NoopReporter, ProgressBar};
use rapid_pagerank::pipeline::runner::{configure, ConfiguredEstimator};
use rapid_pagerank::CsrGraph;
use rapid_pagerank::pipeline::spec::{Algorithm, ConvergenceMode, RankSpec};

/// Log directives used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "rapid_pagerank=info";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Stochastic,
    Distribution,
}

impl From<Method> for Algorithm {
    fn from(method: Method) -> Self {
        match method {
            Method::Stochastic => Algorithm::Stochastic,
            Method::Distribution => Algorithm::Distribution,
        }
    }
}

#[derive(Parser)]
#[command(name = "pagerank")]
#[command(about = "Estimates page ranks from link information")]
struct Args {
    /// Text file of links among web pages as `source target` pairs (stdin if omitted)
    datafile: Option<PathBuf>,

    /// Selected PageRank algorithm
    #[arg(short, long, value_enum)]
    method: Option<Method>,

    /// Number of random walks (stochastic)
    #[arg(short, long)]
    walks: Option<usize>,

    /// Steps per random walk (stochastic)
    #[arg(short = 'l', long)]
    length: Option<usize>,

    /// Number of iterations, or the ceiling when --epsilon is set (distribution)
    #[arg(short, long)]
    steps: Option<usize>,

    /// Stop once successive vectors differ by at most this much (distribution)
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Seed for reproducible random walks
    #[arg(long)]
    seed: Option<u64>,

    /// Spread random walks over all cores
    #[arg(long)]
    parallel: bool,

    /// Number of top results to show
    #[arg(short, long, default_value = "20")]
    number: usize,

    /// JSON rank spec; command line flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn spec(&self) -> Result<RankSpec> {
        let mut spec = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                RankSpec::from_json(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => RankSpec::default(),
        };

        if let Some(method) = self.method {
            spec.algorithm = method.into();
        }
        if let Some(walks) = self.walks {
            spec.num_walks = walks;
        }
        if let Some(length) = self.length {
            spec.walk_length = length;
        }
        if let Some(steps) = self.steps {
            spec.max_iterations = Some(steps);
        }
        if let Some(epsilon) = self.epsilon {
            spec.epsilon = Some(epsilon);
            spec.convergence_mode = ConvergenceMode::Tolerance;
        }
        if let Some(seed) = self.seed {
            spec.rng_seed = Some(seed);
        }
        if self.parallel {
            spec.parallel = true;
        }
        Ok(spec)
    }

    fn reader(&self) -> Result<Box<dyn BufRead>> {
        Ok(match &self.datafile {
            Some(path) => {
                let file = fs::File::open(path)
                    .with_context(|| format!("opening {}", path.display()))?;
                Box::new(BufReader::new(file))
            }
            None => Box::new(io::stdin().lock()),
        })
    }
}

/// `RUST_LOG` directives when given, the crate default otherwise.
fn log_filter(directives: Option<&str>) -> Result<EnvFilter> {
    let directives = directives.unwrap_or(DEFAULT_LOG_FILTER);
    EnvFilter::try_new(directives)
        .with_context(|| format!("invalid log filter \"{directives}\""))
}

/// Run `estimator` with a progress bar on `out`. The bar is cleared whether
/// or not the estimation succeeds.
fn estimate_with_bar<W: Write>(
    estimator: &ConfiguredEstimator,
    graph: &CsrGraph<String>,
    out: W,
) -> rapid_pagerank::Result<PageRankResult<String>> {
    let mut bar = ProgressBar::new(out, estimator.title())?;
    let result = estimator.estimate(graph, &mut bar);
    bar.finish();
    if let Some(err) = bar.error() {
        tracing::warn!(error = %err, "progress output failed");
    }
    result
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(log_filter(rust_log.as_deref())?)
        .init();

    let args = Args::parse();
    let spec = args.spec()?;
    let estimator = configure(&spec)?;

    let graph = parse_edge_list(args.reader()?)?;
    let stats = graph.stats();
    println!("The number of nodes is {}", stats.nodes);
    println!("The number of edges is {}", stats.edges);

    let start = Instant::now();
    let result = if args.quiet {
        estimator.estimate(&graph, &mut NoopReporter)?
    } else {
        estimate_with_bar(&estimator, &graph, io::stderr())?
    };
    let elapsed = start.elapsed();

    if let Some(warning) = &result.warning {
        eprintln!("warning: {warning}");
    }

    eprintln!("Top {} pages:", args.number);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (node, score) in result.top_n(args.number) {
        writeln!(out, "{:.2}\t{node}", 100.0 * score)?;
    }
    out.flush()?;
    eprintln!("Calculation took {:.2} seconds.", elapsed.as_secs_f64());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapid_pagerank::pagerank::{ConvergenceConfig, DistanceMetric};
    use rapid_pagerank::RankError;
    use tracing_subscriber::filter::LevelFilter;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("pagerank").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let spec = parse(&[]).spec().unwrap();
        assert_eq!(spec.algorithm, Algorithm::Stochastic);
        assert_eq!(spec.num_walks, 1_000);
        assert_eq!(spec.convergence(), ConvergenceConfig::fixed(100));
    }

    #[test]
    fn test_steps_are_fixed_iterations() {
        let spec = parse(&["-m", "distribution", "-s", "25"]).spec().unwrap();
        assert_eq!(spec.algorithm, Algorithm::Distribution);
        assert_eq!(spec.convergence(), ConvergenceConfig::fixed(25));
    }

    #[test]
    fn test_epsilon_switches_to_tolerance_with_steps_as_ceiling() {
        let spec = parse(&["-m", "distribution", "-e", "1e-6", "-s", "500"])
            .spec()
            .unwrap();
        assert_eq!(spec.convergence_mode, ConvergenceMode::Tolerance);
        assert_eq!(
            spec.convergence(),
            ConvergenceConfig::tolerance(1e-6).with_ceiling(500)
        );
    }

    #[test]
    fn test_walk_flags() {
        let spec = parse(&["-w", "10", "-l", "7", "--seed", "3", "--parallel"])
            .spec()
            .unwrap();
        let sto = spec.stochastic();
        assert_eq!((sto.num_walks, sto.walk_length, sto.seed), (10, 7, Some(3)));
        assert!(spec.parallel);
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "algorithm": "distribution", "max_iterations": 40, "num_walks": 7, "metric": "max" }}"#
        )
        .unwrap();
        file.flush().unwrap();
        let path = file.path().to_str().unwrap();

        let from_file = parse(&["--config", path]).spec().unwrap();
        assert_eq!(from_file.num_walks, 7);
        assert_eq!(from_file.convergence(), ConvergenceConfig::fixed(40));

        let spec = parse(&["--config", path, "-w", "9", "-e", "0.001"])
            .spec()
            .unwrap();
        assert_eq!(spec.algorithm, Algorithm::Distribution);
        assert_eq!(spec.num_walks, 9);
        assert_eq!(
            spec.convergence(),
            ConvergenceConfig::tolerance(0.001)
                .with_metric(DistanceMetric::Max)
                .with_ceiling(40)
        );
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = parse(&["--config", path.to_str().unwrap()]).spec().unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_rust_log_directive_is_kept() {
        let filter = log_filter(Some("rapid_pagerank=debug")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_default_log_filter_is_info() {
        let filter = log_filter(None).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_invalid_log_filter_rejected() {
        assert!(log_filter(Some("rapid_pagerank=loud")).is_err());
    }

    #[test]
    fn test_bar_cleared_when_estimation_fails() {
        let estimator = configure(&RankSpec::default()).unwrap();
        let mut out = Vec::new();

        let err = estimate_with_bar(&estimator, &CsrGraph::default(), &mut out).unwrap_err();
        assert!(matches!(err, RankError::EmptyGraph));
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with('\r'));
        assert!(text.ends_with('\r'));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bar_write_failure_does_not_abort() {
        let estimator = configure(&RankSpec {
            num_walks: 20,
            walk_length: 5,
            rng_seed: Some(1),
            ..RankSpec::default()
        })
        .unwrap();
        let graph = CsrGraph::from_edges(vec![("a".to_string(), "b".to_string())]);

        let result = estimate_with_bar(&estimator, &graph, ClosedPipe).unwrap();
        assert!((result.ranks.sum() - 1.0).abs() < 1e-9);
    }
}
