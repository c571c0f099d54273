use std::{path::PathBuf, time::Duration};

use clap::Parser;
use ethereum_types::Address;
use gasbench::{
    NodeLedger,
    compare::compare,
    driver::{Benchmark, InputPolicy, SizeRange, run_all},
    generator::InputGenerator,
    invoker::GasMargin,
    ledger::DEFAULT_RECEIPT_RETRIES,
    provisioner::ArtifactStore,
    report::{ConsoleReporter, ObservationSink, to_json, to_markdown},
    workload::Workload,
};
use gasbench_rpc::EthClient;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, Registry, filter::Directive, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "gasbench",
    about = "Measures the gas cost of baseline and optimized contract operations"
)]
struct Cli {
    /// JSON-RPC endpoint of a development node with unlocked accounts
    #[arg(
        long = "rpc-url",
        env = "GASBENCH_RPC_URL",
        default_value = "http://localhost:8545",
        value_name = "URL"
    )]
    rpc_url: String,

    /// Directory holding the compiled contract artifacts
    #[arg(
        long,
        env = "GASBENCH_ARTIFACTS",
        default_value = "artifacts",
        value_name = "DIR"
    )]
    artifacts: PathBuf,

    /// Sender of every transaction (default: the node's first account)
    #[arg(long, env = "GASBENCH_FROM", value_name = "ADDRESS")]
    from: Option<Address>,

    /// Comma-separated workloads to run: staking, token-rescue, simple-write (default: all)
    #[arg(long, value_delimiter = ',', value_name = "WORKLOAD")]
    workloads: Vec<Workload>,

    /// First input size. Overrides every workload's sizes; needs --end and --step
    #[arg(long, value_name = "SIZE", requires_all = ["end", "step"])]
    start: Option<usize>,

    /// Last input size, inclusive. Needs --start and --step
    #[arg(long, value_name = "SIZE", requires_all = ["start", "step"])]
    end: Option<usize>,

    /// Distance between consecutive sizes. Needs --start and --end
    #[arg(long, value_name = "SIZE", requires_all = ["start", "end"])]
    step: Option<usize>,

    /// Gas added to every estimate, overriding the workload's margin
    #[arg(long = "gas-margin", value_name = "GAS")]
    gas_margin: Option<u64>,

    /// Seed for input generation, for reproducible address sets
    #[arg(long)]
    seed: Option<u64>,

    /// Run baseline and optimized of a size on the same input batch
    #[arg(long = "share-inputs")]
    share_inputs: bool,

    /// Receipt polls before a transaction counts as lost
    #[arg(long = "receipt-retries", default_value_t = DEFAULT_RECEIPT_RETRIES)]
    receipt_retries: u64,

    /// Delay between receipt polls
    #[arg(long = "receipt-poll-ms", default_value_t = 250, value_name = "MILLIS")]
    receipt_poll_ms: u64,

    /// Print the whole run as JSON on stdout once it finishes
    #[arg(long)]
    json: bool,

    /// Print a baseline against optimized summary table
    #[arg(long)]
    summary: bool,

    #[arg(long = "log.level", default_value_t = Level::INFO, value_name = "LOG_LEVEL")]
    log_level: Level,
}

impl Cli {
    fn benchmarks(&self) -> eyre::Result<Vec<Benchmark>> {
        let workloads = if self.workloads.is_empty() {
            Workload::ALL.to_vec()
        } else {
            self.workloads.clone()
        };
        let sizes = SizeRange::from_bounds(self.start, self.end, self.step)?;

        Ok(workloads
            .into_iter()
            .map(|workload| {
                let mut benchmark = Benchmark::new(workload);
                if let Some(sizes) = sizes {
                    benchmark = benchmark.with_sizes(sizes);
                }
                if let Some(margin) = self.gas_margin {
                    benchmark = benchmark.with_margin(GasMargin(margin));
                }
                if self.share_inputs {
                    benchmark = benchmark.with_input_policy(InputPolicy::PerSize);
                }
                benchmark
            })
            .collect())
    }
}

fn init_tracing(log_level: Level) -> eyre::Result<()> {
    let log_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(log_level))
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(log_filter);

    tracing::subscriber::set_global_default(Registry::default().with(fmt_layer))?;
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level)?;

    let benchmarks = cli.benchmarks()?;

    let artifacts = ArtifactStore::load(
        &cli.artifacts,
        benchmarks
            .iter()
            .flat_map(|benchmark| benchmark.workload.contracts().iter().copied()),
    )?;
    for benchmark in &benchmarks {
        benchmark.check_operations(&artifacts)?;
    }

    let client = EthClient::new(&cli.rpc_url)?
        .with_receipt_poll_interval(Duration::from_millis(cli.receipt_poll_ms));
    let ledger = NodeLedger::connect(client, cli.from, cli.receipt_retries).await?;

    let mut generator = match cli.seed {
        Some(seed) => InputGenerator::from_seed(seed),
        None => InputGenerator::new(),
    };

    // Stdout carries the JSON document alone when --json is given.
    let mut sink: Box<dyn ObservationSink> = if cli.json {
        Box::new(ConsoleReporter::stderr())
    } else {
        Box::new(ConsoleReporter::stdout())
    };

    let run = run_all(
        &ledger,
        &artifacts,
        &mut generator,
        &benchmarks,
        sink.as_mut(),
    )
    .await?;
    info!(
        observations = run.observations.len(),
        "Benchmark run completed"
    );

    if cli.summary {
        let summary = to_markdown(&compare(&run.observations)?);
        if cli.json {
            eprintln!("{summary}");
        } else {
            println!("{summary}");
        }
    }

    if cli.json {
        println!("{}", to_json(&run)?);
    }

    Ok(())
}
