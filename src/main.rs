use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{LevelFilter, debug};
use qkd_sim::config::{EAVESDROP_PROB, NUM_PHOTONS, SECURITY_THRESHOLD};
use qkd_sim::{BB84Simulator, ProtocolConfig, Sampler};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Parser)]
#[command(
    name = "qkd-sim",
    author,
    version,
    about = "BB84 eavesdropper detection simulation"
)]
struct Cli {
    #[arg(long)]
    debug: bool,
    /// Photons transmitted per run.
    #[arg(long, default_value_t = NUM_PHOTONS)]
    photons: usize,
    /// Probability that Eve intercepts each photon.
    #[arg(long, default_value_t = EAVESDROP_PROB)]
    eavesdrop_prob: f64,
    /// Highest QBER accepted before the key is discarded.
    #[arg(long, default_value_t = SECURITY_THRESHOLD)]
    threshold: f64,
    #[arg(long, value_enum, default_value = "random")]
    eve: EveArg,
    /// Seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    /// Repeat the protocol and print aggregate statistics instead.
    #[arg(long, value_name = "N")]
    trials: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EveArg {
    Present,
    Absent,
    Random,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = ProtocolConfig::new(cli.photons, cli.eavesdrop_prob, cli.threshold)
        .context("invalid protocol configuration")?;
    let simulator = BB84Simulator::new(config);

    let mut rng = match cli.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    };

    let eavesdropper_present = match cli.eve {
        EveArg::Present => true,
        EveArg::Absent => false,
        EveArg::Random => rng.random_bool(0.5),
    };
    debug!("config {config:?}, eavesdropper present: {eavesdropper_present}");

    match cli.trials {
        Some(trials) => run_trials(simulator, &mut rng, eavesdropper_present, trials),
        None => run_single(simulator, &mut rng, cli.eve, eavesdropper_present),
    }

    Ok(())
}

fn run_single(
    simulator: BB84Simulator,
    rng: &mut ChaCha8Rng,
    eve: EveArg,
    eavesdropper_present: bool,
) {
    println!("{}", header(eve));
    println!(
        "--- Running Simulation: {} ---",
        scenario_label(eavesdropper_present)
    );

    let (_key, justification) = simulator.simulate(rng, eavesdropper_present);

    println!("{}", "-".repeat(50));
    println!("{justification}");
    println!("{}", "-".repeat(50));
}

fn run_trials(
    simulator: BB84Simulator,
    rng: &mut ChaCha8Rng,
    eavesdropper_present: bool,
    trials: usize,
) {
    println!(
        "--- Running {trials} Simulations: {} ---",
        scenario_label(eavesdropper_present)
    );
    let summary = Sampler::new(simulator).run(rng, eavesdropper_present, trials);
    println!("{}", "-".repeat(50));
    println!("{summary}");
    println!("{}", "-".repeat(50));
}

fn header(eve: EveArg) -> String {
    let title = "## 🔒 QKD Eavesdropper Detection Simulation";
    match eve {
        EveArg::Random => format!("{title} (Random Case)"),
        EveArg::Present | EveArg::Absent => title.to_string(),
    }
}

fn scenario_label(eavesdropper_present: bool) -> &'static str {
    if eavesdropper_present {
        "*EAVESDROPPER PRESENT*"
    } else {
        "*NO EAVESDROPPER*"
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default));
    builder.format_timestamp(None);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}
