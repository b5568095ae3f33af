use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tilers::{Evaluation, LearnerConfig, Policy, QAgent};

/// Train the tabular agent on simulated games and compare it with random play.
#[derive(Parser)]
#[command(name = "trainagent", about = "Train the tabular 2048 agent")]
struct Cli {
    /// Number of training episodes
    #[arg(long, default_value_t = 1000)]
    episodes: usize,

    /// Exploration rate while learning
    #[arg(long, default_value_t = 0.2)]
    epsilon: f32,

    /// Weight of the successor value in each update
    #[arg(long, default_value_t = 0.5)]
    alpha: f32,

    /// Games played by each policy after training
    #[arg(long, default_value_t = 100)]
    eval_episodes: usize,

    /// Where to store the learned value table
    #[arg(long, default_value = "input/value_table.bin")]
    output: PathBuf,

    /// Optional CSV file for the training score curve
    #[arg(long)]
    curve: Option<PathBuf>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = LearnerConfig::default()
        .with_epsilon(cli.epsilon)
        .with_alpha(cli.alpha);
    let mut agent = match cli.seed {
        Some(seed) => QAgent::seeded(config, seed)?,
        None => QAgent::new(config)?,
    };

    println!("starting training for {} episodes...", cli.episodes);

    let scores = agent.learn(cli.episodes);
    agent.quantize_values(1);

    println!("\ntraining finished, {} values stored.", agent.table().len());

    if let Some(path) = &cli.curve {
        Evaluation::new("training", scores).write_csv(path)?;
        println!("training curve written to {}", path.display());
    }

    let random = Evaluation::new(
        "Random Player",
        (0..cli.eval_episodes).map(|_| agent.evaluate_with_policy(Policy::Random)).collect(),
    );
    let greedy = Evaluation::new(
        "Q-learning Player",
        (0..cli.eval_episodes).map(|_| agent.evaluate_with_policy(Policy::Greedy)).collect(),
    );
    println!("{}", random.summary());
    println!("{}", greedy.summary());

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    match agent.store(&cli.output) {
        Ok(_) => println!("successfully saved value table to {}", cli.output.display()),
        Err(e) => eprintln!("error saving value table: {}", e),
    }

    Ok(())
}
