use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tilers::{Agent, Game, MultiStepAgent, OneStepAgent, RandomAgent, play_once, test_player};

/// Compare the lookahead players over many games.
#[derive(Parser)]
#[command(name = "benchmark", about = "Average and best scores of the lookahead players")]
struct Cli {
    /// Games per player
    #[arg(long, default_value_t = 100)]
    episodes: usize,

    /// Search depths for the multi-step player, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [2, 3])]
    depths: Vec<usize>,

    /// Directory for per-player `episode,score` CSV files
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

fn file_stem(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut agents: Vec<Box<dyn Agent>> = vec![
        Box::new(RandomAgent::new()),
        Box::new(OneStepAgent::new()),
    ];
    for &depth in &cli.depths {
        agents.push(Box::new(MultiStepAgent::new(depth)?));
    }

    if let Some(dir) = &cli.csv_dir {
        std::fs::create_dir_all(dir)?;
    }

    for agent in agents.iter_mut() {
        let evaluation = test_player(agent.as_ref(), cli.episodes);
        println!("{}", evaluation.summary());

        if let Some(dir) = &cli.csv_dir {
            evaluation.write_csv(dir.join(format!("{}.csv", file_stem(&evaluation.name))))?;
        }

        // one more game to show where this player typically ends up
        let mut game = Game::new();
        play_once(&mut game, agent.as_mut());
        println!("{}", game);
    }

    Ok(())
}
