pub mod lookahead;
pub mod qlearning;
pub mod valuetable;

use std::path::Path;

use log::info;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::game::{Action, Game, Grid};

/// A policy that picks a move for a board snapshot.
///
/// Implementations simulate on private copies and never touch the caller's game.
pub trait Agent: Send + Sync {
    fn select_action(&mut self, state: &Grid) -> Action;

    fn name(&self) -> &str;

    /// A fresh copy with its own random stream, for games played side by side.
    fn clone_agent(&self) -> Box<dyn Agent>;
}

/// Plays `game` to the end with `agent` and returns the final score.
pub fn play_once(game: &mut Game, agent: &mut dyn Agent) -> u32 {
    while !game.game_over() {
        let action = agent.select_action(&game.state());
        game.do_action(action);
    }
    game.score()
}

/// Plays `n_episodes` independent games in parallel, one agent clone per game.
pub fn test_player(agent: &dyn Agent, n_episodes: usize) -> Evaluation {
    let scores: Vec<u32> = (0..n_episodes).into_par_iter().map(|_| {
        let mut player = agent.clone_agent();
        play_once(&mut Game::new(), player.as_mut())
    }).collect();

    let evaluation = Evaluation::new(agent.name(), scores);
    info!("{}", evaluation.summary());
    evaluation
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub name: String,
    pub scores: Vec<u32>,
}

#[derive(Serialize)]
struct ScoreRecord {
    episode: usize,
    score: u32,
}

impl Evaluation {
    pub fn new(name: &str, scores: Vec<u32>) -> Self {
        Self {
            name: name.to_string(),
            scores,
        }
    }

    pub fn mean(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().map(|&s| s as f64).sum::<f64>() / self.scores.len() as f64
    }

    pub fn max(&self) -> u32 {
        self.scores.iter().copied().max().unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        format!("{} average score {:.0}, max score {}", self.name, self.mean(), self.max())
    }

    // one `episode,score` row per game
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for (i, &score) in self.scores.iter().enumerate() {
            writer.serialize(ScoreRecord { episode: i + 1, score })?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // first available direction in enumeration order
    struct FixedOrderAgent;

    impl Agent for FixedOrderAgent {
        fn select_action(&mut self, state: &Grid) -> Action {
            Action::ALL.into_iter()
                .find(|&a| crate::game::is_action_available(state, a))
                .unwrap_or(Action::Left)
        }

        fn name(&self) -> &str {
            "Fixed Order"
        }

        fn clone_agent(&self) -> Box<dyn Agent> {
            Box::new(FixedOrderAgent)
        }
    }

    #[test]
    fn test_play_once_runs_to_game_over() {
        let mut game = Game::seeded(17);
        let score = play_once(&mut game, &mut FixedOrderAgent);

        assert!(game.game_over());
        assert_eq!(score, game.score());
    }

    #[test]
    fn test_play_once_on_finished_game() {
        let grid: Grid = [[1, 2, 1, 2], [2, 1, 2, 1], [1, 2, 1, 2], [2, 1, 2, 1]];
        let mut game = Game::from_state(grid, 40);

        assert_eq!(play_once(&mut game, &mut FixedOrderAgent), 40);
        assert_eq!(game.state(), grid);
    }

    #[test]
    fn test_player_collects_every_episode() {
        let evaluation = test_player(&FixedOrderAgent, 8);

        assert_eq!(evaluation.scores.len(), 8);
        assert_eq!(evaluation.name, "Fixed Order");
        assert!(evaluation.max() > 0);
    }

    #[test]
    fn test_evaluation_summary() {
        let evaluation = Evaluation::new("Random Player", vec![1000, 2000, 3000]);

        assert_eq!(evaluation.mean(), 2000.0);
        assert_eq!(evaluation.max(), 3000);
        assert_eq!(evaluation.summary(), "Random Player average score 2000, max score 3000");
        assert_eq!(Evaluation::new("empty", vec![]).mean(), 0.0);
    }

    #[test]
    fn test_write_csv() {
        let evaluation = Evaluation::new("One Step Player", vec![120, 456]);
        let path = std::env::temp_dir().join("tilers_test_scores.csv");

        evaluation.write_csv(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "episode,score\n1,120\n2,456\n");

        std::fs::remove_file(&path).unwrap();
    }
}
