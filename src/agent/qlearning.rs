use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info, trace};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use super::valuetable::ValueTable;
use crate::config::LearnerConfig;
use crate::error::Result;
use crate::game::{self, Action, Game, Grid};

/// How `evaluate_with_policy` picks moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// `best_action` on every move.
    Greedy,
    /// Any of the four directions, illegal ones included. Untrained baseline.
    Random,
}

/// Tabular learner over (board, action) pairs.
///
/// After each move the estimate for the pair just played is overwritten with
/// `reward + alpha * value(next board, greedy next action)`; there is no
/// blending with the previous estimate.
pub struct QAgent {
    table: ValueTable,
    config: LearnerConfig,
    rng: StdRng,
}

impl QAgent {
    pub fn new(config: LearnerConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn seeded(config: LearnerConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: LearnerConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            table: ValueTable::new(),
            config,
            rng,
        })
    }

    pub fn config(&self) -> &LearnerConfig {&self.config}
    pub fn table(&self) -> &ValueTable {&self.table}

    pub fn state_value(&self, grid: &Grid, action: Action) -> f32 {
        self.table.get(grid, action)
    }

    /// Highest-valued available action, ties broken uniformly at random.
    /// `None` when the board has no available action.
    pub fn best_action(&mut self, grid: &Grid) -> Option<Action> {
        let values: Vec<(Action, f32)> = game::available_actions(grid)
            .into_iter()
            .map(|a| (a, self.state_value(grid, a)))
            .collect();

        let max_value = values.iter().map(|&(_, v)| v).fold(f32::NEG_INFINITY, f32::max);
        let best: Vec<Action> = values.into_iter().filter(|&(_, v)| v == max_value).map(|(a, _)| a).collect();

        best.choose(&mut self.rng).copied()
    }

    /// Epsilon-greedy over the available actions.
    pub fn select_action_for_learning(&mut self, grid: &Grid) -> Option<Action> {
        if self.rng.random::<f32>() < self.config.epsilon {
            game::available_actions(grid).choose(&mut self.rng).copied()
        } else {
            self.best_action(grid)
        }
    }

    /// Plays one move on `game` and updates the estimate for it.
    /// Returns the action and its reward, or `None` if the game was already over.
    pub fn learn_step(&mut self, game: &mut Game) -> Option<(Action, i32)> {
        let state = game.state();
        let action = self.select_action_for_learning(&state)?;
        let (next_state, reward, _) = game.do_action(action);

        // bootstrap only from a board that still has a move
        let target = match self.best_action(&next_state) {
            Some(next_action) => reward as f32 + self.config.alpha * self.state_value(&next_state, next_action),
            None => reward as f32,
        };

        trace!("{} -> reward {}, value {}", action.name(), reward, target);
        self.table.set(&state, action, target);

        Some((action, reward))
    }

    /// Learns from `game` until it is over and returns the final score.
    pub fn learn_from_game(&mut self, game: &mut Game) -> u32 {
        let mut last_step = None;
        while !game.game_over() {
            let Some(step) = self.learn_step(game) else {
                break;
            };
            last_step = Some(step);
        }

        // the finished board keeps the last reward, without bootstrap
        if let Some((action, reward)) = last_step {
            self.table.set(&game.state(), action, reward as f32);
        }

        game.score()
    }

    pub fn learn_from_episode(&mut self) -> u32 {
        let mut game = Game::with_rng(StdRng::from_rng(&mut self.rng));
        self.learn_from_game(&mut game)
    }

    /// Runs `n_episodes` fresh games in sequence and returns their final scores.
    pub fn learn(&mut self, n_episodes: usize) -> Vec<u32> {
        let report_every = (n_episodes / 10).max(1);
        let mut scores = Vec::with_capacity(n_episodes);

        for episode in 0..n_episodes {
            let score = self.learn_from_episode();
            debug!("Episode: {}, Score: {}, Table size: {}", episode + 1, score, self.table.len());
            scores.push(score);

            if (episode + 1) % report_every == 0 {
                let recent = &scores[scores.len().saturating_sub(report_every)..];
                let mean = recent.iter().map(|&s| s as f64).sum::<f64>() / recent.len() as f64;
                info!("episodes {}/{}: mean score {:.1}, {} values stored", episode + 1, n_episodes, mean, self.table.len());
            }
        }

        scores
    }

    /// Rounds stored values so near-equal estimates become exact ties.
    pub fn quantize_values(&mut self, decimals: u32) {
        self.table.quantize(decimals);
    }

    /// Plays one game without learning and returns the final score.
    pub fn evaluate_with_policy(&mut self, policy: Policy) -> u32 {
        let mut game = Game::with_rng(StdRng::from_rng(&mut self.rng));

        while !game.game_over() {
            let action = match policy {
                Policy::Greedy => match self.best_action(&game.state()) {
                    Some(action) => action,
                    None => break,
                },
                Policy::Random => Action::random(&mut self.rng),
            };
            game.do_action(action);
        }

        game.score()
    }

    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, &self.table)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P, config: LearnerConfig) -> Result<Self> {
        Self::load_with_rng(path, config, StdRng::from_os_rng())
    }

    pub fn load_seeded<P: AsRef<Path>>(path: P, config: LearnerConfig, seed: u64) -> Result<Self> {
        Self::load_with_rng(path, config, StdRng::seed_from_u64(seed))
    }

    pub fn load_with_rng<P: AsRef<Path>>(path: P, config: LearnerConfig, rng: StdRng) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let table: ValueTable = bincode::deserialize_from(reader)?;

        let mut agent = Self::with_rng(config, rng)?;
        agent.table = table;
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn greedy_config() -> LearnerConfig {
        LearnerConfig::default().with_epsilon(0.0)
    }

    fn corner_tile() -> Grid {
        let mut grid = [[0; 4]; 4];
        grid[0][0] = 1;
        grid
    }

    fn top_pair() -> Grid {
        let mut grid = [[0; 4]; 4];
        grid[0][0] = 1;
        grid[0][1] = 1;
        grid
    }

    // Left merges the top row and leaves no move whatever tile spawns
    fn one_move_from_the_end() -> Grid {
        [
            [1, 1, 3, 4],
            [5, 6, 7, 5],
            [6, 7, 5, 6],
            [7, 5, 6, 7],
        ]
    }

    #[test]
    fn test_fresh_agent_values_are_zero() {
        let agent = QAgent::seeded(LearnerConfig::default(), 1).unwrap();
        for action in Action::ALL {
            assert_eq!(agent.state_value(&top_pair(), action), 0.0);
            assert_eq!(agent.state_value(&corner_tile(), action), 0.0);
        }
        assert!(agent.table().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(QAgent::new(LearnerConfig::default().with_epsilon(-0.5)).is_err());
        assert!(QAgent::new(LearnerConfig::default().with_alpha(3.0)).is_err());
    }

    #[test]
    fn test_best_action_breaks_ties_among_available() {
        let mut agent = QAgent::seeded(greedy_config(), 2).unwrap();
        let chosen: HashSet<Action> = (0..200).map(|_| agent.best_action(&corner_tile()).unwrap()).collect();

        assert_eq!(chosen, HashSet::from([Action::Right, Action::Down]));
    }

    #[test]
    fn test_best_action_ignores_unavailable_values() {
        let mut agent = QAgent::seeded(greedy_config(), 3).unwrap();
        agent.table.set(&corner_tile(), Action::Left, 100.0);
        agent.table.set(&corner_tile(), Action::Down, 1.0);

        for _ in 0..20 {
            assert_eq!(agent.best_action(&corner_tile()), Some(Action::Down));
        }
    }

    #[test]
    fn test_best_action_on_finished_board() {
        let mut agent = QAgent::seeded(greedy_config(), 4).unwrap();
        let grid: Grid = [[1, 2, 1, 2], [2, 1, 2, 1], [1, 2, 1, 2], [2, 1, 2, 1]];

        assert_eq!(agent.best_action(&grid), None);
        assert_eq!(agent.select_action_for_learning(&grid), None);
    }

    #[test]
    fn test_zero_epsilon_is_greedy() {
        let mut agent = QAgent::seeded(greedy_config(), 5).unwrap();
        agent.table.set(&top_pair(), Action::Right, 2.5);

        for _ in 0..50 {
            let greedy = agent.best_action(&top_pair());
            assert_eq!(agent.select_action_for_learning(&top_pair()), greedy);
            assert_eq!(greedy, Some(Action::Right));
        }
    }

    #[test]
    fn test_full_epsilon_explores_available_only() {
        let config = LearnerConfig::default().with_epsilon(1.0);
        let mut agent = QAgent::seeded(config, 6).unwrap();
        agent.table.set(&top_pair(), Action::Left, 9.0);

        let chosen: HashSet<Action> = (0..200).map(|_| agent.select_action_for_learning(&top_pair()).unwrap()).collect();

        assert_eq!(chosen, HashSet::from([Action::Left, Action::Right, Action::Down]));
    }

    #[test]
    fn test_learn_step_overwrites_estimate() {
        let mut agent = QAgent::seeded(greedy_config(), 7).unwrap();
        agent.table.set(&top_pair(), Action::Left, 10.0);
        let mut game = Game::from_state_with_rng(top_pair(), 0, StdRng::seed_from_u64(70));

        let step = agent.learn_step(&mut game);

        // successor is unseen, so the estimate is the bare reward
        assert_eq!(step, Some((Action::Left, 4)));
        assert_eq!(agent.state_value(&top_pair(), Action::Left), 4.0);
    }

    #[test]
    fn test_learn_step_bootstraps_from_successor() {
        let mut agent = QAgent::seeded(greedy_config(), 8).unwrap();
        agent.table.set(&top_pair(), Action::Left, 1.0);

        let mut game = Game::from_state_with_rng(top_pair(), 0, StdRng::seed_from_u64(80));
        let (next_state, _, _) = game.clone().do_action(Action::Left);
        for action in crate::game::available_actions(&next_state) {
            agent.table.set(&next_state, action, 6.0);
        }

        agent.learn_step(&mut game);

        assert_eq!(game.state(), next_state);
        assert_eq!(agent.state_value(&top_pair(), Action::Left), 4.0 + 0.5 * 6.0);
    }

    #[test]
    fn test_terminal_step_skips_bootstrap() {
        let mut agent = QAgent::seeded(greedy_config(), 9).unwrap();
        let start = one_move_from_the_end();
        agent.table.set(&start, Action::Left, 1.0);
        let mut game = Game::from_state_with_rng(start, 0, StdRng::seed_from_u64(90));

        let score = agent.learn_from_game(&mut game);

        assert!(game.game_over());
        assert_eq!(score, 4);
        assert_eq!(agent.state_value(&start, Action::Left), 4.0);
        assert_eq!(agent.state_value(&game.state(), Action::Left), 4.0);
        assert_eq!(agent.table().len(), 2);
    }

    #[test]
    fn test_learn_runs_episodes() {
        let mut agent = QAgent::seeded(LearnerConfig::default(), 10).unwrap();
        let scores = agent.learn(3);

        assert_eq!(scores.len(), 3);
        assert!(!agent.table().is_empty());
        assert!(agent.table().iter().all(|(_, v)| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_quantize_values_makes_ties_fair() {
        let mut agent = QAgent::seeded(greedy_config(), 11).unwrap();
        agent.table.set(&corner_tile(), Action::Right, 3.04);
        agent.table.set(&corner_tile(), Action::Down, 2.98);
        assert_eq!(agent.best_action(&corner_tile()), Some(Action::Right));

        agent.quantize_values(1);

        let chosen: HashSet<Action> = (0..200).map(|_| agent.best_action(&corner_tile()).unwrap()).collect();
        assert_eq!(chosen.len(), 2);
    }

    #[test]
    fn test_evaluate_with_policy() {
        let mut agent = QAgent::seeded(LearnerConfig::default(), 12).unwrap();
        agent.learn(2);

        let greedy = agent.evaluate_with_policy(Policy::Greedy);
        let random = agent.evaluate_with_policy(Policy::Random);

        assert!(greedy > 0);
        assert!(random > 0);
    }

    #[test]
    fn test_agent_store_and_load() {
        let mut agent = QAgent::seeded(LearnerConfig::default(), 13).unwrap();
        agent.learn(2);

        let filepath = std::env::temp_dir().join("tilers_test_value_table.bin");
        agent.store(&filepath).unwrap();

        let loaded = QAgent::load(&filepath, LearnerConfig::default()).unwrap();

        assert_eq!(loaded.table().len(), agent.table().len());
        for ((key, action), value) in agent.table().iter() {
            let mut grid = [[0; 4]; 4];
            for (i, &v) in key.cells().iter().enumerate() {
                grid[i / 4][i % 4] = v;
            }
            assert_eq!(loaded.state_value(&grid, *action), *value);
        }

        std::fs::remove_file(&filepath).unwrap();
    }

    #[test]
    fn test_seeded_load_replays_evaluation() {
        let mut agent = QAgent::seeded(LearnerConfig::default(), 14).unwrap();
        agent.learn(3);

        let filepath = std::env::temp_dir().join("tilers_test_seeded_table.bin");
        agent.store(&filepath).unwrap();

        let mut first = QAgent::load_seeded(&filepath, greedy_config(), 15).unwrap();
        let mut second = QAgent::load_seeded(&filepath, greedy_config(), 15).unwrap();
        std::fs::remove_file(&filepath).unwrap();

        assert_eq!(first.config(), second.config());
        for _ in 0..3 {
            assert_eq!(
                first.evaluate_with_policy(Policy::Greedy),
                second.evaluate_with_policy(Policy::Greedy),
            );
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = QAgent::load("does/not/exist.bin", LearnerConfig::default());
        assert!(matches!(result, Err(crate::error::Error::Io(_))));
    }
}
