use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use super::Agent;
use crate::error::{Error, Result};
use crate::game::{Action, Game, Grid};

// private copy of the board with its own spawn stream
fn fork(rng: &mut StdRng, state: &Grid) -> Game {
    Game::from_state_with_rng(*state, 0, StdRng::from_rng(rng))
}

// first maximum wins; a non-positive best means nothing was learned, so guess
fn pick_positive_max<R: Rng + ?Sized>(totals: &[i32; 4], rng: &mut R) -> Action {
    let mut best = 0;
    for i in 1..totals.len() {
        if totals[i] > totals[best] {
            best = i;
        }
    }

    if totals[best] > 0 {
        Action::ALL[best]
    } else {
        Action::random(rng)
    }
}

/// Uniform over all four directions, including ones that would not move.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        RandomAgent { rng }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn select_action(&mut self, _state: &Grid) -> Action {
        Action::random(&mut self.rng)
    }

    fn name(&self) -> &str {
        "Random Player"
    }

    fn clone_agent(&self) -> Box<dyn Agent> {
        Box::new(RandomAgent::new())
    }
}

/// Tries every direction once and keeps the one with the largest immediate reward.
pub struct OneStepAgent {
    rng: StdRng,
}

impl OneStepAgent {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        OneStepAgent { rng }
    }

    /// Immediate reward of each action, indexed like `Action::ALL`.
    pub fn rewards(&mut self, state: &Grid) -> [i32; 4] {
        Action::ALL.map(|action| fork(&mut self.rng, state).do_action(action).1)
    }
}

impl Default for OneStepAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for OneStepAgent {
    fn select_action(&mut self, state: &Grid) -> Action {
        let rewards = self.rewards(state);
        pick_positive_max(&rewards, &mut self.rng)
    }

    fn name(&self) -> &str {
        "One Step Player"
    }

    fn clone_agent(&self) -> Box<dyn Agent> {
        Box::new(OneStepAgent::new())
    }
}

/// Plays each root action followed by `depth - 1` greedy one-step moves and
/// keeps the root with the largest accumulated reward.
pub struct MultiStepAgent {
    depth: usize,
    name: String,
    rng: StdRng,
    one_step: OneStepAgent,
}

impl MultiStepAgent {
    pub fn new(depth: usize) -> Result<Self> {
        Self::with_rng(depth, StdRng::from_os_rng())
    }

    pub fn seeded(depth: usize, seed: u64) -> Result<Self> {
        Self::with_rng(depth, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(depth: usize, mut rng: StdRng) -> Result<Self> {
        if depth == 0 {
            return Err(Error::InvalidConfiguration(
                "lookahead depth must be at least 1".into(),
            ));
        }

        let one_step = OneStepAgent::with_rng(StdRng::from_rng(&mut rng));
        Ok(MultiStepAgent {
            depth,
            name: format!("Multi Step Player (depth {})", depth),
            rng,
            one_step,
        })
    }

    pub fn depth(&self) -> usize {self.depth}

    /// Accumulated reward of each root action, indexed like `Action::ALL`.
    ///
    /// Every rollout plays exactly `depth` moves. Moves on a finished board
    /// still cost the illegal-move penalty.
    pub fn rewards(&mut self, state: &Grid) -> [i32; 4] {
        let mut totals = [0; 4];

        for (i, &action) in Action::ALL.iter().enumerate() {
            let mut game = fork(&mut self.rng, state);
            let (mut next_state, reward, _) = game.do_action(action);
            totals[i] = reward;

            for _ in 1..self.depth {
                let (s, r, _) = game.do_action(self.one_step.select_action(&next_state));
                next_state = s;
                totals[i] += r;
            }
        }

        totals
    }
}

impl Agent for MultiStepAgent {
    fn select_action(&mut self, state: &Grid) -> Action {
        let totals = self.rewards(state);
        pick_positive_max(&totals, &mut self.rng)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn clone_agent(&self) -> Box<dyn Agent> {
        let mut rng = StdRng::from_os_rng();
        let one_step = OneStepAgent::with_rng(StdRng::from_rng(&mut rng));
        Box::new(MultiStepAgent {
            depth: self.depth,
            name: self.name.clone(),
            rng,
            one_step,
        })
    }
}
