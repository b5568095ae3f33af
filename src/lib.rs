pub mod tensor;

pub use tensor::Tensor;

pub mod game;

pub use game::{Action, Game, Grid};

pub mod agent;

pub use agent::{Agent, Evaluation, play_once, test_player};
pub use agent::lookahead::{
    RandomAgent,
    OneStepAgent,
    MultiStepAgent,
};
pub use agent::qlearning::{
    QAgent,
    Policy,
};
pub use agent::valuetable::{
    ValueTable,
    StateKey,
};

pub mod config;

pub use config::LearnerConfig;

pub mod error;

pub use error::{Error, Result};
