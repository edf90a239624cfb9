pub mod score;

pub use score::{LeaderboardRow, ScoreHistory, TransparencyScore};
