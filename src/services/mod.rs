pub mod aggregator;
pub mod espn;
pub mod ingestor;
pub mod predictor;

pub use espn::EspnClient;
pub use predictor::MatchupPredictor;
