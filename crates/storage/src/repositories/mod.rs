pub mod analysis_repo;
pub mod events_repo;
pub mod trades_repo;

pub use analysis_repo::AnalysisRepository;
pub use events_repo::EventsRepository;
pub use trades_repo::TradesRepository;
