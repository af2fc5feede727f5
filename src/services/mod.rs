pub mod announcement;
pub mod classifier;
pub mod notifier;
pub mod pipeline;
pub mod pubg_client;
pub mod runs;
