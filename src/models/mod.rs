pub mod pubg;
pub mod runs;
