pub mod event_manager;
pub mod localization;
pub mod logger;
pub mod pit;
pub mod roulette;
