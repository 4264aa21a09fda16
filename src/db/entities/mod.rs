pub mod minigame_penalties;
pub mod strikes;
pub mod timeouts;
pub mod warnings;
