pub mod at_bats;
pub mod boxscores;
pub mod dim_game;
