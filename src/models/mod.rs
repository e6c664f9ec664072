pub mod communication;
pub mod game;
pub mod lobby;
