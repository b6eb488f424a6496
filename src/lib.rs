pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod fakes;
pub mod mail;
pub mod ocr;
pub mod state;
pub mod weights;

pub use state::AppState;
