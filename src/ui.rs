//! Ratatui front-end: a library of saved call sheets and a tabbed editor with
//! modal forms for each entity.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
