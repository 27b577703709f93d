//! Call sheet maker: build production call sheets in a terminal UI, keep them
//! as JSON files, and export them as PDFs laid out by a template.
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod pdf;
pub mod storage;
pub mod ui;

pub use config::AppConfig;
pub use error::{CallSheetError, RenderError, TemplateError, ValidationError};
pub use models::{CallSheet, CastMember, Contact, CrewMember, Location};
pub use pdf::{export_call_sheet, preview_call_sheet, render_call_sheet, Template};
pub use storage::{
    delete_call_sheet, list_call_sheets, load_call_sheet, save_call_sheet, CallSheetStore,
};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
