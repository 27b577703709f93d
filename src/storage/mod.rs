//! Persistence module: one JSON file per call sheet inside the data directory.

mod names;
mod sheets;
mod store;

pub use names::sheet_name;
pub use sheets::{delete_call_sheet, list_call_sheets, load_call_sheet, save_call_sheet};
pub use store::CallSheetStore;
