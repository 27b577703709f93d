//! PDF generation: templates, a flowing page layout, and the call sheet
//! renderer that ties them together.

mod fonts;
mod layout;
mod render;
mod template;

pub use fonts::FontStyle;
pub use layout::{wrap_runs, PageWriter, RasterImage, Run};
pub use render::{export_call_sheet, preview_call_sheet, render_call_sheet};
pub use template::{
    discover_templates, field_value, seed_templates, substitute, ColumnWidths, FontSizes, LogoBox,
    PageSetup, Section, Template, STANDARD_TEMPLATE,
};
