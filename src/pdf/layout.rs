//! A small flowing-layout writer on top of `lopdf`. Content is appended top to
//! bottom (paragraphs, tables, images) and spills onto new pages when the
//! cursor reaches the bottom margin. Coordinates follow PDF conventions:
//! origin bottom-left, units in points.

use std::mem;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use crate::error::RenderError;

use super::fonts::{encode_win_ansi, text_width, FontStyle};
use super::template::PageSetup;

/// Line height as a multiple of the font size.
const LEADING: f32 = 1.25;
/// Inner padding of table cells.
const CELL_PADDING: f32 = 4.0;
/// Grey used behind table header rows.
const HEADER_GREY: f32 = 0.83;

/// A run of text in a single face.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub style: FontStyle,
}

impl Run {
    pub fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: FontStyle::Regular,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: FontStyle::Bold,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: FontStyle::Italic,
        }
    }
}

/// Decoded RGB pixels ready to embed as an image XObject.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, 8 bits per channel.
    pub rgb: Vec<u8>,
}

/// Accumulates pages of drawing operations and serializes them on `finish`.
pub struct PageWriter {
    page: PageSetup,
    title: String,
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    /// Top of the remaining free space on the current page.
    cursor: f32,
    images: Vec<(String, Stream)>,
}

impl PageWriter {
    pub fn new(page: &PageSetup, title: impl Into<String>) -> Self {
        Self {
            page: page.clone(),
            title: title.into(),
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: page.height - page.margin,
            images: Vec::new(),
        }
    }

    pub fn text_width(&self) -> f32 {
        self.page.width - 2.0 * self.page.margin
    }

    /// Number of pages started so far, counting the one being written.
    pub fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    fn top(&self) -> f32 {
        self.page.height - self.page.margin
    }

    fn new_page(&mut self) {
        let finished = mem::take(&mut self.ops);
        self.pages.push(finished);
        self.cursor = self.top();
    }

    /// Start a new page unless `height` still fits. A fresh page always
    /// accepts content, even if it overflows, so oversized blocks cannot loop.
    fn ensure_space(&mut self, height: f32) {
        let at_top = (self.cursor - self.top()).abs() < f32::EPSILON;
        if !at_top && self.cursor - height < self.page.margin {
            self.new_page();
        }
    }

    /// Vertical gap. Gaps never carry over to a new page.
    pub fn spacer(&mut self, height: f32) {
        self.cursor = (self.cursor - height).max(self.page.margin);
    }

    /// Wrapped text across the full text width.
    pub fn paragraph(&mut self, runs: &[Run], size: f32) {
        self.paragraph_indented(runs, size, 0.0);
    }

    /// Wrapped text starting `indent` points in from the left margin.
    pub fn paragraph_indented(&mut self, runs: &[Run], size: f32, indent: f32) {
        let width = self.text_width() - indent;
        let line_height = size * LEADING;
        for line in wrap_runs(runs, size, width) {
            self.ensure_space(line_height);
            let baseline = self.cursor - size;
            self.draw_line(&line, self.page.margin + indent, baseline, size);
            self.cursor -= line_height;
        }
    }

    /// Bulleted items with a hanging indent.
    pub fn bullets(&mut self, items: &[String], size: f32) {
        let indent = text_width("\u{2022} ", FontStyle::Regular, size);
        let line_height = size * LEADING;
        for item in items {
            self.ensure_space(line_height);
            let baseline = self.cursor - size;
            self.draw_line(
                &[Run::regular("\u{2022}")],
                self.page.margin,
                baseline,
                size,
            );
            self.paragraph_indented(&[Run::regular(item.clone())], size, indent);
        }
    }

    /// Grid table with a grey, bold header row that repeats after page breaks.
    /// Column widths wider than the text area are scaled down to fit.
    pub fn table(&mut self, widths: &[f32], header: &[&str], rows: &[Vec<String>], size: f32) {
        let widths = fit_widths(widths, header.len(), self.text_width());
        let header_cells: Vec<Vec<Vec<Run>>> = header
            .iter()
            .zip(&widths)
            .map(|(text, width)| wrap_cell(&Run::bold(*text), size, *width))
            .collect();
        let header_height = row_height(&header_cells, size);

        let first_height = rows
            .first()
            .map(|row| row_height(&wrap_row(row, &widths, size), size))
            .unwrap_or(0.0);
        self.ensure_space(header_height + first_height);
        self.draw_row(&header_cells, &widths, header_height, size, true);

        for row in rows {
            let cells = wrap_row(row, &widths, size);
            let height = row_height(&cells, size);
            if self.cursor - height < self.page.margin {
                self.new_page();
                self.draw_row(&header_cells, &widths, header_height, size, true);
            }
            self.draw_row(&cells, &widths, height, size, false);
        }
    }

    fn draw_row(
        &mut self,
        cells: &[Vec<Vec<Run>>],
        widths: &[f32],
        height: f32,
        size: f32,
        header: bool,
    ) {
        let top = self.cursor;
        let bottom = top - height;
        let mut x = self.page.margin;

        if header {
            let total: f32 = widths.iter().sum();
            self.ops.push(Operation::new("q", vec![]));
            self.ops
                .push(Operation::new("g", vec![Object::Real(HEADER_GREY)]));
            self.ops.push(rect_op(x, bottom, total, height));
            self.ops.push(Operation::new("f", vec![]));
            self.ops.push(Operation::new("Q", vec![]));
        }

        for (lines, width) in cells.iter().zip(widths) {
            let mut baseline = top - CELL_PADDING - size;
            for line in lines {
                let line_x = if header {
                    let used: f32 = line
                        .iter()
                        .map(|run| text_width(&run.text, run.style, size))
                        .sum();
                    x + (width - used).max(0.0) / 2.0
                } else {
                    x + CELL_PADDING
                };
                self.draw_line(line, line_x, baseline, size);
                baseline -= size * LEADING;
            }

            self.ops
                .push(Operation::new("w", vec![Object::Real(0.5)]));
            self.ops
                .push(Operation::new("G", vec![Object::Real(0.0)]));
            self.ops.push(rect_op(x, bottom, *width, height));
            self.ops.push(Operation::new("S", vec![]));
            x += width;
        }

        self.cursor = bottom;
    }

    /// Place an image of `width` x `height` points against the right margin.
    pub fn image_right(&mut self, image: RasterImage, width: f32, height: f32) {
        self.ensure_space(height);
        let name = format!("Im{}", self.images.len() + 1);

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        };
        let mut stream = Stream::new(dict, image.rgb);
        // Left raw when compression fails.
        let _ = stream.compress();
        self.images.push((name.clone(), stream));

        let x = self.page.width - self.page.margin - width;
        let y = self.cursor - height;
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                Object::Real(width),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(height),
                Object::Real(x),
                Object::Real(y),
            ],
        ));
        self.ops
            .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.ops.push(Operation::new("Q", vec![]));
        self.cursor = y;
    }

    fn draw_line(&mut self, runs: &[Run], x: f32, baseline: f32, size: f32) {
        let mut x = x;
        for run in runs {
            if run.text.is_empty() {
                continue;
            }
            self.ops.push(Operation::new("BT", vec![]));
            self.ops.push(Operation::new(
                "Tf",
                vec![
                    Object::Name(run.style.resource_name().as_bytes().to_vec()),
                    Object::Real(size),
                ],
            ));
            self.ops.push(Operation::new(
                "Td",
                vec![Object::Real(x), Object::Real(baseline)],
            ));
            self.ops.push(Operation::new(
                "Tj",
                vec![Object::String(
                    encode_win_ansi(&run.text),
                    StringFormat::Literal,
                )],
            ));
            self.ops.push(Operation::new("ET", vec![]));
            x += text_width(&run.text, run.style, size);
        }
    }

    /// Serialize every page into a complete PDF file.
    pub fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        self.new_page();

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for style in FontStyle::ALL {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => style.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(style.resource_name(), font_id);
        }

        let mut xobjects = Dictionary::new();
        for (name, stream) in mem::take(&mut self.images) {
            let image_id = doc.add_object(stream);
            xobjects.set(name, image_id);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
            "XObject" => xobjects,
        });

        let mut kids = Vec::with_capacity(self.pages.len());
        for operations in mem::take(&mut self.pages) {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(self.page.width),
                    Object::Real(self.page.height),
                ],
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_win_ansi(&self.title)),
            "Producer" => Object::string_literal("callsheet-maker"),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|err| RenderError::Pdf(format!("save failed: {err}")))?;
        Ok(buffer)
    }
}

fn rect_op(x: f32, y: f32, width: f32, height: f32) -> Operation {
    Operation::new(
        "re",
        vec![
            Object::Real(x),
            Object::Real(y),
            Object::Real(width),
            Object::Real(height),
        ],
    )
}

/// Use the template's widths for the first `columns` columns, padding with an
/// even share of the leftover space and scaling down if the total overflows.
fn fit_widths(widths: &[f32], columns: usize, available: f32) -> Vec<f32> {
    let mut fitted: Vec<f32> = widths.iter().copied().take(columns).collect();
    if fitted.len() < columns {
        let used: f32 = fitted.iter().sum();
        let missing = columns - fitted.len();
        let share = ((available - used) / missing as f32).max(CELL_PADDING * 4.0);
        fitted.extend(std::iter::repeat(share).take(missing));
    }
    let total: f32 = fitted.iter().sum();
    if total > available && total > 0.0 {
        let scale = available / total;
        for width in &mut fitted {
            *width *= scale;
        }
    }
    fitted
}

fn wrap_cell(run: &Run, size: f32, width: f32) -> Vec<Vec<Run>> {
    wrap_runs(
        std::slice::from_ref(run),
        size,
        (width - 2.0 * CELL_PADDING).max(size),
    )
}

fn wrap_row(row: &[String], widths: &[f32], size: f32) -> Vec<Vec<Vec<Run>>> {
    widths
        .iter()
        .enumerate()
        .map(|(idx, width)| {
            let text = row.get(idx).map(String::as_str).unwrap_or("");
            wrap_cell(&Run::regular(text), size, *width)
        })
        .collect()
}

fn row_height(cells: &[Vec<Vec<Run>>], size: f32) -> f32 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    lines as f32 * size * LEADING + 2.0 * CELL_PADDING - (LEADING - 1.0) * size
}

/// Greedy word wrap across styled runs. Words are separated by single spaces;
/// `\n` inside a run forces a break, and a word wider than the line is split
/// across lines by character.
pub fn wrap_runs(runs: &[Run], size: f32, max_width: f32) -> Vec<Vec<Run>> {
    let mut lines: Vec<Vec<Run>> = Vec::new();
    let mut line: Vec<Run> = Vec::new();
    let mut width = 0.0_f32;

    for run in runs {
        for (segment_idx, segment) in run.text.split('\n').enumerate() {
            if segment_idx > 0 {
                lines.push(mem::take(&mut line));
                width = 0.0;
            }
            for word in segment.split_whitespace() {
                for piece in split_long_word(word, run.style, size, max_width) {
                    let piece_width = text_width(&piece, run.style, size);
                    let space = if line.is_empty() {
                        0.0
                    } else {
                        text_width(" ", run.style, size)
                    };

                    if !line.is_empty() && width + space + piece_width > max_width {
                        lines.push(mem::take(&mut line));
                        width = 0.0;
                        push_word(&mut line, &piece, run.style, false);
                        width += piece_width;
                    } else {
                        push_word(&mut line, &piece, run.style, space > 0.0);
                        width += space + piece_width;
                    }
                }
            }
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn push_word(line: &mut Vec<Run>, word: &str, style: FontStyle, leading_space: bool) {
    let text = if leading_space {
        format!(" {word}")
    } else {
        word.to_string()
    };
    match line.last_mut() {
        Some(last) if last.style == style => last.text.push_str(&text),
        _ => line.push(Run { text, style }),
    }
}

fn split_long_word(word: &str, style: FontStyle, size: f32, max_width: f32) -> Vec<String> {
    if text_width(word, style, size) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if !current.is_empty() && text_width(&candidate, style, size) > max_width {
            pieces.push(mem::take(&mut current));
            current.push(ch);
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter() -> PageSetup {
        PageSetup {
            width: 612.0,
            height: 792.0,
            margin: 36.0,
        }
    }

    fn plain(lines: &[Vec<Run>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.iter().map(|run| run.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let runs = [Run::regular("alpha beta gamma delta")];
        let width = text_width("gamma delta", FontStyle::Regular, 10.0) + 1.0;
        let lines = wrap_runs(&runs, 10.0, width);
        assert_eq!(plain(&lines), vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn keeps_styles_and_joins_runs_with_spaces() {
        let runs = [Run::bold("Dana (Lead):"), Run::regular("bring  umbrella")];
        let lines = wrap_runs(&runs, 10.0, 500.0);
        assert_eq!(
            lines,
            vec![vec![
                Run::bold("Dana (Lead):"),
                Run::regular(" bring umbrella")
            ]]
        );
    }

    #[test]
    fn newline_forces_break_and_empty_text_yields_one_line() {
        let lines = wrap_runs(&[Run::regular("Stage 4\n12 Studio Way")], 10.0, 500.0);
        assert_eq!(plain(&lines), vec!["Stage 4", "12 Studio Way"]);
        assert_eq!(wrap_runs(&[Run::regular("")], 10.0, 100.0).len(), 1);
    }

    #[test]
    fn splits_words_longer_than_the_line() {
        let lines = wrap_runs(&[Run::regular("x".repeat(40))], 10.0, 50.0);
        assert!(lines.len() > 1);
        for line in plain(&lines) {
            assert!(text_width(&line, FontStyle::Regular, 10.0) <= 50.0);
        }
    }

    #[test]
    fn widths_scale_to_available_space() {
        assert_eq!(fit_widths(&[300.0, 300.0], 2, 300.0), vec![150.0, 150.0]);
        assert_eq!(fit_widths(&[100.0], 2, 300.0), vec![100.0, 200.0]);
    }

    #[test]
    fn long_tables_flow_onto_new_pages() {
        let mut writer = PageWriter::new(&letter(), "Roster");
        let rows: Vec<Vec<String>> = (0..120)
            .map(|idx| vec![format!("Person {idx}"), "Grip".into(), "07:00 AM".into()])
            .collect();
        writer.table(&[180.0, 180.0, 72.0], &["Name", "Role", "Call Time"], &rows, 10.0);
        assert!(writer.page_count() >= 3);

        let bytes = writer.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() >= 3);
    }

    #[test]
    fn empty_writer_still_produces_one_page() {
        let bytes = PageWriter::new(&letter(), "Blank").finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), 1);
    }
}
