//! Placeholder cover rendering.
//!
//! Files without a usable cover image get a grey card with the title written
//! on it in white, using a built-in 5x7 bitmap font scaled by two. Lower-case
//! letters are drawn as capitals and characters without a glyph leave a gap.

use image::{DynamicImage, Rgba, RgbaImage};

pub const COVER_WIDTH: u32 = 200;
pub const COVER_HEIGHT: u32 = 277;

const TEXT_WIDTH: u32 = 180;
const MAX_LINES: usize = 5;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const SCALE: u32 = 2;
const ADVANCE: u32 = (GLYPH_WIDTH + 1) * SCALE;
const LINE_HEIGHT: u32 = (GLYPH_HEIGHT + 2) * SCALE;

const BACKGROUND: Rgba<u8> = Rgba([0x88, 0x88, 0x88, 0xFF]);
const FOREGROUND: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);

/// Renders the placeholder cover for `title`.
///
/// ```rust
/// use yomu::import::cover::{placeholder, COVER_HEIGHT, COVER_WIDTH};
///
/// let image = placeholder("Mother of Learning");
/// assert_eq!((image.width(), image.height()), (COVER_WIDTH, COVER_HEIGHT));
/// ```
pub fn placeholder(title: &str) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(COVER_WIDTH, COVER_HEIGHT, BACKGROUND);
    let lines = wrap_title(title);

    let block_height = (lines.len() as u32 * LINE_HEIGHT).saturating_sub(2 * SCALE);
    let top = COVER_HEIGHT.saturating_sub(block_height) / 2;

    for (row, line) in lines.iter().enumerate() {
        let chars = line.chars().count() as u32;
        let line_width = (chars * ADVANCE).saturating_sub(SCALE);
        let left = COVER_WIDTH.saturating_sub(line_width) / 2;
        let y = top + row as u32 * LINE_HEIGHT;

        for (column, c) in line.chars().enumerate() {
            if let Some(rows) = glyph(c) {
                draw_glyph(&mut canvas, &rows, left + column as u32 * ADVANCE, y);
            }
        }
    }

    DynamicImage::ImageRgba8(canvas)
}

/// Splits `title` into the lines drawn on the placeholder.
///
/// Words are kept whole when they fit the text width; longer words are
/// broken. At most five lines are kept.
///
/// ```rust
/// use yomu::import::cover::wrap_title;
///
/// assert_eq!(wrap_title("The Sage Summoned to Another World"),
///            vec!["The Sage", "Summoned to", "Another World"]);
/// ```
pub fn wrap_title(title: &str) -> Vec<String> {
    let max_chars = (TEXT_WIDTH / ADVANCE) as usize;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in title.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(max_chars) {
            let piece: String = piece.iter().collect();
            let needed = current.chars().count() + usize::from(!current.is_empty()) + piece.chars().count();
            if current.is_empty() {
                current = piece;
            } else if needed <= max_chars {
                current.push(' ');
                current.push_str(&piece);
            } else {
                lines.push(std::mem::replace(&mut current, piece));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.truncate(MAX_LINES);
    lines
}

fn draw_glyph(canvas: &mut RgbaImage, rows: &[u8; 7], x: u32, y: u32) {
    for (dy, bits) in rows.iter().enumerate() {
        for dx in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - dx)) == 0 {
                continue;
            }
            for sy in 0..SCALE {
                for sx in 0..SCALE {
                    let px = x + dx * SCALE + sx;
                    let py = y + dy as u32 * SCALE + sy;
                    if px < canvas.width() && py < canvas.height() {
                        canvas.put_pixel(px, py, FOREGROUND);
                    }
                }
            }
        }
    }
}

/// 5x7 glyph rows, most significant of the low five bits on the left.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '"' => [0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        ';' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        '&' => [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        _ => return None,
    };
    Some(rows)
}
