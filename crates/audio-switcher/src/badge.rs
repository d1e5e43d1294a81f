//! Procedural tray badge: a dark disc with the current device number.
//!
//! Digits are drawn from a 3x5 pixel font scaled 2x, so no image assets
//! need to ship with the binary.

/// Badge edge length in pixels.
pub(crate) const BADGE_SIZE: u32 = 32;

/// Largest number drawn; higher positions show this digit.
pub(crate) const MAX_BADGE_DIGIT: usize = 9;

const DISC_RADIUS: i32 = 14;
const DIGIT_SCALE: u32 = 2;
const DISC_RGBA: [u8; 4] = [30, 30, 30, 255];
const DIGIT_RGBA: [u8; 4] = [255, 255, 255, 255];

#[rustfmt::skip]
const DIGITS: [[u8; 5]; 10] = [
    // Each row is a 3-bit mask, most significant bit on the left.
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b001, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

/// Render a `BADGE_SIZE` square RGBA buffer.
///
/// `None` or `Some(0)` draws the bare disc.
pub(crate) fn render_badge(position: Option<usize>) -> Vec<u8> {
    let size = BADGE_SIZE as usize;
    let mut rgba = vec![0u8; size * size * 4];
    let center = BADGE_SIZE as i32 / 2;

    for y in 0..BADGE_SIZE {
        for x in 0..BADGE_SIZE {
            let dx = x as i32 - center;
            let dy = y as i32 - center;
            if dx * dx + dy * dy <= DISC_RADIUS * DISC_RADIUS {
                put_pixel(&mut rgba, x, y, DISC_RGBA);
            }
        }
    }

    if let Some(digit) = position.filter(|&p| p > 0).map(|p| p.min(MAX_BADGE_DIGIT)) {
        let glyph = &DIGITS[digit];
        let start_x = (BADGE_SIZE - 3 * DIGIT_SCALE) / 2;
        let start_y = (BADGE_SIZE - 5 * DIGIT_SCALE) / 2;

        for (row, mask) in glyph.iter().enumerate() {
            for col in 0..3u32 {
                if mask & (0b100 >> col) == 0 {
                    continue;
                }
                for sy in 0..DIGIT_SCALE {
                    for sx in 0..DIGIT_SCALE {
                        let px = start_x + col * DIGIT_SCALE + sx;
                        let py = start_y + row as u32 * DIGIT_SCALE + sy;
                        put_pixel(&mut rgba, px, py, DIGIT_RGBA);
                    }
                }
            }
        }
    }

    rgba
}

fn put_pixel(rgba: &mut [u8], x: u32, y: u32, color: [u8; 4]) {
    let idx = ((y * BADGE_SIZE + x) * 4) as usize;
    if let Some(pixel) = rgba.get_mut(idx..idx + 4) {
        pixel.copy_from_slice(&color);
    }
}
