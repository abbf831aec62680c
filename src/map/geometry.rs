use crate::braille::BrailleCanvas;

/// Walk the pixels of a line using Bresenham's algorithm
fn for_each_line_point(x0: i32, y0: i32, x1: i32, y1: i32, mut plot: impl FnMut(i32, i32)) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        plot(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a solid one-pixel line
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    for_each_line_point(x0, y0, x1, y1, |x, y| canvas.set_pixel_signed(x, y));
}

/// Stroke settings for outlines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stroke {
    /// Line weight in pixels (1 or 2)
    pub weight: u8,
    /// Dash length in pixels; gaps are the same length. `None` is solid.
    pub dash: Option<u32>,
}

/// Draw a line with the given stroke. `phase` carries the dash position
/// across consecutive segments of one ring so dashes stay continuous.
pub fn draw_stroke(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, stroke: Stroke, phase: &mut u32) {
    let mut first = true;
    for_each_line_point(x0, y0, x1, y1, |x, y| {
        // Shared endpoint with the previous segment
        if first {
            first = false;
            if *phase > 0 {
                return;
            }
        }

        let on = match stroke.dash {
            Some(len) if len > 0 => (*phase / len) % 2 == 0,
            _ => true,
        };
        *phase = phase.wrapping_add(1);

        if on {
            canvas.set_pixel_signed(x, y);
            if stroke.weight > 1 {
                canvas.set_pixel_signed(x + 1, y);
                canvas.set_pixel_signed(x, y + 1);
            }
        }
    });
}

/// Draw a filled circle (for city markers)
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Draw the one-pixel perimeter of a circle (marker outlines)
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    let inner = (radius - 1) * (radius - 1);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d2 = dx * dx + dy * dy;
            if d2 > inner && d2 <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}
