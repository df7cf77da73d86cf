use crate::glyphs::GlyphTable;
use crate::noise::Perlin3;

/// How far the sample point moves along the z axis per unit of animation
/// time. Keeps the field drifting slowly relative to the frame cadence.
pub const TIME_DEPTH: f64 = 0.05;

const RESET: &str = "\x1b[0m";

/// Render one complete frame: every cell sampled from the noise field and
/// mapped through the glyph table. Identical inputs always produce a
/// bit-identical frame, which is what makes render workers interchangeable.
pub fn render_frame(
    width: usize,
    height: usize,
    scale: f64,
    t: f64,
    noise: &Perlin3,
    table: &GlyphTable,
) -> String {
    let cell = if table.is_colored() { 24 } else { 4 };
    let mut frame = String::with_capacity(width * height * cell + height + RESET.len());
    let z = t * TIME_DEPTH;
    for y in 0..height {
        if y > 0 {
            frame.push('\n');
        }
        let ys = y as f64 * scale;
        for x in 0..width {
            let v = noise.sample(x as f64 * scale, ys, z);
            frame.push_str(table.entry(v));
        }
    }
    if table.is_colored() {
        // Entries carry their own leading color code, so one reset at the
        // very end is enough.
        frame.push_str(RESET);
    }
    frame
}

/// All-spaces frame of the same shape, substituted when a render is lost.
pub fn blank_frame(width: usize, height: usize) -> String {
    let mut frame = String::with_capacity((width + 1) * height);
    for y in 0..height {
        if y > 0 {
            frame.push('\n');
        }
        for _ in 0..width {
            frame.push(' ');
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_seed_reproduces_an_identical_grid() {
        let charset = " .:-=+*#%@";
        let noise = Perlin3::new(42);
        let table = GlyphTable::new(charset, None);
        let first = render_frame(4, 2, 0.1, 0.0, &noise, &table);
        let second = render_frame(4, 2, 0.1, 0.0, &Perlin3::new(42), &table);
        assert_eq!(first, second);

        let rows: Vec<&str> = first.split('\n').collect();
        assert_eq!(rows.len(), 2);
        for row in rows {
            assert_eq!(row.chars().count(), 4);
            assert!(row.chars().all(|c| charset.contains(c)));
        }
    }

    #[test]
    fn distinct_time_slices_differ() {
        let noise = Perlin3::new(42);
        let table = GlyphTable::new(" .:-=+*#%@", None);
        let early = render_frame(40, 12, 0.1, 0.0, &noise, &table);
        let late = render_frame(40, 12, 0.1, 20.0, &noise, &table);
        assert_ne!(early, late);
    }

    #[test]
    fn colored_frame_has_one_trailing_reset() {
        let noise = Perlin3::new(1);
        let start = crate::glyphs::Rgb::new(255, 17, 17);
        let end = crate::glyphs::Rgb::new(17, 255, 255);
        let table = GlyphTable::new(" .:-=+*#%@", Some((start, end)));
        let frame = render_frame(6, 3, 0.1, 0.0, &noise, &table);
        assert!(frame.ends_with(RESET));
        assert_eq!(frame.matches(RESET).count(), 1);
        assert_eq!(frame.matches("\x1b[38;2;").count(), 6 * 3);
    }

    #[test]
    fn blank_frame_matches_the_geometry() {
        let frame = blank_frame(5, 3);
        let rows: Vec<&str> = frame.split('\n').collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| *r == "     "));
    }
}
