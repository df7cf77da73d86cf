use std::fmt;
use std::fmt::Write;

/// Colorized tables are expanded to this many entries so the gradient stays
/// smooth no matter how few distinct glyphs the charset has.
pub const EXPANDED_LEN: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let ch = |a: u8, b: u8| {
            (a as f64 + (b as f64 - a as f64) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb::new(ch(self.r, other.r), ch(self.g, other.g), ch(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Precomputed intensity → styled glyph mapping.
///
/// With a gradient, every entry is a ready-to-print truecolor escape plus its
/// glyph; without one, entries are the bare charset. Either way the per-cell
/// hot path is one normalize, one multiply, one truncation and one index —
/// all color arithmetic happened here, at build time.
pub struct GlyphTable {
    entries: Vec<String>,
    colored: bool,
}

impl GlyphTable {
    pub fn new(charset: &str, gradient: Option<(Rgb, Rgb)>) -> Self {
        let glyphs: Vec<char> = charset.chars().collect();
        debug_assert!(!glyphs.is_empty(), "charset must not be empty");
        match gradient {
            Some((start, end)) => Self {
                entries: expand_colored(&glyphs, start, end),
                colored: true,
            },
            None => Self {
                entries: glyphs.iter().map(|g| g.to_string()).collect(),
                colored: false,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_colored(&self) -> bool {
        self.colored
    }

    /// Map a raw noise sample in [-1, 1] to its display entry.
    pub fn entry(&self, v: f64) -> &str {
        &self.entries[self.index(v)]
    }

    fn index(&self, v: f64) -> usize {
        let t = ((v + 1.0) * 0.5).clamp(0.0, 1.0);
        let idx = (t * (self.entries.len() - 1) as f64) as usize;
        idx.min(self.entries.len() - 1)
    }
}

fn expand_colored(glyphs: &[char], start: Rgb, end: Rgb) -> Vec<String> {
    let per_glyph = EXPANDED_LEN / glyphs.len();
    let mut entries = Vec::with_capacity(EXPANDED_LEN);
    for (gi, &glyph) in glyphs.iter().enumerate() {
        // The last glyph absorbs the division remainder so the table comes
        // out at exactly EXPANDED_LEN.
        let repeats = if gi == glyphs.len() - 1 {
            EXPANDED_LEN - entries.len()
        } else {
            per_glyph
        };
        for _ in 0..repeats {
            // Interpolate across the whole table, not per glyph: the
            // gradient stays smooth even for a two-glyph charset.
            let t = entries.len() as f64 / (EXPANDED_LEN - 1) as f64;
            let Rgb { r, g, b } = start.lerp(end, t);
            let mut entry = String::with_capacity(24);
            let _ = write!(entry, "\x1b[38;2;{r};{g};{b}m{glyph}");
            entries.push(entry);
        }
    }
    entries
}
