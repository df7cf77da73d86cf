use clap::{Parser, ValueEnum};
use rand::{rngs::StdRng, Rng};

use crate::glyphs::Rgb;

#[derive(Parser, Debug, Clone)]
#[command(name = "terminoise")]
#[command(about = "Animated coherent-noise field for your terminal", long_about = None)]
pub struct Args {
    /// Character set used for rendering
    #[arg(short, long, value_enum, default_value = "horizontal")]
    pub charset: Charset,

    /// Noise scale factor; smaller is more detailed, larger is smoother
    #[arg(short, long, default_value = "0.1", value_parser = parse_scale)]
    pub scale: f64,

    /// Gradient start color in hex (e.g. '#FF5733')
    #[arg(long, default_value = "#FF1111", value_parser = parse_hex_color)]
    pub color_start: Rgb,

    /// Gradient end color in hex
    #[arg(long, default_value = "#11FFFF", value_parser = parse_hex_color)]
    pub color_end: Rgb,

    /// Disable the color gradient (monochrome output)
    #[arg(long)]
    pub no_color: bool,

    /// Show a rolling FPS estimate on the last line
    #[arg(long)]
    pub show_fps: bool,

    /// Target maximum FPS
    #[arg(long, default_value = "120", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_fps: u32,

    /// Noise seed; unseeded runs use the current time and are not reproducible
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use a random charset and colors with guaranteed contrast
    #[arg(long)]
    pub random: bool,

    /// Render frames inline instead of on the worker pool
    #[arg(long)]
    pub serial: bool,

    /// Render worker count; defaults to the available CPU parallelism
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    Simple,
    Blocks,
    Box,
    Squares,
    Vertical,
    Mvertical,
    Vvertical,
    Braille,
    Horizontal,
    Mhorizontal,
    Vhorizontal,
}

impl Charset {
    pub const ALL: [Charset; 11] = [
        Charset::Simple,
        Charset::Blocks,
        Charset::Box,
        Charset::Squares,
        Charset::Vertical,
        Charset::Mvertical,
        Charset::Vvertical,
        Charset::Braille,
        Charset::Horizontal,
        Charset::Mhorizontal,
        Charset::Vhorizontal,
    ];

    pub fn glyphs(self) -> String {
        match self {
            Charset::Simple => " .:-=+*#%@".to_string(),
            Charset::Blocks => " ░▒▓█".to_string(),
            Charset::Box => " ·│─┌┐└┘├┤┬┴┼═║╔╗╚╝╠╣╦╩╬".to_string(),
            Charset::Squares => " ■▄▀▌▐█".to_string(),
            Charset::Vertical => " ▁▂▃▄▅▆▇█".to_string(),
            Charset::Mvertical => "▁▂▃▄▅▆▇█▇▆▅▄▃▂▁".to_string(),
            Charset::Vvertical => "█▇▆▅▄▃▂▁▁▂▃▄▅▆▇█".to_string(),
            Charset::Braille => (0x2800..0x2900).filter_map(char::from_u32).collect(),
            Charset::Horizontal => " ▏▎▍▌▋▊▉█".to_string(),
            Charset::Mhorizontal => "▏▎▍▌▋▊▉█▉▉▊▋▌▍▎▏".to_string(),
            Charset::Vhorizontal => "▉▉▊▋▌▍▎▏▏▎▍▌▋▊▉█".to_string(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Charset::Simple => "simple",
            Charset::Blocks => "blocks",
            Charset::Box => "box",
            Charset::Squares => "squares",
            Charset::Vertical => "vertical",
            Charset::Mvertical => "mvertical",
            Charset::Vvertical => "vvertical",
            Charset::Braille => "braille",
            Charset::Horizontal => "horizontal",
            Charset::Mhorizontal => "mhorizontal",
            Charset::Vhorizontal => "vhorizontal",
        }
    }
}

pub fn random_charset(rng: &mut StdRng) -> Charset {
    Charset::ALL[rng.gen_range(0..Charset::ALL.len())]
}

/// Two random colors that are guaranteed to contrast: every channel of the
/// second color sits at least half the first channel's headroom away.
pub fn random_colors(rng: &mut StdRng) -> (Rgb, Rgb) {
    let first = Rgb::new(rng.gen(), rng.gen(), rng.gen());
    let second = Rgb::new(
        shift_channel(first.r, rng),
        shift_channel(first.g, rng),
        shift_channel(first.b, rng),
    );
    (first, second)
}

fn shift_channel(value: u8, rng: &mut StdRng) -> u8 {
    if value >= 128 {
        rng.gen_range(0..=value - value / 2)
    } else {
        rng.gen_range(128..=255)
    }
}

fn parse_hex_color(raw: &str) -> Result<Rgb, String> {
    let hex = raw.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid hex color '{raw}': expected 6 hex digits"));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|e| e.to_string())
    };
    Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn parse_scale(raw: &str) -> Result<f64, String> {
    let scale: f64 = raw
        .parse()
        .map_err(|_| format!("invalid scale '{raw}'"))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err("scale must be a positive number".to_string())
    }
}

fn parse_workers(raw: &str) -> Result<usize, String> {
    let workers: usize = raw
        .parse()
        .map_err(|_| format!("invalid worker count '{raw}'"))?;
    if workers == 0 {
        Err("worker count must be at least 1".to_string())
    } else {
        Ok(workers)
    }
}
