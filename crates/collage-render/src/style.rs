use collage_config::StyleConfig;
use palette::Srgb;

#[derive(Debug, thiserror::Error)]
#[error("invalid color `{value}` for style.{field}")]
pub struct StyleError {
    pub field: &'static str,
    pub value: String,
}

/// Resolved scene colors and stroke widths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneStyle {
    pub cell_fill: Srgb<u8>,
    pub border: Srgb<u8>,
    pub border_width: f64,
    pub active_border: Srgb<u8>,
    pub active_border_width: f64,
    pub background: Srgb<u8>,
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            cell_fill: Srgb::new(0xf8, 0xf8, 0xf8),
            border: Srgb::new(0x00, 0x00, 0x00),
            border_width: 3.0,
            active_border: Srgb::new(0xff, 0x98, 0x00),
            active_border_width: 6.0,
            background: Srgb::new(0xff, 0xff, 0xff),
        }
    }
}

impl SceneStyle {
    pub fn from_config(config: &StyleConfig) -> Result<Self, StyleError> {
        Ok(Self {
            cell_fill: parse_color("cell_fill", &config.cell_fill)?,
            border: parse_color("border", &config.border)?,
            border_width: config.border_width,
            active_border: parse_color("active_border", &config.active_border)?,
            active_border_width: config.active_border_width,
            background: parse_color("background", &config.background)?,
        })
    }
}

/// Parse `#rrggbb` or `#rgb`.
fn parse_color(field: &'static str, value: &str) -> Result<Srgb<u8>, StyleError> {
    value.trim().parse::<Srgb<u8>>().map_err(|_| StyleError {
        field,
        value: value.to_string(),
    })
}

pub(crate) fn hex(c: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}
