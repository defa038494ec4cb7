//! Cell formatting records.
//!
//! These mirror the parts of `styles.xml` that the report template relies on:
//! fonts, pattern fills, borders, alignment, number formats and protection.
//! Every cell owns its own `CellStyle`; the writer folds identical styles back
//! into shared formats when the workbook is saved.

/// A color as it appears in the template
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Color {
    /// Opaque `0xRRGGBB` value
    Rgb(u32),
    /// Theme palette slot and its tint, from -1.0 (darker) to 1.0 (lighter)
    Theme(u8, f64),
    /// Legacy indexed palette slot
    Indexed(u8),
    /// Application default (usually black text, no fill)
    Automatic,
}

impl Color {
    /// Parses `RRGGBB` or `AARRGGBB` hex text. The alpha channel is ignored.
    pub fn from_hex(hex: &str) -> Option<Color> {
        let hex = hex.trim().trim_start_matches('#');
        let rgb = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return None,
        };
        u32::from_str_radix(rgb, 16).ok().map(Color::Rgb)
    }

    /// Resolves the color to RGB where the value is fixed
    pub fn to_rgb(&self) -> Option<u32> {
        match self {
            Color::Rgb(rgb) => Some(*rgb),
            Color::Indexed(index) => indexed_color(*index),
            Color::Theme(..) | Color::Automatic => None,
        }
    }
}

/// The first entries of the legacy indexed palette
fn indexed_color(index: u8) -> Option<u32> {
    const PALETTE: [u32; 16] = [
        0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF,
        0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF,
    ];
    match index {
        0..=15 => Some(PALETTE[index as usize]),
        16 => Some(0x800000),
        17 => Some(0x008000),
        18 => Some(0x000080),
        19 => Some(0x808000),
        20 => Some(0x800080),
        21 => Some(0x008080),
        22 => Some(0xC0C0C0),
        23 => Some(0x808080),
        _ => None,
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Font {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub color: Option<Color>,
}

impl Font {
    pub fn new(name: &str, size: f64) -> Font {
        Font {
            name: Some(name.to_owned()),
            size: Some(size),
            ..Font::default()
        }
    }

    pub fn with_bold(mut self, bold: bool) -> Font {
        self.bold = bold;
        self
    }

    pub fn with_color(mut self, color: Color) -> Font {
        self.color = Some(color);
        self
    }
}

/// Pattern of a cell fill, named as in `patternFill/@patternType`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillPattern {
    #[default]
    None,
    Solid,
    MediumGray,
    DarkGray,
    LightGray,
    DarkHorizontal,
    DarkVertical,
    DarkDown,
    DarkUp,
    DarkGrid,
    DarkTrellis,
    LightHorizontal,
    LightVertical,
    LightDown,
    LightUp,
    LightGrid,
    LightTrellis,
    Gray125,
    Gray0625,
}

impl FillPattern {
    pub fn parse(name: &str) -> FillPattern {
        match name {
            "solid" => FillPattern::Solid,
            "mediumGray" => FillPattern::MediumGray,
            "darkGray" => FillPattern::DarkGray,
            "lightGray" => FillPattern::LightGray,
            "darkHorizontal" => FillPattern::DarkHorizontal,
            "darkVertical" => FillPattern::DarkVertical,
            "darkDown" => FillPattern::DarkDown,
            "darkUp" => FillPattern::DarkUp,
            "darkGrid" => FillPattern::DarkGrid,
            "darkTrellis" => FillPattern::DarkTrellis,
            "lightHorizontal" => FillPattern::LightHorizontal,
            "lightVertical" => FillPattern::LightVertical,
            "lightDown" => FillPattern::LightDown,
            "lightUp" => FillPattern::LightUp,
            "lightGrid" => FillPattern::LightGrid,
            "lightTrellis" => FillPattern::LightTrellis,
            "gray125" => FillPattern::Gray125,
            "gray0625" => FillPattern::Gray0625,
            _ => FillPattern::None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Fill {
    pub pattern: FillPattern,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

impl Fill {
    /// A solid fill of one color
    pub fn solid(color: Color) -> Fill {
        Fill {
            pattern: FillPattern::Solid,
            foreground: Some(color),
            background: Some(color),
        }
    }
}

/// Line style of one border edge, named as in `border/*/@style`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Dashed,
    Dotted,
    Thick,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderStyle {
    pub fn parse(name: &str) -> BorderStyle {
        match name {
            "thin" => BorderStyle::Thin,
            "medium" => BorderStyle::Medium,
            "dashed" => BorderStyle::Dashed,
            "dotted" => BorderStyle::Dotted,
            "thick" => BorderStyle::Thick,
            "double" => BorderStyle::Double,
            "hair" => BorderStyle::Hair,
            "mediumDashed" => BorderStyle::MediumDashed,
            "dashDot" => BorderStyle::DashDot,
            "mediumDashDot" => BorderStyle::MediumDashDot,
            "dashDotDot" => BorderStyle::DashDotDot,
            "mediumDashDotDot" => BorderStyle::MediumDashDotDot,
            "slantDashDot" => BorderStyle::SlantDashDot,
            _ => BorderStyle::None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BorderEdge {
    pub style: BorderStyle,
    pub color: Option<Color>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Border {
    pub left: BorderEdge,
    pub right: BorderEdge,
    pub top: BorderEdge,
    pub bottom: BorderEdge,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HorizontalAlignment {
    pub fn parse(name: &str) -> HorizontalAlignment {
        match name {
            "left" => HorizontalAlignment::Left,
            "center" => HorizontalAlignment::Center,
            "right" => HorizontalAlignment::Right,
            "fill" => HorizontalAlignment::Fill,
            "justify" => HorizontalAlignment::Justify,
            "centerContinuous" => HorizontalAlignment::CenterContinuous,
            "distributed" => HorizontalAlignment::Distributed,
            _ => HorizontalAlignment::General,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerticalAlignment {
    #[default]
    Bottom,
    Top,
    Center,
    Justify,
    Distributed,
}

impl VerticalAlignment {
    pub fn parse(name: &str) -> VerticalAlignment {
        match name {
            "top" => VerticalAlignment::Top,
            "center" => VerticalAlignment::Center,
            "justify" => VerticalAlignment::Justify,
            "distributed" => VerticalAlignment::Distributed,
            _ => VerticalAlignment::Bottom,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Alignment {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub wrap_text: bool,
    pub shrink_to_fit: bool,
    pub indent: u8,
    pub rotation: i16,
}

impl Alignment {
    pub fn new(horizontal: HorizontalAlignment, vertical: VerticalAlignment) -> Alignment {
        Alignment {
            horizontal,
            vertical,
            ..Alignment::default()
        }
    }

    pub fn centered() -> Alignment {
        Alignment::new(HorizontalAlignment::Center, VerticalAlignment::Center)
    }

    pub fn with_wrap_text(mut self) -> Alignment {
        self.wrap_text = true;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Protection {
    pub locked: bool,
    pub hidden: bool,
}

impl Default for Protection {
    fn default() -> Self {
        Protection {
            locked: true,
            hidden: false,
        }
    }
}

/// The complete formatting of one cell
#[derive(Clone, Debug, PartialEq)]
pub struct CellStyle {
    pub font: Font,
    pub fill: Fill,
    pub border: Border,
    pub alignment: Alignment,
    pub number_format: String,
    pub protection: Protection,
}

impl Default for CellStyle {
    fn default() -> Self {
        CellStyle {
            font: Font::default(),
            fill: Fill::default(),
            border: Border::default(),
            alignment: Alignment::default(),
            number_format: GENERAL_FORMAT.to_owned(),
            protection: Protection::default(),
        }
    }
}

impl CellStyle {
    /// True when the style carries no formatting at all
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }
}

/// Number format code for unformatted cells
pub const GENERAL_FORMAT: &str = "General";

/// Resolves a built-in number format id to its format code
pub(crate) fn builtin_number_format(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => GENERAL_FORMAT,
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}
