/// Paper size code for A4 in `pageSetup/@paperSize`
pub const PAPER_A4: u8 = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page margins in inches
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

/// Print settings of a worksheet
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageSetup {
    pub orientation: Option<Orientation>,
    pub paper_size: Option<u8>,
    pub scale: Option<u16>,
    /// Pages across; `0` means as many as needed
    pub fit_to_width: Option<u16>,
    /// Pages down; `0` means as many as needed
    pub fit_to_height: Option<u16>,
    /// Whether the fit-to values are honoured instead of `scale`
    pub fit_to_page: bool,
    pub center_horizontally: bool,
    pub center_vertically: bool,
    pub margins: Option<Margins>,
    /// Odd-page header with its `&L`/`&C`/`&R` control codes
    pub header: Option<String>,
    pub footer: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SheetViewMode {
    #[default]
    Normal,
    PageBreakPreview,
    PageLayout,
}

impl SheetViewMode {
    pub fn parse(name: &str) -> SheetViewMode {
        match name {
            "pageBreakPreview" => SheetViewMode::PageBreakPreview,
            "pageLayout" => SheetViewMode::PageLayout,
            _ => SheetViewMode::Normal,
        }
    }
}

/// On-screen presentation of a worksheet
#[derive(Clone, Debug, PartialEq)]
pub struct SheetView {
    pub mode: SheetViewMode,
    pub zoom: Option<u16>,
    pub show_grid_lines: bool,
    pub tab_selected: bool,
}

impl Default for SheetView {
    fn default() -> Self {
        SheetView {
            mode: SheetViewMode::Normal,
            zoom: None,
            show_grid_lines: true,
            tab_selected: false,
        }
    }
}
