use plotters::style::RGBColor;

/// Qualitative palette for categorical color encodings
pub struct ColorPalette;

impl ColorPalette {
    const COLORS: [RGBColor; 10] = [
        RGBColor(0x63, 0x6e, 0xfa),
        RGBColor(0xef, 0x55, 0x3b),
        RGBColor(0x00, 0xcc, 0x96),
        RGBColor(0xab, 0x63, 0xfa),
        RGBColor(0xff, 0xa1, 0x5a),
        RGBColor(0x19, 0xd3, 0xf3),
        RGBColor(0xff, 0x66, 0x92),
        RGBColor(0xb6, 0xe8, 0x80),
        RGBColor(0xff, 0x97, 0xff),
        RGBColor(0xfe, 0xcb, 0x52),
    ];

    /// Color for the n-th category, cycling when categories outnumber colors
    pub fn color(index: usize) -> RGBColor {
        Self::COLORS[index % Self::COLORS.len()]
    }
}
