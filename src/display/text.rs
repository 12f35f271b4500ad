/*
 *  display/text.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Text rendering: three mono styles, measuring, fitting and aligned drawing
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_graphics::{
    mono_font::{
        iso_8859_1::{FONT_10X20, FONT_7X14, FONT_9X18},
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb888,
    prelude::*,
    primitives::Rectangle,
};
use embedded_text::{
    alignment::{HorizontalAlignment, VerticalAlignment},
    style::TextBoxStyleBuilder,
    TextBox,
};

use crate::vframebuf::Canvas;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// header label, footer hint, times
    Small,
    /// artist
    Body,
    /// title, telemetry rows
    Big,
}

impl TextStyle {
    pub fn font(&self) -> &'static MonoFont<'static> {
        match self {
            TextStyle::Small => &FONT_7X14,
            TextStyle::Body => &FONT_9X18,
            TextStyle::Big => &FONT_10X20,
        }
    }

    pub fn line_height(&self) -> u32 {
        self.font().character_size.height
    }

    fn advance(&self) -> u32 {
        let font = self.font();
        font.character_size.width + font.character_spacing
    }
}

/// The fonts carry Latin-1 only; map the common typographic characters the
/// remote sends and replace anything else.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            c if (c as u32) < 0x100 => out.push(c),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str(ELLIPSIS),
            _ => out.push('?'),
        }
    }
    out
}

/// Pixel size of `text` drawn on a single line in `style`.
pub fn measure(text: &str, style: TextStyle) -> Size {
    let n = text.chars().count() as u32;
    let font = style.font();
    let width = (n * font.character_size.width) + n.saturating_sub(1) * font.character_spacing;
    Size::new(width, font.character_size.height)
}

/// Sanitized `text`, cut down with a trailing ellipsis until it fits `max_width`.
pub fn fit(text: &str, style: TextStyle, max_width: u32) -> String {
    let clean = sanitize(text);
    let max_chars = ((max_width + style.font().character_spacing) / style.advance()) as usize;
    if clean.chars().count() <= max_chars {
        return clean;
    }
    let ellipsis_len = ELLIPSIS.len();
    if max_chars <= ellipsis_len {
        return ELLIPSIS[..max_chars].to_string();
    }
    let mut cut: String = clean.chars().take(max_chars - ellipsis_len).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str(ELLIPSIS);
    cut
}

/// Draw `text` on one line inside the `width` wide band starting at
/// `top_left`, aligned within it. Overlong text is ellipsized.
pub fn draw_text(
    canvas: &mut Canvas,
    text: &str,
    style: TextStyle,
    color: Rgb888,
    top_left: Point,
    width: u32,
    align: HorizontalAlignment,
) -> Size {
    let fitted = fit(text, style, width);
    let size = measure(&fitted, style);
    let character_style = MonoTextStyle::new(style.font(), color);
    let textbox_style = TextBoxStyleBuilder::new()
        .alignment(align)
        .vertical_alignment(VerticalAlignment::Top)
        .build();
    let bounds = Rectangle::new(top_left, Size::new(width.max(size.width), size.height));
    let Ok(_) = TextBox::with_textbox_style(&fitted, bounds, character_style, textbox_style).draw(canvas);
    size
}

/// Centre `text` horizontally across the whole canvas at row `y`.
pub fn draw_centered(canvas: &mut Canvas, text: &str, style: TextStyle, color: Rgb888, y: i32) -> Size {
    let width = canvas.width() as u32;
    draw_text(canvas, text, style, color, Point::new(0, y), width, HorizontalAlignment::Center)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_latin1_passthrough() {
        assert_eq!(sanitize("Beyoncé"), "Beyoncé");
        assert_eq!(sanitize("Temp CPU (°C)"), "Temp CPU (°C)");
    }

    #[test]
    fn test_sanitize_typography() {
        assert_eq!(sanitize("—"), "-");
        assert_eq!(sanitize("Don’t Stop"), "Don't Stop");
        assert_eq!(sanitize("loading…"), "loading...");
        assert_eq!(sanitize("東京"), "??");
    }

    #[test]
    fn test_measure() {
        assert_eq!(measure("abc", TextStyle::Big), Size::new(30, 20));
        assert_eq!(measure("", TextStyle::Small), Size::new(0, 14));
    }

    #[test]
    fn test_fit_short_text_untouched() {
        assert_eq!(fit("Song", TextStyle::Big, 100), "Song");
    }

    #[test]
    fn test_fit_ellipsizes() {
        // 10px per char, 8 chars fit in 80px
        let fitted = fit("A Very Long Title", TextStyle::Big, 80);
        assert_eq!(fitted, "A Ver...");
        assert!(measure(&fitted, TextStyle::Big).width <= 80);
    }

    #[test]
    fn test_fit_trims_space_before_ellipsis() {
        assert_eq!(fit("Some Song Title", TextStyle::Big, 80), "Some...");
    }

    #[test]
    fn test_fit_tiny_width() {
        assert_eq!(fit("Song", TextStyle::Big, 20), "..");
        assert_eq!(fit("Song", TextStyle::Big, 0), "");
    }

    #[test]
    fn test_draw_centered_touches_middle() {
        let mut canvas = Canvas::new(100, 30, Rgb888::BLACK);
        let size = draw_centered(&mut canvas, "IIII", TextStyle::Big, Rgb888::WHITE, 5);
        assert_eq!(size, Size::new(40, 20));
        let lit = |x0: usize, x1: usize| {
            (5..25).any(|y| (x0..x1).any(|x| canvas.pixel(x, y) == Some(Rgb888::WHITE)))
        };
        assert!(lit(30, 70));
        assert!(!lit(0, 25));
        assert!(!lit(75, 100));
    }
}
