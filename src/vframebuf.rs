/*
 *  vframebuf.rs
 *
 *  PiPanel - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime-sized framebuffer used for off-screen layers and the composed frame
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

use core::convert::Infallible;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{PixelColor, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Full colour off-screen layer: artwork, themed backgrounds and the frame itself.
pub type Canvas = VarFrameBuf<Rgb888>;

/// A runtime-sized framebuffer for embedded-graphics.
#[derive(Debug, Clone, PartialEq)]
pub struct VarFrameBuf<C: PixelColor> {
    buf: Vec<C>,
    w: usize,
    h: usize,
}

impl<C: PixelColor> VarFrameBuf<C> {
    pub fn new(width: u32, height: u32, fill: C) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![fill; w * h], w, h }
    }

    /// Wrap an existing row-major pixel vector; `None` if the length is wrong.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<C>) -> Option<Self> {
        let (w, h) = (width as usize, height as usize);
        (pixels.len() == w * h).then_some(Self { buf: pixels, w, h })
    }

    pub fn width(&self) -> usize { self.w }
    pub fn height(&self) -> usize { self.h }

    pub fn as_slice(&self) -> &[C] { &self.buf }

    pub fn clear_color(&mut self, color: C) {
        self.buf.fill(color);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<C> {
        (x < self.w && y < self.h).then(|| self.buf[y * self.w + x])
    }

    /// One row of pixels, top row is 0.
    pub fn row(&self, y: usize) -> &[C] {
        &self.buf[y * self.w..(y + 1) * self.w]
    }

    /// Map (x,y) to linear index; returns None if out of bounds
    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }

    /// Copy `src` onto this buffer with its top-left corner at `origin`, clipped.
    pub fn blit(&mut self, src: &Self, origin: Point) {
        let x0 = origin.x.max(0) as usize;
        let y0 = origin.y.max(0) as usize;
        let skip_x = (-origin.x).max(0) as usize;
        let skip_y = (-origin.y).max(0) as usize;
        if x0 >= self.w || y0 >= self.h || skip_x >= src.w || skip_y >= src.h {
            return;
        }
        let cols = (src.w - skip_x).min(self.w - x0);
        let rows = (src.h - skip_y).min(self.h - y0);
        for row in 0..rows {
            let s = (skip_y + row) * src.w + skip_x;
            let d = (y0 + row) * self.w + x0;
            self.buf[d..d + cols].copy_from_slice(&src.buf[s..s + cols]);
        }
    }

    /// Rotate clockwise by 0/90/180/270 degrees into `dst`, resizing it if needed.
    /// Any other angle is treated as 0.
    pub fn rotated_into(&self, degrees: u16, dst: &mut Self) {
        let (dw, dh) = match degrees {
            90 | 270 => (self.h, self.w),
            _ => (self.w, self.h),
        };
        dst.w = dw;
        dst.h = dh;
        // clear() keeps the allocation, so a reused dst costs no realloc per frame
        dst.buf.clear();
        dst.buf.reserve(dw * dh);
        for dy in 0..dh {
            for dx in 0..dw {
                let (sx, sy) = match degrees {
                    90 => (dy, self.h - 1 - dx),
                    180 => (self.w - 1 - dx, self.h - 1 - dy),
                    270 => (self.w - 1 - dy, dx),
                    _ => (dx, dy),
                };
                dst.buf.push(self.buf[sy * self.w + sx]);
            }
        }
    }

    pub fn rotated(&self, degrees: u16) -> Self {
        let mut dst = Self { buf: Vec::with_capacity(self.buf.len()), w: 0, h: 0 };
        self.rotated_into(degrees, &mut dst);
        dst
    }
}

impl Canvas {
    /// Blend `src` over this buffer at `alpha` (0 keeps self, 1 is a plain copy).
    /// Only the overlapping top-left region is touched when sizes differ.
    pub fn blend_from(&mut self, src: &Canvas, alpha: f32) {
        let a = alpha.clamp(0.0, 1.0);
        if a >= 1.0 {
            self.blit(src, Point::zero());
            return;
        }
        if a <= 0.0 {
            return;
        }
        let a256 = (a * 256.0).round() as u32;
        let inv = 256 - a256;
        let cols = self.w.min(src.w);
        let rows = self.h.min(src.h);
        for y in 0..rows {
            for x in 0..cols {
                let d = &mut self.buf[y * self.w + x];
                let s = src.buf[y * src.w + x];
                let mix = |under: u8, over: u8| ((under as u32 * inv + over as u32 * a256) >> 8) as u8;
                *d = Rgb888::new(mix(d.r(), s.r()), mix(d.g(), s.g()), mix(d.b(), s.b()));
            }
        }
    }

    /// Linear vertical gradient, `top` on the first row and `bottom` on the last.
    pub fn vertical_gradient(width: u32, height: u32, top: Rgb888, bottom: Rgb888) -> Canvas {
        let mut canvas = Canvas::new(width, height, top);
        let span = height.saturating_sub(1).max(1) as f32;
        let lerp = |from: u8, to: u8, t: f32| (from as f32 + (to as f32 - from as f32) * t).round() as u8;
        for y in 0..canvas.h {
            let t = y as f32 / span;
            let color = Rgb888::new(lerp(top.r(), bottom.r(), t), lerp(top.g(), bottom.g(), t), lerp(top.b(), bottom.b(), t));
            let w = canvas.w;
            canvas.buf[y * w..(y + 1) * w].fill(color);
        }
        canvas
    }
}

impl<C: PixelColor> OriginDimensions for VarFrameBuf<C> {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl<C: PixelColor> DrawTarget for VarFrameBuf<C> {
    type Color = C;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c;
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.clear_color(color);
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        // fast path for the rectangles the panel draws every frame
        let clipped = area.intersection(&self.bounding_box());
        let Some(bottom_right) = clipped.bottom_right() else { return Ok(()) };
        let (x0, y0) = (clipped.top_left.x as usize, clipped.top_left.y as usize);
        let (x1, y1) = (bottom_right.x as usize, bottom_right.y as usize);
        for y in y0..=y1 {
            self.buf[y * self.w + x0..=y * self.w + x1].fill(color);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::PrimitiveStyle;

    const A: Rgb888 = Rgb888::new(10, 0, 0);
    const B: Rgb888 = Rgb888::new(20, 0, 0);
    const C: Rgb888 = Rgb888::new(30, 0, 0);
    const D: Rgb888 = Rgb888::new(40, 0, 0);

    fn two_by_two() -> Canvas {
        Canvas::from_pixels(2, 2, vec![A, B, C, D]).unwrap()
    }

    #[test]
    fn test_from_pixels_checks_length() {
        assert!(Canvas::from_pixels(2, 2, vec![A; 3]).is_none());
        assert!(Canvas::from_pixels(2, 2, vec![A; 4]).is_some());
    }

    #[test]
    fn test_rotate_90_clockwise() {
        let strip = Canvas::from_pixels(2, 1, vec![A, B]).unwrap();
        let r = strip.rotated(90);
        assert_eq!((r.width(), r.height()), (1, 2));
        assert_eq!(r.pixel(0, 0), Some(A));
        assert_eq!(r.pixel(0, 1), Some(B));

        let r = two_by_two().rotated(90);
        // A B      C A
        // C D  ->  D B
        assert_eq!(r.as_slice(), &[C, A, D, B]);
    }

    #[test]
    fn test_rotate_180_and_270() {
        assert_eq!(two_by_two().rotated(180).as_slice(), &[D, C, B, A]);
        // A B      B D
        // C D  ->  A C
        assert_eq!(two_by_two().rotated(270).as_slice(), &[B, D, A, C]);
        assert_eq!(two_by_two().rotated(0), two_by_two());
    }

    #[test]
    fn test_rotate_non_square_dimensions() {
        let tall = Canvas::new(3, 5, A);
        let r = tall.rotated(90);
        assert_eq!((r.width(), r.height()), (5, 3));
        let back = r.rotated(270);
        assert_eq!(back, tall);
    }

    #[test]
    fn test_blit_clips() {
        let mut dst = Canvas::new(4, 4, Rgb888::BLACK);
        let src = Canvas::new(3, 3, Rgb888::WHITE);
        dst.blit(&src, Point::new(2, -1));
        // src rows 1..3 land on dst rows 0..2, cols 2..4
        assert_eq!(dst.pixel(2, 0), Some(Rgb888::WHITE));
        assert_eq!(dst.pixel(3, 1), Some(Rgb888::WHITE));
        assert_eq!(dst.pixel(2, 2), Some(Rgb888::BLACK));
        assert_eq!(dst.pixel(1, 0), Some(Rgb888::BLACK));

        // entirely off-canvas is a no-op
        dst.blit(&src, Point::new(10, 10));
        dst.blit(&src, Point::new(-5, 0));
    }

    #[test]
    fn test_blend_endpoints() {
        let mut under = Canvas::new(2, 2, Rgb888::BLACK);
        let over = Canvas::new(2, 2, Rgb888::new(200, 100, 50));

        under.blend_from(&over, 0.0);
        assert_eq!(under.pixel(0, 0), Some(Rgb888::BLACK));

        under.blend_from(&over, 0.5);
        assert_eq!(under.pixel(1, 1), Some(Rgb888::new(100, 50, 25)));

        under.blend_from(&over, 1.0);
        assert_eq!(under, over);
    }

    #[test]
    fn test_vertical_gradient_to_black() {
        let g = Canvas::vertical_gradient(4, 5, Rgb888::new(200, 100, 40), Rgb888::BLACK);
        assert_eq!(g.pixel(0, 0), Some(Rgb888::new(200, 100, 40)));
        assert_eq!(g.pixel(3, 4), Some(Rgb888::BLACK));
        assert_eq!(g.pixel(1, 2), Some(Rgb888::new(100, 50, 20)));
        // each row is uniform
        assert!(g.row(3).iter().all(|&p| p == g.row(3)[0]));
    }

    #[test]
    fn test_fill_solid_clipped() {
        let mut canvas = Canvas::new(8, 8, Rgb888::BLACK);
        Rectangle::new(Point::new(-2, 6), Size::new(4, 10))
            .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
            .draw(&mut canvas)
            .unwrap();
        assert_eq!(canvas.pixel(0, 6), Some(Rgb888::RED));
        assert_eq!(canvas.pixel(1, 7), Some(Rgb888::RED));
        assert_eq!(canvas.pixel(2, 7), Some(Rgb888::BLACK));
        assert_eq!(canvas.pixel(0, 5), Some(Rgb888::BLACK));
    }
}
