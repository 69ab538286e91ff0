use model::{DevicePx, Point, Rect, Size};

/// Owned raster buffer, one packed premultiplied BGRA `u32` per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn filled(width: u32, height: u32, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size<DevicePx> {
        Size::new(i64::from(self.width), i64::from(self.height))
    }

    pub fn bounds(&self) -> Rect<DevicePx> {
        Rect::from_size(self.size())
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Changes the dimensions in place, keeping the allocation when it is large enough.
    /// Contents are cleared.
    pub fn reset_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize, 0);
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    pub fn fill_rect(&mut self, rect: &Rect<DevicePx>, color: u32) {
        let clipped = rect.intersect(&self.bounds());
        if clipped.is_empty() {
            return;
        }
        let stride = self.width as usize;
        for row in clipped.y..clipped.bottom() {
            let start = row as usize * stride + clipped.x as usize;
            self.pixels[start..start + clipped.width as usize].fill(color);
        }
    }

    /// Copies `src_rect` of `src` so that its origin lands on `dest`. Both sides clip.
    pub fn blit(&mut self, src: &Bitmap, src_rect: &Rect<DevicePx>, dest: Point<DevicePx>) {
        let src_rect = src_rect.intersect(&src.bounds());
        if src_rect.is_empty() {
            return;
        }
        let dest_rect = Rect::from_origin_size(dest, src_rect.size()).intersect(&self.bounds());
        if dest_rect.is_empty() {
            return;
        }
        let src_x = src_rect.x + (dest_rect.x - dest.x);
        let src_y = src_rect.y + (dest_rect.y - dest.y);
        let width = dest_rect.width as usize;
        let src_stride = src.width as usize;
        let dest_stride = self.width as usize;
        for row in 0..dest_rect.height {
            let from = (src_y + row) as usize * src_stride + src_x as usize;
            let to = (dest_rect.y + row) as usize * dest_stride + dest_rect.x as usize;
            self.pixels[to..to + width].copy_from_slice(&src.pixels[from..from + width]);
        }
    }

    /// Moves the content of `area` by `(delta_x, delta_y)`. Content leaving `area` is
    /// dropped; the uncovered strip keeps its previous pixels.
    pub fn shift_region(&mut self, area: &Rect<DevicePx>, delta_x: i64, delta_y: i64) {
        let area = area.intersect(&self.bounds());
        let dest = area.offset(delta_x, delta_y).intersect(&area);
        if dest.is_empty() || (delta_x == 0 && delta_y == 0) {
            return;
        }
        let stride = self.width as usize;
        let width = dest.width as usize;
        let copy_row = |pixels: &mut Vec<u32>, row: i64| {
            let from = (row - delta_y) as usize * stride + (dest.x - delta_x) as usize;
            let to = row as usize * stride + dest.x as usize;
            pixels.copy_within(from..from + width, to);
        };
        if delta_y > 0 {
            for row in (dest.y..dest.bottom()).rev() {
                copy_row(&mut self.pixels, row);
            }
        } else {
            for row in dest.y..dest.bottom() {
                copy_row(&mut self.pixels, row);
            }
        }
    }
}
