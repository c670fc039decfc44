//! Glyph atlas
//!
//! CPU-side texture pages shared by every glyph of a texture font.
//! Glyph coverage is shelf-packed into R8 pages; when a page fills up a new
//! one is started. Renderers upload a page whenever its generation changes.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use crate::constants::{ATLAS_PADDING, ATLAS_PAGE_HEIGHT, ATLAS_PAGE_WIDTH};
use crate::face::Raster;

static NEXT_PAGE_ID: AtomicU64 = AtomicU64::new(1);

/// One R8 texture page
#[derive(Debug)]
pub struct AtlasPage {
    /// Process-unique page id (renderer texture key)
    pub id: u64,
    pub width: u32,
    pub height: u32,
    /// Coverage, row 0 at the top
    pub data: Vec<u8>,
    /// Bumped on every write
    pub generation: u64,
}

impl AtlasPage {
    fn new(width: u32, height: u32) -> Self {
        Self {
            id: NEXT_PAGE_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            data: vec![0u8; (width * height) as usize],
            generation: 0,
        }
    }

    /// Copy coverage into the page at (x, y)
    fn blit(&mut self, raster: &Raster, x: u32, y: u32) {
        let pw = self.width as usize;
        for row in 0..raster.rows {
            let dst = (y + row) as usize * pw + x as usize;
            for col in 0..raster.width {
                self.data[dst + col as usize] = raster.coverage(col, row);
            }
        }
        self.generation += 1;
    }
}

/// Placement of one glyph inside a page
#[derive(Debug, Clone)]
pub struct AtlasRegion {
    pub page: Rc<RefCell<AtlasPage>>,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRegion {
    /// Texture coordinates of the upper-left and lower-right corners
    pub fn uv(&self) -> ([f32; 2], [f32; 2]) {
        let page = self.page.borrow();
        let pw = page.width as f32;
        let ph = page.height as f32;
        (
            [self.x as f32 / pw, self.y as f32 / ph],
            [
                (self.x + self.width) as f32 / pw,
                (self.y + self.height) as f32 / ph,
            ],
        )
    }
}

/// Shelf-packed atlas
pub struct GlyphAtlas {
    pages: Vec<Rc<RefCell<AtlasPage>>>,
    page_width: u32,
    page_height: u32,
    /// Shelf packing: current X position
    cursor_x: u32,
    /// Shelf packing: current Y position (top of row)
    cursor_y: u32,
    /// Shelf packing: max height of current row
    row_height: u32,
}

impl Default for GlyphAtlas {
    fn default() -> Self {
        Self::new(ATLAS_PAGE_WIDTH, ATLAS_PAGE_HEIGHT)
    }
}

impl GlyphAtlas {
    pub fn new(page_width: u32, page_height: u32) -> Self {
        Self {
            pages: Vec::new(),
            page_width,
            page_height,
            cursor_x: 0,
            cursor_y: 0,
            row_height: 0,
        }
    }

    /// Number of pages allocated so far
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Ids of every allocated page
    pub fn page_ids(&self) -> Vec<u64> {
        self.pages.iter().map(|page| page.borrow().id).collect()
    }

    /// Pack `raster` into the atlas.
    ///
    /// Returns `None` for empty rasters and for rasters larger than a page.
    pub fn insert(&mut self, raster: &Raster) -> Option<AtlasRegion> {
        if raster.is_empty() {
            return None;
        }
        let pad = ATLAS_PADDING;
        if raster.width + pad > self.page_width || raster.rows + pad > self.page_height {
            warn!(
                "Glyph {}x{} does not fit a {}x{} atlas page",
                raster.width, raster.rows, self.page_width, self.page_height
            );
            return None;
        }

        // Move to next row if doesn't fit in current row
        if self.cursor_x + raster.width + pad > self.page_width {
            self.cursor_y += self.row_height + pad;
            self.cursor_x = 0;
            self.row_height = 0;
        }

        // Start a new page when the current one is full
        if self.pages.is_empty() || self.cursor_y + raster.rows + pad > self.page_height {
            self.pages.push(Rc::new(RefCell::new(AtlasPage::new(
                self.page_width,
                self.page_height,
            ))));
            self.cursor_x = 0;
            self.cursor_y = 0;
            self.row_height = 0;
            debug!("Atlas page {} allocated", self.pages.len());
        }

        let page = self.pages.last()?.clone();
        let (x, y) = (self.cursor_x, self.cursor_y);
        page.borrow_mut().blit(raster, x, y);

        self.cursor_x += raster.width + pad;
        self.row_height = self.row_height.max(raster.rows);

        Some(AtlasRegion {
            page,
            x,
            y,
            width: raster.width,
            height: raster.rows,
        })
    }

    /// Drop every page (glyphs holding regions keep theirs alive)
    pub fn clear(&mut self) {
        self.pages.clear();
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.row_height = 0;
    }
}
