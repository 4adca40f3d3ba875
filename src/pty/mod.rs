//! Pseudoterminal handling
//!
//! Allocation of the master/slave pair a target process gets moved onto,
//! plus the window-size ioctls shared by the relay.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::{get_window_size, set_window_size, PtyPair};

/// Window size for a terminal device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub rows: u16,
    pub cols: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

impl WindowSize {
    /// Size pushed to the target when the controlling terminal reports none.
    pub const FALLBACK: WindowSize = WindowSize::new(80, 30);

    /// Create a new window size with just rows and columns
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self::with_pixels(cols, rows, 0, 0)
    }

    /// Create a new window size with pixel dimensions
    pub const fn with_pixels(cols: u16, rows: u16, pixel_width: u16, pixel_height: u16) -> Self {
        Self {
            rows,
            cols,
            pixel_width,
            pixel_height,
        }
    }

    /// Zero rows or zero columns means the terminal has no meaningful size.
    pub fn is_usable(&self) -> bool {
        self.rows > 0 && self.cols > 0
    }
}

impl From<WindowSize> for libc::winsize {
    fn from(ws: WindowSize) -> Self {
        libc::winsize {
            ws_row: ws.rows,
            ws_col: ws.cols,
            ws_xpixel: ws.pixel_width,
            ws_ypixel: ws.pixel_height,
        }
    }
}

impl From<libc::winsize> for WindowSize {
    fn from(ws: libc::winsize) -> Self {
        Self::with_pixels(ws.ws_col, ws.ws_row, ws.ws_xpixel, ws.ws_ypixel)
    }
}
