//! X11 platform implementation of the overlay surface
//!
//! Uses XCB via x11rb for a transparent, always-on-top, click-through
//! window. Pixels travel through MIT-SHM. Requires a compositor for
//! per-pixel transparency.

use std::fs::File;
use std::os::fd::AsFd;

use rustix::fs::{MemfdFlags, memfd_create};
use rustix::mm::{MapFlags, ProtFlags, mmap};
use x11rb::atom_manager;
use x11rb::connection::Connection;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::shape::{self, ConnectionExt as _};
use x11rb::protocol::shm::{self, ConnectionExt as _};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::{Frame, OverlayConfig, OverlaySurface, PlatformError};
use crate::region::{Point, WorkArea};

// Atoms needed for EWMH hints and work area queries
atom_manager! {
    pub AtomCollection: AtomCollectionCookie {
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_STATE,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_SKIP_TASKBAR,
        _NET_WM_STATE_SKIP_PAGER,
        _NET_WORKAREA,
        _NET_CURRENT_DESKTOP,
        ATOM,
        CARDINAL,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared memory
// ─────────────────────────────────────────────────────────────────────────────

/// Mapped memfd segment shared with the X server. Unmapped on drop; the
/// server-side attachment is released by the owner, which holds the
/// connection.
struct ShmBuffer {
    seg_id: shm::Seg,
    ptr: *mut u8,
    size: usize,
    width: u32,
    height: u32,
}

impl ShmBuffer {
    /// Create a shared memory buffer and attach it to the server
    fn create(conn: &RustConnection, width: u32, height: u32) -> Result<Self, PlatformError> {
        let size = width as usize * height as usize * 4;

        // Create anonymous shared memory
        let fd = memfd_create(c"toastline-x11-buffer", MemfdFlags::CLOEXEC)
            .map_err(|e| PlatformError::BufferError(format!("memfd_create failed: {}", e)))?;

        rustix::fs::ftruncate(&fd, size as u64)
            .map_err(|e| PlatformError::BufferError(format!("ftruncate failed: {}", e)))?;

        // SAFETY: fresh shared mapping of a memfd we just sized; nothing else
        // aliases it on our side
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                fd.as_fd(),
                0,
            )
            .map_err(|e| PlatformError::BufferError(format!("mmap failed: {}", e)))?
        };

        let mut buffer = ShmBuffer {
            seg_id: 0,
            ptr: ptr as *mut u8,
            size,
            width,
            height,
        };

        // Attach to X server
        let seg_id = conn
            .generate_id()
            .map_err(|e| PlatformError::BufferError(e.to_string()))?;

        // x11rb shm_attach_fd takes ownership of the fd
        let file = File::from(fd);
        conn.shm_attach_fd(seg_id, file, false)
            .map_err(|e| PlatformError::BufferError(format!("shm_attach_fd failed: {}", e)))?;

        buffer.seg_id = seg_id;
        Ok(buffer)
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr maps exactly `size` bytes for the lifetime of self
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size) }
    }
}

impl Drop for ShmBuffer {
    fn drop(&mut self) {
        // SAFETY: unmapping the region mapped in `create`
        unsafe {
            rustix::mm::munmap(self.ptr as *mut _, self.size).ok();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Work area discovery
// ─────────────────────────────────────────────────────────────────────────────

/// Monitor rectangles from RandR, primary first
fn monitor_rects(conn: &RustConnection, root: Window) -> Vec<WorkArea> {
    let Ok(cookie) = conn.randr_get_monitors(root, true) else {
        return Vec::new();
    };
    let Ok(reply) = cookie.reply() else {
        return Vec::new();
    };

    let mut monitors: Vec<_> = reply.monitors.iter().collect();
    monitors.sort_by_key(|mon| !mon.primary);
    monitors
        .into_iter()
        .map(|mon| {
            WorkArea::from_xywh(
                mon.x as i32,
                mon.y as i32,
                mon.width as u32,
                mon.height as u32,
            )
        })
        .collect()
}

/// `_NET_WORKAREA` of the current desktop, if the window manager sets it
fn net_workarea(conn: &RustConnection, atoms: &AtomCollection, root: Window) -> Option<WorkArea> {
    let desktop = conn
        .get_property(false, root, atoms._NET_CURRENT_DESKTOP, atoms.CARDINAL, 0, 1)
        .ok()?
        .reply()
        .ok()
        .and_then(|reply| reply.value32()?.next())
        .unwrap_or(0);

    let reply = conn
        .get_property(false, root, atoms._NET_WORKAREA, atoms.CARDINAL, 0, u32::MAX)
        .ok()?
        .reply()
        .ok()?;
    let values: Vec<u32> = reply.value32()?.collect();

    let offset = desktop as usize * 4;
    let area = values.get(offset..offset + 4).or_else(|| values.get(0..4))?;
    Some(WorkArea::from_xywh(
        area[0] as i32,
        area[1] as i32,
        area[2],
        area[3],
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// X11 Overlay Implementation
// ─────────────────────────────────────────────────────────────────────────────

pub struct X11Overlay {
    conn: RustConnection,
    root: Window,
    window: Window,
    gc: Gcontext,
    atoms: AtomCollection,
    screen_width: u16,
    screen_height: u16,
    depth: u8,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    shm_buffer: ShmBuffer,
    running: bool,
}

impl X11Overlay {
    /// Find a 32-bit ARGB visual for transparency
    fn find_argb_visual(screen: &Screen) -> Option<(Visualid, u8)> {
        for depth in &screen.allowed_depths {
            if depth.depth == 32 {
                for visual in &depth.visuals {
                    if visual.class == VisualClass::TRUE_COLOR {
                        return Some((visual.visual_id, depth.depth));
                    }
                }
            }
        }
        None
    }

    /// Swap in a buffer of the new size, detaching the old segment
    fn resize_shm_buffer(&mut self, width: u32, height: u32) -> Result<(), PlatformError> {
        let buffer = ShmBuffer::create(&self.conn, width, height)?;
        let old = std::mem::replace(&mut self.shm_buffer, buffer);
        let _ = self.conn.shm_detach(old.seg_id);
        tracing::debug!(width, height, "x11 shm buffer resized");
        Ok(())
    }

    /// Set window class, title and EWMH hints for overlay behavior
    fn setup_window_hints(&self, namespace: &str) -> Result<(), PlatformError> {
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                AtomEnum::WM_NAME,
                AtomEnum::STRING,
                namespace.as_bytes(),
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        // WM_CLASS is instance and class, each NUL terminated
        let class = format!("{namespace}\0{namespace}\0");
        self.conn
            .change_property8(
                PropMode::REPLACE,
                self.window,
                AtomEnum::WM_CLASS,
                AtomEnum::STRING,
                class.as_bytes(),
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        // Window type: dock (stays on top, no decorations)
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_WINDOW_TYPE,
                self.atoms.ATOM,
                &[self.atoms._NET_WM_WINDOW_TYPE_DOCK],
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        // Window state: above, skip taskbar/pager
        self.conn
            .change_property32(
                PropMode::REPLACE,
                self.window,
                self.atoms._NET_WM_STATE,
                self.atoms.ATOM,
                &[
                    self.atoms._NET_WM_STATE_ABOVE,
                    self.atoms._NET_WM_STATE_SKIP_TASKBAR,
                    self.atoms._NET_WM_STATE_SKIP_PAGER,
                ],
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        Ok(())
    }

    /// Empty input region - clicks pass through
    fn set_click_through(&self) -> Result<(), PlatformError> {
        self.conn
            .shape_rectangles(
                shape::SO::SET,
                shape::SK::INPUT,
                ClipOrdering::UNSORTED,
                self.window,
                0,
                0,
                &[],
            )
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        Ok(())
    }
}

impl OverlaySurface for X11Overlay {
    fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|e| PlatformError::ConnectionFailed(e.to_string()))?;

        // Intern atoms
        let atoms = AtomCollection::new(&conn)
            .map_err(|e| PlatformError::Other(e.to_string()))?
            .reply()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let setup = conn.setup();
        let screen = &setup.roots[screen_num];
        let root = screen.root;
        let (screen_width, screen_height) = (screen.width_in_pixels, screen.height_in_pixels);

        // Check for required extensions
        conn.shape_query_version()
            .map_err(|_| PlatformError::UnsupportedFeature("Shape extension".into()))?
            .reply()
            .map_err(|_| PlatformError::UnsupportedFeature("Shape extension".into()))?;

        conn.shm_query_version()
            .map_err(|_| PlatformError::UnsupportedFeature("SHM extension".into()))?
            .reply()
            .map_err(|_| PlatformError::UnsupportedFeature("SHM extension".into()))?;

        // Find 32-bit visual for transparency
        let (visual, depth) = Self::find_argb_visual(screen)
            .ok_or_else(|| PlatformError::UnsupportedFeature("32-bit ARGB visual".into()))?;

        // Create colormap for 32-bit visual
        let colormap = conn
            .generate_id()
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        conn.create_colormap(ColormapAlloc::NONE, colormap, root, visual)
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        // Create window, sized on first push
        let window = conn
            .generate_id()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let win_aux = CreateWindowAux::new()
            .background_pixel(0)
            .border_pixel(0)
            .colormap(colormap)
            .event_mask(EventMask::EXPOSURE | EventMask::STRUCTURE_NOTIFY)
            .override_redirect(1);

        conn.create_window(
            depth,
            window,
            root,
            config.x as i16,
            config.y as i16,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            visual,
            &win_aux,
        )
        .map_err(|e| PlatformError::Other(e.to_string()))?;

        // Create graphics context
        let gc = conn
            .generate_id()
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        conn.create_gc(gc, window, &CreateGCAux::new())
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        let shm_buffer = ShmBuffer::create(&conn, 1, 1)?;

        let overlay = Self {
            conn,
            root,
            window,
            gc,
            atoms,
            screen_width,
            screen_height,
            depth,
            x: config.x,
            y: config.y,
            width: 1,
            height: 1,
            shm_buffer,
            running: true,
        };

        overlay.setup_window_hints(&config.namespace)?;
        overlay.set_click_through()?;

        // Map window
        overlay
            .conn
            .map_window(window)
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        overlay
            .conn
            .flush()
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        tracing::debug!(window, depth, "x11 overlay created");
        Ok(overlay)
    }

    fn work_area_at(&self, point: Point) -> Option<WorkArea> {
        let monitors = monitor_rects(&self.conn, self.root);
        let monitor = monitors
            .iter()
            .find(|m| m.contains(point))
            .or(monitors.first())
            .copied()
            .unwrap_or_else(|| {
                WorkArea::from_xywh(0, 0, self.screen_width as u32, self.screen_height as u32)
            });

        // _NET_WORKAREA spans the whole desktop; clip it to the monitor
        let area = net_workarea(&self.conn, &self.atoms, self.root)
            .and_then(|desktop| desktop.intersect(&monitor))
            .unwrap_or(monitor);
        Some(area)
    }

    fn bring_to_front(&mut self) {
        let _ = self.conn.configure_window(
            self.window,
            &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
        );
        let _ = self.conn.flush();
    }

    fn push(&mut self, frame: Frame<'_>) -> Result<(), PlatformError> {
        if frame.width > u16::MAX as u32 || frame.height > u16::MAX as u32 {
            return Err(PlatformError::BufferError(format!(
                "{}x{} frame exceeds the X11 size limit",
                frame.width, frame.height
            )));
        }

        if frame.width != self.shm_buffer.width || frame.height != self.shm_buffer.height {
            self.resize_shm_buffer(frame.width, frame.height)?;
        }

        if (frame.origin.x, frame.origin.y, frame.width, frame.height)
            != (self.x, self.y, self.width, self.height)
        {
            self.conn
                .configure_window(
                    self.window,
                    &ConfigureWindowAux::new()
                        .x(frame.origin.x)
                        .y(frame.origin.y)
                        .width(frame.width)
                        .height(frame.height),
                )
                .map_err(|e| PlatformError::Other(e.to_string()))?;
            self.x = frame.origin.x;
            self.y = frame.origin.y;
            self.width = frame.width;
            self.height = frame.height;
        }

        // Convert RGBA to BGRA directly into SHM buffer
        let shm_slice = self.shm_buffer.as_mut_slice();
        for (dst, src) in shm_slice
            .chunks_exact_mut(4)
            .zip(frame.pixels.chunks_exact(4))
        {
            dst[0] = src[2]; // B
            dst[1] = src[1]; // G
            dst[2] = src[0]; // R
            dst[3] = src[3]; // A
        }

        self.conn
            .shm_put_image(
                self.window,
                self.gc,
                frame.width as u16,
                frame.height as u16,
                0,
                0,
                frame.width as u16,
                frame.height as u16,
                0,
                0,
                self.depth,
                ImageFormat::Z_PIXMAP.into(),
                false,
                self.shm_buffer.seg_id,
                0,
            )
            .map_err(|e| PlatformError::Other(format!("shm_put_image failed: {}", e)))?;
        self.conn
            .flush()
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        Ok(())
    }

    fn poll_events(&mut self) -> bool {
        loop {
            match self.conn.poll_for_event() {
                Ok(Some(x11rb::protocol::Event::DestroyNotify(e))) if e.window == self.window => {
                    self.running = false;
                    return false;
                }
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "x11 connection lost");
                    self.running = false;
                    break;
                }
            }
        }
        self.running
    }
}

impl Drop for X11Overlay {
    fn drop(&mut self) {
        // Clean up SHM; the mapping itself goes with the buffer
        let _ = self.conn.shm_detach(self.shm_buffer.seg_id);

        let _ = self.conn.destroy_window(self.window);
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.flush();
    }
}
