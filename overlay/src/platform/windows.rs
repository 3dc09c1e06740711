//! Windows platform implementation of the overlay surface
//!
//! Uses a layered Win32 popup updated with `UpdateLayeredWindow`, which
//! composites premultiplied BGRA per pixel. The window is topmost,
//! click-through and never activated.
#![allow(clippy::too_many_arguments)]

use std::mem;
use std::ptr;

use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, POINT, RECT, SIZE, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BLENDFUNCTION, CreateCompatibleDC, CreateDIBSection,
    DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetMonitorInfoW, HBITMAP, HDC, HGDIOBJ,
    MONITOR_DEFAULTTOPRIMARY, MONITORINFO, MonitorFromPoint, ReleaseDC, SelectObject,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CS_HREDRAW, CS_VREDRAW, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW,
    HTTRANSPARENT, HWND_TOPMOST, IDC_ARROW, LoadCursorW, MB_ICONERROR, MB_OK, MSG, MessageBoxW,
    PM_REMOVE, PeekMessageW, PostQuitMessage, RegisterClassExW, SW_SHOWNOACTIVATE, SWP_NOACTIVATE, SWP_NOMOVE,
    SWP_NOSIZE, SetWindowPos, ShowWindow, TranslateMessage, ULW_ALPHA, UpdateLayeredWindow,
    WM_DESTROY, WM_ERASEBKGND, WM_NCHITTEST, WM_QUIT, WNDCLASSEXW, WS_EX_LAYERED,
    WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};
use windows::core::PCWSTR;

use super::{Frame, OverlayConfig, OverlaySurface, PlatformError};
use crate::region::{Point, WorkArea};

const CLASS_NAME: &str = "ToastlineOverlayClass";

/// Show a modal error box. Blocks until dismissed.
pub fn message_box(title: &str, message: &str) {
    let title = wide_string(title);
    let message = wide_string(message);
    unsafe {
        MessageBoxW(
            None,
            PCWSTR(message.as_ptr()),
            PCWSTR(title.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GDI handle guards
// ─────────────────────────────────────────────────────────────────────────────

/// Screen device context, released on drop
struct ScreenDc(HDC);

impl ScreenDc {
    fn acquire() -> Result<Self, PlatformError> {
        let hdc = unsafe { GetDC(HWND::default()) };
        if hdc.is_invalid() {
            return Err(PlatformError::BufferError("GetDC failed".to_string()));
        }
        Ok(Self(hdc))
    }
}

impl Drop for ScreenDc {
    fn drop(&mut self) {
        unsafe {
            ReleaseDC(HWND::default(), self.0);
        }
    }
}

/// Memory DC with a top-down 32-bit DIB selected into it
struct DibSection {
    hdc: HDC,
    hbitmap: HBITMAP,
    previous: HGDIOBJ,
    bits: *mut u8,
    width: u32,
    height: u32,
}

impl DibSection {
    fn create(width: u32, height: u32) -> Result<Self, PlatformError> {
        let screen = ScreenDc::acquire()?;

        unsafe {
            let hdc = CreateCompatibleDC(screen.0);
            if hdc.is_invalid() {
                return Err(PlatformError::BufferError(
                    "CreateCompatibleDC failed".to_string(),
                ));
            }

            let bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width as i32,
                    biHeight: -(height as i32), // Top-down DIB
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut bits: *mut std::ffi::c_void = ptr::null_mut();
            let hbitmap = match CreateDIBSection(screen.0, &bmi, DIB_RGB_COLORS, &mut bits, None, 0)
            {
                Ok(hbitmap) if !bits.is_null() => hbitmap,
                Ok(hbitmap) => {
                    let _ = DeleteObject(hbitmap);
                    let _ = DeleteDC(hdc);
                    return Err(PlatformError::BufferError(
                        "CreateDIBSection returned no pixels".to_string(),
                    ));
                }
                Err(e) => {
                    let _ = DeleteDC(hdc);
                    return Err(PlatformError::BufferError(format!(
                        "CreateDIBSection failed: {}",
                        e
                    )));
                }
            };

            let previous = SelectObject(hdc, hbitmap);

            Ok(Self {
                hdc,
                hbitmap,
                previous,
                bits: bits as *mut u8,
                width,
                height,
            })
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        let len = self.width as usize * self.height as usize * 4;
        // SAFETY: the DIB holds width * height 32-bit pixels while self lives
        unsafe { std::slice::from_raw_parts_mut(self.bits, len) }
    }
}

impl Drop for DibSection {
    fn drop(&mut self) {
        unsafe {
            let _ = SelectObject(self.hdc, self.previous);
            let _ = DeleteObject(self.hbitmap);
            let _ = DeleteDC(self.hdc);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Windows Overlay Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Windows overlay implementation
pub struct WindowsOverlay {
    hwnd: HWND,
    dib: DibSection,
    running: bool,
}

// NOTE: WindowsOverlay does NOT implement Send.
// Win32 HWND handles must be used from the thread that created them.

impl WindowsOverlay {
    fn register_class() -> Result<(), PlatformError> {
        unsafe {
            let class_name = wide_string(CLASS_NAME);
            let hinstance = GetModuleHandleW(None)
                .map_err(|e| PlatformError::Other(format!("GetModuleHandleW failed: {}", e)))?;

            let wc = WNDCLASSEXW {
                cbSize: mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(window_proc),
                hInstance: hinstance.into(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                lpszClassName: PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };

            let atom = RegisterClassExW(&wc);
            if atom == 0 {
                // Class may already be registered, which is fine
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(1410) {
                    // ERROR_CLASS_ALREADY_EXISTS
                    return Err(PlatformError::Other(format!(
                        "RegisterClassExW failed: {}",
                        err
                    )));
                }
            }
        }
        Ok(())
    }
}

impl OverlaySurface for WindowsOverlay {
    fn new(config: OverlayConfig) -> Result<Self, PlatformError> {
        Self::register_class()?;

        let hwnd = unsafe {
            let class_name = wide_string(CLASS_NAME);
            let window_name = wide_string(&config.namespace);

            let hinstance = GetModuleHandleW(None)
                .map_err(|e| PlatformError::Other(format!("GetModuleHandleW failed: {}", e)))?;

            let ex_style = WS_EX_LAYERED
                | WS_EX_TOPMOST
                | WS_EX_TOOLWINDOW
                | WS_EX_TRANSPARENT
                | WS_EX_NOACTIVATE;

            CreateWindowExW(
                ex_style,
                PCWSTR(class_name.as_ptr()),
                PCWSTR(window_name.as_ptr()),
                WS_POPUP,
                config.x,
                config.y,
                1,
                1,
                None,
                None,
                hinstance,
                None,
            )
            .map_err(|e| PlatformError::Other(format!("CreateWindowExW failed: {}", e)))?
        };

        let dib = match DibSection::create(1, 1) {
            Ok(dib) => dib,
            Err(e) => {
                unsafe {
                    let _ = DestroyWindow(hwnd);
                }
                return Err(e);
            }
        };

        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
        }

        tracing::debug!(?hwnd, "win32 overlay created");
        Ok(Self {
            hwnd,
            dib,
            running: true,
        })
    }

    fn work_area_at(&self, point: Point) -> Option<WorkArea> {
        unsafe {
            let monitor = MonitorFromPoint(
                POINT {
                    x: point.x,
                    y: point.y,
                },
                MONITOR_DEFAULTTOPRIMARY,
            );

            let mut info = MONITORINFO {
                cbSize: mem::size_of::<MONITORINFO>() as u32,
                ..Default::default()
            };
            if !GetMonitorInfoW(monitor, &mut info).as_bool() {
                tracing::warn!("GetMonitorInfoW failed");
                return None;
            }

            let RECT {
                left,
                top,
                right,
                bottom,
            } = info.rcWork;
            Some(WorkArea {
                left,
                top,
                right,
                bottom,
            })
        }
    }

    fn bring_to_front(&mut self) {
        unsafe {
            let _ = SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            );
        }
    }

    fn push(&mut self, frame: Frame<'_>) -> Result<(), PlatformError> {
        if frame.width != self.dib.width || frame.height != self.dib.height {
            self.dib = DibSection::create(frame.width, frame.height)?;
            tracing::debug!(width = frame.width, height = frame.height, "win32 dib resized");
        }

        // Convert RGBA to BGRA straight into the DIB
        for (dst, src) in self
            .dib
            .as_mut_slice()
            .chunks_exact_mut(4)
            .zip(frame.pixels.chunks_exact(4))
        {
            dst[0] = src[2]; // B
            dst[1] = src[1]; // G
            dst[2] = src[0]; // R
            dst[3] = src[3]; // A
        }

        let screen = ScreenDc::acquire()?;
        let pt_src = POINT { x: 0, y: 0 };
        let pt_dst = POINT {
            x: frame.origin.x,
            y: frame.origin.y,
        };
        let size = SIZE {
            cx: frame.width as i32,
            cy: frame.height as i32,
        };
        let blend = BLENDFUNCTION {
            BlendOp: 0, // AC_SRC_OVER
            BlendFlags: 0,
            SourceConstantAlpha: 255,
            AlphaFormat: 1, // AC_SRC_ALPHA
        };

        unsafe {
            UpdateLayeredWindow(
                self.hwnd,
                screen.0,
                Some(&pt_dst),
                Some(&size),
                self.dib.hdc,
                Some(&pt_src),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            )
            .map_err(|e| PlatformError::Other(format!("UpdateLayeredWindow failed: {}", e)))
        }
    }

    fn poll_events(&mut self) -> bool {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
                match msg.message {
                    WM_QUIT => {
                        tracing::debug!(?self.hwnd, "WM_QUIT received");
                        self.running = false;
                        return false;
                    }
                    _ => {
                        let _ = TranslateMessage(&msg);
                        DispatchMessageW(&msg);
                    }
                }
            }
        }
        self.running
    }
}

impl Drop for WindowsOverlay {
    fn drop(&mut self) {
        unsafe {
            if !self.hwnd.is_invalid() {
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

/// Window procedure for overlay windows
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        // Clicks fall through to whatever is underneath
        WM_NCHITTEST => LRESULT(HTTRANSPARENT as isize),
        WM_ERASEBKGND => LRESULT(1), // Don't erase background
        // Sent, not posted: turn it into WM_QUIT for poll_events
        WM_DESTROY => {
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

/// Convert a &str to a null-terminated wide string
fn wide_string(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
