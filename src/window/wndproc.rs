//! Win32 window procedure for the main window.
//!
//! Translates window messages into [`WindowEvent`]s and applies the
//! dispatcher's answer. A fatal error shows a message box once and posts
//! quit with exit code 1.

use std::cell::Cell;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    DefWindowProcW, GetClientRect, GetWindowLongPtrW, MessageBoxW, PostQuitMessage,
    GWLP_USERDATA, MB_ICONERROR, MB_OK, MINMAXINFO, WM_CLOSE, WM_GETMINMAXINFO, WM_SIZE,
    WM_TIMER,
};

use crate::clock::MonotonicClock;
use crate::compositor::graphics::WindowsBackend;
use crate::compositor::{
    DispatchOutcome, Dispatcher, FrameSize, Renderer, TrackSize, WindowEvent,
};
use crate::error::DcompShaderError;

/// Exit code posted after a fatal rendering error.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Per-window state, reachable from `GWLP_USERDATA`.
pub struct AppState {
    pub renderer: Renderer<WindowsBackend>,
    pub clock: MonotonicClock,
    failed: Cell<bool>,
}

impl AppState {
    pub fn new(renderer: Renderer<WindowsBackend>, clock: MonotonicClock) -> Self {
        Self {
            renderer,
            clock,
            failed: Cell::new(false),
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failed.get()
    }
}

/// Window procedure for the main window.
///
/// # Safety
/// This is a Win32 callback and must be marked unsafe.
pub unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let state_ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const AppState;

    match msg {
        WM_CLOSE => handle_event(hwnd, state_ptr, WindowEvent::Close).unwrap_or_else(|| {
            PostQuitMessage(0);
            LRESULT(0)
        }),
        WM_SIZE => {
            let size = FrameSize::from_lparam(lparam.0);
            handle_event(hwnd, state_ptr, WindowEvent::Resize(size));
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        WM_TIMER => {
            handle_event(hwnd, state_ptr, WindowEvent::Tick);
            LRESULT(0)
        }
        WM_GETMINMAXINFO => handle_min_max(hwnd, state_ptr, lparam)
            .unwrap_or_else(|| DefWindowProcW(hwnd, msg, wparam, lparam)),
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Dispatch one event. `None` if the window has no state attached yet.
fn handle_event(hwnd: HWND, state_ptr: *const AppState, event: WindowEvent) -> Option<LRESULT> {
    if state_ptr.is_null() {
        return None;
    }
    let state = unsafe { &*state_ptr };
    if state.has_failed() {
        return Some(LRESULT(0));
    }

    let dispatcher = Dispatcher::new(&state.renderer, &state.clock);
    match dispatcher.dispatch(event, || client_size(hwnd)) {
        Ok(DispatchOutcome::Quit) => unsafe { PostQuitMessage(0) },
        Ok(_) => {}
        Err(err) => fail(hwnd, state, &err),
    }
    Some(LRESULT(0))
}

/// Handle WM_GETMINMAXINFO - keep the client area from reaching zero.
fn handle_min_max(hwnd: HWND, state_ptr: *const AppState, lparam: LPARAM) -> Option<LRESULT> {
    let info = lparam.0 as *mut MINMAXINFO;
    if info.is_null() {
        return None;
    }
    let info = unsafe { &mut *info };
    let proposed = TrackSize {
        x: info.ptMinTrackSize.x,
        y: info.ptMinTrackSize.y,
    };

    // Answered in every state, including before the renderer exists.
    let clamped = if state_ptr.is_null() {
        proposed.clamp_min()
    } else {
        let state = unsafe { &*state_ptr };
        let dispatcher = Dispatcher::new(&state.renderer, &state.clock);
        match dispatcher.dispatch(WindowEvent::MinMaxQuery(proposed), || client_size(hwnd)) {
            Ok(DispatchOutcome::MinTrackSize(size)) => size,
            _ => proposed.clamp_min(),
        }
    };

    info.ptMinTrackSize.x = clamped.x;
    info.ptMinTrackSize.y = clamped.y;
    Some(LRESULT(0))
}

/// Current client area of the window.
pub fn client_size(hwnd: HWND) -> FrameSize {
    let mut rect = RECT::default();
    if unsafe { GetClientRect(hwnd, &mut rect) }.is_err() {
        return FrameSize::default();
    }
    FrameSize::new(
        (rect.right - rect.left).max(0) as u32,
        (rect.bottom - rect.top).max(0) as u32,
    )
}

/// Report a fatal error once and end the message loop with a failure code.
fn fail(hwnd: HWND, state: &AppState, err: &DcompShaderError) {
    if state.failed.replace(true) {
        return;
    }
    log::error!("[WINDOW] Fatal rendering error: {}", err);
    show_fatal(hwnd, err);
    unsafe { PostQuitMessage(FATAL_EXIT_CODE) };
}

/// Modal error box naming the failing step and its status code.
pub fn show_fatal(hwnd: HWND, err: &DcompShaderError) {
    let text = match err.status_code() {
        Some(code) => format!("{}\n\nHRESULT {}", err, code),
        None => err.to_string(),
    };
    let text = wide(&text);
    let caption = wide("Rendering failed");
    unsafe {
        MessageBoxW(
            hwnd,
            PCWSTR(text.as_ptr()),
            PCWSTR(caption.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}

/// Null-terminated UTF-16 copy of `text`.
pub fn wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}
