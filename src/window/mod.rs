//! The top-level window and its message loop.
//!
//! Startup order: register the class, create the window, build the device
//! chain, draw an initial frame at t = 0, show the window, start the clock
//! and the frame timer, then pump messages until quit.

pub mod wndproc;

use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DestroyWindow, DispatchMessageW, GetMessageW, KillTimer, LoadCursorW,
    RegisterClassW, SetTimer, SetWindowLongPtrW, ShowWindow, TranslateMessage, CW_USEDEFAULT,
    GWLP_USERDATA, IDC_ARROW, MSG, SW_SHOW, WNDCLASSW, WS_EX_NOREDIRECTIONBITMAP,
    WS_EX_OVERLAPPEDWINDOW, WS_OVERLAPPEDWINDOW,
};

use crate::clock::MonotonicClock;
use crate::compositor::graphics::WindowsBackend;
use crate::compositor::{FrameSize, Renderer, WindowHandle};
use crate::config::AppConfig;
use crate::error::{DcompShaderError, DcompShaderResult, ResultExt};

use wndproc::{show_fatal, wide, wnd_proc, AppState, FATAL_EXIT_CODE};

const FRAME_TIMER_ID: usize = 1;

/// Create the window, run until it closes, and return the process exit code.
pub fn run(config: &AppConfig) -> DcompShaderResult<i32> {
    register_class(&config.window.class_name)?;
    let hwnd = create_window(config)?;
    log::info!("[WINDOW] Created window {:?}", hwnd.0);

    let initial_size = config.window.size();
    let renderer = Renderer::new(
        WindowsBackend::new(),
        WindowHandle(hwnd.0 as isize),
        initial_size,
    );

    if let Err(err) = renderer.initialize() {
        show_fatal(hwnd, &err);
        destroy(hwnd);
        return Err(err);
    }

    if let Err(err) = renderer.submit_frame(0.0, initial_size, false) {
        show_fatal(hwnd, &err);
        renderer.dispose();
        destroy(hwnd);
        return Err(err);
    }

    let state = Box::new(AppState::new(renderer, MonotonicClock::start_now()));
    let state_ptr = &*state as *const AppState;

    unsafe {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, state_ptr as isize);
        let _ = ShowWindow(hwnd, SW_SHOW);
    }

    let interval = config.tick_interval();
    let millis = u32::try_from(interval.as_millis()).unwrap_or(u32::MAX);
    if let Err(err) = started_timer(unsafe { SetTimer(hwnd, FRAME_TIMER_ID, millis, None) }) {
        unsafe { SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) };
        show_fatal(hwnd, &err);
        state.renderer.dispose();
        drop(state);
        destroy(hwnd);
        return Err(err);
    }
    log::info!("[WINDOW] Frame timer started at {} ms", millis);

    let exit_code = message_loop();

    unsafe {
        let _ = KillTimer(hwnd, FRAME_TIMER_ID);
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
    }

    let stats = state.renderer.stats();
    log::info!(
        "[WINDOW] Shutting down: {} presented, {} dropped, {} skipped, {} recoveries",
        stats.presented,
        stats.dropped,
        stats.skipped,
        stats.recoveries
    );
    let exit_code = if state.has_failed() {
        FATAL_EXIT_CODE
    } else {
        exit_code
    };

    state.renderer.dispose();
    drop(state);
    destroy(hwnd);

    Ok(exit_code)
}

/// Pump messages until `WM_QUIT`; returns the posted exit code.
fn message_loop() -> i32 {
    let mut msg = MSG::default();
    loop {
        let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        match result.0 {
            0 => return msg.wParam.0 as i32,
            -1 => {
                log::error!("[WINDOW] GetMessageW failed");
                return FATAL_EXIT_CODE;
            }
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }
}

fn register_class(class_name: &str) -> DcompShaderResult<()> {
    unsafe {
        let hinstance = GetModuleHandleW(None).context("Failed to get module handle")?;

        let class_name = wide(class_name);

        let wc = WNDCLASSW {
            lpfnWndProc: Some(wnd_proc),
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            hCursor: LoadCursorW(None, IDC_ARROW).context("Failed to load cursor")?,
            ..Default::default()
        };

        let atom = RegisterClassW(&wc);
        if atom == 0 {
            return Err(DcompShaderError::Window(
                "Failed to register window class".to_string(),
            ));
        }
    }

    Ok(())
}

fn create_window(config: &AppConfig) -> DcompShaderResult<HWND> {
    let FrameSize { width, height } = config.window.size();
    let class_name = wide(&config.window.class_name);
    let title = wide(&config.window.title);

    unsafe {
        let hinstance = GetModuleHandleW(None).context("Failed to get module handle")?;

        // No redirection bitmap: DirectComposition provides all content.
        CreateWindowExW(
            WS_EX_NOREDIRECTIONBITMAP | WS_EX_OVERLAPPEDWINDOW,
            PCWSTR(class_name.as_ptr()),
            PCWSTR(title.as_ptr()),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            width as i32,
            height as i32,
            None,
            None,
            hinstance,
            None,
        )
        .map_err(|e| DcompShaderError::Window(format!("Failed to create window: {:?}", e)))
    }
}

/// `SetTimer` returns 0 on failure.
fn started_timer(id: usize) -> DcompShaderResult<usize> {
    if id == 0 {
        let err = windows::core::Error::from_win32();
        return Err(DcompShaderError::Window(format!(
            "SetTimer failed: {}",
            err.message()
        )));
    }
    Ok(id)
}

fn destroy(hwnd: HWND) {
    unsafe {
        let _ = DestroyWindow(hwnd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timer_id_is_an_error() {
        let err = started_timer(0).unwrap_err();
        assert!(matches!(err, DcompShaderError::Window(ref msg) if msg.starts_with("SetTimer failed")));
    }

    #[test]
    fn nonzero_timer_id_is_returned() {
        assert_eq!(started_timer(FRAME_TIMER_ID).unwrap(), FRAME_TIMER_ID);
    }
}
