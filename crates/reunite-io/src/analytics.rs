//! Lightweight Simple Analytics event tracking.
//!
//! Calls the global `sa_event` function injected by the Simple
//! Analytics `<script>` tag. All functions silently no-op when the
//! script is absent (e.g., blocked by an ad-blocker or during tests).
//!
//! Event names follow Simple Analytics conventions: lowercase
//! alphanumeric with underscores, max 200 characters.

use reunite_analysis::RequestKind;
use wasm_bindgen::prelude::*;

/// Fire a Simple Analytics custom event.
///
/// Silently does nothing when the analytics script is absent.
fn track_event(name: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(func) = js_sys::Reflect::get(&window, &JsValue::from_str("sa_event")) else {
        return;
    };
    if !func.is_function() {
        return;
    }
    let func: js_sys::Function = func.unchecked_into();
    let _ = func.call1(&JsValue::NULL, &JsValue::from_str(name));
}

/// What the user did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultAction {
    Download,
    Share,
}

/// Event name for `action` on a `kind` result, e.g. `download_facial_match`.
#[must_use]
pub fn event_name(action: ResultAction, kind: RequestKind) -> String {
    let verb = match action {
        ResultAction::Download => "download",
        ResultAction::Share => "share",
    };
    format!("{verb}_{}", kind.event_name())
}

/// Record a download or share of a result.
///
/// # Panics (debug only)
///
/// Debug-asserts that the event name fits within the 200-character limit.
pub fn track_result_action(action: ResultAction, kind: RequestKind) {
    let name = event_name(action, kind);
    debug_assert!(
        name.len() <= 200,
        "event name exceeds 200-character limit: {name:?}"
    );
    track_event(&name);
}
