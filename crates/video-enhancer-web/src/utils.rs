use wasm_bindgen::JsValue;

pub fn set_panic_hook() {
    // Better error messages when the module panics
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Routes `tracing` output to the browser console; safe to call more than once
pub fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(tracing_wasm::set_as_global_default);
}

pub fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}
