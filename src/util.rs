// Small helpers shared by the view code.

use wasm_bindgen::JsValue;

/// Thousands-grouped integer formatting for the tooltip value
/// (",d" semantics: round, then group digits by commas).
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    let rounded = v.round() as i64;
    let digits = rounded.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn clog(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}
