pub mod json;
pub mod terminal;

use error_stack::Report;

use crate::analysis::Analysis;
use crate::error::{AnalysisError, RenderError};

pub const NOT_AVAILABLE: &str = "N/A";

/// Sink for analysis results and per-cycle failures.
pub trait Presenter: Send + Sync {
    fn present(&self, analysis: &Analysis) -> Result<(), Report<RenderError>>;

    /// Show a failed cycle to the user. Never fails the session.
    fn present_error(&self, error: &Report<AnalysisError>);
}

/// Group the integer digits of a non-negative decimal string with commas.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234567.4` → `"1,234,567"`.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{}", group_thousands(&format!("{:.0}", rounded.abs())))
}

/// `1234.5` with `"$"` → `"$1,234.50"`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{sign}{symbol}{}.{frac_part}", group_thousands(int_part))
}

/// Signed percentage with two decimals, e.g. `"+1.25%"`.
pub fn format_percent(value: f64) -> String {
    format!("{value:+.2}%")
}

/// Apply `f` to a defined value or fall back to [`NOT_AVAILABLE`].
pub fn or_na<T>(value: Option<T>, f: impl FnOnce(T) -> String) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), f)
}
