use once_cell::sync::Lazy;
use regex::Regex;

/// Naming convention tools.
pub struct Case;

static CAPITALIZED_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid capitalized word pattern"));
static LOWER_UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid lower upper pattern"));

impl Case {
    /// camelCase / PascalCase to snake_case
    ///
    /// `createdAt` -> `created_at`, `spHttpStatus` -> `sp_http_status`, `HTTPStatus` -> `http_status`.
    /// Already snake_case input is returned unchanged.
    pub fn snake(s: &str) -> String {
        let words = CAPITALIZED_WORD.replace_all(s, "${1}_${2}");
        LOWER_UPPER.replace_all(&words, "${1}_${2}").to_lowercase()
    }
}
