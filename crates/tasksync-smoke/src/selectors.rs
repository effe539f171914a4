//! DOM selectors for the Tasks web app.

/// Task title spans inside each `div.group` row of the task list
pub const TASK_ROW_LABEL: &str = "div.group span";

/// The new-task text input
pub const TASK_INPUT: &str = "input[placeholder*='What needs to be done']";

/// The "Add Task" button
pub const ADD_TASK_BUTTON: &str = "//button[contains(text(), 'Add Task')]";

/// The remaining-items counter
pub const ITEMS_COUNTER: &str = "//*[contains(text(), 'items left') or contains(text(), '0')]";

/// XPath matching any element whose text contains `text`.
///
/// The text is embedded as an XPath string literal; values containing both
/// quote kinds are split with `concat()`.
#[must_use]
pub fn contains_text(text: &str) -> String {
    format!("//*[contains(text(), {})]", xpath_literal(text))
}

fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{text}'");
    }
    if !text.contains('"') {
        return format!("\"{text}\"");
    }
    let parts: Vec<String> = text.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Extract the text from an expression built by [`contains_text`].
///
/// Only plain single-quoted literals are recognised.
#[must_use]
pub fn contained_text(xpath: &str) -> Option<&str> {
    xpath
        .strip_prefix("//*[contains(text(), '")?
        .strip_suffix("')]")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_text_plain() {
        assert_eq!(
            contains_text("BrowserStack Test - Run 1#2 - 3"),
            "//*[contains(text(), 'BrowserStack Test - Run 1#2 - 3')]"
        );
    }

    #[test]
    fn test_contains_text_single_quote() {
        assert_eq!(contains_text("it's"), "//*[contains(text(), \"it's\")]");
    }

    #[test]
    fn test_contains_text_both_quotes() {
        assert_eq!(
            contains_text("a'b\"c"),
            "//*[contains(text(), concat('a', \"'\", 'b\"c'))]"
        );
    }

    #[test]
    fn test_contained_text_reverses_plain_literal() {
        let xpath = contains_text("hello world");
        assert_eq!(contained_text(&xpath), Some("hello world"));
        assert_eq!(contained_text(ADD_TASK_BUTTON), None);
    }
}
