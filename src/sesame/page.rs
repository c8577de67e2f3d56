//! Server-rendered login page.

use crate::auth::{ErrorInformation, PageVariant, FORM_TOKEN_PARAM, PARAM_ACTION};

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the login form for `variant`, carrying the session's anti-forgery token.
#[must_use]
pub fn render(variant: PageVariant, form_token: &str, error: Option<&ErrorInformation>) -> String {
    let (title, identity_fields) = match variant {
        PageVariant::Login => (
            "Sign in",
            concat!(
                r#"<label for="username">Username</label>"#,
                r#"<input id="username" name="username" type="text" autocomplete="username" required autofocus>"#,
                r#"<input name="context" type="hidden" value="">"#,
            ),
        ),
        PageVariant::PasswordOnly => ("Confirm your password", ""),
    };

    let error_block = error.map_or_else(String::new, |error| {
        format!(
            r#"<p class="error" role="alert" data-code="{}">{}</p>"#,
            error.code,
            escape(&error.message)
        )
    });

    format!(
        concat!(
            "<!DOCTYPE html>\n",
            r#"<html lang="en"><head><meta charset="utf-8">"#,
            "<title>{title}</title></head><body>",
            "<h1>{title}</h1>{error_block}",
            r#"<form method="post" action="/login">"#,
            r#"<input name="{action_param}" type="hidden" value="login">"#,
            r#"<input name="{token_param}" type="hidden" value="{form_token}">"#,
            "{identity_fields}",
            r#"<label for="password">Password</label>"#,
            r#"<input id="password" name="password" type="password" autocomplete="current-password" required>"#,
            r#"<button type="submit">Sign in</button>"#,
            "</form></body></html>\n",
        ),
        title = title,
        error_block = error_block,
        action_param = PARAM_ACTION,
        token_param = FORM_TOKEN_PARAM,
        form_token = escape(form_token),
        identity_fields = identity_fields,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ErrorCode;

    #[test]
    fn login_page_has_hidden_fields() {
        let html = render(PageVariant::Login, "tok-123", None);
        assert!(html.contains(r#"name="processAction" type="hidden" value="login""#));
        assert!(html.contains(r#"name="formToken" type="hidden" value="tok-123""#));
        assert!(html.contains(r#"name="username""#));
        assert!(html.contains(r#"name="password""#));
        assert!(!html.contains("role=\"alert\""));
    }

    #[test]
    fn password_only_page_has_no_username() {
        let html = render(PageVariant::PasswordOnly, "tok", None);
        assert!(!html.contains(r#"name="username""#));
        assert!(html.contains(r#"name="password""#));
        assert!(html.contains("Confirm your password"));
    }

    #[test]
    fn error_message_is_escaped() {
        let error = ErrorInformation::new(ErrorCode::WrongPassword, "<script>alert(1)</script>");
        let html = render(PageVariant::Login, "tok", Some(&error));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"data-code="wrong_password""#));
    }

    #[test]
    fn escape_handles_quotes() {
        assert_eq!(escape(r#"a"b'c&d"#), "a&quot;b&#x27;c&amp;d");
    }
}
