//! Hidden form field extraction
//!
//! The automated flow has to replay what a browser would submit, which
//! means carrying every hidden input (CSRF tokens and friends) back in the
//! POST body. Instance login pages are external markup we do not control,
//! so all scraping lives behind this module; swapping the parsing strategy
//! must not touch the flow's control logic.

use std::sync::OnceLock;

use regex::Regex;

fn input_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<input[^>]*>").unwrap())
}

fn attr_re(attr: &'static str, cell: &'static OnceLock<Regex>) -> &'static Regex {
    cell.get_or_init(|| Regex::new(&format!(r#"{}\s*=\s*"([^"]*)""#, attr)).unwrap())
}

fn name_attr(tag: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    attr_re("name", &RE)
        .captures(tag)
        .map(|c| c[1].to_string())
}

fn value_attr(tag: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    attr_re("value", &RE)
        .captures(tag)
        .map(|c| c[1].to_string())
}

fn type_attr(tag: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    attr_re("type", &RE)
        .captures(tag)
        .map(|c| c[1].to_string())
}

/// All hidden `<input>` name/value pairs in the page, in document order
///
/// Attribute order within the tag does not matter. Values are returned
/// verbatim; the flow must reproduce them unmodified in its POST body.
pub fn hidden_fields(html: &str) -> Vec<(String, String)> {
    input_tag_re()
        .find_iter(html)
        .filter_map(|m| {
            let tag = m.as_str();
            if type_attr(tag).as_deref() != Some("hidden") {
                return None;
            }
            let name = name_attr(tag)?;
            let value = value_attr(tag).unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

/// CSRF token from a `<meta name="csrf-token">` tag, if present
///
/// Some instances put the token in the document head instead of the form;
/// it gets submitted as `authenticity_token` in that case.
pub fn meta_csrf_token(html: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r#"<meta\s+name="csrf-token"\s+content="([^"]*)""#).unwrap()
    });
    re.captures(html).map(|c| c[1].to_string())
}

/// The fields a simulated form submission must carry alongside its own
///
/// Hidden inputs win; the meta tag is the fallback when the form has none.
pub fn form_fields(html: &str) -> Vec<(String, String)> {
    let fields = hidden_fields(html);
    if !fields.is_empty() {
        return fields;
    }
    meta_csrf_token(html)
        .map(|token| vec![("authenticity_token".to_string(), token)])
        .unwrap_or_default()
}

/// First `code=` parameter found in a query string, URL, or page body
pub fn find_code_param(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"code=([^&\s"'<]+)"#).unwrap());
    re.captures(text).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_fields_basic() {
        let html = r#"
            <form action="/auth/sign_in" method="POST">
                <input type="hidden" name="authenticity_token" value="abc123">
                <input type="text" name="username">
                <input type="password" name="password">
            </form>
        "#;
        let fields = hidden_fields(html);
        assert_eq!(
            fields,
            vec![("authenticity_token".to_string(), "abc123".to_string())]
        );
    }

    #[test]
    fn test_hidden_fields_attribute_order() {
        let html = r#"<input name="csrf" value="xyz" type="hidden">"#;
        assert_eq!(
            hidden_fields(html),
            vec![("csrf".to_string(), "xyz".to_string())]
        );
    }

    #[test]
    fn test_hidden_fields_multiple() {
        let html = r#"
            <input type="hidden" name="_token" value="one">
            <input type="hidden" name="state" value="two">
        "#;
        let fields = hidden_fields(html);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ("_token".to_string(), "one".to_string()));
        assert_eq!(fields[1], ("state".to_string(), "two".to_string()));
    }

    #[test]
    fn test_hidden_field_value_verbatim() {
        // Token values often contain base64 padding and mixed case
        let html = r#"<input type="hidden" name="csrf_token" value="Qz+9/aB==">"#;
        assert_eq!(
            hidden_fields(html),
            vec![("csrf_token".to_string(), "Qz+9/aB==".to_string())]
        );
    }

    #[test]
    fn test_hidden_fields_ignores_visible_inputs() {
        let html = r#"<input type="text" name="username" value="leftover">"#;
        assert!(hidden_fields(html).is_empty());
    }

    #[test]
    fn test_meta_csrf_token() {
        let html = r#"<head><meta name="csrf-token" content="meta-value-1"></head>"#;
        assert_eq!(meta_csrf_token(html).as_deref(), Some("meta-value-1"));
        assert!(meta_csrf_token("<head></head>").is_none());
    }

    #[test]
    fn test_form_fields_prefers_hidden_inputs() {
        let html = r#"
            <meta name="csrf-token" content="from-meta">
            <input type="hidden" name="csrf" value="from-form">
        "#;
        assert_eq!(
            form_fields(html),
            vec![("csrf".to_string(), "from-form".to_string())]
        );
    }

    #[test]
    fn test_form_fields_meta_fallback() {
        let html = r#"<meta name="csrf-token" content="from-meta">"#;
        assert_eq!(
            form_fields(html),
            vec![("authenticity_token".to_string(), "from-meta".to_string())]
        );
    }

    #[test]
    fn test_form_fields_empty_when_nothing_found() {
        assert!(form_fields("<html><body>plain page</body></html>").is_empty());
    }

    #[test]
    fn test_find_code_param_in_query() {
        assert_eq!(
            find_code_param("https://x.example/cb?code=CODE123&state=s").as_deref(),
            Some("CODE123")
        );
    }

    #[test]
    fn test_find_code_param_in_body() {
        let html = r#"<p>Your authorization code: <code>code=ZXJ0eXVp</code></p>"#;
        assert_eq!(find_code_param(html).as_deref(), Some("ZXJ0eXVp"));
    }

    #[test]
    fn test_find_code_param_absent() {
        assert!(find_code_param("no parameters here").is_none());
    }
}
