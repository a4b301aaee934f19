use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes left as-is in a URL component: alphanumerics plus `- _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a single URL path segment with uppercase hex escapes.
pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::encode_uri_component;

    #[test]
    fn passes_unreserved_through() {
        assert_eq!(encode_uri_component("my-plugin_1.0"), "my-plugin_1.0");
    }

    #[test]
    fn escapes_reserved_and_multibyte() {
        assert_eq!(encode_uri_component("a/b c#d"), "a%2Fb%20c%23d");
        assert_eq!(encode_uri_component("é"), "%C3%A9");
    }

    #[test]
    fn keeps_marks_and_escapes_query_syntax() {
        assert_eq!(encode_uri_component("it's(~*!)"), "it's(~*!)");
        assert_eq!(encode_uri_component("a+b=c&d?"), "a%2Bb%3Dc%26d%3F");
    }
}
