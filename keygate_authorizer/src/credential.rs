use keygate::JwtRef;

/// Extracts the bearer credential from an `Authorization` header value
///
/// The header is split on whitespace and the last segment is taken, so
/// both `Bearer <token>` and a bare `<token>` are accepted. An absent or
/// blank header, or one holding only the `Bearer` scheme, yields nothing.
///
/// ```
/// use keygate_authorizer::extract_bearer;
///
/// let token = extract_bearer(Some("Bearer abc.def.ghi")).unwrap();
/// assert_eq!(token.as_str(), "abc.def.ghi");
///
/// assert!(extract_bearer(Some("   ")).is_none());
/// assert!(extract_bearer(None).is_none());
/// ```
#[must_use]
pub fn extract_bearer(header: Option<&str>) -> Option<&JwtRef> {
    let mut segments = header?.split_whitespace();
    let first = segments.next()?;

    let token = match segments.last() {
        Some(last) => last,
        None if first.eq_ignore_ascii_case("bearer") => return None,
        None => first,
    };

    Some(JwtRef::from_str(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_last_segment() {
        let cases = [
            ("Bearer abc.def.ghi", "abc.def.ghi"),
            ("bearer\tabc.def.ghi", "abc.def.ghi"),
            ("  Bearer   abc.def.ghi  ", "abc.def.ghi"),
            ("abc.def.ghi", "abc.def.ghi"),
            ("Token extra abc.def.ghi", "abc.def.ghi"),
        ];

        for (header, expected) in cases {
            let token = extract_bearer(Some(header)).map(JwtRef::as_str);
            assert_eq!(token, Some(expected), "header: {header:?}");
        }
    }

    #[test]
    fn blank_or_scheme_only_headers_yield_nothing() {
        for header in ["", " ", "\t\n", "Bearer", "  BEARER  "] {
            assert!(extract_bearer(Some(header)).is_none(), "header: {header:?}");
        }
        assert!(extract_bearer(None).is_none());
    }
}
