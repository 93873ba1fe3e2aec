//! Percent- and form-encoding helpers shared by the client façades.
//!
//! Both chat platforms want RFC 3986 unreserved characters passed through
//! and everything else escaped byte-wise; the form-body variant additionally
//! encodes spaces in *values* as `+`, which is what
//! `application/x-www-form-urlencoded` servers expect.

/// Percent-encode a string for use in a URL path segment or query value.
///
/// Unreserved characters (`A-Z a-z 0-9 - _ . ~`) pass through; every other
/// byte (including each byte of a multi-byte UTF-8 sequence) becomes `%XX`.
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            push_escaped(&mut out, b);
        }
    }
    out
}

/// Build an `application/x-www-form-urlencoded` body from key/value pairs.
///
/// Keys are percent-encoded; values are percent-encoded with the space →
/// `+` rule. Pairs are joined with `&` in the order given.
pub fn form_urlencode(pairs: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (i, (key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            body.push('&');
        }
        body.push_str(&percent_encode(key));
        body.push('=');
        for &b in value.as_bytes() {
            if is_unreserved(b) {
                body.push(b as char);
            } else if b == b' ' {
                body.push('+');
            } else {
                push_escaped(&mut body, b);
            }
        }
    }
    body
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~')
}

fn push_escaped(out: &mut String, b: u8) {
    out.push('%');
    out.push_str(&format!("{:02X}", b));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
