use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// bytes escaped inside one path segment
const SEGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'%').add(b'/').add(b'<').add(b'>').add(b'?').add(b'`').add(b'{').add(b'}');

/// Join two url path
pub fn join(base: &str, other: &str) -> String {
    let be = base.ends_with("/");
    let os = other.starts_with("/");
    if be && os {
        return format!("{}{}", base, &other[1..]);
    }

    if !be && !os {
        return format!("{}/{}", base, other);
    }

    format!("{}{}", base, other)
}

/// href already carries scheme and host
pub fn is_absolute(href: &str) -> bool {
    url::Url::parse(href).map(|u| u.has_host()).unwrap_or(false)
}

/// absolute hrefs are kept, relative ones are joined to base
pub fn resolve(base: &str, href: &str) -> String {
    if is_absolute(href) {
        href.to_string()
    } else {
        join(base, href)
    }
}

/// Percent encode one path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Reference of one direct child of `href`: `{href}/{segment}`, segment encoded
pub fn child(href: &str, segment: &str) -> String {
    format!("{}/{}", href.trim_end_matches('/'), encode_segment(segment))
}

/// Inverse of child, the decoded segment when `reference` sits directly under `href`
pub fn child_segment(href: &str, reference: &str) -> Option<String> {
    let encoded = reference.strip_prefix(href.trim_end_matches('/'))?.strip_prefix('/')?;
    if encoded.is_empty() || encoded.contains('/') {
        return None;
    }
    percent_decode_str(encoded).decode_utf8().ok().map(|segment| segment.into_owned())
}
