use super::*;

/// Parses a full document. Text outside any element is kept so that
/// serialization round-trips whitespace between fields.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            let end = find_subslice(bytes, i + 4, b"-->")
                .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
            i = end + 3;
            continue;
        }

        if bytes[i] == b'<' && starts_with_at(bytes, i, b"</") {
            let (tag, next) = parse_end_tag(html, i)?;
            i = next;
            // Unmatched end tags are ignored rather than unwinding the stack.
            if let Some(depth) = stack
                .iter()
                .rposition(|node| dom.tag_name(*node) == Some(tag.as_str()))
            {
                stack.truncate(depth);
            }
            continue;
        }

        if bytes[i] == b'<' && starts_with_at(bytes, i, b"<!") {
            i = skip_declaration(bytes, i)?;
            continue;
        }

        if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;
            close_implied_end_tags(&dom, &mut stack, &tag);

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if is_raw_text_tag(&tag) && !self_closing {
                let close = find_raw_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                let body = html
                    .get(i..close)
                    .ok_or_else(|| Error::HtmlParse(format!("invalid <{tag}> body")))?;
                if !body.is_empty() {
                    let text = if tag == "textarea" || tag == "title" {
                        decode_html_character_references(body)
                    } else {
                        body.to_string()
                    };
                    dom.create_text(node, text);
                }
                let (_, after_end) = parse_end_tag(html, close)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        i += 1;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }
        let text = html
            .get(text_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid text run".into()))?;
        let parent = *stack
            .last()
            .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
        dom.create_text(parent, decode_html_character_references(text));
    }

    Ok(dom)
}

/// Parses a fragment (a decoded item template). The fragment's top-level
/// nodes are the children of the returned document root.
pub(crate) fn parse_fragment(html: &str) -> Result<Dom> {
    let dom = parse_html(html)?;
    if dom.child_elements(dom.root).is_empty() {
        return Err(Error::HtmlParse("fragment contains no elements".into()));
    }
    Ok(dom)
}

// (closing tag, tags that close it, tags that stop the search)
const IMPLIED_END_TAGS: &[(&str, &[&str], &[&str])] = &[
    ("li", &["li"], &["ul", "ol", "menu"]),
    ("option", &["option", "optgroup"], &["select", "datalist", "optgroup"]),
    ("dt", &["dt", "dd"], &["dl"]),
    ("dd", &["dt", "dd"], &["dl"]),
    (
        "p",
        &[
            "p", "div", "fieldset", "form", "ul", "ol", "dl", "table", "h1", "h2", "h3", "h4",
            "h5", "h6", "section", "header", "footer", "pre", "blockquote",
        ],
        &[],
    ),
];

fn close_implied_end_tags(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    for (open, closed_by, stop) in IMPLIED_END_TAGS {
        if !closed_by.contains(&tag) {
            continue;
        }
        for index in (1..stack.len()).rev() {
            let Some(open_tag) = dom.tag_name(stack[index]) else {
                continue;
            };
            if open_tag == *open {
                stack.truncate(index);
                break;
            }
            if stop.contains(&open_tag) {
                break;
            }
        }
    }
}

fn parse_start_tag(
    html: &str,
    at: usize,
) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid tag name".into()))?
        .to_ascii_lowercase();
    if tag.is_empty() {
        return Err(Error::HtmlParse("empty tag name".into()));
    }

    let mut attrs = HashMap::new();
    let mut self_closing = false;
    loop {
        skip_ws(bytes, &mut i);
        match bytes.get(i) {
            None => return Err(Error::HtmlParse(format!("unclosed start tag <{tag}>"))),
            Some(b'>') => {
                i += 1;
                break;
            }
            Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                self_closing = true;
                i += 2;
                break;
            }
            Some(b) if !is_attr_name_char(*b) => {
                // Stray characters inside a tag are skipped, as browsers do.
                i += 1;
                continue;
            }
            Some(_) => {}
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }
        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();

        skip_ws(bytes, &mut i);
        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, &mut i)?
        } else {
            String::new()
        };
        // First occurrence wins.
        attrs.entry(name).or_insert(value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_attr_value(html: &str, i: &mut usize) -> Result<String> {
    let bytes = html.as_bytes();
    let Some(&first) = bytes.get(*i) else {
        return Err(Error::HtmlParse("missing attribute value".into()));
    };

    if first == b'\'' || first == b'"' {
        let start = *i + 1;
        let end = bytes[start..]
            .iter()
            .position(|b| *b == first)
            .map(|offset| start + offset)
            .ok_or_else(|| Error::HtmlParse("unclosed quoted attribute value".into()))?;
        *i = end + 1;
        let raw = html
            .get(start..end)
            .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
        return Ok(decode_html_character_references(raw));
    }

    let start = *i;
    while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
        *i += 1;
    }
    let raw = html
        .get(start..*i)
        .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
    Ok(decode_html_character_references(raw))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    skip_ws(bytes, &mut i);
    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag".into()))?
        .to_ascii_lowercase();
    let close = bytes[i..]
        .iter()
        .position(|b| *b == b'>')
        .ok_or_else(|| Error::HtmlParse(format!("unclosed end tag </{tag}")))?;
    Ok((tag, i + close + 1))
}

fn skip_declaration(bytes: &[u8], at: usize) -> Result<usize> {
    bytes[at..]
        .iter()
        .position(|b| *b == b'>')
        .map(|offset| at + offset + 1)
        .ok_or_else(|| Error::HtmlParse("unclosed declaration tag".into()))
}

fn find_raw_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while i + 2 + tag.len() <= bytes.len() {
        if bytes[i] == b'<' && bytes[i + 1] == b'/' {
            let name = &bytes[i + 2..i + 2 + tag.len()];
            let after = bytes.get(i + 2 + tag.len()).copied();
            if name.eq_ignore_ascii_case(tag) && !after.is_some_and(|b| b.is_ascii_alphanumeric())
            {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

pub(crate) fn decode_html_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[..semi];
            decode_entity(entity).map(|ch| (ch, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        let codepoint = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(codepoint);
    }
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => None,
    }
}

pub(crate) fn escape_html_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn escape_html_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes
        .get(at..at + needle.len())
        .is_some_and(|window| window == needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':' || b == b'.'
}
