use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorAttrCondition {
    Exists { key: String },
    Eq { key: String, value: String },
    StartsWith { key: String, value: String },
    EndsWith { key: String, value: String },
    Contains { key: String, value: String },
    Includes { key: String, value: String },
}

impl SelectorAttrCondition {
    pub(crate) fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Exists { key } => element.attrs.contains_key(key),
            Self::Eq { key, value } => element.attrs.get(key) == Some(value),
            Self::StartsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.starts_with(value.as_str())),
            Self::EndsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.ends_with(value.as_str())),
            Self::Contains { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.contains(value.as_str())),
            Self::Includes { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.split_whitespace().any(|token| token == value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SelectorPseudoClass {
    FirstChild,
    LastChild,
    Empty,
    NthChild(usize),
    Not(Vec<Vec<SelectorPart>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SelectorStep {
    pub(crate) tag: Option<String>,
    pub(crate) universal: bool,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<SelectorAttrCondition>,
    pub(crate) pseudo_classes: Vec<SelectorPseudoClass>,
}

impl SelectorStep {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo_classes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectorCombinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectorPart {
    pub(crate) step: SelectorStep,
    // Relation to the part on the left.
    pub(crate) combinator: Option<SelectorCombinator>,
}

pub(crate) fn parse_selector_groups(selector: &str) -> Result<Vec<Vec<SelectorPart>>> {
    split_top_level(selector, |ch| ch == ',')?
        .iter()
        .map(|group| parse_selector_chain(group))
        .collect()
}

pub(crate) fn parse_selector_chain(selector: &str) -> Result<Vec<SelectorPart>> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }

    let mut parts: Vec<SelectorPart> = Vec::new();
    let mut pending: Option<SelectorCombinator> = None;
    for token in tokenize_selector(selector)? {
        let combinator = match token.as_str() {
            ">" => Some(SelectorCombinator::Child),
            "+" => Some(SelectorCombinator::AdjacentSibling),
            "~" => Some(SelectorCombinator::GeneralSibling),
            _ => None,
        };
        if let Some(combinator) = combinator {
            if pending.is_some() || parts.is_empty() {
                return Err(Error::UnsupportedSelector(selector.into()));
            }
            pending = Some(combinator);
            continue;
        }

        let step = parse_selector_step(&token)?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(SelectorCombinator::Descendant))
        };
        parts.push(SelectorPart { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    Ok(parts)
}

/// Splits on `is_separator` outside brackets, parentheses and quotes.
fn split_top_level(selector: &str, is_separator: impl Fn(char) -> bool) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '\'' | '"' if bracket_depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' => {
                bracket_depth = bracket_depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::UnsupportedSelector(selector.into()))?;
                current.push(ch);
            }
            '(' => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' => {
                paren_depth = paren_depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::UnsupportedSelector(selector.into()))?;
                current.push(ch);
            }
            ch if bracket_depth == 0 && paren_depth == 0 && is_separator(ch) => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.into()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if bracket_depth != 0 || paren_depth != 0 || quote.is_some() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    let trimmed = current.trim();
    if trimmed.is_empty() {
        return Err(Error::UnsupportedSelector(selector.into()));
    }
    groups.push(trimmed.to_string());
    Ok(groups)
}

fn tokenize_selector(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.trim().is_empty() {
            tokens.push(current.trim().to_string());
        }
        current.clear();
    };

    for ch in selector.chars() {
        match ch {
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.saturating_sub(1),
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            _ => {}
        }
        let top_level = bracket_depth == 0 && paren_depth == 0;
        if top_level && matches!(ch, '>' | '+' | '~') {
            flush(&mut current, &mut tokens);
            tokens.push(ch.to_string());
        } else if top_level && ch.is_ascii_whitespace() {
            flush(&mut current, &mut tokens);
        } else {
            current.push(ch);
        }
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}

fn parse_selector_step(part: &str) -> Result<SelectorStep> {
    let unsupported = || Error::UnsupportedSelector(part.into());
    let bytes = part.as_bytes();
    let mut i = 0usize;
    let mut step = SelectorStep::default();

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal || step.tag.is_some() {
                    return Err(unsupported());
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) = parse_selector_ident(part, i + 1).ok_or_else(unsupported)?;
                if step.id.replace(id).is_some() {
                    return Err(unsupported());
                }
                i = next;
            }
            b'.' => {
                let (class_name, next) =
                    parse_selector_ident(part, i + 1).ok_or_else(unsupported)?;
                step.classes.push(class_name);
                i = next;
            }
            b'[' => {
                let (cond, next) = parse_selector_attr_condition(part, i)?;
                step.attrs.push(cond);
                i = next;
            }
            b':' => {
                let (pseudo, next) = parse_selector_pseudo(part, i + 1)?;
                step.pseudo_classes.push(pseudo);
                i = next;
            }
            _ => {
                if i != 0 {
                    return Err(unsupported());
                }
                let (tag, next) = parse_selector_ident(part, i).ok_or_else(unsupported)?;
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step.is_empty() {
        return Err(unsupported());
    }
    Ok(step)
}

fn parse_selector_pseudo(part: &str, start: usize) -> Result<(SelectorPseudoClass, usize)> {
    let unsupported = || Error::UnsupportedSelector(part.into());
    let tail = part.get(start..).ok_or_else(unsupported)?;
    let name_len = tail
        .bytes()
        .take_while(|b| is_selector_ident_char(*b))
        .count();
    let name = &tail[..name_len];
    let after_name = start + name_len;

    let simple = match name {
        "first-child" => Some(SelectorPseudoClass::FirstChild),
        "last-child" => Some(SelectorPseudoClass::LastChild),
        "empty" => Some(SelectorPseudoClass::Empty),
        _ => None,
    };
    if let Some(pseudo) = simple {
        return Ok((pseudo, after_name));
    }

    if part.as_bytes().get(after_name) != Some(&b'(') {
        return Err(unsupported());
    }
    let body_start = after_name + 1;
    let close = find_matching_paren(&part[body_start..]).ok_or_else(unsupported)?;
    let body = part[body_start..body_start + close].trim();
    let next = body_start + close + 1;

    match name {
        "nth-child" => {
            let index = body
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(unsupported)?;
            Ok((SelectorPseudoClass::NthChild(index), next))
        }
        "not" => Ok((SelectorPseudoClass::Not(parse_selector_groups(body)?), next)),
        _ => Err(unsupported()),
    }
}

fn find_matching_paren(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<u8> = None;
    for (idx, b) in body.bytes().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_selector_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut end = start;
    while end < bytes.len() && is_selector_ident_char(bytes[end]) {
        end += 1;
    }
    if end == start {
        return None;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn parse_selector_attr_condition(
    src: &str,
    open_bracket: usize,
) -> Result<(SelectorAttrCondition, usize)> {
    let unsupported = || Error::UnsupportedSelector(src.into());
    let close = src[open_bracket..]
        .find(']')
        .map(|offset| open_bracket + offset)
        .ok_or_else(unsupported)?;
    // Quoted values may contain ']'; search for the bracket after the quote.
    let body_end = match src[open_bracket..].find(['"', '\'']) {
        Some(quote_offset) if open_bracket + quote_offset < close => {
            let quote_at = open_bracket + quote_offset;
            let quote = src.as_bytes()[quote_at] as char;
            let quote_end = src[quote_at + 1..]
                .find(quote)
                .map(|offset| quote_at + 1 + offset)
                .ok_or_else(unsupported)?;
            src[quote_end..]
                .find(']')
                .map(|offset| quote_end + offset)
                .ok_or_else(unsupported)?
        }
        _ => close,
    };
    let body = src[open_bracket + 1..body_end].trim();

    let op_at = body.find(['=', '^', '$', '*', '~']);
    let Some(op_at) = op_at else {
        if body.is_empty() || !body.bytes().all(is_selector_attr_name_char) {
            return Err(unsupported());
        }
        return Ok((
            SelectorAttrCondition::Exists {
                key: body.to_ascii_lowercase(),
            },
            body_end + 1,
        ));
    };

    let key = body[..op_at].trim().to_ascii_lowercase();
    if key.is_empty() || !key.bytes().all(is_selector_attr_name_char) {
        return Err(unsupported());
    }
    let rest = &body[op_at..];
    let (op, raw_value) = if let Some(value) = rest.strip_prefix('=') {
        ("=", value)
    } else {
        let op = rest.get(..2).ok_or_else(unsupported)?;
        (op, &rest[2..])
    };
    let value = unquote_attr_value(raw_value.trim());

    let cond = match op {
        "=" => SelectorAttrCondition::Eq { key, value },
        "^=" => SelectorAttrCondition::StartsWith { key, value },
        "$=" => SelectorAttrCondition::EndsWith { key, value },
        "*=" => SelectorAttrCondition::Contains { key, value },
        "~=" => SelectorAttrCondition::Includes { key, value },
        _ => return Err(unsupported()),
    };
    Ok((cond, body_end + 1))
}

fn is_selector_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b':'
}

fn unquote_attr_value(raw: &str) -> String {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0]
    {
        return raw[1..raw.len() - 1].to_string();
    }
    raw.to_string()
}
