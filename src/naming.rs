//! Positional naming convention shared by field `id`, `name` and `for`
//! attributes.
//!
//! A field wrapper's id is a dash-separated path ending in `--field`, for
//! example `myform-people-0--field`. The control inside it carries the same
//! path without the suffix (`myform-people-0`) as its id, and the dotted
//! path without the form segment (`people.0`) as its name.

use crate::{Error, Result};

/// Suffix carried by every field wrapper id.
pub const FIELD_SUFFIX: &str = "--field";

/// Marker used by templates in place of a not-yet-known index.
pub const PLACEHOLDER: &str = "*";

/// Length of the `-field` tail removed from a sequence id to obtain its
/// prefix. The prefix keeps the first dash of the suffix.
const PREFIX_TAIL_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divider {
    Dash,
    Dot,
}

impl Divider {
    pub fn as_char(self) -> char {
        match self {
            Self::Dash => '-',
            Self::Dot => '.',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dash => "-",
            Self::Dot => ".",
        }
    }
}

/// Converts a dash path to its dotted name form, dropping the form segment
/// when the form has an id.
pub fn path_to_name(id_path: &str, has_form_prefix: bool) -> String {
    let skip = usize::from(has_form_prefix);
    id_path
        .split('-')
        .skip(skip)
        .collect::<Vec<_>>()
        .join(".")
}

/// Rebuilds a path as `prefix + index + remainder`.
///
/// `remainder` is the material that followed the prefix in the old path. Its
/// first segment (the old index) is dropped, and so are `strip` trailing
/// segments. Empty prefix segments are skipped and an empty remainder is
/// omitted together with its divider.
pub fn splice_index(
    prefix_segments: &[&str],
    index: usize,
    remainder: &str,
    divider: Divider,
    strip: usize,
) -> String {
    let bits = remainder.split(divider.as_char()).collect::<Vec<_>>();
    let end = bits.len().saturating_sub(strip);
    let kept = if end > 1 { bits[1..end].join(divider.as_str()) } else { String::new() };

    let mut out = prefix_segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .map(|segment| (*segment).to_string())
        .collect::<Vec<_>>();
    out.push(index.to_string());
    let mut joined = out.join(divider.as_str());
    if !kept.is_empty() {
        joined.push_str(divider.as_str());
        joined.push_str(&kept);
    }
    joined
}

/// Substitutes `indices` into the placeholder or numeric segments of `path`,
/// left to right. Segments past the last index are kept verbatim.
pub fn replace_indices(path: &str, indices: &[usize], divider: Divider) -> String {
    let mut next = indices.iter();
    let mut pending = next.next();
    path.split(divider.as_char())
        .map(|segment| match pending {
            Some(index) if is_position_segment(segment) => {
                pending = next.next();
                index.to_string()
            }
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join(divider.as_str())
}

/// Index list used to stamp a template: every numeric segment of the
/// adder's dotted name, followed by the new item's position.
pub fn sequence_numbers(adder_name: &str, position: usize) -> Vec<usize> {
    let mut out = adder_name
        .split('.')
        .filter_map(leading_integer)
        .collect::<Vec<_>>();
    out.push(position);
    out
}

/// Whether a segment stands for a position: the placeholder or anything
/// with a leading integer.
pub fn is_position_segment(segment: &str) -> bool {
    segment == PLACEHOLDER || leading_integer(segment).is_some()
}

/// Parses the integer at the start of `segment`, ignoring leading
/// whitespace and trailing garbage. Negative values clamp to zero.
pub fn leading_integer(segment: &str) -> Option<usize> {
    let trimmed = segment.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value = digits[..end].parse::<usize>().unwrap_or(usize::MAX);
    Some(if negative { 0 } else { value })
}

/// A sequence id with its `-field` tail removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequencePrefix {
    prefix: String,
    id_depth: usize,
}

impl SequencePrefix {
    pub fn from_field_id(id: &str) -> Result<Self> {
        if !id.ends_with(FIELD_SUFFIX) {
            return Err(Error::malformed_path(id, "sequence id must end with --field"));
        }
        let prefix = &id[..id.len() - PREFIX_TAIL_LEN];
        if prefix.trim_matches('-').is_empty() {
            return Err(Error::malformed_path(id, "sequence id has no path"));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            id_depth: id.split('-').count(),
        })
    }

    /// Prefix string, ending with `-`.
    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    pub fn id_segments(&self) -> Vec<&str> {
        self.prefix.split('-').collect()
    }

    /// Dotted form of the prefix, ending with `.`.
    pub fn name_prefix(&self, has_form_prefix: bool) -> String {
        path_to_name(&self.prefix, has_form_prefix)
    }

    pub fn item_id(&self, index: usize) -> String {
        format!("{}{index}{FIELD_SUFFIX}", self.prefix)
    }

    /// Direct items have exactly one more dash segment than the sequence id.
    pub fn is_direct_item_id(&self, candidate: &str) -> bool {
        candidate.starts_with(&self.prefix) && candidate.split('-').count() == self.id_depth + 1
    }

    /// Old index segment of a direct item id.
    pub fn item_index_segment<'a>(&self, item_id: &'a str) -> Result<&'a str> {
        let rest = item_id
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| Error::malformed_path(item_id, "item id outside its sequence"))?;
        let segment = rest.split('-').next().unwrap_or_default();
        if segment.is_empty() {
            return Err(Error::malformed_path(item_id, "item id has no index segment"));
        }
        Ok(segment)
    }
}

/// A dash or dot path split into segments, used to test whether a
/// descendant attribute belongs to an item by whole segments rather than by
/// string prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath<'a> {
    raw: &'a str,
    segments: Vec<&'a str>,
    divider: Divider,
}

impl<'a> FieldPath<'a> {
    pub fn parse(raw: &'a str, divider: Divider) -> Self {
        Self {
            raw,
            segments: raw.split(divider.as_char()).collect(),
            divider,
        }
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// When this path starts with `prefix` followed by `index_segment`,
    /// returns the material after `prefix` (old index included).
    pub fn item_remainder(&self, prefix: &[&str], index_segment: &str) -> Option<&'a str> {
        let prefix = prefix
            .iter()
            .copied()
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>();
        if self.segments.len() <= prefix.len()
            || self.segments[..prefix.len()] != prefix[..]
            || self.segments[prefix.len()] != index_segment
        {
            return None;
        }
        let offset = prefix
            .iter()
            .map(|segment| segment.len() + self.divider.as_str().len())
            .sum::<usize>();
        self.raw.get(offset..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_indices_substitutes_left_to_right() {
        assert_eq!(replace_indices("a.*.b.*.c", &[2, 5], Divider::Dot), "a.2.b.5.c");
        assert_eq!(replace_indices("a.*.b.*.c", &[2], Divider::Dot), "a.2.b.*.c");
        assert_eq!(
            replace_indices("f-people-0-phones-*--field", &[3, 1], Divider::Dash),
            "f-people-3-phones-1--field"
        );
    }

    #[test]
    fn replace_indices_leaves_path_alone_without_indices() {
        assert_eq!(replace_indices("a.*.b", &[], Divider::Dot), "a.*.b");
    }

    #[test]
    fn path_to_name_drops_form_segment() {
        assert_eq!(path_to_name("myform-people-0", true), "people.0");
        assert_eq!(path_to_name("people-0", false), "people.0");
    }

    #[test]
    fn splice_index_handles_plain_and_container_remainders() {
        let prefix = ["f", "people", ""];
        assert_eq!(splice_index(&prefix, 4, "2", Divider::Dash, 1), "f-people-4");
        assert_eq!(
            splice_index(&prefix, 4, "2-name--field", Divider::Dash, 0),
            "f-people-4-name--field"
        );
        assert_eq!(
            splice_index(&["people", ""], 1, "2.name", Divider::Dot, 0),
            "people.1.name"
        );
        assert_eq!(splice_index(&prefix, 0, "", Divider::Dash, 3), "f-people-0");
    }

    #[test]
    fn sequence_numbers_collects_numeric_segments() {
        assert_eq!(sequence_numbers("people.*", 3), vec![3]);
        assert_eq!(sequence_numbers("people.2.phones.*", 0), vec![2, 0]);
        assert_eq!(sequence_numbers("people.7x.phones", 1), vec![7, 1]);
    }

    #[test]
    fn leading_integer_follows_parse_int() {
        assert_eq!(leading_integer("12"), Some(12));
        assert_eq!(leading_integer(" 3abc"), Some(3));
        assert_eq!(leading_integer("-1"), Some(0));
        assert_eq!(leading_integer("field"), None);
        assert_eq!(leading_integer(""), None);
        assert!(is_position_segment("*"));
    }

    #[test]
    fn sequence_prefix_classifies_direct_items() -> Result<()> {
        let prefix = SequencePrefix::from_field_id("f-people--field")?;
        assert_eq!(prefix.as_str(), "f-people-");
        assert_eq!(prefix.name_prefix(true), "people.");
        assert_eq!(prefix.item_id(2), "f-people-2--field");
        assert!(prefix.is_direct_item_id("f-people-2--field"));
        assert!(!prefix.is_direct_item_id("f-people-2-name--field"));
        assert!(!prefix.is_direct_item_id("g-people-2--field"));
        assert_eq!(prefix.item_index_segment("f-people-2--field")?, "2");
        Ok(())
    }

    #[test]
    fn sequence_prefix_rejects_ids_without_suffix() {
        assert!(matches!(
            SequencePrefix::from_field_id("f-people"),
            Err(Error::MalformedPath { .. })
        ));
        assert!(matches!(
            SequencePrefix::from_field_id("--field"),
            Err(Error::MalformedPath { .. })
        ));
    }

    #[test]
    fn field_path_matches_whole_segments() {
        let path = FieldPath::parse("f-people-1-name", Divider::Dash);
        assert_eq!(path.item_remainder(&["f", "people", ""], "1"), Some("1-name"));
        assert_eq!(path.item_remainder(&["f", "people", ""], "0"), None);
        let other = FieldPath::parse("f-peoplex-1-name", Divider::Dash);
        assert_eq!(other.item_remainder(&["f", "people", ""], "1"), None);
        let name = FieldPath::parse("people.1.name", Divider::Dot);
        assert_eq!(name.item_remainder(&["people", ""], "1"), Some("1.name"));
    }
}
