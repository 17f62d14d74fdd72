//! JSDoc comment model: parsing, merging, and serialization.
//!
//! The annotator synthesizes Closure tags and merges them with whatever the
//! user already wrote. Parsing is line-oriented over `/** ... */` blocks;
//! anything that is not a recognized `@tag` line becomes plain text carried
//! through unchanged.

/// One parsed JSDoc tag. A tag with an empty `tag_name` is plain comment
/// text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag {
    pub tag_name: String,
    /// `@param {T} name` carries the parameter name here.
    pub parameter_name: Option<String>,
    /// Brace-wrapped type expression, without the braces.
    pub type_expr: Option<String>,
    /// Freeform text following the tag.
    pub text: Option<String>,
}

impl Tag {
    pub fn plain(text: impl Into<String>) -> Self {
        Tag {
            text: Some(text.into()),
            ..Tag::default()
        }
    }

    pub fn named(tag_name: impl Into<String>) -> Self {
        Tag {
            tag_name: tag_name.into(),
            ..Tag::default()
        }
    }

    pub fn with_type(tag_name: impl Into<String>, type_expr: impl Into<String>) -> Self {
        Tag {
            tag_name: tag_name.into(),
            type_expr: Some(type_expr.into()),
            ..Tag::default()
        }
    }
}

/// Tags the annotator owns or Closure rejects in user comments. A user copy
/// of one of these is dropped during merging (the synthesized value wins),
/// with a diagnostic raised by the caller.
pub const BANNED_TAGS: &[&str] = &[
    "augments",
    "class",
    "constructs",
    "constructor",
    "enum",
    "extends",
    "field",
    "function",
    "implements",
    "interface",
    "lends",
    "namespace",
    "private",
    "public",
    "record",
    "static",
    "template",
    "this",
    "type",
    "typedef",
];

/// Tags whose text spans multiple lines without re-tagging.
const ONE_LINE_BANNER_TAGS: &[&str] = &["fileoverview", "license", "preserve"];

/// Parse a `/** ... */` comment into tags. Returns `None` when `comment` is
/// not a JSDoc block.
pub fn parse(comment: &str) -> Option<Vec<Tag>> {
    let comment = comment.trim();
    if !comment.starts_with("/**") || !comment.ends_with("*/") || comment.len() < 5 {
        return None;
    }
    let body = &comment[3..comment.len() - 2];
    let mut tags: Vec<Tag> = Vec::new();

    for raw_line in body.lines() {
        let mut line = raw_line.trim();
        line = line.strip_prefix('*').unwrap_or(line).trim_start();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('@') {
            let name_end = rest
                .find(|c: char| !c.is_ascii_alphanumeric())
                .unwrap_or(rest.len());
            let tag_name = &rest[..name_end];
            if tag_name.is_empty() {
                append_text(&mut tags, line);
                continue;
            }
            let mut remainder = rest[name_end..].trim_start();
            let mut type_expr = None;
            if remainder.starts_with('{') {
                if let Some(closing) = find_balanced_brace(remainder) {
                    type_expr = Some(remainder[1..closing].trim().to_string());
                    remainder = remainder[closing + 1..].trim_start();
                }
            }
            let mut parameter_name = None;
            if tag_name == "param" {
                let name_end = remainder
                    .find(char::is_whitespace)
                    .unwrap_or(remainder.len());
                if name_end > 0 {
                    parameter_name = Some(remainder[..name_end].to_string());
                    remainder = remainder[name_end..].trim_start();
                }
            }
            tags.push(Tag {
                tag_name: tag_name.to_string(),
                parameter_name,
                type_expr,
                text: if remainder.is_empty() {
                    None
                } else {
                    Some(remainder.to_string())
                },
            });
        } else {
            append_text(&mut tags, line);
        }
    }
    Some(tags)
}

/// Append plain text, continuing a banner tag's text when one is open.
fn append_text(tags: &mut Vec<Tag>, line: &str) {
    if let Some(last) = tags.last_mut() {
        if ONE_LINE_BANNER_TAGS.contains(&last.tag_name.as_str()) || last.tag_name.is_empty() {
            let text = last.text.get_or_insert_with(String::new);
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(line);
            return;
        }
    }
    tags.push(Tag::plain(line));
}

/// Find the index of the `}` balancing the `{` that `text` starts with.
fn find_balanced_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
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

/// Serialize tags into a JSDoc block, one tag per line, with a trailing
/// newline. A single tag with no text collapses to one line.
pub fn to_string(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    if tags.len() == 1 && tags[0].text.is_none() && !tags[0].tag_name.is_empty() {
        return format!("/** {} */\n", tag_to_string(&tags[0]));
    }
    let mut out = String::from("/**\n");
    for tag in tags {
        for line in tag_to_string(tag).split('\n') {
            out.push_str(" * ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str(" */\n");
    out
}

fn tag_to_string(tag: &Tag) -> String {
    let mut out = String::new();
    if !tag.tag_name.is_empty() {
        out.push('@');
        out.push_str(&tag.tag_name);
    }
    if let Some(type_expr) = &tag.type_expr {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push('{');
        out.push_str(type_expr);
        out.push('}');
    }
    if let Some(parameter_name) = &tag.parameter_name {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(parameter_name);
    }
    if let Some(text) = &tag.text {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(text);
    }
    out
}
