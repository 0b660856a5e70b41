// src/pipeline/stages/sort.rs

//! Alphabetical declaration sorting.
//!
//! Every innermost `{ ... }` block has its declarations reordered by property
//! name. Vendor-prefixed properties sort under their unprefixed name, ahead of
//! the unprefixed property; equal keys keep source order. Blocks that contain
//! nested blocks (`@media`, nesting) only have their children sorted.
//!
//! Declarations that set a common longhand (`flex-flow` and `flex-direction`,
//! `border-top` and `border-color`) keep their relative order, so a later
//! declaration still overrides an earlier one after sorting.
//!
//! The whitespace layout of a block is kept: each slot keeps its leading
//! whitespace and only the declaration bodies move, so compact and expanded
//! output both stay as they were.

use std::collections::BTreeSet;

use crate::pipeline::stages::{map_each, Stage};
use crate::pipeline::{PipelineError, SourceFile};

#[derive(Debug, Clone, Default)]
pub struct SortDeclarations;

impl Stage for SortDeclarations {
    fn name(&self) -> &'static str {
        "sort-declarations"
    }

    fn apply(&self, files: Vec<SourceFile>) -> Result<Vec<SourceFile>, PipelineError> {
        map_each(files, |mut file| {
            let sorted = sort_declarations(file.text(self.name())?);
            file.contents = sorted.into_bytes();
            Ok(Some(file))
        })
    }
}

/// Sort the declarations of every block in `css`.
///
/// `button{color:red;background:blue}` → `button{background:blue;color:red}`
pub fn sort_declarations(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    sort_level(css, &mut out);
    out
}

/// Sort key of one declaration body: `(unprefixed name, is_unprefixed)`.
pub fn property_key(body: &str) -> (String, bool) {
    let (prefix, name) = property_parts(body);
    let unprefixed = prefix.is_empty();
    (name, unprefixed)
}

/// True when setting `a` and `b` in the same block is order-dependent:
/// same property, or shorthands that share a longhand. Vendor prefixes are
/// distinct properties.
pub fn properties_overlap(a: &str, b: &str) -> bool {
    let (a_prefix, a_name) = property_parts(a);
    let (b_prefix, b_name) = property_parts(b);
    !longhand_leaves(&a_prefix, &a_name).is_disjoint(&longhand_leaves(&b_prefix, &b_name))
}

/// `(vendor prefix, unprefixed lowercase name)` of a declaration body.
fn property_parts(body: &str) -> (String, String) {
    let body = strip_leading_trivia(body);
    let name = match find_top_level(body.as_bytes(), b':') {
        Some(idx) => &body[..idx],
        None => body,
    };
    let name = name.trim().to_ascii_lowercase();

    if name.starts_with('-') && !name.starts_with("--") {
        if let Some(idx) = name[1..].find('-') {
            return (name[..idx + 2].to_string(), name[idx + 2..].to_string());
        }
    }
    (String::new(), name)
}

/// Longhands a shorthand expands to, one level deep.
fn longhands(name: &str) -> &'static [&'static str] {
    match name {
        "margin" => &["margin-top", "margin-right", "margin-bottom", "margin-left"],
        "padding" => &["padding-top", "padding-right", "padding-bottom", "padding-left"],
        "inset" => &["top", "right", "bottom", "left"],
        "border" => &[
            "border-top",
            "border-right",
            "border-bottom",
            "border-left",
            "border-image",
        ],
        "border-top" => &["border-top-width", "border-top-style", "border-top-color"],
        "border-right" => &["border-right-width", "border-right-style", "border-right-color"],
        "border-bottom" => &["border-bottom-width", "border-bottom-style", "border-bottom-color"],
        "border-left" => &["border-left-width", "border-left-style", "border-left-color"],
        "border-width" => &[
            "border-top-width",
            "border-right-width",
            "border-bottom-width",
            "border-left-width",
        ],
        "border-style" => &[
            "border-top-style",
            "border-right-style",
            "border-bottom-style",
            "border-left-style",
        ],
        "border-color" => &[
            "border-top-color",
            "border-right-color",
            "border-bottom-color",
            "border-left-color",
        ],
        "border-radius" => &[
            "border-top-left-radius",
            "border-top-right-radius",
            "border-bottom-right-radius",
            "border-bottom-left-radius",
        ],
        "border-image" => &[
            "border-image-source",
            "border-image-slice",
            "border-image-width",
            "border-image-outset",
            "border-image-repeat",
        ],
        "outline" => &["outline-width", "outline-style", "outline-color"],
        "flex" => &["flex-grow", "flex-shrink", "flex-basis"],
        "flex-flow" => &["flex-direction", "flex-wrap"],
        "grid" => &[
            "grid-template",
            "grid-auto-rows",
            "grid-auto-columns",
            "grid-auto-flow",
        ],
        "grid-template" => &[
            "grid-template-rows",
            "grid-template-columns",
            "grid-template-areas",
        ],
        "grid-area" => &["grid-row", "grid-column"],
        "grid-row" => &["grid-row-start", "grid-row-end"],
        "grid-column" => &["grid-column-start", "grid-column-end"],
        "gap" | "grid-gap" => &["row-gap", "column-gap"],
        "grid-row-gap" => &["row-gap"],
        "grid-column-gap" => &["column-gap"],
        "place-items" => &["align-items", "justify-items"],
        "place-content" => &["align-content", "justify-content"],
        "place-self" => &["align-self", "justify-self"],
        "font" => &[
            "font-style",
            "font-variant",
            "font-weight",
            "font-stretch",
            "font-size",
            "line-height",
            "font-family",
        ],
        "background" => &[
            "background-color",
            "background-image",
            "background-repeat",
            "background-attachment",
            "background-position",
            "background-size",
            "background-origin",
            "background-clip",
        ],
        "background-position" => &["background-position-x", "background-position-y"],
        "list-style" => &["list-style-type", "list-style-position", "list-style-image"],
        "transition" => &[
            "transition-property",
            "transition-duration",
            "transition-timing-function",
            "transition-delay",
        ],
        "animation" => &[
            "animation-name",
            "animation-duration",
            "animation-timing-function",
            "animation-delay",
            "animation-iteration-count",
            "animation-direction",
            "animation-fill-mode",
            "animation-play-state",
        ],
        "overflow" => &["overflow-x", "overflow-y"],
        "text-decoration" => &[
            "text-decoration-line",
            "text-decoration-style",
            "text-decoration-color",
        ],
        "columns" => &["column-width", "column-count"],
        "column-rule" => &["column-rule-width", "column-rule-style", "column-rule-color"],
        _ => &[],
    }
}

/// Every longhand `base` ultimately sets, tagged with the vendor prefix.
fn longhand_leaves(prefix: &str, base: &str) -> BTreeSet<String> {
    let mut leaves = BTreeSet::new();
    let mut stack = vec![base];
    while let Some(current) = stack.pop() {
        let children = longhands(current);
        if children.is_empty() {
            leaves.insert(format!("{prefix}{current}"));
        } else {
            stack.extend_from_slice(children);
        }
    }
    leaves
}

/// Positions of `bodies` in sorted order.
///
/// Repeatedly takes the smallest key whose overlapping predecessors have
/// all been placed, so overlapping declarations never swap.
fn sorted_order(bodies: &[&str]) -> Vec<usize> {
    let keys: Vec<(String, bool)> = bodies.iter().map(|b| property_key(b)).collect();
    let leaves: Vec<BTreeSet<String>> = bodies
        .iter()
        .map(|body| {
            let (prefix, name) = property_parts(body);
            longhand_leaves(&prefix, &name)
        })
        .collect();

    let mut placed = vec![false; bodies.len()];
    let mut order = Vec::with_capacity(bodies.len());
    while order.len() < bodies.len() {
        let ready = (0..bodies.len())
            .filter(|&j| !placed[j])
            .filter(|&j| (0..j).all(|i| placed[i] || leaves[i].is_disjoint(&leaves[j])))
            .min_by(|&a, &b| keys[a].cmp(&keys[b]).then(a.cmp(&b)));
        // The first unplaced declaration is always ready.
        let Some(next) = ready else { break };
        placed[next] = true;
        order.push(next);
    }
    order
}

fn sort_level(src: &str, out: &mut String) {
    let bytes = src.as_bytes();
    let mut i = 0;
    let mut last = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_comment(bytes, i),
            b'{' => {
                let close = find_block_end(bytes, i);
                out.push_str(&src[last..=i]);
                out.push_str(&sort_block(&src[i + 1..close]));
                if close < bytes.len() {
                    out.push('}');
                    i = close + 1;
                } else {
                    i = close;
                }
                last = i;
            }
            _ => i += 1,
        }
    }

    out.push_str(&src[last..]);
}

fn sort_block(inner: &str) -> String {
    if find_top_level_any(inner.as_bytes(), b'{').is_some() {
        let mut out = String::with_capacity(inner.len());
        sort_level(inner, &mut out);
        return out;
    }
    sort_flat_block(inner)
}

fn sort_flat_block(inner: &str) -> String {
    let mut segments: Vec<&str> = split_top_level(inner, b';');
    let total = segments.len();
    let tail_is_trivia = segments.last().is_some_and(|last| !has_declaration(last));
    let tail = if tail_is_trivia {
        segments.pop().unwrap_or_default()
    } else {
        ""
    };
    let had_trailing_semicolon = tail_is_trivia && total > 1;
    segments.retain(|s| !s.trim().is_empty());

    if segments.len() < 2 {
        return inner.to_string();
    }

    // A final declaration without `;` carries trailing whitespace that belongs
    // to the block, not to the declaration.
    let mut tail = tail.to_string();
    if !had_trailing_semicolon {
        if let Some(last) = segments.last_mut() {
            let current: &str = *last;
            let trimmed = current.trim_end();
            tail = format!("{}{}", &current[trimmed.len()..], tail);
            *last = trimmed;
        }
    }

    let slots: Vec<&str> = segments.iter().map(|s| leading_whitespace(s)).collect();
    let bodies: Vec<&str> = segments
        .iter()
        .map(|s| &s[leading_whitespace(s).len()..])
        .collect();
    let bodies: Vec<&str> = sorted_order(&bodies).into_iter().map(|i| bodies[i]).collect();

    let mut out = String::with_capacity(inner.len());
    for (idx, (slot, body)) in slots.iter().zip(bodies.iter()).enumerate() {
        if idx > 0 {
            out.push(';');
        }
        out.push_str(slot);
        out.push_str(body);
    }
    if had_trailing_semicolon {
        out.push(';');
    }
    out.push_str(&tail);
    out
}

fn leading_whitespace(s: &str) -> &str {
    &s[..s.len() - s.trim_start().len()]
}

/// True when the segment has anything besides whitespace and comments.
fn has_declaration(segment: &str) -> bool {
    !strip_leading_trivia(segment).is_empty()
}

fn strip_leading_trivia(mut s: &str) -> &str {
    loop {
        s = s.trim_start();
        if s.starts_with("/*") {
            let end = skip_comment(s.as_bytes(), 0);
            s = &s[end..];
        } else {
            return s;
        }
    }
}

/// Index of the `}` closing the block opened at `open`, or `bytes.len()`.
fn find_block_end(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_comment(bytes, i);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// Split on `delim` outside strings, comments, parentheses and brackets.
fn split_top_level(s: &str, delim: u8) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_comment(bytes, i);
                continue;
            }
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b if b == delim && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    parts.push(&s[start..]);
    parts
}

/// First `needle` outside strings, comments and parentheses.
fn find_top_level(bytes: &[u8], needle: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_comment(bytes, i);
                continue;
            }
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b if b == needle && depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// First `needle` outside strings and comments, at any paren depth.
fn find_top_level_any(bytes: &[u8], needle: u8) -> Option<usize> {
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_comment(bytes, i);
                continue;
            }
            b if b == needle => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}
