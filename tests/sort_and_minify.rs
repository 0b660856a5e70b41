// tests/sort_and_minify.rs

use std::path::Path;

use proptest::prelude::*;

use themewatch::pipeline::stages::css::minify_css;
use themewatch::pipeline::stages::js::minify_js;
use themewatch::pipeline::stages::sort::{properties_overlap, property_key, sort_declarations};

#[test]
fn sorts_the_button_example() {
    assert_eq!(
        sort_declarations("button{color:red;background:blue}"),
        "button{background:blue;color:red}"
    );
}

#[test]
fn keeps_expanded_layout() {
    let input = "a {\n  z-index: 1;\n  color: red;\n  display: block;\n}\n";
    let expected = "a {\n  color: red;\n  display: block;\n  z-index: 1;\n}\n";
    assert_eq!(sort_declarations(input), expected);
}

#[test]
fn vendor_prefix_sorts_before_unprefixed() {
    assert_eq!(
        sort_declarations("a{transform:none;-webkit-transform:none;color:red}"),
        "a{color:red;-webkit-transform:none;transform:none}"
    );
    assert_eq!(property_key("-moz-box-sizing: border-box"), ("box-sizing".to_string(), false));
    assert_eq!(property_key("--custom: 1"), ("--custom".to_string(), true));
}

#[test]
fn equal_keys_keep_source_order() {
    assert_eq!(
        sort_declarations("a{width:1px;color:red;width:2px}"),
        "a{color:red;width:1px;width:2px}"
    );
}

#[test]
fn semicolons_inside_strings_and_urls_do_not_split() {
    let input = r#"a{content:"b;a";background:url(data:image/png;base64,xx)}"#;
    assert_eq!(
        sort_declarations(input),
        r#"a{background:url(data:image/png;base64,xx);content:"b;a"}"#
    );
}

#[test]
fn only_innermost_blocks_are_sorted() {
    let input = "@media (min-width: 10px){a{z:1;b:2}c{y:1;x:2}}d{q:1;p:2}";
    let expected = "@media (min-width: 10px){a{b:2;z:1}c{x:2;y:1}}d{p:2;q:1}";
    assert_eq!(sort_declarations(input), expected);
}

#[test]
fn comments_travel_with_their_declaration() {
    assert_eq!(
        sort_declarations("a{/* text */color:red;/* box */background:none}"),
        "a{/* box */background:none;/* text */color:red}"
    );
}

#[test]
fn longhand_after_its_shorthand_stays_after_it() {
    assert_eq!(
        sort_declarations("a{flex-flow:row;flex-direction:column}"),
        "a{flex-flow:row;flex-direction:column}"
    );
    assert_eq!(
        sort_declarations("a{margin:0;color:red;margin-left:auto}"),
        "a{color:red;margin:0;margin-left:auto}"
    );
}

#[test]
fn shorthand_after_its_longhand_stays_after_it() {
    assert_eq!(
        sort_declarations("a{font-size:2em;font:12px serif}"),
        "a{font-size:2em;font:12px serif}"
    );
}

#[test]
fn sibling_shorthands_sharing_a_longhand_keep_order() {
    assert_eq!(
        sort_declarations("a{border-top:1px solid red;border-color:blue}"),
        "a{border-top:1px solid red;border-color:blue}"
    );
    assert_eq!(
        sort_declarations("a{z-index:1;background:none;background-position-x:left;align-items:center}"),
        "a{align-items:center;background:none;background-position-x:left;z-index:1}"
    );
}

#[test]
fn unrelated_properties_still_sort_around_shorthands() {
    assert_eq!(
        sort_declarations("a{overflow:hidden;color:red;overflow-y:auto;border:0;display:block}"),
        "a{border:0;color:red;display:block;overflow:hidden;overflow-y:auto}"
    );
}

#[test]
fn overlap_table() {
    assert!(properties_overlap("border-top", "border-color"));
    assert!(properties_overlap("grid-area", "grid-row-start"));
    assert!(properties_overlap("inset", "left"));
    assert!(properties_overlap("transition", "transition-delay"));
    assert!(properties_overlap("width", "width"));
    assert!(!properties_overlap("border-top", "border-left-color"));
    assert!(!properties_overlap("-webkit-transform", "transform"));
    assert!(!properties_overlap("margin", "padding"));
}

#[test]
fn css_minify_is_a_fixpoint_and_reparses() {
    let source = "a {\n  color: red;\n  background: blue;\n}\n\n.b > .c { margin: 0px 0px; }\n";
    let once = minify_css(source, "t.css").unwrap();
    let twice = minify_css(&once, "t.css").unwrap();
    assert_eq!(once, twice);
    assert!(once.len() < source.len());
}

#[test]
fn css_minify_reports_syntax_errors() {
    let err = minify_css("a..b { color: red }", "broken.css").unwrap_err();
    assert!(!err.is_empty());
}

#[test]
fn js_minify_is_a_fixpoint_and_reparses() {
    let source = "const add = (a, b) => {\n  return a + b;\n};\n\nif (add(1, 2) === 3) {\n  console.log('ok');\n}\n";
    let path = Path::new("app.js");
    let once = minify_js(source, path).unwrap();
    let twice = minify_js(&once, path).unwrap();
    assert_eq!(once, twice);
    assert!(once.len() < source.len());
}

#[test]
fn js_minify_rejects_invalid_code() {
    let err = minify_js("let = ;", Path::new("bad.js")).unwrap_err();
    assert!(!err.is_empty());
}

const KNOWN_PROPERTIES: &[&str] = &[
    "margin",
    "margin-top",
    "border",
    "border-top",
    "border-color",
    "border-top-color",
    "flex",
    "flex-flow",
    "flex-direction",
    "font",
    "font-size",
    "background",
    "color",
    "overflow",
    "overflow-x",
    "transform",
];

fn property_name() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(KNOWN_PROPERTIES).prop_map(str::to_string),
        "[a-z]{1,6}(-[a-z]{1,4})?",
    ]
}

fn declaration() -> impl Strategy<Value = String> {
    (
        prop::option::of(prop::sample::select(vec!["-webkit-", "-moz-", "-ms-"])),
        property_name(),
        "[a-z0-9]{1,6}",
    )
        .prop_map(|(prefix, name, value)| format!("{}{name}:{value}", prefix.unwrap_or("")))
}

fn block() -> impl Strategy<Value = (String, Vec<String>)> {
    (
        "[a-z]{1,5}",
        prop::collection::vec(declaration(), 0..8),
        any::<bool>(),
    )
        .prop_map(|(selector, decls, trailing)| {
            // Unique values let tests find each declaration after sorting.
            let decls: Vec<String> = decls
                .into_iter()
                .enumerate()
                .map(|(idx, decl)| format!("{decl}x{idx}"))
                .collect();
            let mut body = decls.join(";");
            if trailing && !decls.is_empty() {
                body.push(';');
            }
            (format!("{selector}{{{body}}}"), decls)
        })
}

fn declarations_of(sorted_block: &str) -> Vec<String> {
    let open = sorted_block.find('{').unwrap();
    let inner = &sorted_block[open + 1..sorted_block.len() - 1];
    inner
        .split(';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

proptest! {
    #[test]
    fn sorting_is_idempotent((css, _decls) in block()) {
        let once = sort_declarations(&css);
        let twice = sort_declarations(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sorting_preserves_declarations((css, decls) in block()) {
        let sorted = sort_declarations(&css);
        let mut got = declarations_of(&sorted);
        let mut want = decls.clone();
        got.sort();
        want.sort();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn only_overlapping_neighbours_are_out_of_key_order((css, _decls) in block()) {
        let sorted = declarations_of(&sort_declarations(&css));
        for pair in sorted.windows(2) {
            if property_key(&pair[0]) > property_key(&pair[1]) {
                prop_assert!(
                    properties_overlap(&pair[0], &pair[1]),
                    "{:?} sorted after {:?}", pair[1], pair[0]
                );
            }
        }
    }

    #[test]
    fn overlapping_declarations_keep_source_order((css, decls) in block()) {
        let sorted = declarations_of(&sort_declarations(&css));
        let position = |decl: &String| sorted.iter().position(|d| d == decl).unwrap();
        for (i, earlier) in decls.iter().enumerate() {
            for later in &decls[i + 1..] {
                if properties_overlap(earlier, later) {
                    prop_assert!(
                        position(earlier) < position(later),
                        "{:?} moved before {:?}", later, earlier
                    );
                }
            }
        }
    }
}
