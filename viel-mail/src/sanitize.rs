//! HTML bodies are sent to a browser, only a small set of
//! formatting tags survives. Scripts, styles, images, forms and
//! event handlers are dropped.

use std::collections::{HashMap, HashSet};

use ammonia::Builder;
use lazy_static::lazy_static;

lazy_static! {
    static ref ALLOWED_TAGS: HashSet<&'static str> = [
        "a", "abbr", "acronym", "b", "blockquote", "br", "code", "div", "em", "h1", "h2", "h3",
        "h4", "h5", "h6", "hr", "i", "li", "ol", "p", "pre", "span", "strong", "table", "tbody",
        "td", "tfoot", "th", "thead", "tr", "u", "ul",
    ]
    .into_iter()
    .collect();
    static ref ALLOWED_ATTRIBUTES: HashMap<&'static str, HashSet<&'static str>> = [
        ("a", vec!["href", "title"]),
        ("abbr", vec!["title"]),
        ("acronym", vec!["title"]),
        ("td", vec!["colspan", "rowspan"]),
        ("th", vec!["colspan", "rowspan"]),
    ]
    .into_iter()
    .map(|(tag, attrs)| (tag, attrs.into_iter().collect()))
    .collect();
    static ref URL_SCHEMES: HashSet<&'static str> =
        ["http", "https", "mailto"].into_iter().collect();
}

pub fn sanitize_html(html: &str) -> String {
    Builder::default()
        .tags(ALLOWED_TAGS.clone())
        .tag_attributes(ALLOWED_ATTRIBUTES.clone())
        .generic_attributes(HashSet::new())
        .url_schemes(URL_SCHEMES.clone())
        .link_rel(Some("noopener noreferrer"))
        .strip_comments(true)
        .clean(html)
        .to_string()
}
