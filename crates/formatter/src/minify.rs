//! Textual HTML minifier

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::MinifyOptions;

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->").expect("comment pattern is valid"));
static BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("between-tags pattern is valid"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"));

/// Minify HTML without parsing it
///
/// Conditional comments (`<!--[if IE]>...<![endif]-->`) are kept when
/// removing comments, including the closing `<!--<![endif]-->` of the
/// downlevel-revealed form. Collapsing removes whitespace between `>` and `<`,
/// folds any run of two or more whitespace characters into one space and
/// trims the result.
pub fn minify_html(code: &str, options: &MinifyOptions) -> String {
    let mut out = code.to_string();

    if options.remove_comments {
        out = COMMENT
            .replace_all(&out, |caps: &Captures| {
                let body = caps[1].trim_start();
                if body.starts_with("[if") || body.starts_with("<![endif]") {
                    caps[0].to_string()
                } else {
                    String::new()
                }
            })
            .into_owned();
    }

    if options.collapse_whitespace {
        out = BETWEEN_TAGS.replace_all(&out, "><").into_owned();
        out = WHITESPACE_RUN
            .replace_all(&out, " ")
            .trim()
            .to_string();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_and_whitespace() {
        let out = minify_html("<!-- c --><div>  a  </div>", &MinifyOptions::default());
        assert_eq!(out, "<div> a </div>");
    }

    #[test]
    fn test_whitespace_between_tags_removed() {
        let out = minify_html(
            "<ul>\n  <li>one</li>\n  <li>two</li>\n</ul>\n",
            &MinifyOptions::default(),
        );
        assert_eq!(out, "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn test_conditional_comments_kept() {
        let input = "<!--[if IE]><p>old</p><![endif]--><!-- drop --><p>new</p>";
        let out = minify_html(input, &MinifyOptions::default());
        assert_eq!(out, "<!--[if IE]><p>old</p><![endif]--><p>new</p>");

        let spaced = "<!--  [if lt IE 9]>x<![endif]-->";
        assert_eq!(minify_html(spaced, &MinifyOptions::default()), spaced);
    }

    #[test]
    fn test_downlevel_revealed_conditional_kept_whole() {
        let input = "<!--[if !IE]><!--><p>x</p><!--<![endif]--><!-- drop -->";
        let out = minify_html(input, &MinifyOptions::default());
        assert_eq!(out, "<!--[if !IE]><!--><p>x</p><!--<![endif]-->");
    }

    #[test]
    fn test_multiline_comment_removed() {
        let out = minify_html("<p>a</p><!--\nline one\nline two\n--><p>b</p>", &MinifyOptions::default());
        assert_eq!(out, "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_keep_comments() {
        let options = MinifyOptions::default().with_remove_comments(false);
        let out = minify_html("<!-- c -->  <div>a</div>", &options);
        assert_eq!(out, "<!-- c --><div>a</div>");
    }

    #[test]
    fn test_no_collapse() {
        let options = MinifyOptions::default().with_collapse_whitespace(false);
        let out = minify_html("<!-- c --><div>  a  </div>\n", &options);
        assert_eq!(out, "<div>  a  </div>\n");
    }

    #[test]
    fn test_everything_disabled_is_identity() {
        let options = MinifyOptions::new()
            .with_remove_comments(false)
            .with_collapse_whitespace(false);
        let input = "  <!-- c -->\n<div>  a  </div>  ";
        assert_eq!(minify_html(input, &options), input);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(minify_html("", &MinifyOptions::default()), "");
    }
}
