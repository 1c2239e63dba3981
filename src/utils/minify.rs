//! HTML minification for rendered pages.

use std::borrow::Cow;

/// Minify rendered page markup when `enabled`.
///
/// Returns the input untouched when disabled, so default builds write exactly
/// what the template produced.
pub fn minify_page(html: &[u8], enabled: bool) -> Cow<'_, [u8]> {
    if !enabled {
        return Cow::Borrowed(html);
    }

    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    Cow::Owned(minify_html::minify(html, &cfg))
}
