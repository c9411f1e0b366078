use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::viewport::CanvasSize;

/// Container holding the restaurant result list.
pub const RESULTS_SELECTOR: &str = r#"[aria-label="Results for Restaurants"]"#;
/// One restaurant entry inside the results container.
pub const ARTICLE_SELECTOR: &str = r#"[role="article"]"#;

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Results container {0} not found on page")]
    ResultsContainerMissing(&'static str),

    #[error("Invalid selector {selector}: {reason}")]
    Selector { selector: &'static str, reason: String },
}

/// A result element as rendered on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    /// Accessible label (`aria-label`), empty when the element has none.
    pub label: String,
    /// Full text content of the element.
    pub display_text: String,
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        selector: css,
        reason: e.to_string(),
    })
}

/// Read every result article from a rendered map page, in document order.
pub fn extract_entries(html: &str) -> Result<Vec<ResultEntry>> {
    let document = Html::parse_document(html);
    let results_selector = selector(RESULTS_SELECTOR)?;
    let article_selector = selector(ARTICLE_SELECTOR)?;

    let container = document
        .select(&results_selector)
        .next()
        .ok_or(ScrapeError::ResultsContainerMissing(RESULTS_SELECTOR))?;

    Ok(container
        .select(&article_selector)
        .map(|article| ResultEntry {
            label: article.value().attr("aria-label").unwrap_or_default().to_string(),
            display_text: text_content(&article),
        })
        .collect())
}

fn text_content(element: &ElementRef) -> String {
    element.text().collect()
}

/// On-screen size of the first `canvas` on the page, from its inline `px`
/// styles or, failing that, its `width`/`height` attributes. The attributes
/// hold the drawing-buffer size, which is larger on high-DPI screens.
pub fn canvas_size(html: &str) -> Option<CanvasSize> {
    let document = Html::parse_document(html);
    let canvas_selector = Selector::parse("canvas").ok()?;
    let canvas = document.select(&canvas_selector).next()?;
    let el = canvas.value();
    let style = el.attr("style").unwrap_or_default();

    let width = style_px(style, "width")
        .or_else(|| el.attr("width").and_then(|v| v.trim().parse().ok()))?;
    let height = style_px(style, "height")
        .or_else(|| el.attr("height").and_then(|v| v.trim().parse().ok()))?;

    Some(CanvasSize { width, height })
}

fn style_px(style: &str, property: &str) -> Option<f64> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim() != property {
            return None;
        }
        value.trim().strip_suffix("px")?.trim().parse().ok()
    })
}
