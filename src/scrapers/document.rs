use crate::error::CrawlError;
use scraper::html::Select;
use scraper::{ElementRef, Html, Selector};

/// Parsed page with the small selection surface extraction needs
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Elements borrow the document only, not the selector
    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> Select<'a, 'b> {
        self.html.select(selector)
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        self.html.select(selector).next().is_some()
    }

    /// Text of the `<title>` element, if any
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html.select(&selector).next().map(text)
    }
}

/// Compile a CSS selector
pub fn compile(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|e| CrawlError::Selector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Whitespace-normalised text content of an element
pub fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First descendant matching `selector`
pub fn first<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

/// Non-empty text of the first descendant matching `selector`
pub fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    first(element, selector).map(text).filter(|t| !t.is_empty())
}

/// Non-empty attribute value
pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_whitespace_normalised() {
        let doc = PageDocument::parse("<div class='a'>  hello \n <b>world</b>  </div>");
        let sel = compile("div.a").unwrap();
        let el = doc.select(&sel).next().unwrap();
        assert_eq!(text(el), "hello world");
    }

    #[test]
    fn title_and_contains() {
        let doc = PageDocument::parse("<html><head><title> 404 Not Found </title></head><body><p class='empty'></p></body></html>");
        assert_eq!(doc.title().as_deref(), Some("404 Not Found"));
        assert!(doc.contains(&compile(".empty").unwrap()));
        assert!(!doc.contains(&compile(".item").unwrap()));
    }

    #[test]
    fn invalid_selector_is_reported() {
        assert!(matches!(compile("div[[["), Err(CrawlError::Selector { .. })));
    }

    #[test]
    fn empty_attr_is_absent() {
        let doc = PageDocument::parse("<a class='x' href='  '>t</a><a class='y' href='/1'>u</a>");
        let x = doc.select(&compile("a.x").unwrap()).next().unwrap();
        let y = doc.select(&compile("a.y").unwrap()).next().unwrap();
        assert_eq!(attr(x, "href"), None);
        assert_eq!(attr(y, "href"), Some("/1"));
    }
}
