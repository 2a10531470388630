use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use tokio::task::spawn_blocking;

use crate::models::{SearchPage, TagCategory, Tags, WorkId, WorkRecord};
use crate::normalize::to_ascii;
use crate::{Error, Result};

const WORK_SEGMENT: &str = "/works/";

/// Compiled selectors for search result pages and work pages.
#[derive(Debug)]
pub struct Selectors {
    flash_error: Selector,
    meta_group: Selector,
    title: Selector,
    tag_groups: Vec<(TagCategory, Selector)>,
    tag: Selector,
    chapters: Selector,
    paragraph: Selector,
    search_entry: Selector,
    link: Selector,
}

impl Selectors {
    pub fn new() -> Result<Self> {
        let tag_groups = TagCategory::ALL
            .iter()
            .map(|category| {
                let selector = create_selector(&format!("dd.{}.tags", category.as_str()))?;
                Ok((*category, selector))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            flash_error: create_selector(".flash.error")?,
            meta_group: create_selector("dl.work.meta.group")?,
            title: create_selector("h2.title.heading")?,
            tag_groups,
            tag: create_selector(".tag")?,
            chapters: create_selector("div#chapters")?,
            paragraph: create_selector("p")?,
            search_entry: create_selector("li.work")?,
            link: create_selector("a[href]")?,
        })
    }
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::InvalidSelector(sel_str.into()))
}

/// Why a work page was classified as access-gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The page shows a flash error banner.
    ErrorBanner,
    /// The page has no work metadata block (adult wall, deleted, restricted).
    MissingMetadata,
}
impl Display for Denial {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Denial::ErrorBanner => f.write_str("Access Denied: error banner on page"),
            Denial::MissingMetadata => f.write_str("Access Denied: work metadata missing"),
        }
    }
}

/// Outcome of parsing a work page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkPage {
    Denied(Denial),
    Work(WorkRecord),
}

/// Typed lookups over a parsed work page. Absent elements come back as `None`
/// or an empty list, never as an error.
pub struct WorkDocument<'a> {
    document: &'a Html,
    selectors: &'a Selectors,
}

impl<'a> WorkDocument<'a> {
    pub fn new(document: &'a Html, selectors: &'a Selectors) -> Self {
        Self { document, selectors }
    }

    pub fn denial(&self) -> Option<Denial> {
        if self.document.select(&self.selectors.flash_error).next().is_some() {
            return Some(Denial::ErrorBanner);
        }
        if self.metadata().is_none() {
            return Some(Denial::MissingMetadata);
        }
        None
    }

    pub fn metadata(&self) -> Option<ElementRef<'a>> {
        self.document.select(&self.selectors.meta_group).next()
    }

    pub fn title(&self) -> Option<String> {
        self.document
            .select(&self.selectors.title)
            .next()
            .map(|el| to_ascii(el.text().collect::<String>().trim()))
    }

    /// Tag texts of one category. A missing `dd` yields an empty list.
    pub fn tags(&self, category: TagCategory) -> Vec<String> {
        let Some(meta) = self.metadata() else {
            return Vec::new();
        };
        let Some((_, group_selector)) = self.selectors.tag_groups.iter().find(|(c, _)| *c == category) else {
            return Vec::new();
        };
        let Some(group) = meta.select(group_selector).next() else {
            return Vec::new();
        };
        group
            .select(&self.selectors.tag)
            .map(|tag| to_ascii(tag.text().collect::<String>().trim()))
            .collect()
    }

    /// Paragraph texts inside the chapters container, or `None` if there is no container.
    pub fn paragraphs(&self) -> Option<Vec<String>> {
        let chapters = self.document.select(&self.selectors.chapters).next()?;
        Some(
            chapters
                .select(&self.selectors.paragraph)
                .map(|p| to_ascii(&p.text().collect::<String>()))
                .collect(),
        )
    }
}

/// Classifies a work page and, if it is accessible, extracts the record.
/// Denial is decided before any field is read.
pub fn work_page(selectors: &Selectors, id: WorkId, html: &str) -> WorkPage {
    let document = Html::parse_document(html);
    let doc = WorkDocument::new(&document, selectors);

    if let Some(denial) = doc.denial() {
        return WorkPage::Denied(denial);
    }

    let mut tags = Tags::default();
    for category in TagCategory::ALL {
        *tags.get_mut(category) = doc.tags(category);
    }

    WorkPage::Work(WorkRecord {
        id,
        title: doc.title().unwrap_or_default(),
        tags,
        body: doc.paragraphs().map(|p| p.join("\n\n")).unwrap_or_default(),
    })
}

/// Collects candidate work ids from a page of search results.
/// Only the first link of each result entry is considered.
pub fn search_page(selectors: &Selectors, html: &str) -> SearchPage {
    let document = Html::parse_document(html);

    // A full results page has 20 entries.
    let mut candidates = Vec::with_capacity(20);
    let mut entries = 0;
    for entry in document.select(&selectors.search_entry) {
        entries += 1;
        let Some(link) = entry.select(&selectors.link).next() else {
            continue;
        };
        if let Some(id) = link.value().attr("href").and_then(work_id_from_href) {
            candidates.push(id);
        }
    }

    SearchPage {
        candidates,
        is_empty: entries == 0,
    }
}

/// `/works/123?view_adult=true` -> `123`
fn work_id_from_href(href: &str) -> Option<WorkId> {
    let (_, tail) = href.rsplit_once(WORK_SEGMENT)?;
    let id = tail.split(['?', '#', '/']).next().unwrap_or_default();
    if id.is_empty() {
        return None;
    }
    Some(WorkId::new(id))
}

/// Parses a work page on the blocking pool.
pub(crate) async fn parse_work(selectors: Arc<Selectors>, id: WorkId, html: String) -> Result<WorkPage> {
    let page = spawn_blocking(move || work_page(&selectors, id, &html)).await?;
    Ok(page)
}

/// Parses a search results page on the blocking pool.
pub(crate) async fn parse_search(selectors: Arc<Selectors>, html: String) -> Result<SearchPage> {
    let page = spawn_blocking(move || search_page(&selectors, &html)).await?;
    Ok(page)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;

    pub(crate) const WORK_HTML: &str = r#"
        <html><body>
        <div id="main">
          <dl class="work meta group">
            <dt class="rating tags">Rating:</dt>
            <dd class="rating tags"><ul><li><a class="tag" href="/tags/Explicit">Explicit</a></li></ul></dd>
            <dt class="category tags">Category:</dt>
            <dd class="category tags"><ul><li><a class="tag" href="/tags/F*s*M">F/M</a></li></ul></dd>
            <dt class="fandom tags">Fandom:</dt>
            <dd class="fandom tags"><ul>
              <li><a class="tag" href="/tags/Pokemon">Pokémon</a></li>
              <li><a class="tag" href="/tags/Zelda">The Legend of Zelda</a></li>
            </ul></dd>
            <dt class="relationship tags">Relationship:</dt>
            <dd class="relationship tags"><ul><li><a class="tag">Link/Zelda</a></li></ul></dd>
            <dt class="character tags">Characters:</dt>
            <dd class="character tags"><ul>
              <li><a class="tag">Link</a></li>
              <li><a class="tag">Zelda</a></li>
            </ul></dd>
            <dt class="freeform tags">Additional Tags:</dt>
            <dd class="freeform tags"><ul><li><a class="tag">Fluff</a></li><li><a class="tag">Angst</a></li></ul></dd>
          </dl>
          <h2 class="title heading">
            Crème Brûlée
          </h2>
          <div id="chapters">
            <div class="userstuff">
              <p>First paragraph.</p>
              <p>Second <em>paragraph</em> with “quotes”.</p>
            </div>
          </div>
        </div>
        </body></html>
    "#;

    pub(crate) const ADULT_WALL_HTML: &str = r#"
        <html><body>
        <div id="main">
          <p class="caution">This work could have adult content. If you continue, you have agreed that you are willing to see such content.</p>
        </div>
        </body></html>
    "#;

    pub(crate) const ERROR_BANNER_HTML: &str = r#"
        <html><body>
        <div class="flash error">Sorry, you don't have permission to access the page you were trying to reach.</div>
        <dl class="work meta group"></dl>
        </body></html>
    "#;

    pub(crate) fn search_html(ids: &[&str]) -> String {
        let items: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<li class="work blurb group" id="work_{id}" role="article">
                        <div class="header module"><h4 class="heading">
                          <a href="/works/{id}">Title {id}</a> by <a rel="author" href="/users/someone/pseuds/someone">someone</a>
                        </h4></div>
                      </li>"#
                )
            })
            .collect();
        format!(r#"<html><body><ol class="work index group">{items}</ol></body></html>"#)
    }

    fn selectors() -> Selectors {
        Selectors::new().unwrap()
    }

    #[test]
    fn extracts_accessible_work() {
        let page = work_page(&selectors(), WorkId::from("42"), WORK_HTML);
        let WorkPage::Work(record) = &page else {
            panic!("expected a record, got {page:?}");
        };
        assert_eq!(record.id.as_str(), "42");
        assert_eq!(record.title, "Creme Brulee");
        assert_eq!(record.tags.rating, vec!["Explicit"]);
        assert_eq!(record.tags.category, vec!["F/M"]);
        assert_eq!(record.tags.fandom, vec!["Pokemon", "The Legend of Zelda"]);
        assert_eq!(record.tags.relationship, vec!["Link/Zelda"]);
        assert_eq!(record.tags.character, vec!["Link", "Zelda"]);
        assert_eq!(record.tags.freeform, vec!["Fluff", "Angst"]);
        assert_eq!(
            record.body,
            "First paragraph.\n\nSecond paragraph with \"quotes\"."
        );
    }

    #[test]
    fn missing_categories_are_empty() {
        let html = r#"
            <dl class="work meta group">
              <dd class="rating tags"><a class="tag">Mature</a></dd>
            </dl>
            <h2 class="title heading">Only a rating</h2>
        "#;
        let WorkPage::Work(record) = work_page(&selectors(), WorkId::from("7"), html) else {
            panic!("expected a record");
        };
        assert_eq!(record.tags.rating, vec!["Mature"]);
        for category in [
            TagCategory::Category,
            TagCategory::Fandom,
            TagCategory::Relationship,
            TagCategory::Character,
            TagCategory::Freeform,
        ] {
            assert!(record.tags.get(category).is_empty(), "{category} should be empty");
        }
        // No chapters container is not a denial.
        assert_eq!(record.body, "");
    }

    #[rstest]
    #[case(ADULT_WALL_HTML, Denial::MissingMetadata)]
    #[case(ERROR_BANNER_HTML, Denial::ErrorBanner)]
    #[case("", Denial::MissingMetadata)]
    fn detects_denial(#[case] html: &str, #[case] expected: Denial) {
        assert_eq!(
            work_page(&selectors(), WorkId::from("1"), html),
            WorkPage::Denied(expected)
        );
    }

    #[test]
    fn typed_lookups_report_absence() {
        let document = Html::parse_document(ADULT_WALL_HTML);
        let selectors = selectors();
        let doc = WorkDocument::new(&document, &selectors);
        assert!(doc.metadata().is_none());
        assert!(doc.title().is_none());
        assert!(doc.paragraphs().is_none());
        assert!(doc.tags(TagCategory::Rating).is_empty());
    }

    #[test]
    fn extracts_search_candidates_in_order() {
        let page = search_page(&selectors(), &search_html(&["3", "1", "2"]));
        assert!(!page.is_empty);
        let ids: Vec<_> = page.candidates.iter().map(WorkId::as_str).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn search_page_without_entries_is_empty() {
        let html = r#"<html><body><h3 class="heading">No results found.</h3><a href="/works/99">Stray link</a></body></html>"#;
        let page = search_page(&selectors(), html);
        assert!(page.is_empty);
        assert!(page.candidates.is_empty());
    }

    #[test]
    fn search_entry_without_work_link_is_skipped() {
        let html = r#"<ol>
            <li class="work"><a href="/users/someone">someone</a></li>
            <li class="work"><span>no link</span></li>
            <li class="work"><a href="/works/5?view_adult=true">Five</a></li>
        </ol>"#;
        let page = search_page(&selectors(), html);
        assert!(!page.is_empty);
        assert_eq!(page.candidates, vec![WorkId::from("5")]);
    }

    #[rstest]
    #[case("/works/123", Some("123"))]
    #[case("/works/123?view_adult=true", Some("123"))]
    #[case("https://archiveofourown.org/works/55#comments", Some("55"))]
    #[case("/works/9/chapters/10", Some("9"))]
    #[case("/collections/x/works/77", Some("77"))]
    #[case("/works/", None)]
    #[case("/series/4", None)]
    fn parses_work_id_from_href(#[case] href: &str, #[case] expected: Option<&str>) {
        assert_eq!(work_id_from_href(href), expected.map(WorkId::from));
    }
}
