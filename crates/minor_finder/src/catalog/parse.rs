//! HTML parsing for catalog pages.

use super::error::CatalogError;
use crate::requirements::{MinorListing, MinorRequirements, RawItems};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

// Static selectors for parsing - compiled once
static MINOR_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href*='preview_program.php']").unwrap());
static SECTION_HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h3, h4").unwrap());
static ANY_HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3, h4, h5, h6").unwrap());
static LI_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static MAJOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#all-majors-container li a").unwrap());
static CODE_IN_TEXT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,4}\s*\d{3,5}\b").unwrap());
static PARENT_LETTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z])\.").unwrap());

/// Parses the catalog's minor index into `(name, absolute link)` pairs.
///
/// Only links whose text contains "Minor" are kept; catalog order is kept.
pub fn parse_minor_list(html: &str, base: &Url) -> Result<Vec<MinorListing>, CatalogError> {
    let document = Html::parse_document(html);
    let mut minors = Vec::new();

    for link in document.select(&MINOR_LINK_SELECTOR) {
        let name = element_text(&link);
        if !name.contains("Minor") {
            continue;
        }
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let link = base.join(href)?;
        minors.push(MinorListing {
            name,
            link: link.to_string(),
        });
    }

    Ok(minors)
}

/// Parses one minor's program page into raw sections and notes.
///
/// `h3` headings become sections of course codes; `h4` headings become
/// subsections keyed by their parent's letter (`"C. 1. ..."`) and keep
/// non-code list items as free text. A heading with no list keeps the next
/// paragraph as a single free-text item.
pub fn parse_minor_page(html: &str) -> MinorRequirements {
    let document = Html::parse_document(html);
    let mut requirements = MinorRequirements::default();
    let mut parent_title: Option<String> = None;

    for heading in document.select(&SECTION_HEADING_SELECTOR) {
        let title = element_text(&heading);
        if title.is_empty() {
            continue;
        }

        if heading.value().name() == "h3" {
            parent_title = Some(title.clone());
            let Some(list) = following(&heading, "ul") else {
                requirements
                    .sections
                    .insert(title, paragraph_items(&heading));
                continue;
            };
            if title.eq_ignore_ascii_case("notes") {
                requirements.notes = list_texts(&list);
                continue;
            }
            let codes: BTreeSet<String> = list
                .select(&LI_SELECTOR)
                .flat_map(|li| codes_in(&element_text(&li)))
                .collect();
            let items = if codes.is_empty() {
                list_texts(&list)
            } else {
                codes.into_iter().collect()
            };
            if !items.is_empty() {
                requirements.sections.insert(title, RawItems::Flat(items));
            }
            continue;
        }

        let key = match parent_title
            .as_deref()
            .and_then(|p| PARENT_LETTER_REGEX.captures(p))
        {
            Some(caps) => format!("{}. {}", &caps[1], title),
            None => title,
        };
        match following(&heading, "ul") {
            Some(list) => {
                let mut items = Vec::new();
                for li in list.select(&LI_SELECTOR) {
                    let text = element_text(&li);
                    let found = codes_in(&text);
                    if found.is_empty() {
                        if !text.is_empty() {
                            items.push(text);
                        }
                    } else {
                        items.extend(found);
                    }
                }
                if !items.is_empty() {
                    requirements.sections.insert(key, RawItems::Flat(items));
                }
            }
            None => {
                requirements
                    .sections
                    .insert(key, paragraph_items(&heading));
            }
        }
    }

    if requirements.notes.is_empty() {
        requirements.notes = document
            .select(&ANY_HEADING_SELECTOR)
            .find(|h| element_text(h).eq_ignore_ascii_case("notes"))
            .and_then(|h| following(&h, "ul"))
            .map(|list| list_texts(&list))
            .unwrap_or_default();
    }

    requirements
}

/// Parses the admissions majors page into a sorted, de-duplicated list.
pub fn parse_majors(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&MAJOR_SELECTOR)
        .map(|a| element_text(&a))
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Visible text with runs of whitespace collapsed to one space.
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical codes mentioned in a piece of text, in order.
fn codes_in(text: &str) -> Vec<String> {
    CODE_IN_TEXT_REGEX
        .find_iter(text)
        .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect())
        .collect()
}

fn list_texts(list: &ElementRef) -> Vec<String> {
    list.select(&LI_SELECTOR)
        .map(|li| element_text(&li))
        .filter(|t| !t.is_empty())
        .collect()
}

fn paragraph_items(heading: &ElementRef) -> RawItems {
    let items = following(heading, "p")
        .map(|p| element_text(&p))
        .filter(|t| !t.is_empty())
        .into_iter()
        .collect();
    RawItems::Flat(items)
}

/// First sibling element named `name` after `heading`, stopping at the next
/// heading of any level.
fn following<'a>(heading: &ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| !is_heading(el.value().name()))
        .find(|el| el.value().name() == name)
}

fn is_heading(name: &str) -> bool {
    matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_HTML: &str = r#"
        <html><body>
          <a href="preview_program.php?catoid=13&poid=100">Statistics Minor</a>
          <a href="/preview_program.php?catoid=13&poid=101">Statistics, BS</a>
          <a href="preview_program.php?catoid=13&poid=102">Global Studies  Minor</a>
          <a href="other.php">History Minor</a>
        </body></html>
    "#;

    const MINOR_HTML: &str = r#"
        <html><body><div>
          <h3>A. Required Courses (6 credits)</h3>
          <ul>
            <li>STAT 35000 - Introduction to Statistics</li>
            <li>STAT 35500 - Statistics for Data Science</li>
          </ul>
          <h3>B. Electives</h3>
          <p>Choose from courses approved by the department.</p>
          <h3>C. Choose one of the following options</h3>
          <h4>1. Theory</h4>
          <ul>
            <li>STAT 41600 - Probability</li>
            <li>Any STAT course with advisor approval</li>
          </ul>
          <h4>2. Applied</h4>
          <ul><li>STAT 51200 or STAT 51300</li></ul>
          <h3>Notes</h3>
          <ul>
            <li>At least 50% of coursework must be completed at Purdue.</li>
            <li>Grades of C- or better are required.</li>
          </ul>
        </div></body></html>
    "#;

    #[test]
    fn test_parse_minor_list() {
        let base = Url::parse("https://catalog.purdue.edu").unwrap();
        let minors = parse_minor_list(INDEX_HTML, &base).unwrap();
        assert_eq!(minors.len(), 2);
        assert_eq!(minors[0].name, "Statistics Minor");
        assert_eq!(
            minors[0].link,
            "https://catalog.purdue.edu/preview_program.php?catoid=13&poid=100"
        );
        assert_eq!(minors[1].name, "Global Studies Minor");
    }

    #[test]
    fn test_parse_minor_page_sections() {
        let req = parse_minor_page(MINOR_HTML);
        assert_eq!(
            req.sections["A. Required Courses (6 credits)"],
            RawItems::Flat(vec!["STAT35000".into(), "STAT35500".into()])
        );
        assert_eq!(
            req.sections["B. Electives"],
            RawItems::Flat(vec!["Choose from courses approved by the department.".into()])
        );
        assert_eq!(
            req.sections["C. 1. Theory"],
            RawItems::Flat(vec![
                "STAT41600".into(),
                "Any STAT course with advisor approval".into()
            ])
        );
        assert_eq!(
            req.sections["C. 2. Applied"],
            RawItems::Flat(vec!["STAT51200".into(), "STAT51300".into()])
        );
        assert_eq!(
            req.sections["C. Choose one of the following options"],
            RawItems::Flat(vec![])
        );
        assert!(!req.sections.contains_key("Notes"));
        assert_eq!(req.notes.len(), 2);
    }

    #[test]
    fn test_notes_under_other_heading_level() {
        let html = r#"<div><h3>A. Core</h3><ul><li>MA 16100</li></ul>
            <h2>Notes</h2><ul><li>75% at Purdue</li></ul></div>"#;
        let req = parse_minor_page(html);
        assert_eq!(req.notes, vec!["75% at Purdue".to_string()]);
    }

    #[test]
    fn test_parse_majors() {
        let html = r#"<div id="all-majors-container"><ul>
            <li><a href="/a">Statistics</a></li>
            <li><a href="/b">Computer Science</a></li>
            <li><a href="/c">Statistics</a></li>
        </ul></div><ul><li><a href="/d">Not a major</a></li></ul>"#;
        assert_eq!(
            parse_majors(html),
            vec!["Computer Science".to_string(), "Statistics".to_string()]
        );
    }
}
