use scraper::{Html, Selector};
use tracing::warn;

use oeis_common::{EdgeTriple, SeqId};

/// Extract edge triples from the labeled sections of a sequence page.
///
/// Each `div.section` carries a `div.sectname` (the relationship label) and a
/// `div.sectbody` with zero or more links. Link text matching the identifier
/// shape is canonicalized; anything else is kept as an opaque external target.
/// A page with no sections yields an empty list. A section missing its name
/// or body is skipped with a warning; parsing never fails past this boundary.
pub fn parse_sections(html: &str, from_id: &SeqId) -> Vec<EdgeTriple> {
    let document = Html::parse_document(html);
    let section_selector = Selector::parse("div.section").unwrap();
    let name_selector = Selector::parse("div.sectname").unwrap();
    let body_selector = Selector::parse("div.sectbody").unwrap();
    let link_selector = Selector::parse("a").unwrap();

    let mut triples = Vec::new();

    for section in document.select(&section_selector) {
        let Some(name_el) = section.select(&name_selector).next() else {
            warn!(id = %from_id, "Section without a sectname, skipping");
            continue;
        };
        let relationship = element_text(&name_el);
        if relationship.is_empty() {
            warn!(id = %from_id, "Section with empty sectname, skipping");
            continue;
        }

        let Some(body) = section.select(&body_selector).next() else {
            warn!(id = %from_id, relationship, "Section without a sectbody, skipping");
            continue;
        };

        for link in body.select(&link_selector) {
            let text = element_text(&link);
            if text.is_empty() {
                continue;
            }
            let to_id = match SeqId::parse(&text) {
                Some(target) => target.to_string(),
                None => text,
            };
            triples.push(EdgeTriple {
                from_id: from_id.clone(),
                to_id,
                relationship: relationship.clone(),
            });
        }
    }

    triples
}

fn element_text(element: &scraper::ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ").trim().to_string()
}
