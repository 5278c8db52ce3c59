//! Projection of an [`EnrichedPerson`] into TEI elements.

use authority_enrich_core::models::EnrichedPerson;

use crate::document::Element;

/// Enrichment elements for `person`, in output order. Absent fields emit
/// nothing.
pub fn person_elements(person: &EnrichedPerson) -> Vec<Element> {
    let mut out = Vec::new();

    if let Some(gender) = person.gender {
        out.push(
            Element::new("gender")
                .with_attr("value", gender.value())
                .with_text(gender.text()),
        );
    }

    for (tag, date) in [("birth", &person.birth), ("death", &person.death)] {
        if let Some(date) = date {
            out.push(
                Element::new(tag)
                    .with_child(Element::new("date").with_attr("when", date.as_str())),
            );
        }
    }

    for variant in &person.name_variants {
        out.push(
            Element::new("persName")
                .with_attr("type", "variant")
                .with_text(variant),
        );
    }

    for (kind, uri) in [
        ("wikidata", &person.wikidata_uri),
        ("gnd", &person.authority_uri),
    ] {
        if let Some(uri) = uri {
            out.push(
                Element::new("ptr")
                    .with_attr("type", kind)
                    .with_attr("target", uri),
            );
        }
    }

    for occupation in &person.occupations {
        out.push(
            Element::new("occupation")
                .with_attr("ref", &occupation.reference_uri)
                .with_text(&occupation.label),
        );
    }

    out
}

/// Append the enrichment elements to a `person` element.
pub fn append_person(target: &mut Element, person: &EnrichedPerson) {
    for el in person_elements(person) {
        target.push(el);
    }
}
