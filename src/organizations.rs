//! Organizations pass: copies every `org` of the authority list into the
//! `listOrg` of the organizations template. No lookups are made.

use anyhow::Result;

use crate::config::Config;
use crate::document::Document;
use crate::pass::{append_to_list, load_template, PassSummary};
use crate::progress::{EnrichProgressEvent, EnrichProgressReporter};

const PASS: &str = "organizations";

pub fn copy_organizations(
    authority: &Document,
    output: &mut Document,
    reporter: &dyn EnrichProgressReporter,
) -> Result<PassSummary> {
    let orgs = authority.root.descendants("org");
    let total = orgs.len() as u64;
    let mut summary = PassSummary::default();

    for (i, org) in orgs.iter().enumerate() {
        let label = org
            .first_child("orgName")
            .map(|n| n.normalized_text())
            .unwrap_or_default();
        reporter.report(EnrichProgressEvent::Processing {
            pass: PASS,
            id: org.attr("xml:id").unwrap_or_default().to_string(),
            label,
            n: i as u64 + 1,
            total,
        });
        summary.processed += 1;
    }

    append_to_list(output, "listOrg", orgs.into_iter().cloned().collect())?;
    Ok(summary)
}

/// `enrich organizations`: copy and write `organizations.xml`.
pub fn run_organizations(
    config: &Config,
    reporter: &dyn EnrichProgressReporter,
) -> Result<PassSummary> {
    let authority = Document::read(&config.input.authority_list)?;
    let mut output = load_template(config.templates.organizations.as_deref(), "listOrg")?;

    let mut summary = copy_organizations(&authority, &mut output, reporter)?;

    summary.output = config.output.organizations_path();
    output.write(&summary.output)?;
    tracing::info!(processed = summary.processed, "organizations written");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    #[test]
    fn orgs_are_copied_unchanged_in_order() {
        let authority = Document::parse(
            r#"<TEI><text><body><listOrg>
<org xml:id="org_0001"><orgName>Kaiser-Wilhelm-Gesellschaft</orgName></org>
<org xml:id="org_0002"><orgName>Royal Society</orgName><note>London</note></org>
</listOrg></body></text></TEI>"#,
        )
        .unwrap();
        let mut output = Document::tei_skeleton("listOrg");

        let summary = copy_organizations(&authority, &mut output, &NoProgress).unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.lookups, 0);

        let copied = output.root.descendants("org");
        let originals = authority.root.descendants("org");
        assert_eq!(copied, originals);
    }
}
