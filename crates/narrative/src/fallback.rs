use crate::gateway::{NarrativeExpansion, NarrativeSection};
use darshan_composer::TruthPackage;

/// Deterministic narrative built purely from the package.
///
/// Used when no connector is configured and whenever the connector fails;
/// both paths must read identically for the same package.
#[must_use]
pub fn fallback_summary(package: &TruthPackage) -> NarrativeExpansion {
    let practice_body = {
        let mut body = package.practice.title.clone();
        for step in &package.practice.steps {
            body.push('\n');
            body.push_str("- ");
            body.push_str(step);
        }
        body
    };

    let sections = vec![
        NarrativeSection {
            title: "The verse".to_string(),
            content: package.sacred.text.clone(),
        },
        NarrativeSection {
            title: "The practice".to_string(),
            content: practice_body,
        },
        NarrativeSection {
            title: "To sit with".to_string(),
            content: package.contemplative_question.text.clone(),
        },
    ];

    let narrative_expansion = sections
        .iter()
        .map(|s| format!("{}\n{}", s.title, s.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    NarrativeExpansion {
        narrative_expansion,
        sections: Some(sections),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darshan_composer::{ComposeOptions, Composer};
    use pretty_assertions::assert_eq;

    fn package() -> TruthPackage {
        Composer::builtin()
            .unwrap()
            .compose(
                None,
                &ComposeOptions {
                    seed: Some(9),
                    now_ms: Some(0),
                    ..Default::default()
                },
            )
            .unwrap()
    }

    #[test]
    fn fallback_is_deterministic() {
        let p = package();
        let a = fallback_summary(&p);
        let b = fallback_summary(&p);
        assert_eq!(a.narrative_expansion, b.narrative_expansion);
    }

    #[test]
    fn fallback_contains_the_package_content() {
        let p = package();
        let summary = fallback_summary(&p);
        assert!(summary.narrative_expansion.contains(&p.sacred.text));
        assert!(summary
            .narrative_expansion
            .contains(&p.contemplative_question.text));
        assert_eq!(summary.sections.as_ref().map(Vec::len), Some(3));
    }
}
