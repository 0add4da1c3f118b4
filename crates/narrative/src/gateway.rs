use crate::connector::{HttpConnector, NarrativeConnector, NarrativeRequest};
use crate::fallback::fallback_summary;
use darshan_composer::TruthPackage;
use darshan_intent::Theme;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeSection {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NarrativeExpansion {
    pub narrative_expansion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<NarrativeSection>>,
}

/// Front door for narrative expansion. Infallible by contract.
pub struct NarrativeGateway {
    connector: Option<Box<dyn NarrativeConnector>>,
}

impl NarrativeGateway {
    pub fn new(connector: Option<Box<dyn NarrativeConnector>>) -> Self {
        Self { connector }
    }

    /// Gateway wired from the environment; without `DARSHAN_AI_URL` it runs
    /// on the deterministic fallback alone.
    pub fn from_env() -> Self {
        Self::new(
            HttpConnector::from_env().map(|c| Box::new(c) as Box<dyn NarrativeConnector>),
        )
    }

    #[must_use]
    pub fn has_connector(&self) -> bool {
        self.connector.is_some()
    }

    /// Expands a finalized package into narrative text.
    ///
    /// The package is read-only context; connector output becomes narration
    /// and nothing else, so the structured fields cannot drift. Connector
    /// failures are logged and absorbed into the fallback.
    pub async fn expand(
        &self,
        package: &TruthPackage,
        question: &str,
        theme: Theme,
    ) -> NarrativeExpansion {
        let Some(connector) = &self.connector else {
            return fallback_summary(package);
        };

        let request = NarrativeRequest {
            package,
            question,
            theme,
        };
        match connector.expand(&request).await {
            Ok(text) => NarrativeExpansion {
                narrative_expansion: text,
                sections: None,
            },
            Err(err) => {
                log::warn!("Narrative connector failed, using fallback: {err}");
                fallback_summary(package)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::NarrativeError;
    use darshan_composer::{ComposeOptions, Composer};
    use pretty_assertions::assert_eq;

    struct FixedConnector(&'static str);

    #[async_trait::async_trait]
    impl NarrativeConnector for FixedConnector {
        async fn expand(&self, _request: &NarrativeRequest<'_>) -> Result<String, NarrativeError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingConnector;

    #[async_trait::async_trait]
    impl NarrativeConnector for FailingConnector {
        async fn expand(&self, _request: &NarrativeRequest<'_>) -> Result<String, NarrativeError> {
            Err(NarrativeError::EmptyResponse)
        }
    }

    fn package() -> TruthPackage {
        Composer::builtin()
            .unwrap()
            .compose(
                None,
                &ComposeOptions {
                    seed: Some(21),
                    now_ms: Some(0),
                    ..Default::default()
                },
            )
            .unwrap()
    }

    #[tokio::test]
    async fn no_connector_means_fallback() {
        let gateway = NarrativeGateway::new(None);
        let p = package();
        let expansion = gateway.expand(&p, "pergunta", Theme::General).await;
        assert!(expansion.narrative_expansion.contains(&p.sacred.text));
    }

    #[tokio::test]
    async fn connector_failure_degrades_to_fallback() {
        let gateway = NarrativeGateway::new(Some(Box::new(FailingConnector)));
        let p = package();
        let expansion = gateway.expand(&p, "pergunta", Theme::General).await;
        let fallback = fallback_summary(&p);
        assert_eq!(expansion.narrative_expansion, fallback.narrative_expansion);
    }

    #[tokio::test]
    async fn connector_text_is_used_as_narration_only() {
        let gateway = NarrativeGateway::new(Some(Box::new(FixedConnector(
            "a gentle expansion of the reading",
        ))));
        let p = package();
        let before = serde_json::to_string(&p).unwrap();

        let expansion = gateway.expand(&p, "pergunta", Theme::Love).await;
        assert_eq!(
            expansion.narrative_expansion,
            "a gentle expansion of the reading"
        );
        // The package itself is untouched by the expansion.
        assert_eq!(serde_json::to_string(&p).unwrap(), before);
    }
}
