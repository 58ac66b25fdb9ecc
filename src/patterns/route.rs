//! Conditional routing.
//!
//! A classifier generator reads the request and names a route; the request
//! is then handed, unchanged, to that route's handler. Replies are matched
//! after trimming, lowercasing and stripping surrounding punctuation.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::ConversationHistory;
use crate::error::{ReflectorError, Result};
use crate::llm::TextGenerator;
use crate::prompt::{PromptRenderer, ROUTE_CLASSIFY, params};

/// The chosen route and its handler's reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    pub label: String,
    pub output: String,
}

struct Route {
    label: String,
    handler: Arc<dyn TextGenerator>,
}

pub struct Router {
    classifier: Arc<dyn TextGenerator>,
    routes: Vec<Route>,
    fallback: Option<Route>,
}

impl Router {
    pub fn new(classifier: Arc<dyn TextGenerator>) -> Self {
        Self {
            classifier,
            routes: Vec::new(),
            fallback: None,
        }
    }

    /// Register a handler under a label (labels are lowercased)
    pub fn route(mut self, label: impl Into<String>, handler: Arc<dyn TextGenerator>) -> Self {
        self.routes.push(Route {
            label: label.into().to_lowercase(),
            handler,
        });
        self
    }

    /// Handler for replies that match no label
    pub fn fallback(mut self, label: impl Into<String>, handler: Arc<dyn TextGenerator>) -> Self {
        self.fallback = Some(Route {
            label: label.into().to_lowercase(),
            handler,
        });
        self
    }

    pub fn labels(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.label.as_str()).collect()
    }

    /// Ask the classifier which route fits the request
    pub async fn classify(&self, request: &str, renderer: &PromptRenderer) -> Result<String> {
        if self.routes.is_empty() {
            return Err(ReflectorError::InvalidConfig("router has no routes".to_string()));
        }

        let labels = self.labels().join(", ");
        let fallback = self.fallback.as_ref().map(|r| r.label.as_str()).unwrap_or("unclear");
        let prompt = renderer.render(
            ROUTE_CLASSIFY,
            &params([("labels", labels.as_str()), ("fallback", fallback), ("request", request)]),
        )?;

        let reply = self
            .classifier
            .generate(&ConversationHistory::with_task(prompt))
            .await
            .map_err(|source| ReflectorError::Step {
                step: "classify".to_string(),
                source,
            })?;

        Ok(normalize_label(&reply))
    }

    /// Classify the request and run the selected handler on it.
    pub async fn dispatch(&self, request: &str, renderer: &PromptRenderer) -> Result<RouteDecision> {
        let label = self.classify(request, renderer).await?;

        let route = self
            .routes
            .iter()
            .find(|r| r.label == label)
            .or(self.fallback.as_ref())
            .ok_or_else(|| ReflectorError::NoRoute(label.clone()))?;

        if route.label != label {
            log::info!("Classifier reply '{}' matched no route, using fallback '{}'", label, route.label);
        }

        let output = route
            .handler
            .generate(&ConversationHistory::with_task(request))
            .await
            .map_err(|source| ReflectorError::Step {
                step: route.label.clone(),
                source,
            })?;

        Ok(RouteDecision {
            label: route.label.clone(),
            output,
        })
    }
}

fn normalize_label(reply: &str) -> String {
    reply
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '_' && c != '-')
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedGenerator;

    fn handler(name: &str, reply: &str) -> Arc<ScriptedGenerator> {
        Arc::new(ScriptedGenerator::new(name, [reply]))
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Booking.\n"), "booking");
        assert_eq!(normalize_label("'info'"), "info");
        assert_eq!(normalize_label("tool_use"), "tool_use");
    }

    #[tokio::test]
    async fn test_dispatch_to_matching_route() {
        let booker = handler("booker", "Booked flight to London");
        let info = handler("info", "unused");
        let router = Router::new(handler("classifier", "Booking"))
            .route("booking", booker.clone())
            .route("info", info.clone());

        let decision = router
            .dispatch("Book me a flight to London", &PromptRenderer::new())
            .await
            .unwrap();

        assert_eq!(decision.label, "booking");
        assert_eq!(decision.output, "Booked flight to London");
        assert_eq!(booker.calls()[0].messages()[0].content, "Book me a flight to London");
        assert_eq!(info.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_goes_to_fallback() {
        let unclear = handler("unclear", "Please clarify");
        let router = Router::new(handler("classifier", "weather"))
            .route("booking", handler("booker", "unused"))
            .fallback("unclear", unclear.clone());

        let decision = router.dispatch("What's the weather?", &PromptRenderer::new()).await.unwrap();

        assert_eq!(decision.label, "unclear");
        assert_eq!(decision.output, "Please clarify");
    }

    #[tokio::test]
    async fn test_unmatched_without_fallback() {
        let router = Router::new(handler("classifier", "weather")).route("booking", handler("booker", "unused"));

        let result = router.dispatch("What's the weather?", &PromptRenderer::new()).await;
        assert!(matches!(result, Err(ReflectorError::NoRoute(label)) if label == "weather"));
    }

    #[tokio::test]
    async fn test_classifier_prompt_lists_labels() {
        let classifier = handler("classifier", "info");
        let router = Router::new(classifier.clone())
            .route("booking", handler("booker", "unused"))
            .route("info", handler("info", "Capital is Paris"))
            .fallback("unclear", handler("unclear", "unused"));

        router.dispatch("Capital of France?", &PromptRenderer::new()).await.unwrap();

        let calls = classifier.calls();
        let prompt = &calls[0].messages()[0].content;
        assert!(prompt.contains("booking, info"));
        assert!(prompt.contains("reply 'unclear'"));
        assert!(prompt.contains("Capital of France?"));
    }

    #[tokio::test]
    async fn test_no_routes_rejected() {
        let router = Router::new(handler("classifier", "x"));
        let result = router.classify("anything", &PromptRenderer::new()).await;
        assert!(matches!(result, Err(ReflectorError::InvalidConfig(_))));
    }
}
