use tracing::warn;

use crate::{
    client::InterviewBackend,
    error::{MockviewError, Result},
    store::{SessionStore, load_report, persist_report},
    types::InterviewReport,
};

pub const ROADMAP_UNAVAILABLE: &str = "Unable to fetch roadmap. Please try again later.";

pub fn saved_report(store: &SessionStore) -> Result<InterviewReport> {
    load_report(store)?.ok_or_else(|| {
        MockviewError::validation("No interview report found. Finish an interview first.")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearningPath {
    Generated(Vec<String>),
    /// Shown instead of a path; the stored report is left as it was.
    Unavailable(String),
}

/// Ask for a learning path for the saved report and attach it when one
/// comes back. The caller saves the store.
pub async fn generate_learning_path(
    backend: &dyn InterviewBackend,
    store: &mut SessionStore,
) -> Result<LearningPath> {
    let mut report = saved_report(store)?;

    match backend.generate_roadmap(&report.summary).await {
        Ok(path) => {
            report.learning_path = Some(path.clone());
            persist_report(store, &report)?;
            Ok(LearningPath::Generated(path))
        }
        Err(e @ MockviewError::UnexpectedResponse { .. }) => {
            warn!(error = %e, "roadmap response had no list");
            Ok(LearningPath::Unavailable(ROADMAP_UNAVAILABLE.to_string()))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        capture::Recording, client::ProcessResponse, store::keys, summary::compile_report,
        types::Summary,
    };

    struct RoadmapOnly(Result<Vec<String>>);

    #[async_trait]
    impl InterviewBackend for RoadmapOnly {
        async fn process_answer(&self, _: &Recording, _: &str) -> Result<ProcessResponse> {
            unreachable!("results never upload answers")
        }

        async fn generate_roadmap(&self, _: &Summary) -> Result<Vec<String>> {
            match &self.0 {
                Ok(path) => Ok(path.clone()),
                Err(_) => Err(MockviewError::UnexpectedResponse {
                    endpoint: "/api/roadmap/generate",
                    reason: "response has no roadmap list".into(),
                }),
            }
        }
    }

    fn store_with_report() -> SessionStore {
        let mut store = SessionStore::in_memory("unused.json");
        persist_report(&mut store, &compile_report(Vec::new())).unwrap();
        store
    }

    #[test]
    fn missing_report_is_reported() {
        let store = SessionStore::in_memory("unused.json");
        assert!(matches!(
            saved_report(&store),
            Err(MockviewError::ValidationFailure(_))
        ));
    }

    #[tokio::test]
    async fn generated_path_is_attached_to_the_stored_report() {
        let mut store = store_with_report();
        let backend = RoadmapOnly(Ok(vec!["Practice STAR answers".into()]));

        let path = generate_learning_path(&backend, &mut store).await.unwrap();
        assert_eq!(
            path,
            LearningPath::Generated(vec!["Practice STAR answers".into()])
        );
        assert_eq!(
            saved_report(&store).unwrap().learning_path,
            Some(vec!["Practice STAR answers".into()])
        );
    }

    #[tokio::test]
    async fn malformed_roadmap_leaves_the_report_untouched() {
        let mut store = store_with_report();
        let before = store.get(keys::REPORT).map(str::to_string);
        let backend = RoadmapOnly(Err(MockviewError::validation("unused")));

        let path = generate_learning_path(&backend, &mut store).await.unwrap();
        assert_eq!(path, LearningPath::Unavailable(ROADMAP_UNAVAILABLE.into()));
        assert_eq!(store.get(keys::REPORT).map(str::to_string), before);
    }
}
