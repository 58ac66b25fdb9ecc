//! Parallel fan-out: independent prompts sent concurrently, joined in order.

use futures::future::join_all;
use serde::Serialize;

use crate::domain::ConversationHistory;
use crate::error::{ReflectorError, Result};
use crate::llm::TextGenerator;

/// A named prompt to run alongside others
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutTask {
    pub name: String,
    pub prompt: String,
}

impl FanOutTask {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanOutResult {
    pub name: String,
    pub output: String,
}

/// Run every task concurrently against one generator.
///
/// Results come back in input order. If any task fails, the error of the
/// first failing task (in input order) is returned.
pub async fn fan_out<G>(generator: &G, tasks: &[FanOutTask]) -> Result<Vec<FanOutResult>>
where
    G: TextGenerator + ?Sized,
{
    log::debug!("Fanning out {} prompts to {}", tasks.len(), generator.name());

    let replies = join_all(tasks.iter().map(|task| async move {
        let history = ConversationHistory::with_task(task.prompt.as_str());
        generator.generate(&history).await
    }))
    .await;

    tasks
        .iter()
        .zip(replies)
        .map(|(task, reply)| {
            reply
                .map(|output| FanOutResult {
                    name: task.name.clone(),
                    output,
                })
                .map_err(|source| ReflectorError::Step {
                    step: task.name.clone(),
                    source,
                })
        })
        .collect()
}

/// The three-way topic breakdown used by the CLI
pub fn topic_tasks(topic: &str) -> Vec<FanOutTask> {
    vec![
        FanOutTask::new("summary", format!("Summarize the following topic concisely:\n\n{}", topic)),
        FanOutTask::new(
            "questions",
            format!("Generate three interesting questions about the following topic:\n\n{}", topic),
        ),
        FanOutTask::new(
            "key_terms",
            format!(
                "Identify 5-10 key terms from the following topic, separated by commas:\n\n{}",
                topic
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, ScriptedGenerator};

    #[tokio::test]
    async fn test_results_in_input_order() {
        let generator = ScriptedGenerator::new("llm", ["first", "second", "third"]);
        let tasks = vec![
            FanOutTask::new("a", "pa"),
            FanOutTask::new("b", "pb"),
            FanOutTask::new("c", "pc"),
        ];

        let results = fan_out(&generator, &tasks).await.unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_task_list() {
        let generator = ScriptedGenerator::new("llm", Vec::<String>::new());
        let results = fan_out(&generator, &[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_failure_names_task() {
        let generator = ScriptedGenerator::new("llm", ["only one"]);
        let tasks = vec![FanOutTask::new("a", "pa"), FanOutTask::new("b", "pb")];

        let err = fan_out(&generator, &tasks).await.unwrap_err();
        match err {
            ReflectorError::Step { step, source } => {
                assert_eq!(step, "b");
                assert!(matches!(source, LlmError::Exhausted));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_topic_tasks() {
        let tasks = topic_tasks("The history of space exploration");
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].name, "summary");
        assert!(tasks.iter().all(|t| t.prompt.contains("space exploration")));
    }
}
