//! Fixed-topology sequential pipelines.
//!
//! The task graph is plain data: an ordered list of specs, each naming the
//! earlier stages it reads by index. Execution is strictly in list order,
//! one blocking model call per task, no retries — the first failure aborts
//! the whole run and nothing is persisted.

use colored::*;
use eyre::{Context, Result};
use log::{info, warn};
use std::borrow::Cow;

use crate::agent::{self, Agent};
use crate::llm::ChatClient;

/// How a task's raw model text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Keep the text as-is
    Prose,
    /// Attempt a best-effort JSON parse, degrading to text on failure
    Json,
}

/// One stage of a pipeline
#[derive(Debug, Clone)]
pub struct TaskSpec {
    /// Prompt body sent to the assigned agent
    pub description: String,

    /// Role of the agent that runs this task
    pub role: &'static str,

    /// What the task should produce. Shown to the operator, not enforced.
    pub expected_output: &'static str,

    /// Indices of earlier tasks whose outputs are fed in as context
    pub context: Vec<usize>,

    pub output: OutputKind,
}

/// What a task produced
#[derive(Debug, Clone)]
pub enum TaskOutput {
    Text(String),
    Structured(serde_json::Value),
}

impl TaskOutput {
    /// Plain text comes back unchanged; structured payloads are serialized.
    /// Idempotent: rendering already-plain text always returns it verbatim.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            TaskOutput::Text(text) => Cow::Borrowed(text.as_str()),
            TaskOutput::Structured(value) => {
                Cow::Owned(serde_json::to_string_pretty(value).unwrap_or_default())
            }
        }
    }
}

#[derive(Debug)]
pub struct TaskResult {
    pub role: &'static str,
    pub output: TaskOutput,
}

/// Story pipeline: produce → critique → revise.
/// Tasks 1 and 3 belong to the storyteller, task 2 to the critic.
pub fn story_tasks(scenario: &str) -> Vec<TaskSpec> {
    vec![
        TaskSpec {
            description: format!(
                "Create a story based on the following scenario: {}. \
                 Focus on the themes of fear, friendship, and survival.",
                scenario
            ),
            role: agent::STORYTELLER,
            expected_output: "A well-crafted story that aligns with the given scenario.",
            context: vec![],
            output: OutputKind::Prose,
        },
        TaskSpec {
            description: "Review the story and provide detailed feedback on the following elements:\n\
                          - Narrative structure\n\
                          - Character development\n\
                          - Dialogue\n\
                          - Style\n\
                          - Coherence\n\
                          - Any other relevant aspects\n\n\
                          The feedback should be constructive, actionable, and aimed at improving \
                          the overall quality of the prose."
                .to_string(),
            role: agent::LITERARY_CRITIC,
            expected_output: "A comprehensive critique of the story, including specific suggestions \
                              and recommendations for revisions.",
            context: vec![0],
            output: OutputKind::Prose,
        },
        TaskSpec {
            description: "Rewrite the original story, incorporating all the critical comments \
                          provided in the feedback."
                .to_string(),
            role: agent::STORYTELLER,
            expected_output: "A revised version of the story that addresses all critical comments \
                              from the critique.",
            context: vec![0, 1],
            output: OutputKind::Prose,
        },
    ]
}

/// Card pipeline: produce → critique(personality) → critique(scenario) →
/// critique(messages). Four distinct roles; only the first task's output is
/// persisted, the critiques are advisory.
pub fn card_tasks(description: &str) -> Vec<TaskSpec> {
    vec![
        TaskSpec {
            description: format!(
                "Create a character card based on the following user input: {}. \
                 Include name, description, personality, scenario, first message, example message, \
                 and creator comment. Respond with a single JSON object using the keys name, \
                 description, personality, scenario, first_message, example_message, \
                 creator_comment, tags, talkativeness, and fav. Use {{{{char}}}} to refer to the \
                 character being created and {{{{user}}}} for the user interacting with the character.",
                description
            ),
            role: agent::CARD_CREATOR,
            expected_output: "A JSON string containing the character card details.",
            context: vec![],
            output: OutputKind::Json,
        },
        TaskSpec {
            description: "Review and enhance the personality of the character. Ensure {{char}} is \
                          used consistently to refer to the character."
                .to_string(),
            role: agent::PERSONALITY_CRITIC,
            expected_output: "A string containing feedback and suggestions for the character's personality.",
            context: vec![0],
            output: OutputKind::Prose,
        },
        TaskSpec {
            description: "Review and improve the scenario for the character. Verify that {{char}} \
                          and {{user}} are used appropriately in the scenario."
                .to_string(),
            role: agent::SCENARIO_CRITIC,
            expected_output: "A string containing feedback and suggestions for the character's scenario.",
            context: vec![0],
            output: OutputKind::Prose,
        },
        TaskSpec {
            description: "Review and refine the first message and example message for the \
                          character. Ensure proper formatting with *italics* for narration and \
                          \"quotes\" for dialogue. Confirm that {{char}} and {{user}} are used \
                          correctly in the messages."
                .to_string(),
            role: agent::MESSAGE_CRITIC,
            expected_output: "A string containing feedback and suggestions for the character's messages.",
            context: vec![0],
            output: OutputKind::Prose,
        },
    ]
}

/// Execute tasks in list order, feeding referenced outputs forward.
pub fn run_pipeline(
    agents: &[Agent],
    tasks: &[TaskSpec],
    client: &ChatClient,
    quiet: bool,
) -> Result<Vec<TaskResult>> {
    let mut results: Vec<TaskResult> = Vec::with_capacity(tasks.len());

    for (index, task) in tasks.iter().enumerate() {
        let agent = agents
            .iter()
            .find(|a| a.role == task.role)
            .ok_or_else(|| eyre::eyre!("No agent configured for role: {}", task.role))?;

        if let Some(&bad) = task.context.iter().find(|&&c| c >= index) {
            eyre::bail!("Task {} references stage {} which has not run yet", index + 1, bad + 1);
        }

        if !quiet {
            println!(
                "{} [{}/{}] {} — {}",
                "▶".cyan(),
                index + 1,
                tasks.len(),
                task.role.bold(),
                task.expected_output.dimmed()
            );
        }
        info!("Running task {}/{} as {} ({})", index + 1, tasks.len(), task.role, agent.model);

        let prompt = build_prompt(task, &results);
        let raw = client
            .complete(&agent.model, &agent.system_prompt(), &prompt)
            .context(format!("Task {} ({}) failed", index + 1, task.role))?;

        let output = match task.output {
            OutputKind::Prose => TaskOutput::Text(raw),
            OutputKind::Json => parse_structured(raw),
        };

        results.push(TaskResult {
            role: task.role,
            output,
        });
    }

    Ok(results)
}

/// Prepend each referenced stage's output as a labeled section.
fn build_prompt(task: &TaskSpec, results: &[TaskResult]) -> String {
    let mut prompt = String::new();

    for &i in &task.context {
        let result = &results[i];
        prompt.push_str(&format!(
            "## Output of step {} ({})\n\n{}\n\n",
            i + 1,
            result.role,
            result.output.as_text()
        ));
    }

    prompt.push_str(&task.description);
    prompt
}

fn parse_structured(raw: String) -> TaskOutput {
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) if value.is_object() => TaskOutput::Structured(value),
        _ => {
            warn!("Task output is not a JSON object, keeping raw text");
            TaskOutput::Text(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_tasks_shape() {
        let tasks = story_tasks("a lighthouse keeper alone in a storm");
        assert_eq!(tasks.len(), 3);
        assert!(tasks[0].description.contains("a lighthouse keeper alone in a storm"));
    }

    #[test]
    fn test_story_tasks_role_reuse() {
        let tasks = story_tasks("any scenario");
        assert_eq!(tasks[0].role, tasks[2].role);
        assert_ne!(tasks[0].role, tasks[1].role);
    }

    #[test]
    fn test_story_tasks_context_wiring() {
        let tasks = story_tasks("any scenario");
        assert!(tasks[0].context.is_empty());
        assert_eq!(tasks[1].context, vec![0]);
        assert_eq!(tasks[2].context, vec![0, 1]);
    }

    #[test]
    fn test_card_tasks_distinct_roles() {
        let tasks = card_tasks("a grumpy alchemist");
        assert_eq!(tasks.len(), 4);
        for (i, a) in tasks.iter().enumerate() {
            for b in &tasks[i + 1..] {
                assert_ne!(a.role, b.role);
            }
        }
        assert!(tasks[0].description.contains("a grumpy alchemist"));
    }

    #[test]
    fn test_card_tasks_only_first_is_json() {
        let tasks = card_tasks("whoever");
        assert_eq!(tasks[0].output, OutputKind::Json);
        assert!(tasks[1..].iter().all(|t| t.output == OutputKind::Prose));
    }

    #[test]
    fn test_context_indices_precede_tasks() {
        for tasks in [story_tasks("s"), card_tasks("d")] {
            for (index, task) in tasks.iter().enumerate() {
                assert!(task.context.iter().all(|&c| c < index));
            }
        }
    }

    #[test]
    fn test_as_text_plain_unchanged() {
        let output = TaskOutput::Text("  already text \n".to_string());
        assert_eq!(output.as_text(), "  already text \n");
    }

    #[test]
    fn test_as_text_idempotent() {
        let output = TaskOutput::Structured(serde_json::json!({"name": "Zara"}));
        let first = output.as_text().into_owned();
        assert!(!first.is_empty());

        let again = TaskOutput::Text(first.clone());
        assert_eq!(again.as_text(), first);
    }

    #[test]
    fn test_parse_structured_object() {
        match parse_structured(r#"{"name": "Zara"}"#.to_string()) {
            TaskOutput::Structured(value) => assert_eq!(value["name"], "Zara"),
            TaskOutput::Text(_) => panic!("expected structured output"),
        }
    }

    #[test]
    fn test_parse_structured_falls_back() {
        match parse_structured("Here is your character!".to_string()) {
            TaskOutput::Text(text) => assert_eq!(text, "Here is your character!"),
            TaskOutput::Structured(_) => panic!("expected text fallback"),
        }
    }

    #[test]
    fn test_build_prompt_includes_context() {
        let tasks = story_tasks("the scenario");
        let results = vec![TaskResult {
            role: crate::agent::STORYTELLER,
            output: TaskOutput::Text("Draft story.".to_string()),
        }];
        let prompt = build_prompt(&tasks[1], &results);
        assert!(prompt.contains("Draft story."));
        assert!(prompt.contains("## Output of step 1"));
        assert!(prompt.ends_with(tasks[1].description.as_str()));
    }
}
