use std::borrow::Cow;
use std::path::Path;

use serde_json::{Map, Value};

use crate::agents::{Agent, Artifact, write_artifact};
use crate::error::{Error, Result};
use crate::llm::Message;
use crate::response::extract_json_array;

pub const SYSTEM_PROMPT: &str = r#"You are a QA engineer. Generate test cases from requirements.

Return ONLY a JSON array with this structure:
[
  {
    "id": "TC-001",
    "title": "Short test title",
    "steps": ["Step 1", "Step 2", "Step 3"],
    "expected": "Expected result",
    "priority": "High"
  }
]

Rules:
- Return 5 test cases
- Cover positive and negative scenarios
- Include edge cases
- Keep steps clear and actionable
- Priority: High, Medium, or Low
- Return ONLY JSON, no markdown fences"#;

pub const CSV_COLUMNS: [&str; 5] = ["TestID", "Title", "Steps", "Expected", "Priority"];

/// Generates test cases from a requirements document.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestcaseAgent;

impl Agent for TestcaseAgent {
    fn name(&self) -> &'static str {
        "testcase"
    }

    fn default_input_dir(&self) -> &'static str {
        "data/requirements"
    }

    fn default_output_dir(&self) -> &'static str {
        "outputs/testcase_generated"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        &["txt"]
    }

    fn build_messages(&self, contents: &str) -> Vec<Message> {
        vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!("Requirements are as follows:\n\n{contents}")),
        ]
    }

    fn persist(&self, _input: &Path, response: &str, output_dir: &Path) -> Result<Vec<Artifact>> {
        let raw_text = output_dir.join("raw_output.txt");
        let raw_json = output_dir.join("raw_output.json");
        let csv = output_dir.join("testcases.csv");

        let cases = extract_json_array(response, &raw_text)?;
        let pretty = serde_json::to_string_pretty(&cases).map_err(|err| {
            Error::MalformedResponse {
                reason: format!("failed to re-serialize test cases: {err}"),
            }
        })?;
        write_artifact(&raw_json, &pretty)?;
        write_artifact(&csv, &to_csv(&cases))?;
        tracing::info!(cases = cases.len(), "test cases generated");

        Ok(vec![
            Artifact {
                label: "raw text",
                path: raw_text,
            },
            Artifact {
                label: "raw json",
                path: raw_json,
            },
            Artifact {
                label: "csv",
                path: csv,
            },
        ])
    }
}

/// Renders test cases as a CSV table, one row per case.
///
/// Missing ids are numbered by position (`TC-001`, ...), a missing priority
/// becomes `Medium` and step lists are joined with ` | `.
pub fn to_csv(cases: &[Map<String, Value>]) -> String {
    let mut out = CSV_COLUMNS.join(",");
    out.push('\n');

    for (index, case) in cases.iter().enumerate() {
        let id = field(case, "id").unwrap_or_else(|| format!("TC-{:03}", index + 1));
        let title = field(case, "title").unwrap_or_default();
        let steps = match case.get("steps") {
            Some(Value::Array(steps)) => steps.iter().map(text).collect::<Vec<_>>().join(" | "),
            Some(Value::Null) | None => String::new(),
            Some(other) => text(other),
        };
        let expected = field(case, "expected").unwrap_or_default();
        let priority = field(case, "priority").unwrap_or_else(|| "Medium".to_string());

        let row = [id, title, steps, expected, priority];
        out.push_str(
            &row.iter()
                .map(|cell| escape(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push('\n');
    }

    out
}

fn field(case: &Map<String, Value>, key: &str) -> Option<String> {
    match case.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(text(value)),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn escape(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::RecordingSink;
    use crate::agents::{AgentOptions, RunStatus, run};
    use crate::config::Settings;
    use crate::llm::{ChatClient, Provider, Role};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::fs;

    fn cases(value: Value) -> Vec<Map<String, Value>> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn messages_are_system_then_user_payload() {
        let messages = TestcaseAgent.build_messages("Login must lock after 3 failures.");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, Role::User);
        assert!(messages[1].content.ends_with("\n\nLogin must lock after 3 failures."));
    }

    #[test]
    fn csv_fills_defaults_and_joins_steps() {
        let csv = to_csv(&cases(json!([
            {"id": "TC-100", "title": "Valid login", "steps": ["Open page", "Submit"], "expected": "Dashboard", "priority": "High"},
            {"title": "No id", "steps": "single step", "expected": "Error"}
        ])));
        assert_eq!(
            csv,
            "TestID,Title,Steps,Expected,Priority\n\
             TC-100,Valid login,Open page | Submit,Dashboard,High\n\
             TC-002,No id,single step,Error,Medium\n"
        );
    }

    #[test]
    fn csv_quotes_cells_with_separators() {
        let csv = to_csv(&cases(json!([
            {"id": "TC-1", "title": "Say \"hi\", then leave", "steps": ["a\nb"], "expected": "ok", "priority": "Low"}
        ])));
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "TC-1,\"Say \"\"hi\"\", then leave\",\"a");
        assert!(csv.contains("b\",ok,Low\n"));
    }

    #[test]
    fn csv_of_no_cases_is_just_the_header() {
        assert_eq!(to_csv(&[]), "TestID,Title,Steps,Expected,Priority\n");
    }

    #[test]
    fn persist_writes_raw_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let response = "```json\n[{\"id\":\"TC-001\",\"title\":\"t\",\"steps\":[\"s\"],\"expected\":\"e\",\"priority\":\"Low\"}]\n```";
        let artifacts = TestcaseAgent
            .persist(Path::new("req.txt"), response, dir.path())
            .unwrap();

        assert_eq!(artifacts.len(), 3);
        assert_eq!(
            fs::read_to_string(dir.path().join("raw_output.txt")).unwrap(),
            response
        );
        let parsed: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("raw_output.json")).unwrap())
                .unwrap();
        assert_eq!(parsed[0]["id"], json!("TC-001"));
        assert!(
            fs::read_to_string(dir.path().join("testcases.csv"))
                .unwrap()
                .contains("TC-001,t,s,e,Low")
        );
    }

    #[test]
    fn run_against_local_model_writes_artifacts_and_reports() {
        let workspace = tempfile::tempdir().unwrap();
        let input_dir = workspace.path().join("requirements");
        fs::create_dir_all(&input_dir).unwrap();
        fs::write(input_dir.join("b.txt"), "second").unwrap();
        fs::write(input_dir.join("a.txt"), "Users can reset passwords.").unwrap();

        let mut server = Server::new();
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({"model": "llama3", "stream": false})),
                Matcher::Regex("Users can reset passwords".to_string()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "message": {"role": "assistant", "content": "[{\"id\":\"TC-001\",\"title\":\"Reset\"}]"},
                    "prompt_eval_count": 40,
                    "eval_count": 12
                })
                .to_string(),
            )
            .create();

        let settings = Settings {
            provider: Provider::Ollama,
            model: "llama3".to_string(),
            ollama_host: server.url(),
            timeout_secs: 5,
            ..Settings::default()
        };
        let client = ChatClient::from_settings(&settings).unwrap();
        let options = AgentOptions {
            file: None,
            input_dir,
            output_dir: workspace.path().join("out"),
        };
        let sink = RecordingSink::default();

        let artifacts = run(&TestcaseAgent, &client, &options, &sink).unwrap();
        mock.assert();
        assert_eq!(artifacts.len(), 3);
        assert!(workspace.path().join("out").join("testcases.csv").exists());

        let summaries = sink.summaries.borrow();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].status, RunStatus::Ok);
        assert_eq!(summaries[0].total_tokens, 52);
        assert_eq!(summaries[0].cost_usd, 0.0);
    }

    #[test]
    fn malformed_reply_fails_but_keeps_raw_text_and_reports_usage() {
        let workspace = tempfile::tempdir().unwrap();
        let requirement = workspace.path().join("req.txt");
        fs::write(&requirement, "anything").unwrap();

        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(
                json!({"message": {"content": "Sorry, I cannot help."}, "prompt_eval_count": 7, "eval_count": 3})
                    .to_string(),
            )
            .create();

        let settings = Settings {
            provider: Provider::Ollama,
            model: "mistral".to_string(),
            ollama_host: server.url(),
            ..Settings::default()
        };
        let client = ChatClient::from_settings(&settings).unwrap();
        let out = workspace.path().join("out");
        let options = AgentOptions {
            file: Some(requirement),
            input_dir: workspace.path().join("unused"),
            output_dir: out.clone(),
        };
        let sink = RecordingSink::default();

        let err = run(&TestcaseAgent, &client, &options, &sink).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
        assert_eq!(
            fs::read_to_string(out.join("raw_output.txt")).unwrap(),
            "Sorry, I cannot help."
        );
        assert!(!out.join("testcases.csv").exists());

        let summaries = sink.summaries.borrow();
        assert_eq!(summaries[0].status, RunStatus::Failed);
        assert_eq!(summaries[0].total_tokens, 10);
    }

    #[test]
    fn missing_input_reports_a_zeroed_failure() {
        let workspace = tempfile::tempdir().unwrap();
        let client = ChatClient::from_settings(&Settings::default()).unwrap();
        let options = AgentOptions {
            file: None,
            input_dir: workspace.path().to_path_buf(),
            output_dir: workspace.path().join("out"),
        };
        let sink = RecordingSink::default();

        let err = run(&TestcaseAgent, &client, &options, &sink).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let summaries = sink.summaries.borrow();
        assert_eq!(summaries[0].status, RunStatus::Failed);
        assert_eq!(summaries[0].total_tokens, 0);
        assert!(summaries[0].input.is_none());
    }
}
