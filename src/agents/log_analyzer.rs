use std::path::Path;

use crate::agents::{Agent, Artifact, write_artifact};
use crate::error::{Error, Result};
use crate::llm::Message;
use crate::response::split_report;

pub const SYSTEM_PROMPT: &str = r#"You are a senior DevOps engineer analyzing system logs.

Your task:
1. Identify all errors and warnings
2. Find patterns and root causes
3. Assess severity and impact
4. Provide actionable recommendations

First, provide detailed technical analysis in this format:
- Summary: Brief overview of issues found
- Critical Errors: List with timestamps
- Root Cause: What caused the issues
- Impact: Which systems/users affected
- Recommendations: Step-by-step fixes
- Prevention: How to avoid in future

Then, provide structured JSON summary after "```json":
{
  "summary": "Brief one-line summary",
  "error_count": 5,
  "critical_errors": [
    {"timestamp": "2026-01-04 10:24:12", "message": "Payment timeout", "severity": "high"}
  ],
  "root_causes": ["Cause 1", "Cause 2"],
  "affected_systems": ["payment", "database", "api"],
  "recommendations": ["Fix 1", "Fix 2"],
  "severity": "high"
}

Finally, provide executive summary after "---EXECUTIVE---" in simple, non-technical language:
- What happened (in plain English)
- Business impact (users affected, downtime)
- What we're doing to fix it
- When it will be resolved
Keep it brief (3-5 sentences). No technical jargon.

Be technical in analysis but simple in executive summary."#;

/// Turns a log file into a technical report, a JSON digest and an
/// executive summary, all from one model reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAnalyzer;

impl Agent for LogAnalyzer {
    fn name(&self) -> &'static str {
        "log-analyzer"
    }

    fn default_input_dir(&self) -> &'static str {
        "data/logs"
    }

    fn default_output_dir(&self) -> &'static str {
        "outputs/log_analyzer"
    }

    fn input_extensions(&self) -> &'static [&'static str] {
        &["log", "txt"]
    }

    fn build_messages(&self, contents: &str) -> Vec<Message> {
        vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!("Analyze this log file:\n\n{contents}")),
        ]
    }

    fn persist(&self, input: &Path, response: &str, output_dir: &Path) -> Result<Vec<Artifact>> {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string());
        let raw_text = output_dir.join(format!("{stem}_raw.txt"));
        let technical = output_dir.join(format!("{stem}_analysis.txt"));
        let analysis = output_dir.join(format!("{stem}_analysis.json"));
        let executive = output_dir.join(format!("{stem}_executive.txt"));

        write_artifact(&raw_text, response)?;
        let report = split_report(response);
        let pretty = serde_json::to_string_pretty(&report.analysis).map_err(|err| {
            Error::MalformedResponse {
                reason: format!("failed to re-serialize analysis: {err}"),
            }
        })?;
        write_artifact(&technical, &report.technical)?;
        write_artifact(&analysis, &pretty)?;
        write_artifact(&executive, &report.executive)?;

        Ok(vec![
            Artifact {
                label: "raw text",
                path: raw_text,
            },
            Artifact {
                label: "technical report",
                path: technical,
            },
            Artifact {
                label: "json analysis",
                path: analysis,
            },
            Artifact {
                label: "executive summary",
                path: executive,
            },
        ])
    }
}
