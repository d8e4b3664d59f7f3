// Prompt text for report generation.

pub const REPORT_SYSTEM: &str = "You are a helpful career coaching assistant.";

pub const REPORT_TEMPERATURE: f32 = 0.5;

/// Separator appended after every log included in a report prompt.
pub const LOG_SEPARATOR: &str = "\n\n---\n\n";

/// Report prompt template. Replace `{logs}` before sending.
pub const REPORT_PROMPT_TEMPLATE: &str = r#"Analyze the following daily work logs and generate a professional career development report.
The report must have three sections: "STAR Story Seeds", "Room for Improvement", and "Learning Plan for Next Month".

For the "STAR Story Seeds" section:
- Identify at least 2-3 significant accomplishments from the logs.
- For each accomplishment, create a STAR story framework (Situation, Task, Action, Result).
- The 'Situation', 'Task', and 'Action' should be inferred from the logs.
- The 'Result' should be a placeholder like "[Add specific metric or impact here.]" as the logs may not contain the final outcome.
- Focus on themes like process improvement, problem-solving, collaboration, and leadership.
- Pay special attention to the "What went well" reflections as they often contain key accomplishments.

For the "Room for Improvement" section:
- Analyze the 'Blockers' and 'What could be improved' sections of the logs.
- Summarize recurring challenges or areas for growth.
- Look for patterns in blockers and improvement reflections across multiple days.

For the "Learning Plan for Next Month" section:
- Based on the "Room for Improvement" analysis, suggest 2-3 concrete, actionable learning goals.
- Consider the blockers mentioned and how they could be addressed through learning.

Format the entire output in Markdown.

Here are the logs:
---
{logs}
---
"#;

pub fn build_report_prompt(logs: &str) -> String {
    REPORT_PROMPT_TEMPLATE.replace("{logs}", logs)
}
