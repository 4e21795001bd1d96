//! Advice value and the tolerant parser for remote responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::shortlist::Category;
use crate::tasks::{TaskPriority, TaskType};

/// Structured counselling output. Every path that produces advice yields
/// this exact shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Advice {
    pub message: String,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendations: Vec<String>,
    pub actions: Vec<ProposedAction>,
}

impl Advice {
    /// Advice carrying only a free-form message.
    pub fn from_raw_text(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            ..Self::default()
        }
    }
}

/// An action suggested by the advice source, not yet applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProposedAction {
    CreateTask {
        #[serde(default)]
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, alias = "taskType")]
        task_type: TaskType,
        #[serde(default)]
        priority: TaskPriority,
        #[serde(default, alias = "dueDate", skip_serializing_if = "Option::is_none")]
        due_date: Option<NaiveDate>,
        #[serde(default, alias = "universityId", skip_serializing_if = "Option::is_none")]
        university_id: Option<Uuid>,
    },
    Shortlist {
        #[serde(alias = "universityId")]
        university_id: Uuid,
        #[serde(default)]
        category: Category,
    },
}

impl ProposedAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateTask { .. } => "create_task",
            Self::Shortlist { .. } => "shortlist",
        }
    }
}

/// Parse a remote response into `Advice`.
///
/// Never fails: text that is not a JSON object becomes the message of an
/// action-less advice, and individual malformed actions are dropped.
pub fn parse_advice(raw: &str) -> Advice {
    let json = extract_json_object(raw);
    let Ok(Value::Object(mut obj)) = serde_json::from_str::<Value>(&json) else {
        return Advice::from_raw_text(raw.trim());
    };

    let message = match obj.remove("message") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        _ => raw.trim().to_string(),
    };

    let actions = match obj.remove("actions") {
        Some(Value::Array(items)) => items.into_iter().filter_map(parse_action).collect(),
        _ => Vec::new(),
    };

    Advice {
        message,
        strengths: string_list(obj.remove("strengths")),
        gaps: string_list(obj.remove("gaps")),
        recommendations: string_list(obj.remove("recommendations")),
        actions,
    }
}

fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}

fn parse_action(value: Value) -> Option<ProposedAction> {
    let Value::Object(mut obj) = value else {
        warn!("Dropping non-object action");
        return None;
    };
    normalize_action(&mut obj);
    match serde_json::from_value::<ProposedAction>(Value::Object(obj)) {
        Ok(action) => Some(action),
        Err(e) => {
            warn!(error = %e, "Dropping malformed action");
            None
        }
    }
}

/// Accept the casing variants services tend to emit ("createTask",
/// "SOP", "Dream") and a blank university id.
fn normalize_action(obj: &mut Map<String, Value>) {
    if let Some(Value::String(kind)) = obj.get_mut("type") {
        *kind = match kind.as_str() {
            "createTask" | "CreateTask" | "create-task" => "create_task".to_string(),
            other => other.to_lowercase(),
        };
    }
    for key in ["task_type", "taskType", "priority", "category"] {
        if let Some(Value::String(s)) = obj.get_mut(key) {
            *s = s.trim().to_lowercase();
        }
    }
    for key in ["university_id", "universityId", "due_date", "dueDate"] {
        if matches!(obj.get(key), Some(Value::String(s)) if s.trim().is_empty()) {
            obj.remove(key);
        }
    }
}

/// Extract a JSON object from a response that may be wrapped in a
/// markdown fence or surrounded by prose.
pub(crate) fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_response() {
        let uni = Uuid::new_v4();
        let raw = format!(
            r#"{{
                "message": "Solid profile.",
                "strengths": ["GPA"],
                "gaps": ["No GRE"],
                "recommendations": ["Book the GRE"],
                "actions": [
                    {{"type": "create_task", "title": "Book GRE", "task_type": "exam", "priority": "high", "due_date": "2027-02-01"}},
                    {{"type": "shortlist", "university_id": "{uni}", "category": "dream"}}
                ]
            }}"#
        );
        let advice = parse_advice(&raw);
        assert_eq!(advice.message, "Solid profile.");
        assert_eq!(advice.strengths, vec!["GPA"]);
        assert_eq!(advice.actions.len(), 2);
        assert_eq!(
            advice.actions[1],
            ProposedAction::Shortlist {
                university_id: uni,
                category: Category::Dream
            }
        );
        match &advice.actions[0] {
            ProposedAction::CreateTask {
                task_type,
                priority,
                due_date,
                ..
            } => {
                assert_eq!(*task_type, TaskType::Exam);
                assert_eq!(*priority, TaskPriority::High);
                assert_eq!(*due_date, NaiveDate::from_ymd_opt(2027, 2, 1));
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn unwraps_markdown_fence() {
        let raw = "Here you go:\n```json\n{\"message\": \"Fenced\", \"actions\": []}\n```";
        let advice = parse_advice(raw);
        assert_eq!(advice.message, "Fenced");
        assert!(advice.actions.is_empty());
    }

    #[test]
    fn accepts_camel_case_and_capitalized_values() {
        let uni = Uuid::new_v4();
        let raw = format!(
            r#"{{"message": "m", "actions": [
                {{"type": "createTask", "title": "Draft SOP", "taskType": "SOP", "priority": "High", "dueDate": "2027-01-10", "universityId": "{uni}"}},
                {{"type": "shortlist", "universityId": "{uni}", "category": "Safe"}}
            ]}}"#
        );
        let advice = parse_advice(&raw);
        assert_eq!(advice.actions.len(), 2);
        assert!(matches!(
            advice.actions[0],
            ProposedAction::CreateTask {
                task_type: TaskType::Sop,
                university_id: Some(u),
                ..
            } if u == uni
        ));
        assert!(matches!(
            advice.actions[1],
            ProposedAction::Shortlist { category: Category::Safe, .. }
        ));
    }

    #[test]
    fn malformed_actions_are_dropped_individually() {
        let raw = r#"{"message": "m", "actions": [
            {"type": "shortlist", "university_id": "not-a-uuid"},
            {"type": "teleport"},
            "just a string",
            {"type": "create_task", "title": "Keep me"}
        ]}"#;
        let advice = parse_advice(raw);
        assert_eq!(advice.actions.len(), 1);
        assert_eq!(advice.actions[0].kind(), "create_task");
    }

    #[test]
    fn non_json_becomes_message() {
        let advice = parse_advice("  Focus on your SOP this month.  ");
        assert_eq!(advice.message, "Focus on your SOP this month.");
        assert!(advice.actions.is_empty());
        assert!(advice.strengths.is_empty());
    }

    #[test]
    fn missing_message_falls_back_to_raw_text() {
        let raw = r#"{"actions": []}"#;
        let advice = parse_advice(raw);
        assert_eq!(advice.message, raw);
    }

    #[test]
    fn serialized_advice_always_has_actions() {
        let json = serde_json::to_value(Advice::from_raw_text("hi")).unwrap();
        assert!(json["actions"].is_array());
    }

    #[test]
    fn extract_json_object_handles_prose() {
        assert_eq!(
            extract_json_object("Sure! {\"a\": 1} Hope that helps."),
            "{\"a\": 1}"
        );
        assert_eq!(extract_json_object("no json"), "no json");
    }
}
