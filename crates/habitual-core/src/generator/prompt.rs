//! Prompt text sent to the completion backend.

use crate::time_of_day::TimeOfDay;

pub const SYSTEM_PROMPT: &str = "あなたは健康的な生活習慣を提案するアシスタントです。ユーザーの理想習慣を参考に、実践的で魅力的な提案を提供してください。必ず指定されたJSON形式で回答してください。";

/// Shown in place of the habit list when the user has none.
pub const NO_HABITS_PLACEHOLDER: &str = "特に設定されていない";

const HABIT_SEPARATOR: &str = "、";

const RESPONSE_FORMAT: &str = r#"{ "title": "提案のタイトル（30文字以内）", "description": "具体的な説明（100文字程度）", "category": "カテゴリ（健康、学習、趣味、仕事、生活のいずれか）", "priority": 1-10の優先度（数値のみ）, "tags": ["タグ1", "タグ2", "タグ3"] }"#;

/// User prompt asking for a single suggestion in the fixed JSON shape.
pub fn build_prompt(habits: &[String], time_of_day: TimeOfDay, context: Option<&str>) -> String {
    let label = time_of_day.display_name();
    let habit_list = if habits.is_empty() {
        NO_HABITS_PLACEHOLDER.to_string()
    } else {
        habits.join(HABIT_SEPARATOR)
    };
    let context_line = context
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("現在の状況: {c}"))
        .unwrap_or_default();

    format!(
        "ユーザーの理想的な{label}の習慣: {habit_list}\n\n{context_line}\n\n\
         以下の形式で{label}の時間に実践できる健康的な活動を1つ提案してください。\n\
         必ず以下のJSON形式で回答し、他のテキストは含めないでください:\n\n{RESPONSE_FORMAT}"
    )
}

/// Generation context built from user preferences, `None` when there are none.
pub fn preferences_context(preferences: &[String]) -> Option<String> {
    let kept: Vec<&str> = preferences
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if kept.is_empty() {
        return None;
    }
    Some(format!("ユーザーの好み: {}", kept.join(HABIT_SEPARATOR)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_joins_habits_with_japanese_comma() {
        let prompt = build_prompt(
            &["ストレッチ".to_string(), "水を飲む".to_string()],
            TimeOfDay::Morning,
            None,
        );
        assert!(prompt.starts_with("ユーザーの理想的な朝の習慣: ストレッチ、水を飲む"));
        assert!(prompt.contains("朝の時間に実践できる"));
        assert!(!prompt.contains("現在の状況"));
        assert!(prompt.ends_with(RESPONSE_FORMAT));
    }

    #[test]
    fn prompt_uses_placeholder_for_empty_habits() {
        let prompt = build_prompt(&[], TimeOfDay::Evening, Some("雨の日"));
        assert!(prompt.contains("夜の習慣: 特に設定されていない"));
        assert!(prompt.contains("現在の状況: 雨の日"));
    }

    #[test]
    fn preferences_context_skips_blank_entries() {
        assert_eq!(preferences_context(&[]), None);
        assert_eq!(preferences_context(&[" ".to_string()]), None);
        assert_eq!(
            preferences_context(&["読書".to_string(), "".to_string(), "ヨガ".to_string()])
                .as_deref(),
            Some("ユーザーの好み: 読書、ヨガ")
        );
    }
}
