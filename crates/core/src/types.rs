use serde::{Deserialize, Serialize};

/// A persisted day record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub id: i64,
    pub date: String,
    pub day_of_week: String,
}

/// Fields required to create a day; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDay {
    pub date: String,
    pub day_of_week: String,
}

/// Partial update of a day. Only fields present overwrite the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
}

/// Result of the weekday lookup path. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayLookup {
    pub date: String,
    pub day_of_week: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_serializes_with_camel_case_keys() {
        let day = Day {
            id: 7,
            date: "15-08-2025".to_string(),
            day_of_week: "FRIDAY".to_string(),
        };

        let value = serde_json::to_value(&day).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "id": 7,
                "date": "15-08-2025",
                "dayOfWeek": "FRIDAY"
            })
        );
    }

    #[test]
    fn patch_omits_absent_fields() {
        let patch = DayPatch {
            date: None,
            day_of_week: Some("MONDAY".to_string()),
        };

        let value = serde_json::to_value(&patch).expect("serialize");
        assert_eq!(value, serde_json::json!({ "dayOfWeek": "MONDAY" }));
    }
}
