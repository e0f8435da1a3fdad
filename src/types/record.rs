use serde::{Deserialize, Serialize};

/// One post as published by the remote source and persisted in the `posts` table.
///
/// `id` is the external identity; the store never overwrites a row once its id is present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
}

impl Record {
    pub fn new(id: i64, user_id: i64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            title: title.into(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_remote_field_names() {
        let json = r#"{"id":7,"userId":2,"title":"t","body":"b"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record, Record::new(7, 2, "t", "b"));
    }

    #[test]
    fn rejects_missing_user_id() {
        let json = r#"{"id":7,"title":"t","body":"b"}"#;
        assert!(serde_json::from_str::<Record>(json).is_err());
    }

    #[test]
    fn accepts_negative_and_zero_ids() {
        let json = r#"[{"id":0,"userId":1,"title":"","body":""},{"id":-4,"userId":1,"title":"","body":""}]"#;
        let records: Vec<Record> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].id, 0);
        assert_eq!(records[1].id, -4);
    }
}
