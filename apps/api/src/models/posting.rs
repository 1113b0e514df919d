use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One job advertisement as stored in the `postings` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Posting {
    pub posting_id: String,
    pub title: String,
    pub company: String,
    /// Required experience floor in years; 0 means entry-level.
    pub experience: i32,
    pub location: String,
    pub responsibilities: Option<String>,
    pub requirements: Option<String>,
    pub preferred: Option<String>,
    pub benefits: Option<String>,
    pub url: Option<String>,
}

impl Posting {
    /// "신입" for entry-level postings, otherwise "N년 이상".
    pub fn experience_label(&self) -> String {
        if self.experience <= 0 {
            "신입".to_string()
        } else {
            format!("{}년 이상", self.experience)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(experience: i32) -> Posting {
        Posting {
            posting_id: "1".to_string(),
            title: "백엔드 개발자".to_string(),
            company: "테스트".to_string(),
            experience,
            location: "서울 중구".to_string(),
            responsibilities: None,
            requirements: None,
            preferred: None,
            benefits: None,
            url: None,
        }
    }

    #[test]
    fn test_entry_level_label() {
        assert_eq!(posting(0).experience_label(), "신입");
    }

    #[test]
    fn test_experienced_label() {
        assert_eq!(posting(3).experience_label(), "3년 이상");
    }
}
