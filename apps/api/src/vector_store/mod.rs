//! Vector store capability: metadata-filtered retrieval of embedded posting chunks.
//!
//! Each posting is indexed upstream as one chunk per field type. The store returns
//! chunks with their stored vectors and metadata; all scoring happens in `recommend`.

pub mod chroma;
pub mod snapshot;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

pub use chroma::ChromaStore;
pub use snapshot::SnapshotStore;

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed chunk: {0}")]
    Malformed(String),

    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Semantic category of an indexed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Title,
    Responsibilities,
    QualificationsAndPreferred,
    Benefits,
}

impl FieldType {
    pub fn label(self) -> &'static str {
        match self {
            FieldType::Title => "title",
            FieldType::Responsibilities => "responsibilities",
            FieldType::QualificationsAndPreferred => "qualifications_and_preferred",
            FieldType::Benefits => "benefits",
        }
    }

    /// Label used by the Korean-keyed index.
    pub fn korean_label(self) -> &'static str {
        match self {
            FieldType::Title => "공고제목",
            FieldType::Responsibilities => "주요업무",
            FieldType::QualificationsAndPreferred => "자격요건및우대사항",
            FieldType::Benefits => "혜택및복지",
        }
    }

    /// Accepts either label set.
    pub fn from_label(label: &str) -> Option<Self> {
        [
            FieldType::Title,
            FieldType::Responsibilities,
            FieldType::QualificationsAndPreferred,
            FieldType::Benefits,
        ]
        .into_iter()
        .find(|f| f.label() == label || f.korean_label() == label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub posting_id: String,
    pub field_type: FieldType,
    pub experience: u32,
    pub location: String,
}

/// One embedded unit: a posting field's vector plus its filterable metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Metadata predicate understood by every store backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkFilter {
    ExperienceAtMost(u32),
    LocationIn(Vec<String>),
    And(Vec<ChunkFilter>),
}

impl ChunkFilter {
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        match self {
            ChunkFilter::ExperienceAtMost(ceiling) => metadata.experience <= *ceiling,
            ChunkFilter::LocationIn(locations) => locations.contains(&metadata.location),
            ChunkFilter::And(clauses) => clauses.iter().all(|c| c.matches(metadata)),
        }
    }

    /// True when no chunk can match (an empty `∈` set inside the conjunction).
    pub fn is_unsatisfiable(&self) -> bool {
        match self {
            ChunkFilter::ExperienceAtMost(_) => false,
            ChunkFilter::LocationIn(locations) => locations.is_empty(),
            ChunkFilter::And(clauses) => clauses.iter().any(ChunkFilter::is_unsatisfiable),
        }
    }

    /// Renders the predicate as a Chroma `where` document.
    pub fn to_where(&self, schema: &MetadataSchema) -> Value {
        match self {
            ChunkFilter::ExperienceAtMost(ceiling) => {
                json!({ schema.experience_key: { "$lte": ceiling } })
            }
            ChunkFilter::LocationIn(locations) => {
                json!({ schema.location_key: { "$in": locations } })
            }
            ChunkFilter::And(clauses) => {
                let rendered: Vec<Value> = clauses.iter().map(|c| c.to_where(schema)).collect();
                json!({ "$and": rendered })
            }
        }
    }
}

/// Key names used by the upstream index for chunk metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSchema {
    pub posting_id_key: &'static str,
    pub field_type_key: &'static str,
    pub experience_key: &'static str,
    pub location_key: &'static str,
}

impl MetadataSchema {
    pub fn english() -> Self {
        Self {
            posting_id_key: "posting_id",
            field_type_key: "field_type",
            experience_key: "experience",
            location_key: "location",
        }
    }

    pub fn korean() -> Self {
        Self {
            posting_id_key: "공고id",
            field_type_key: "type",
            experience_key: "경력",
            location_key: "근무위치",
        }
    }

    /// Reads one chunk's metadata. Posting ids stored as numbers become strings.
    pub fn parse(&self, raw: &Map<String, Value>) -> Result<ChunkMetadata, VectorStoreError> {
        let posting_id = match raw.get(self.posting_id_key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => normalize_numeric_id(n),
            _ => return Err(missing(self.posting_id_key)),
        };

        let field_label = raw
            .get(self.field_type_key)
            .and_then(Value::as_str)
            .ok_or_else(|| missing(self.field_type_key))?;
        let field_type = FieldType::from_label(field_label).ok_or_else(|| {
            VectorStoreError::Malformed(format!("unknown field type '{field_label}'"))
        })?;

        let experience = raw
            .get(self.experience_key)
            .and_then(Value::as_f64)
            .filter(|e| *e >= 0.0)
            .ok_or_else(|| missing(self.experience_key))?
            .round() as u32;

        let location = raw
            .get(self.location_key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(ChunkMetadata {
            posting_id,
            field_type,
            experience,
            location,
        })
    }
}

fn normalize_numeric_id(n: &serde_json::Number) -> String {
    match n.as_u64() {
        Some(int) => int.to_string(),
        // ids exported through a float column, e.g. 12345.0
        None => n
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| format!("{f:.0}"))
            .unwrap_or_else(|| n.to_string()),
    }
}

fn missing(key: &str) -> VectorStoreError {
    VectorStoreError::Malformed(format!("metadata key '{key}' missing or invalid"))
}

/// Query capability over the indexed chunks. Results keep the store's order.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn query(&self, filter: &ChunkFilter) -> Result<Vec<IndexedChunk>, VectorStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(experience: u32, location: &str) -> ChunkMetadata {
        ChunkMetadata {
            posting_id: "1".to_string(),
            field_type: FieldType::Title,
            experience,
            location: location.to_string(),
        }
    }

    #[test]
    fn test_field_type_accepts_both_label_sets() {
        assert_eq!(FieldType::from_label("benefits"), Some(FieldType::Benefits));
        assert_eq!(FieldType::from_label("혜택및복지"), Some(FieldType::Benefits));
        assert_eq!(FieldType::from_label("공고제목"), Some(FieldType::Title));
        assert_eq!(FieldType::from_label("salary"), None);
    }

    #[test]
    fn test_experience_clause_is_inclusive() {
        let filter = ChunkFilter::ExperienceAtMost(3);
        assert!(filter.matches(&metadata(3, "서울 강남구")));
        assert!(!filter.matches(&metadata(4, "서울 강남구")));
    }

    #[test]
    fn test_conjunction_requires_both_clauses() {
        let filter = ChunkFilter::And(vec![
            ChunkFilter::ExperienceAtMost(3),
            ChunkFilter::LocationIn(vec!["서울 강남구".to_string()]),
        ]);
        assert!(filter.matches(&metadata(1, "서울 강남구")));
        assert!(!filter.matches(&metadata(1, "부산 중구")));
        assert!(!filter.matches(&metadata(5, "서울 강남구")));
    }

    #[test]
    fn test_empty_location_set_is_unsatisfiable() {
        let filter = ChunkFilter::And(vec![
            ChunkFilter::ExperienceAtMost(10),
            ChunkFilter::LocationIn(vec![]),
        ]);
        assert!(filter.is_unsatisfiable());
        assert!(!filter.matches(&metadata(0, "세종")));
        assert!(!ChunkFilter::ExperienceAtMost(0).is_unsatisfiable());
    }

    #[test]
    fn test_where_document_uses_schema_keys() {
        let filter = ChunkFilter::And(vec![
            ChunkFilter::ExperienceAtMost(3),
            ChunkFilter::LocationIn(vec!["서울 강남구".to_string()]),
        ]);
        let rendered = filter.to_where(&MetadataSchema::korean());
        assert_eq!(
            rendered,
            json!({"$and": [
                {"경력": {"$lte": 3}},
                {"근무위치": {"$in": ["서울 강남구"]}}
            ]})
        );
    }

    #[test]
    fn test_single_clause_has_no_and_wrapper() {
        let rendered = ChunkFilter::ExperienceAtMost(2).to_where(&MetadataSchema::english());
        assert_eq!(rendered, json!({"experience": {"$lte": 2}}));
    }

    #[test]
    fn test_parse_normalizes_numeric_posting_id() {
        let raw = json!({"공고id": 40123, "type": "주요업무", "경력": 2.0, "근무위치": "세종"});
        let parsed = MetadataSchema::korean()
            .parse(raw.as_object().unwrap())
            .unwrap();
        assert_eq!(parsed.posting_id, "40123");
        assert_eq!(parsed.field_type, FieldType::Responsibilities);
        assert_eq!(parsed.experience, 2);
        assert_eq!(parsed.location, "세종");
    }

    #[test]
    fn test_parse_float_posting_id_drops_fraction() {
        let raw = json!({"posting_id": 77.0, "field_type": "title", "experience": 0, "location": "x"});
        let parsed = MetadataSchema::english()
            .parse(raw.as_object().unwrap())
            .unwrap();
        assert_eq!(parsed.posting_id, "77");
    }

    #[test]
    fn test_parse_rejects_unknown_field_type() {
        let raw = json!({"posting_id": "1", "field_type": "salary", "experience": 0});
        let err = MetadataSchema::english()
            .parse(raw.as_object().unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("salary"));
    }
}
