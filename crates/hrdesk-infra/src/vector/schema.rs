//! Arrow schema for the LanceDB corpus table.
//!
//! A single `corpus_fragments` table holds pre-embedded spans from all three
//! corpora (policy documents, employee records, FAQ) with a 384-dimensional
//! float32 vector field for BGESmallENV15 embeddings.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// BGESmallENV15 embedding dimension.
pub const EMBEDDING_DIMENSION: i32 = 384;

/// Schema for the corpus fragments table.
pub fn corpus_fragments_schema() -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("document_id", DataType::Utf8, false),
        Field::new("corpus", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("embedding_model", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                EMBEDDING_DIMENSION,
            ),
            false,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_fragments_schema_has_correct_fields() {
        let schema = corpus_fragments_schema();
        assert_eq!(schema.fields().len(), 7);
        assert!(schema.field_with_name("id").is_ok());
        assert!(schema.field_with_name("document_id").is_ok());
        assert!(schema.field_with_name("corpus").is_ok());
        assert!(schema.field_with_name("text").is_ok());
        assert!(schema.field_with_name("vector").is_ok());

        let vector_field = schema.field_with_name("vector").unwrap();
        match vector_field.data_type() {
            DataType::FixedSizeList(_, size) => assert_eq!(*size, EMBEDDING_DIMENSION),
            other => panic!("Expected FixedSizeList, got {:?}", other),
        }
    }

    #[test]
    fn test_embedding_dimension_constant() {
        assert_eq!(EMBEDDING_DIMENSION, 384);
    }
}
