//! LanceDB-backed retrieval store over the HR corpus.
//!
//! Implements `RetrievalStore` from `hrdesk-core`: the query is embedded
//! locally, searched with cosine distance against the pre-embedded corpus
//! fragments, and the results are floored and ordered by the engine's
//! ranking rules (score, then corpus priority, then document id).
//!
//! Corpus ingestion/chunking is out of scope; [`LanceCorpusStore::add`]
//! accepts fragments that already carry their embedding.

use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};

use hrdesk_core::retrieval::{Embedder, RetrievalStore, rank_fragments};
use hrdesk_types::error::RetrievalError;
use hrdesk_types::retrieval::{Corpus, RetrievedFragment};

use super::lance::LanceCorpusDb;
use super::schema::{EMBEDDING_DIMENSION, corpus_fragments_schema};

/// A corpus fragment as stored, with its provenance metadata.
#[derive(Debug, Clone)]
pub struct CorpusFragmentRecord {
    pub id: String,
    pub document_id: String,
    pub corpus: Corpus,
    pub text: String,
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
}

/// Retrieval store combining a LanceDB table with a query embedder.
pub struct LanceCorpusStore<E: Embedder> {
    db: LanceCorpusDb,
    embedder: E,
    min_score: f32,
}

impl<E: Embedder> LanceCorpusStore<E> {
    /// Build a store over an opened database with the given relevance floor.
    pub fn new(db: LanceCorpusDb, embedder: E, min_score: f32) -> Self {
        Self {
            db,
            embedder,
            min_score,
        }
    }

    async fn ensure_table(&self) -> Result<lancedb::Table, RetrievalError> {
        let schema = Arc::new(corpus_fragments_schema());
        self.db
            .ensure_table(LanceCorpusDb::corpus_table_name(), schema)
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("failed to open corpus table: {e}")))
    }

    /// Build an Arrow RecordBatch from a fragment record and its embedding.
    fn build_record_batch(
        record: &CorpusFragmentRecord,
        embedding: &[f32],
    ) -> Result<RecordBatch, RetrievalError> {
        let schema = Arc::new(corpus_fragments_schema());

        let id_array = StringArray::from(vec![record.id.clone()]);
        let document_id_array = StringArray::from(vec![record.document_id.clone()]);
        let corpus_array = StringArray::from(vec![record.corpus.to_string()]);
        let text_array = StringArray::from(vec![record.text.clone()]);
        let embedding_model_array = StringArray::from(vec![record.embedding_model.clone()]);
        let created_at_array = StringArray::from(vec![record.created_at.to_rfc3339()]);

        let values = Float32Array::from(embedding.to_vec());
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::new(field, EMBEDDING_DIMENSION, Arc::new(values), None);

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(id_array),
                Arc::new(document_id_array),
                Arc::new(corpus_array),
                Arc::new(text_array),
                Arc::new(embedding_model_array),
                Arc::new(created_at_array),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| RetrievalError::Unavailable(format!("failed to build record batch: {e}")))
    }

    /// Parse result rows into fragments using the `_distance` column added
    /// by the vector search. Cosine similarity is `1 - distance`.
    fn record_batch_to_fragments(batch: &RecordBatch) -> Vec<RetrievedFragment> {
        let num_rows = batch.num_rows();
        if num_rows == 0 {
            return vec![];
        }

        let document_id_col = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("document_id column should be StringArray");
        let corpus_col = batch
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("corpus column should be StringArray");
        let text_col = batch
            .column(3)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("text column should be StringArray");
        let distance_col = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

        let mut fragments = Vec::with_capacity(num_rows);
        for i in 0..num_rows {
            let corpus: Corpus = corpus_col.value(i).parse().unwrap_or(Corpus::Faq);
            let distance = distance_col.map_or(0.0, |d| d.value(i));
            fragments.push(RetrievedFragment {
                document_id: document_id_col.value(i).to_string(),
                text: text_col.value(i).to_string(),
                score: 1.0 - distance,
                corpus,
            });
        }

        fragments
    }

    /// Add a pre-embedded fragment to the corpus.
    pub async fn add(
        &self,
        record: &CorpusFragmentRecord,
        embedding: &[f32],
    ) -> Result<(), RetrievalError> {
        let table = self.ensure_table().await?;

        let batch = Self::build_record_batch(record, embedding)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("failed to add fragment: {e}")))?;

        Ok(())
    }

    /// Number of fragments in the corpus.
    pub async fn count(&self) -> Result<u64, RetrievalError> {
        if !self
            .db
            .table_exists(LanceCorpusDb::corpus_table_name())
            .await
        {
            return Ok(0);
        }
        let table = self.ensure_table().await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("failed to count rows: {e}")))?;
        Ok(count as u64)
    }
}

impl<E: Embedder> RetrievalStore for LanceCorpusStore<E> {
    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedFragment>, RetrievalError> {
        let embedding = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("embedder returned no vector".to_string()))?;

        let table = self.ensure_table().await?;

        // Fetch extra to account for the relevance floor filtering
        let results = table
            .vector_search(embedding.as_slice())
            .map_err(|e| RetrievalError::Unavailable(format!("vector search setup failed: {e}")))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(k * 2)
            .execute()
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("vector search failed: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("failed to collect results: {e}")))?;

        let fragments: Vec<RetrievedFragment> = batches
            .iter()
            .flat_map(Self::record_batch_to_fragments)
            .collect();

        Ok(rank_fragments(fragments, k, self.min_score))
    }
}
