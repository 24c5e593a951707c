use std::collections::{BTreeMap, HashMap};

use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance, FieldType,
    Filter, PointId, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value,
    VectorParamsBuilder,
};

use crate::vector_store::{BoxFuture, ScoredPoint, VectorPoint, VectorStore, VectorStoreError};

const NAMESPACE_FIELD: &str = "namespace";
const RECORD_ID_FIELD: &str = "record_id";

/// Qdrant-backed store. All namespaces share one collection and are separated
/// by a keyword-indexed `namespace` payload field.
#[derive(Clone)]
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl std::fmt::Debug for QdrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantStore")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl QdrantStore {
    /// Create a store talking to the Qdrant gRPC endpoint at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn new(url: &str, collection: impl Into<String>) -> Result<Self, VectorStoreError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            collection: collection.into(),
        })
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn create_collection_if_missing(&self, vector_size: u64) -> Result<(), VectorStoreError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
        if exists {
            return Ok(());
        }

        tracing::info!(collection = %self.collection, vector_size, "creating Qdrant collection");
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
            )
            .await
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;

        self.client
            .create_field_index(CreateFieldIndexCollectionBuilder::new(
                &self.collection,
                NAMESPACE_FIELD,
                FieldType::Keyword,
            ))
            .await
            .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
        Ok(())
    }

    async fn upsert_points(
        &self,
        namespace: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorStoreError> {
        if points.is_empty() {
            return Ok(());
        }
        let count = points.len();
        let qdrant_points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| {
                let point_id = point_uuid(namespace, &p.id);
                PointStruct::new(point_id, p.vector, to_payload(namespace, p.id, p.payload))
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, qdrant_points).wait(true))
            .await
            .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
        tracing::debug!(namespace, count, "upserted points");
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<ScoredPoint>, VectorStoreError> {
        let builder = SearchPointsBuilder::new(&self.collection, vector, top_k)
            .with_payload(true)
            .filter(Filter::must([Condition::matches(
                NAMESPACE_FIELD,
                namespace.to_owned(),
            )]));
        let response = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| VectorStoreError::Query(e.to_string()))?;
        Ok(response.result.into_iter().map(from_scored_point).collect())
    }
}

impl VectorStore for QdrantStore {
    fn ensure_collection(&self, vector_size: u64) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(self.create_collection_if_missing(vector_size))
    }

    fn upsert(
        &self,
        namespace: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let namespace = namespace.to_owned();
        Box::pin(async move { self.upsert_points(&namespace, points).await })
    }

    fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredPoint>, VectorStoreError>> {
        let namespace = namespace.to_owned();
        Box::pin(async move { self.search(&namespace, vector, top_k).await })
    }
}

/// Deterministic Qdrant point id for a logical record id within a namespace.
#[must_use]
pub fn point_uuid(namespace: &str, id: &str) -> String {
    uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        format!("{namespace}/{id}").as_bytes(),
    )
    .to_string()
}

fn to_payload(
    namespace: &str,
    id: String,
    payload: BTreeMap<String, String>,
) -> HashMap<String, Value> {
    let mut out: HashMap<String, Value> = payload
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect();
    out.insert(NAMESPACE_FIELD.to_owned(), Value::from(namespace.to_owned()));
    out.insert(RECORD_ID_FIELD.to_owned(), Value::from(id));
    out
}

fn from_scored_point(point: qdrant_client::qdrant::ScoredPoint) -> ScoredPoint {
    let mut payload: BTreeMap<String, String> = point
        .payload
        .into_iter()
        .filter_map(|(k, v)| match v.kind {
            Some(Kind::StringValue(s)) => Some((k, s)),
            _ => None,
        })
        .collect();
    payload.remove(NAMESPACE_FIELD);
    let id = payload
        .remove(RECORD_ID_FIELD)
        .or_else(|| point.id.and_then(point_id_string))
        .unwrap_or_default();
    ScoredPoint {
        id,
        score: point.score,
        payload,
    }
}

fn point_id_string(id: PointId) -> Option<String> {
    match id.point_id_options? {
        PointIdOptions::Num(n) => Some(n.to_string()),
        PointIdOptions::Uuid(u) => Some(u),
    }
}
