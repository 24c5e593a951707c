use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::vector_store::{BoxFuture, ScoredPoint, VectorPoint, VectorStore, VectorStoreError};

struct StoredPoint {
    vector: Vec<f32>,
    payload: BTreeMap<String, String>,
}

/// Process-local store with brute-force cosine search.
pub struct InMemoryVectorStore {
    namespaces: RwLock<HashMap<String, HashMap<String, StoredPoint>>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records stored in `namespace`.
    #[must_use]
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .map(|ns| ns.get(namespace).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }

    /// Payload of the record `id` in `namespace`, if present.
    #[must_use]
    pub fn payload(&self, namespace: &str, id: &str) -> Option<BTreeMap<String, String>> {
        let ns = self.namespaces.read().ok()?;
        ns.get(namespace)?.get(id).map(|p| p.payload.clone())
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore").finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(&self, _vector_size: u64) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn upsert(
        &self,
        namespace: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let namespace = namespace.to_owned();
        Box::pin(async move {
            let mut all = self
                .namespaces
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let ns = all.entry(namespace).or_default();
            for p in points {
                ns.insert(
                    p.id,
                    StoredPoint {
                        vector: p.vector,
                        payload: p.payload,
                    },
                );
            }
            Ok(())
        })
    }

    fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredPoint>, VectorStoreError>> {
        let namespace = namespace.to_owned();
        Box::pin(async move {
            let all = self
                .namespaces
                .read()
                .map_err(|e| VectorStoreError::Query(e.to_string()))?;
            let Some(ns) = all.get(&namespace) else {
                return Ok(Vec::new());
            };

            let mut scored: Vec<ScoredPoint> = ns
                .iter()
                .map(|(id, sp)| ScoredPoint {
                    id: id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            scored.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
            scored.truncate(usize::try_from(top_k).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }
}
