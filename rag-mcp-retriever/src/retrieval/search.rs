//! Cross-root semantic search.
//!
//! Every candidate root is queried independently for its closest chunks; the per-root
//! answers are merged into one list ordered by ascending distance. Roots without an
//! index, and roots whose query fails, simply contribute nothing.

use futures::future::join_all;
use rag_mcp_embed::EmbeddingProvider;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::registry::RootRegistry;
use crate::storage::sqlite_store::SqliteStore;
use crate::storage::{ChunkStore, has_index};

/// Number of chunks requested from each root.
pub const TOP_K_PER_ROOT: usize = 5;

/// Matches strictly closer than this are labelled [`MatchDegree::High`].
pub const HIGH_MATCH_DISTANCE: f32 = 0.5;

/// Which roots a query runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    /// Always exactly this directory; any directory named by the caller is ignored.
    Pinned(PathBuf),
    /// The directory named by the caller, or every registered root when none is named.
    Registry,
}

impl SearchScope {
    /// Whether callers may pick the directory to search.
    pub fn accepts_directory(&self) -> bool {
        matches!(self, SearchScope::Registry)
    }

    /// Candidate roots for a query that optionally names `requested`.
    pub fn resolve(&self, requested: Option<&Path>, registry: &RootRegistry) -> Vec<PathBuf> {
        match self {
            SearchScope::Pinned(dir) => vec![dir.clone()],
            SearchScope::Registry => match requested {
                Some(dir) => vec![dir.to_path_buf()],
                None => registry.load(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchDegree {
    High,
    Medium,
}

impl MatchDegree {
    pub fn from_distance(distance: f32) -> Self {
        if distance < HIGH_MATCH_DISTANCE {
            MatchDegree::High
        } else {
            MatchDegree::Medium
        }
    }
}

/// A chunk returned by one root, before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub content: String,
    pub distance: f32,
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchContent {
    pub content: String,
    pub match_degree: MatchDegree,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchFile {
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchStats {
    /// Wall-clock seconds, rounded to milliseconds
    pub cost_time: f64,
    pub match_file_count: usize,
    pub match_chunk_count: usize,
}

/// Merged matches. `match_content[i]` and `file_info[i]` describe the same chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub match_content: Vec<MatchContent>,
    pub file_info: Vec<MatchFile>,
    pub stats: SearchStats,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// There was nothing to search
    NoRoots,
    /// Roots were searched but returned nothing
    NoMatches,
    Found(SearchResults),
}

/// Runs a query against several independently indexed roots.
#[derive(Clone)]
pub struct SearchAggregator {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for SearchAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchAggregator")
            .field("embedder", &self.embedder.provider_name())
            .finish()
    }
}

impl SearchAggregator {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Search `roots` for `keyword` and merge the results.
    pub async fn search(&self, keyword: &str, roots: &[PathBuf]) -> SearchOutcome {
        let start_time = Instant::now();
        if roots.is_empty() {
            return SearchOutcome::NoRoots;
        }
        info!("Searching {} roots for {:?}", roots.len(), keyword);

        let per_root = join_all(roots.iter().map(|root| self.query_root(root, keyword))).await;
        let mut matches: Vec<SearchMatch> = per_root.into_iter().flatten().collect();
        if matches.is_empty() {
            return SearchOutcome::NoMatches;
        }

        // Stable, so equal distances keep root order.
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let match_file_count = matches
            .iter()
            .map(|m| m.file_path.as_str())
            .collect::<HashSet<_>>()
            .len();
        let match_chunk_count = matches.len();

        let (match_content, file_info): (Vec<_>, Vec<_>) = matches
            .into_iter()
            .map(|m| {
                (
                    MatchContent {
                        content: m.content,
                        match_degree: MatchDegree::from_distance(m.distance),
                    },
                    MatchFile {
                        file_path: m.file_path,
                    },
                )
            })
            .unzip();

        let cost_time = (start_time.elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
        SearchOutcome::Found(SearchResults {
            match_content,
            file_info,
            stats: SearchStats {
                cost_time,
                match_file_count,
                match_chunk_count,
            },
        })
    }

    async fn query_root(&self, root: &Path, keyword: &str) -> Vec<SearchMatch> {
        if !has_index(root) {
            debug!("Skipping {}: not indexed", root.display());
            return Vec::new();
        }

        let store = match SqliteStore::open_existing(root, self.embedder.clone()).await {
            Ok(store) => store,
            Err(e) => {
                error!("Error searching in {}: {}", root.display(), e);
                return Vec::new();
            }
        };

        let result = store.query(keyword, TOP_K_PER_ROOT).await;
        store.close().await;

        match result {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| SearchMatch {
                    content: hit.text,
                    distance: hit.distance,
                    file_path: hit.metadata.file_path,
                })
                .collect(),
            Err(e) => {
                error!("Error searching in {}: {}", root.display(), e);
                Vec::new()
            }
        }
    }
}
