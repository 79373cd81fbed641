//! End-to-end scenarios through the public crate surface
//!
//! Exercises the full flow - index, search, paginate, highlight, remove -
//! on both backend variants via the root re-exports only.

use gramdex::{
    InProcessKv, MemoryBackend, Metadata, RemoteBackend, SearchBackend, SearchConfig, SearchQuery,
};
use serde_json::json;

async fn scenario(backend: &dyn SearchBackend) {
    backend
        .index_document("a", "TypeScript is amazing", None)
        .await
        .unwrap();
    backend
        .index_document("b", "WebSockets enable real-time communication", None)
        .await
        .unwrap();

    // Exact term: only "a" matches, with a positive score
    let response = backend
        .search(&SearchQuery::new("typescript"))
        .await
        .unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.results[0].id, "a");
    assert!(response.results[0].score > 0.0);
    assert!(response.results[0]
        .highlights
        .iter()
        .any(|h| h.contains("<mark>TypeScript</mark>")));

    // Multi-term query: "b" outranks any incidental overlap
    let response = backend
        .search(&SearchQuery::new("real time"))
        .await
        .unwrap();
    assert!(!response.results.is_empty());
    assert_eq!(response.results[0].id, "b");

    // Removal makes the document unfindable
    backend.remove_document("b").await.unwrap();
    let response = backend
        .search(&SearchQuery::new("websockets"))
        .await
        .unwrap();
    assert_eq!(response.total, 0);
}

#[tokio::test]
async fn end_to_end_memory_backend() {
    let backend = MemoryBackend::new(SearchConfig::default());
    scenario(&backend).await;
}

#[tokio::test]
async fn end_to_end_remote_backend() {
    let backend = RemoteBackend::new(InProcessKv::new(), SearchConfig::default());
    scenario(&backend).await;
}

#[tokio::test]
async fn metadata_filters_and_pagination_compose() {
    let backend = MemoryBackend::new(SearchConfig::default());

    for i in 0..6 {
        let mut meta = Metadata::new();
        meta.insert(
            "shard".to_string(),
            json!(if i % 2 == 0 { "even" } else { "odd" }),
        );
        backend
            .index_document(&format!("doc{}", i), "paginated corpus entry", Some(meta))
            .await
            .unwrap();
    }

    let mut filters = Metadata::new();
    filters.insert("shard".to_string(), json!("even"));

    let page = backend
        .search(
            &SearchQuery::new("paginated")
                .with_filters(filters.clone())
                .with_limit(2),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.results.len(), 2);
    assert!(page.has_more);

    let rest = backend
        .search(
            &SearchQuery::new("paginated")
                .with_filters(filters)
                .with_limit(2)
                .with_offset(2),
        )
        .await
        .unwrap();
    assert_eq!(rest.results.len(), 1);
    assert!(!rest.has_more);
}

#[tokio::test]
async fn typo_and_prefix_queries_find_documents() {
    let backend = RemoteBackend::new(InProcessKv::new(), SearchConfig::default());
    backend
        .index_document("guide", "a complete tutorial for beginners", None)
        .await
        .unwrap();

    for query in ["tutoriel", "tutor", "tut"] {
        let response = backend.search(&SearchQuery::new(query)).await.unwrap();
        assert_eq!(response.total, 1, "query {:?} should match", query);
        assert_eq!(response.results[0].id, "guide");
    }
}
