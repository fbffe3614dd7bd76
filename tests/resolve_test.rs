//! End-to-end resolution: location string in, loaded graph out

use grandlite::graph::{GraphStore, PropertyValue};
use grandlite::source::{classify, Resolver, ResolverConfig, SourceError, SourceKind};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn resolve(location: &str) -> Result<std::sync::Arc<GraphStore>, SourceError> {
    Resolver::new(ResolverConfig::default()).resolve(location)
}

fn edge_keys(store: &GraphStore) -> Vec<(String, String)> {
    store
        .edges()
        .map(|e| {
            (
                store.get_node(e.source).unwrap().key.clone(),
                store.get_node(e.target).unwrap().key.clone(),
            )
        })
        .collect()
}

#[test]
fn test_headered_edge_list_keeps_remaining_columns() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "edges.csv", "src,tgt,weight\nA,B,5\nB,C,7\n");
    let store = resolve(&format!("h-edgelist(src:tgt)://{}", path.display())).unwrap();

    assert!(store.is_directed());
    assert_eq!(
        edge_keys(&store),
        vec![("A".to_string(), "B".to_string()), ("B".to_string(), "C".to_string())]
    );
    let weights: Vec<&PropertyValue> = store.edges().map(|e| &e.properties["weight"]).collect();
    assert_eq!(weights, vec![&PropertyValue::from("5"), &PropertyValue::from("7")]);
    for edge in store.edges() {
        assert_eq!(edge.properties.len(), 1);
    }
}

#[test]
fn test_sniffed_delimiters() {
    let dir = TempDir::new().unwrap();
    for (name, text) in [
        ("tabs.tsv", "src\ttgt\tw\nA\tB\t1\n"),
        ("pipes.txt", "src|tgt|w\nA|B|1\n"),
        ("semis.txt", "src;tgt;w\nA;B;1\n"),
    ] {
        let path = write(dir.path(), name, text);
        let store = resolve(&format!("h-edgelist(src:tgt)://{}", path.display())).unwrap();
        assert_eq!(edge_keys(&store), vec![("A".to_string(), "B".to_string())], "{}", name);
    }

    let path = write(dir.path(), "spaces.txt", "src tgt\nA B\n");
    let err = resolve(&format!("h-edgelist(src:tgt)://{}", path.display())).unwrap_err();
    assert!(matches!(err, SourceError::UndeterminedDelimiter));
}

#[test]
fn test_duplicate_rows_are_parallel_edges() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "dup.csv", "src,tgt\nA,B\nA,B\nB,A\n");
    let store = resolve(&format!("h-edgelist(src:tgt)://{}", path.display())).unwrap();
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.edge_count(), 3);
}

#[test]
fn test_classification_is_deterministic_and_location_first() {
    let dir = TempDir::new().unwrap();
    // GraphML markup behind a .gml name is still GML
    let path = write(dir.path(), "misleading.gml", "<graphml></graphml>");
    let location = path.to_str().unwrap();
    let config = ResolverConfig::default();

    let first = classify(location, &config).unwrap();
    assert!(matches!(first, SourceKind::Gml { compressed: false, .. }));
    for _ in 0..3 {
        assert_eq!(classify(location, &config).unwrap(), first);
    }
    assert!(matches!(resolve(location), Err(SourceError::Parse { .. })));
}

#[test]
fn test_content_sniffing_fallbacks() {
    let dir = TempDir::new().unwrap();
    let graphml = write(
        dir.path(),
        "graph.xml",
        r#"<graphml><graph edgedefault="directed"><node id="a"/><node id="b"/><edge source="a" target="b"/></graph></graphml>"#,
    );
    let store = resolve(graphml.to_str().unwrap()).unwrap();
    assert!(store.is_directed());
    assert_eq!(store.edge_count(), 1);

    let headered = write(dir.path(), "data", "source,target,kind\nx,y,friend\n");
    let store = resolve(headered.to_str().unwrap()).unwrap();
    assert_eq!(edge_keys(&store), vec![("x".to_string(), "y".to_string())]);

    let unknown = write(dir.path(), "notes", "hello\n");
    assert!(matches!(
        resolve(unknown.to_str().unwrap()),
        Err(SourceError::Unclassifiable(_))
    ));
    assert!(matches!(
        resolve(dir.path().join("missing").to_str().unwrap()),
        Err(SourceError::Unclassifiable(_))
    ));
}

#[test]
fn test_gml_and_graphml_files() {
    let dir = TempDir::new().unwrap();
    let gml = write(
        dir.path(),
        "people.gml",
        r#"graph [
  directed 1
  node [ id 0 label "alice" age 30 ]
  node [ id 1 label "bob" age 25 ]
  edge [ source 0 target 1 since 2019 ]
]"#,
    );
    let store = resolve(gml.to_str().unwrap()).unwrap();
    assert!(store.is_directed());
    assert_eq!(
        store.node_by_key("alice").unwrap().get_property("age"),
        Some(&PropertyValue::Integer(30))
    );

    let graphml = write(
        dir.path(),
        "g.graphml",
        r#"<graphml>
  <key id="w" for="edge" attr.name="weight" attr.type="int"/>
  <graph edgedefault="undirected">
    <node id="a"/><node id="b"/>
    <edge source="a" target="b"><data key="w">4</data></edge>
  </graph>
</graphml>"#,
    );
    let store = resolve(graphml.to_str().unwrap()).unwrap();
    assert!(!store.is_directed());
    let edge = store.edges().next().unwrap();
    assert_eq!(edge.get_property("weight"), Some(&PropertyValue::Integer(4)));
}

#[test]
fn test_vertex_edge_collection() {
    let dir = TempDir::new().unwrap();
    let people = write(dir.path(), "people.csv", "~id,~label,name\np1,Person,Alice\np2,Person,Bob\n");
    let places = write(dir.path(), "places.csv", "~id,~label,name\nc1,City,Berlin\n");
    let knows = write(dir.path(), "knows.csv", "~from,~to,~label\np1,p2,KNOWS\n");
    let lives = write(dir.path(), "lives.csv", "~from,~to,~label\np1,c1,LIVES_IN\np2,c1,LIVES_IN\n");

    let location = format!(
        "vertex:{},{};edge:{},{}",
        people.display(),
        places.display(),
        knows.display(),
        lives.display()
    );
    let store = resolve(&location).unwrap();
    assert!(store.is_directed());
    assert_eq!(store.node_count(), 3);
    assert_eq!(store.edge_count(), 3);
}

#[test]
fn test_legacy_pickle_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "old.gpickle", "not really a pickle");
    assert!(matches!(
        resolve(path.to_str().unwrap()),
        Err(SourceError::UnsupportedFormat(_))
    ));
}
