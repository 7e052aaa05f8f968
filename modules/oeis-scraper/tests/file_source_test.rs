use std::fs;
use std::sync::Arc;

use oeis_common::SeqId;
use oeis_scraper::{FileRecordSource, Pipeline, RecordSource};

fn write_seq_file(dir: &std::path::Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_scan_indexes_nested_tree() {
    let root = tempfile::tempdir().unwrap();
    let sub = root.path().join("A000");
    fs::create_dir(&sub).unwrap();

    write_seq_file(root.path(), "A000001.seq", "%N A000001 Groups of order n.\n");
    write_seq_file(&sub, "A000002.seq", "%N A000002 Kolakoski sequence.\n");
    write_seq_file(&sub, "notes.txt", "not a record");
    write_seq_file(&sub, "badname.seq", "%N mislabeled\n");

    let source = FileRecordSource::scan(root.path()).unwrap();
    assert_eq!(
        source.ids(),
        vec![SeqId::from_number(1), SeqId::from_number(2)]
    );
}

#[tokio::test]
async fn test_load_pipeline_over_seq_files() {
    let root = tempfile::tempdir().unwrap();
    write_seq_file(
        root.path(),
        "A000045.seq",
        "%I A000045 M0692 N0256\n\
         %N A000045 Fibonacci numbers.\n\
         %D A000045 D. E. Knuth, The Art of Computer Programming, Vol. 1.\n\
         %A A000045 N. J. A. Sloane\n",
    );

    let source = FileRecordSource::scan(root.path()).unwrap();
    let ids = source.ids();
    let pipeline = Pipeline::new(Arc::new(source) as Arc<dyn RecordSource>, 2, 50);
    let outcome = pipeline.scrape(ids).await;

    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.triples.len(), 3);

    let description = outcome
        .triples
        .iter()
        .find(|t| t.relationship == "HAS_DESCRIPTION")
        .unwrap();
    assert_eq!(description.to_id, "Fibonacci numbers.");

    let author = outcome
        .triples
        .iter()
        .find(|t| t.relationship == "HAS_AUTHOR")
        .unwrap();
    assert_eq!(author.from_id, SeqId::from_number(45));
    assert_eq!(author.to_id, "N. J. A. Sloane");

    let reference = outcome
        .triples
        .iter()
        .find(|t| t.relationship == "HAS_REFERENCE")
        .unwrap();
    assert!(reference.to_id.starts_with("D. E. Knuth"));
}

#[test]
fn test_scan_missing_directory_is_an_error() {
    let result = FileRecordSource::scan(std::path::Path::new("/nonexistent/seqs"));
    assert!(matches!(result, Err(ref e) if e.to_string().contains("/nonexistent/seqs")));
}
