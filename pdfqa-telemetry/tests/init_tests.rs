//! Global subscriber installation.

use std::sync::Arc;

use pdfqa_telemetry::{LogFormat, SharedTraceStorage, TelemetryError, init_with_storage};
use tracing::info_span;

#[tokio::test]
async fn installs_once_and_captures_stage_spans() {
    let storage = Arc::new(SharedTraceStorage::new());
    init_with_storage(LogFormat::Text, Arc::clone(&storage)).unwrap();

    {
        let _question = info_span!("pdfqa.question", question.id = "q-42").entered();
        let _ask = info_span!("pdfqa.ask").entered();
        tracing::info!("answered question");
    }

    let spans = storage.get_trace("q-42").expect("spans captured under question id");
    let names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["pdfqa.question", "pdfqa.ask"]);
    assert!(spans.iter().all(|s| s.start_time > 0));

    let second = init_with_storage(LogFormat::Json, storage);
    assert!(matches!(second, Err(TelemetryError::Init(_))));
}
