use crate::common::{config_for, read, MockClient, SESSIONS};
use sessoes_enricher::config::{Config, FailurePolicy, ProgressMode};
use sessoes_enricher::{process_table, CallError, ConfigError, EnrichError, RowState};
use std::fs;
use tempfile::TempDir;

/// Output of one uninterrupted run over `SESSIONS`
async fn uninterrupted_output(mode: ProgressMode) -> String {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), SESSIONS);
    config.run.mode = mode;
    process_table(&config, &MockClient::new()).await.unwrap();
    read(&config.resolved_output_path())
}

#[tokio::test]
async fn test_resume_matches_uninterrupted_run() {
    let expected = uninterrupted_output(ProgressMode::Stream).await;

    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), SESSIONS);
    config.run.limit = 2;
    process_table(&config, &MockClient::new()).await.unwrap();

    config.run.limit = 0;
    config.run.resume = true;
    let client = MockClient::new();
    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(stats.resumed_from(), 2);
    assert_eq!(stats.processed(), 3);
    assert_eq!(client.calls(), 2);
    assert!(client.prompts()[0].contains("tema: Caso D"));
    assert_eq!(read(&config.resolved_output_path()), expected);
}

#[tokio::test]
async fn test_resume_of_a_finished_run_does_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), SESSIONS);
    process_table(&config, &MockClient::new()).await.unwrap();
    let first = read(&config.resolved_output_path());

    config.run.resume = true;
    let client = MockClient::new();
    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(client.calls(), 0);
    assert_eq!(stats.processed(), 0);
    assert!(stats.is_complete());
    assert_eq!(read(&config.resolved_output_path()), first);
}

#[tokio::test]
async fn test_torn_last_row_is_reprocessed() {
    let expected = uninterrupted_output(ProgressMode::Stream).await;

    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), SESSIONS);
    config.run.limit = 2;
    process_table(&config, &MockClient::new()).await.unwrap();

    // A crash in the middle of the third row
    let output = config.resolved_output_path();
    let mut partial = read(&output);
    partial.push_str(",,,https://www.tse");
    fs::write(&output, partial).unwrap();

    config.run.limit = 0;
    config.run.resume = true;
    let stats = process_table(&config, &MockClient::new()).await.unwrap();

    assert_eq!(stats.resumed_from(), 2);
    assert_eq!(stats.count(RowState::NoContext), 1);
    assert_eq!(read(&output), expected);
}

#[tokio::test]
async fn test_header_mismatch_aborts_before_processing() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), SESSIONS);
    config.run.resume = true;
    let output = config.resolved_output_path();
    fs::write(&output, "tema,relator,noticia_TSE\nCaso A,Min. X,\n").unwrap();

    let client = MockClient::new();
    let result = process_table(&config, &client).await;

    match result {
        Err(EnrichError::Config(ConfigError::HeaderMismatch {
            expected, found, ..
        })) => {
            assert_eq!(expected.len(), 6);
            assert_eq!(found, vec!["tema", "relator", "noticia_TSE"]);
        }
        other => panic!("expected a header mismatch, got {:?}", other.map(|_| ())),
    }
    assert_eq!(client.calls(), 0);
    assert_eq!(read(&output), "tema,relator,noticia_TSE\nCaso A,Min. X,\n");
}

#[tokio::test]
async fn test_without_resume_the_output_is_recreated() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), SESSIONS);
    fs::write(config.resolved_output_path(), "lixo\n").unwrap();

    let client = MockClient::new();
    process_table(&config, &client).await.unwrap();

    assert_eq!(client.calls(), 4);
    assert_eq!(
        read(&config.resolved_output_path()),
        uninterrupted_output(ProgressMode::Stream).await
    );
}

#[tokio::test]
async fn test_abort_keeps_written_rows_for_resume() {
    let expected = uninterrupted_output(ProgressMode::Stream).await;

    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), SESSIONS);
    assert_eq!(config.retry.on_fatal, FailurePolicy::Abort);

    let result = process_table(&config, &MockClient::failing_on("Caso D")).await;
    assert!(matches!(result, Err(EnrichError::Call(CallError::Fatal(_)))));
    assert_eq!(read(&config.resolved_output_path()).lines().count(), 4);

    let mut config = config;
    config.run.resume = true;
    process_table(&config, &MockClient::new()).await.unwrap();

    assert_eq!(read(&config.resolved_output_path()), expected);
}

#[tokio::test]
async fn test_checkpoint_mode_matches_stream_mode() {
    let expected = uninterrupted_output(ProgressMode::Stream).await;
    assert_eq!(uninterrupted_output(ProgressMode::Checkpoint).await, expected);
}

#[tokio::test]
async fn test_checkpoint_resume_after_abort() {
    let expected = uninterrupted_output(ProgressMode::Stream).await;

    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), SESSIONS);
    config.run.mode = ProgressMode::Checkpoint;
    let output = config.resolved_output_path();
    let checkpoint = Config::checkpoint_path(&output);

    let result = process_table(&config, &MockClient::failing_on("Caso D")).await;
    assert!(result.is_err());
    assert!(checkpoint.exists());
    assert!(!output.exists());

    config.run.resume = true;
    let client = MockClient::new();
    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(stats.resumed_from(), 3);
    assert_eq!(stats.count(RowState::Skipped), 3);
    assert_eq!(client.calls(), 2);
    assert!(!checkpoint.exists());
    assert_eq!(read(&output), expected);
}

#[tokio::test]
async fn test_checkpoint_rejects_a_changed_input() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), SESSIONS);
    config.run.mode = ProgressMode::Checkpoint;

    let result = process_table(&config, &MockClient::failing_on("Caso B")).await;
    assert!(result.is_err());

    fs::write(&config.run.input_path, format!("{}Caso F,,\n", SESSIONS)).unwrap();
    config.run.resume = true;
    let client = MockClient::new();
    let result = process_table(&config, &client).await;

    assert!(matches!(
        result,
        Err(EnrichError::Config(ConfigError::CheckpointMismatch { .. }))
    ));
    assert_eq!(client.calls(), 0);
}
