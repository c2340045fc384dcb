use crate::common::{config_for, read, MockClient, SESSIONS};
use sessoes_enricher::client::DryRunClient;
use sessoes_enricher::config::{NewsLayout, TaskKind};
use sessoes_enricher::{
    process_table, CallError, ClientError, ConfigError, EnrichError, RowState,
};
use tempfile::TempDir;

/// Parses an output table back into rows, header included
fn rows(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_single_topic_record() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), "tema,punchline,relator\nCaso X,,\n");
    let client = MockClient::scripted(vec![Ok(
        "```json\n{\"noticia_TSE\": [\"https://tse.jus.br/a\"], \"noticia_TRE\": [], \"noticia_geral\": [\"folha.uol.com.br/b\"]}\n```"
            .to_string(),
    )]);

    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(stats.count(RowState::Queried), 1);
    assert!(client.prompts()[0].contains("Context:\ntema: Caso X\n"));

    let output = rows(&config.resolved_output_path());
    assert_eq!(
        output[0],
        vec!["tema", "punchline", "relator", "noticia_TSE", "noticia_TRE", "noticia_geral"]
    );
    assert_eq!(
        output[1],
        vec!["Caso X", "", "", "https://tse.jus.br/a", "", "https://folha.uol.com.br/b"]
    );
}

#[tokio::test]
async fn test_blank_record_makes_no_call() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), "tema,relator,observacao\n,  ,ignorada\n");
    let client = MockClient::new();

    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(client.calls(), 0);
    assert_eq!(stats.count(RowState::NoContext), 1);
    assert_eq!(
        rows(&config.resolved_output_path())[1],
        vec!["", "  ", "ignorada", "", "", ""]
    );
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_degrade_the_record() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), "tema\nCaso X\nCaso Y\n");
    config.retry.max_retries = 3;
    let client = MockClient::scripted(vec![
        Err(ClientError::Transient("HTTP 503".to_string())),
        Err(ClientError::Transient("HTTP 503".to_string())),
        Err(ClientError::Transient("HTTP 503".to_string())),
        Ok(r#"{"noticia_TSE": ["https://tse.jus.br/late"]}"#.to_string()),
    ]);

    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(stats.degraded(), 1);
    assert_eq!(stats.count(RowState::Queried), 1);
    assert_eq!(client.calls(), 4);

    let output = rows(&config.resolved_output_path());
    assert_eq!(output[1], vec!["Caso X", "", "", ""]);
    // The fourth answer belongs to the next record
    assert_eq!(output[2], vec!["Caso Y", "https://tse.jus.br/late", "", ""]);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_then_success() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), "tema\nCaso X\n");
    let client = MockClient::scripted(vec![
        Err(ClientError::RateLimited("HTTP 429".to_string())),
        Ok(String::new()),
        Ok(r#"{"noticia_geral": ["https://www.conjur.com.br/x"]}"#.to_string()),
    ]);

    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(stats.count(RowState::Queried), 1);
    assert_eq!(client.calls(), 3);
    assert_eq!(
        rows(&config.resolved_output_path())[1],
        vec!["Caso X", "", "", "https://www.conjur.com.br/x"]
    );
}

#[tokio::test]
async fn test_rejected_and_duplicate_links_are_dropped() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), "tema\nCaso X\n");
    let client = MockClient::scripted(vec![Ok(r#"{
        "noticia_TSE": ["https://www.tse.jus.br/a", "https://WWW.TSE.jus.br/a", "https://blog.example.com/a"],
        "noticia_TRE": ["https://www.tre-mg.jus.br/b", "https://www.stf.jus.br/c"],
        "noticia_geral": ["https://g1.globo.com/d", "https://g1.globo.com/e"]
    }"#
    .to_string())]);

    process_table(&config, &client).await.unwrap();

    assert_eq!(
        rows(&config.resolved_output_path())[1],
        vec![
            "Caso X",
            "https://www.tse.jus.br/a",
            "https://www.tre-mg.jus.br/b",
            "https://g1.globo.com/d, https://g1.globo.com/e"
        ]
    );
}

#[tokio::test]
async fn test_full_table_keeps_input_order() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path(), SESSIONS);
    let client = MockClient::new();

    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(client.calls(), 4);
    assert_eq!(stats.processed(), 5);
    assert!(stats.is_complete());

    let output = rows(&config.resolved_output_path());
    let temas: Vec<&str> = output[1..].iter().map(|r| r[0].as_str()).collect();
    assert_eq!(temas, vec!["Caso A", "Caso B", "", "Caso D", "Caso E"]);
    assert_eq!(output[2][2], "MDB, PSD");
    assert_eq!(output[4][2], "Linha 1\nLinha 2");
    assert_eq!(output[4][3], "https://www.tse.jus.br/caso-d");
}

#[tokio::test]
async fn test_spread_layout_reserves_overflow_columns() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), "tema\nCaso X\n");
    config.task.news_layout = NewsLayout::Spread;
    config.task.max_overflow_columns = 2;
    let client = MockClient::scripted(vec![Ok(
        r#"{"noticia_geral": ["https://cnn.com/1", "https://cnn.com/2"]}"#.to_string(),
    )]);

    process_table(&config, &client).await.unwrap();

    let output = rows(&config.resolved_output_path());
    assert_eq!(
        output[0],
        vec![
            "tema",
            "noticia_TSE",
            "noticia_TRE",
            "noticia_geral",
            "noticia_geral_1",
            "noticia_geral_2"
        ]
    );
    assert_eq!(
        output[1],
        vec!["Caso X", "", "", "https://cnn.com/1", "https://cnn.com/2", ""]
    );
}

#[tokio::test]
async fn test_theses_task() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(
        dir.path(),
        "Tema,Ementa\n\
         1,\"Há repercussão geral na questão.\"\n\
         2,\"Ementa sem tese.\"\n\
         3,\"Fixada a seguinte tese: É constitucional X.\"\n\
         4,\n",
    );
    config.task.kind = TaskKind::Theses;
    let client = MockClient::scripted(vec![
        Ok("N/A".to_string()),
        Ok("```\nÉ constitucional X.\n```".to_string()),
        Ok("A decisão garante X a todos.".to_string()),
    ]);

    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(client.calls(), 3);
    assert_eq!(stats.count(RowState::Precomputed), 1);
    assert_eq!(stats.count(RowState::Queried), 2);
    assert_eq!(stats.count(RowState::NoContext), 1);

    let output = rows(&config.resolved_output_path());
    assert_eq!(output[0][2..], ["Tese", "Justificativa", "Resultado"]);
    assert_eq!(
        output[1][2..],
        [
            "Repercussão geral reconhecida, mas mérito pendente de julgamento.",
            "",
            "Aguardando julgamento"
        ]
    );
    assert_eq!(output[2][2..], ["N/A", "", "Infraconstitucional"]);
    assert_eq!(
        output[3][2..],
        ["É constitucional X.", "A decisão garante X a todos.", "Tese fixada"]
    );
    assert_eq!(output[4][2..], ["", "", ""]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_justification_keeps_the_thesis() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), "Tema,Ementa\n7,\"Fixada a tese: É legal Y.\"\n");
    config.task.kind = TaskKind::Theses;
    config.retry.max_retries = 3;
    let client = MockClient::scripted(vec![
        Ok("É legal Y.".to_string()),
        Err(ClientError::Transient("HTTP 503".to_string())),
        Err(ClientError::Transient("HTTP 503".to_string())),
        Err(ClientError::Transient("HTTP 503".to_string())),
    ]);

    let stats = process_table(&config, &client).await.unwrap();

    assert_eq!(client.calls(), 4);
    assert_eq!(stats.count(RowState::Queried), 1);
    assert_eq!(stats.degraded(), 0);
    assert_eq!(
        rows(&config.resolved_output_path())[1][2..],
        ["É legal Y.", "", "Tese fixada"]
    );
}

#[tokio::test]
async fn test_fatal_justification_failure_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), "Tema,Ementa\n7,\"Fixada a tese: É legal Y.\"\n");
    config.task.kind = TaskKind::Theses;
    let client = MockClient::scripted(vec![
        Ok("É legal Y.".to_string()),
        Err(ClientError::Fatal("HTTP 403".to_string())),
    ]);

    let result = process_table(&config, &client).await;

    assert!(matches!(result, Err(EnrichError::Call(CallError::Fatal(_)))));
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn test_dry_run_writes_placeholders() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), "tema\nCaso X\n");
    config.run.dry_run = true;
    let client = DryRunClient::new(config.classifier.authority_domain.clone());

    process_table(&config, &client).await.unwrap();

    let output = rows(&config.resolved_output_path());
    assert!(output[1][1].starts_with("https://www.tse.jus.br/dry-run/"));
    assert_eq!(output[1][2], "");
}

#[tokio::test]
async fn test_derived_output_path() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), "tema\nCaso X\n");
    config.run.output_path = None;
    let client = MockClient::new();

    process_table(&config, &client).await.unwrap();

    assert!(read(&dir.path().join("sessoes_noticias.csv")).starts_with("tema,noticia_TSE"));
}

#[tokio::test]
async fn test_missing_input_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), "tema\n");
    config.run.input_path = dir.path().join("nao_existe.csv");
    let client = MockClient::new();

    let result = process_table(&config, &client).await;

    assert!(matches!(
        result,
        Err(EnrichError::Config(ConfigError::MissingInput(_)))
    ));
    assert!(!config.resolved_output_path().exists());
}
