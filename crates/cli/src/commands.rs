//! Runs one parsed command against a client and prints its result.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use contract::{
    ConfigMap, DataSourceConfig, LlmConfig, OperRouterClient, ResourceName, Row,
};
use serde::Serialize;
use tracing::info;

use crate::cli::{Command, CreateDatasource, CreateLlm, DatasourceCommand, LlmCommand};

/// Executes `command` and writes its result as pretty JSON to `out`.
///
/// Returns whether the service reported success. Transport and protocol
/// faults are returned as errors instead.
pub async fn run(
    client: &dyn OperRouterClient,
    command: Command,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    match command {
        Command::Ping => {
            let result = client.ping().await?;
            print(out, &result, result.success)
        }
        Command::Metadata => {
            let metadata = client.get_metadata().await?;
            print(out, &metadata, true)
        }
        Command::ValidateConfig { file } => {
            let config = read_config(&file)?;
            let result = client.validate_config(&config).await?;
            print(out, &result, result.success)
        }
        Command::LoadConfig { path } => {
            let result = client.load_config(&path).await?;
            print(out, &result, result.success)
        }
        Command::Datasource(command) => run_datasource(client, command, out).await,
        Command::Llm(command) => run_llm(client, command, out).await,
    }
}

async fn run_datasource(
    client: &dyn OperRouterClient,
    command: DatasourceCommand,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    match command {
        DatasourceCommand::Create(args) => {
            let name = resource(&args.name)?;
            let config = datasource_config(args);
            info!(datasource = %name, driver = %config.driver, "creating datasource");
            let result = client.create_datasource(&name, &config).await?;
            print(out, &result, result.success)
        }
        DatasourceCommand::Query { name, query } => {
            let result = client.query_datasource(&resource(&name)?, &query).await?;
            print(out, &result, result.success)
        }
        DatasourceCommand::Execute { name, query } => {
            let result = client.execute_datasource(&resource(&name)?, &query).await?;
            print(out, &result, result.success)
        }
        DatasourceCommand::Insert { name, data } => {
            let row: Row = serde_json::from_str(&data).context("row data must be a JSON object")?;
            let result = client.insert_datasource(&resource(&name)?, &row).await?;
            print(out, &result, result.success)
        }
        DatasourceCommand::Ping { name } => {
            let result = client.ping_datasource(&resource(&name)?).await?;
            print(out, &result, result.success)
        }
        DatasourceCommand::Close { name } => {
            let result = client.close_datasource(&resource(&name)?).await?;
            print(out, &result, result.success)
        }
    }
}

async fn run_llm(
    client: &dyn OperRouterClient,
    command: LlmCommand,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    match command {
        LlmCommand::Create(args) => {
            let name = resource(&args.name)?;
            let config = llm_config(args);
            info!(llm = %name, provider = %config.provider, "creating LLM");
            let result = client.create_llm(&name, &config).await?;
            print(out, &result, result.success)
        }
        LlmCommand::Generate { name, prompt } => {
            let result = client.generate_llm(&resource(&name)?, &prompt).await?;
            print(out, &result, result.success)
        }
        LlmCommand::Chat { name, messages } => {
            let result = client.chat_llm(&resource(&name)?, &messages).await?;
            print(out, &result, result.success)
        }
        LlmCommand::Embed { name, text } => {
            let result = client.embedding_llm(&resource(&name)?, &text).await?;
            print(out, &result, result.success)
        }
        LlmCommand::Ping { name } => {
            let result = client.ping_llm(&resource(&name)?).await?;
            print(out, &result, result.success)
        }
        LlmCommand::Close { name } => {
            let result = client.close_llm(&resource(&name)?).await?;
            print(out, &result, result.success)
        }
    }
}

fn print(out: &mut dyn Write, value: &impl Serialize, success: bool) -> anyhow::Result<bool> {
    serde_json::to_writer_pretty(&mut *out, value).context("cannot render result")?;
    writeln!(out)?;
    Ok(success)
}

fn resource(name: &str) -> anyhow::Result<ResourceName> {
    ResourceName::new(name).context("resource name must not be empty")
}

fn read_config(path: &Path) -> anyhow::Result<ConfigMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON object", path.display()))
}

fn datasource_config(args: CreateDatasource) -> DataSourceConfig {
    let mut config = DataSourceConfig::new(args.driver, args.host, args.port);
    if let Some(database) = args.database {
        config = config.with_database(database);
    }
    if let (Some(username), Some(password)) = (args.username, args.password) {
        config = config.with_credentials(username, password);
    }
    for (key, value) in args.extra {
        config = config.with_extra(key, value);
    }
    config
}

fn llm_config(args: CreateLlm) -> LlmConfig {
    let mut config = LlmConfig::new(args.provider, args.model);
    if let Some(api_key) = args.api_key {
        config = config.with_api_key(api_key);
    }
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }
    for (key, value) in args.extra {
        config = config.with_extra(key, value);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use clap::Parser;
    use contract::{
        ChatMessage, ClientError, EmbeddingResult, Metadata, OperationResult, QueryResult,
        TextResult,
    };

    use crate::cli::Cli;

    /// Records what each call received and reports `success` for every result.
    struct FakeClient {
        success: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn new(success: bool) -> Self {
            Self {
                success,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: String) -> OperationResult {
            self.calls.lock().unwrap().push(call);
            OperationResult::new(self.success, if self.success { "" } else { "refused" })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OperRouterClient for FakeClient {
        async fn ping(&self) -> Result<OperationResult, ClientError> {
            Ok(self.record("ping".into()))
        }
        async fn validate_config(&self, config: &ConfigMap) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("validate_config {}", config.len())))
        }
        async fn load_config(&self, path: &str) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("load_config {path}")))
        }
        async fn get_metadata(&self) -> Result<Metadata, ClientError> {
            Err(ClientError::Transport {
                message: "connection refused".into(),
            })
        }
        async fn create_datasource(
            &self,
            name: &ResourceName,
            config: &DataSourceConfig,
        ) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("create_datasource {name} {}", config.connection_locator())))
        }
        async fn query_datasource(&self, name: &ResourceName, query: &str) -> Result<QueryResult, ClientError> {
            self.record(format!("query_datasource {name} {query}"));
            Ok(QueryResult::new(self.success, Vec::new(), ""))
        }
        async fn execute_datasource(&self, name: &ResourceName, query: &str) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("execute_datasource {name} {query}")))
        }
        async fn insert_datasource(&self, name: &ResourceName, data: &Row) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("insert_datasource {name} {}", data.len())))
        }
        async fn ping_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("ping_datasource {name}")))
        }
        async fn close_datasource(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("close_datasource {name}")))
        }
        async fn create_llm(&self, name: &ResourceName, config: &LlmConfig) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("create_llm {name} {} {}", config.provider, config.model)))
        }
        async fn generate_llm(&self, name: &ResourceName, prompt: &str) -> Result<TextResult, ClientError> {
            self.record(format!("generate_llm {name} {prompt}"));
            Ok(TextResult::new(self.success, "text", ""))
        }
        async fn chat_llm(&self, name: &ResourceName, messages: &[ChatMessage]) -> Result<TextResult, ClientError> {
            let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
            self.record(format!("chat_llm {name} {}", roles.join(",")));
            Ok(TextResult::new(self.success, "text", ""))
        }
        async fn embedding_llm(&self, name: &ResourceName, text: &str) -> Result<EmbeddingResult, ClientError> {
            self.record(format!("embedding_llm {name} {text}"));
            Ok(EmbeddingResult::new(self.success, vec![0.5], ""))
        }
        async fn ping_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("ping_llm {name}")))
        }
        async fn close_llm(&self, name: &ResourceName) -> Result<OperationResult, ClientError> {
            Ok(self.record(format!("close_llm {name}")))
        }
    }

    async fn exec(client: &FakeClient, args: &[&str]) -> (anyhow::Result<bool>, String) {
        let cli = Cli::try_parse_from(std::iter::once("operrouter").chain(args.iter().copied())).unwrap();
        let mut out = Vec::new();
        let outcome = run(client, cli.command, &mut out).await;
        (outcome, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_success_prints_pretty_json() {
        let client = FakeClient::new(true);
        let (outcome, out) = exec(&client, &["ping"]).await;
        assert!(outcome.unwrap());
        let printed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(printed["success"], true);
        assert!(out.contains('\n'));
    }

    #[tokio::test]
    async fn test_application_failure_is_not_an_error() {
        let client = FakeClient::new(false);
        let (outcome, out) = exec(&client, &["llm", "close", "bot"]).await;
        assert!(!outcome.unwrap());
        assert!(out.contains("refused"));
    }

    #[tokio::test]
    async fn test_transport_fault_is_an_error() {
        let client = FakeClient::new(true);
        let (outcome, out) = exec(&client, &["metadata"]).await;
        assert!(outcome.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_datasource_create_builds_config() {
        let client = FakeClient::new(true);
        let args = [
            "datasource", "create", "db1", "--driver", "postgres", "--port", "5432",
            "--database", "x", "--username", "u", "--password", "p",
        ];
        exec(&client, &args).await.0.unwrap();
        assert_eq!(
            client.calls(),
            vec!["create_datasource db1 postgresql://u:p@localhost:5432/x"]
        );
    }

    #[tokio::test]
    async fn test_llm_commands_reach_client() {
        let client = FakeClient::new(true);
        exec(&client, &["llm", "create", "bot", "--provider", "openai", "--model", "gpt-4o-mini"])
            .await
            .0
            .unwrap();
        exec(&client, &["llm", "chat", "bot", "--message", "system:x", "--message", "user:y"])
            .await
            .0
            .unwrap();
        exec(&client, &["llm", "embed", "bot", "hello"]).await.0.unwrap();
        assert_eq!(
            client.calls(),
            vec![
                "create_llm bot openai gpt-4o-mini",
                "chat_llm bot system,user",
                "embedding_llm bot hello",
            ]
        );
    }

    #[tokio::test]
    async fn test_insert_parses_json_row() {
        let client = FakeClient::new(true);
        exec(&client, &["datasource", "insert", "db1", r#"{"id": 1, "name": "a"}"#])
            .await
            .0
            .unwrap();
        assert_eq!(client.calls(), vec!["insert_datasource db1 2"]);

        let (outcome, _) = exec(&client, &["datasource", "insert", "db1", "[1, 2]"]).await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_validate_config_reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{"port": 8080, "debug": true}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let client = FakeClient::new(true);
        exec(&client, &["validate-config", &path]).await.0.unwrap();
        assert_eq!(client.calls(), vec!["validate_config 2"]);
    }

    #[tokio::test]
    async fn test_empty_resource_name_is_rejected() {
        let client = FakeClient::new(true);
        let (outcome, _) = exec(&client, &["datasource", "ping", ""]).await;
        assert!(outcome.is_err());
        assert!(client.calls().is_empty());
    }
}
