//! WASM transport tests: inline WAT modules plus an axum JSON-RPC stub.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{extract::State, routing::post, Json, Router};
use contract::{
    ChatMessage, ClientConfig, ClientError, ConfigMap, DataSourceConfig, DomainValue, LlmConfig,
    OperRouterClient, ResourceName, Row,
};
use jsonrpc::methods;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use wasm_bridge::{ModuleHost, WasmClient};

const METADATA: &str = r#"{"name":"operrouter-core","version":"0.3.0"}"#;

/// `get_metadata` returns [`METADATA`]; when `with_validator` is set the
/// module also exports a bump `alloc` and a `validate_config` that echoes
/// its input back as the reply.
fn core_module(with_validator: bool) -> String {
    let validator = if with_validator {
        r#"(func (export "alloc") (param i32) (result i32) (i32.const 1024))
           (func (export "validate_config") (param $ptr i32) (param $len i32) (result i64)
             (i64.or
               (i64.shl (i64.extend_i32_u (local.get $ptr)) (i64.const 32))
               (i64.extend_i32_u (local.get $len))))"#
    } else {
        ""
    };
    format!(
        r#"(module
             (memory (export "memory") 1)
             (data (i32.const 16) "{}")
             (func (export "get_metadata") (result i64)
               (i64.or (i64.shl (i64.const 16) (i64.const 32)) (i64.const {})))
             {validator})"#,
        METADATA.replace('"', "\\\""),
        METADATA.len()
    )
}

#[derive(Clone, Default)]
struct Stub {
    methods: Arc<Mutex<Vec<String>>>,
}

impl Stub {
    fn methods(&self) -> Vec<String> {
        self.methods.lock().unwrap().clone()
    }
}

async fn echo(State(stub): State<Stub>, Json(req): Json<Value>) -> Json<Value> {
    let method = req["method"].as_str().unwrap_or_default().to_string();
    stub.methods.lock().unwrap().push(method.clone());
    let result = match method.as_str() {
        "datasource.ping" | "llm.ping" => {
            json!({"success": true, "healthy": false, "message": "unreachable"})
        }
        "validate_config" => json!({"success": false, "message": "checked remotely"}),
        "datasource.query" => json!({"success": true, "rows": [{"n": 1}]}),
        "llm.generate" | "llm.chat" => json!({"success": true, "text": "reply"}),
        "llm.embedding" => json!({"success": true, "embedding": [0.5]}),
        _ => json!({"success": true, "message": ""}),
    };
    Json(json!({"jsonrpc": "2.0", "result": result, "id": req["id"]}))
}

async fn serve(stub: Stub) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/", post(echo)).with_state(stub);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn client(with_validator: bool) -> (WasmClient, Stub) {
    let stub = Stub::default();
    let url = serve(stub.clone()).await;
    let host = ModuleHost::from_bytes(core_module(with_validator)).await.unwrap();
    let client = WasmClient::with_host(ClientConfig::new(url).unwrap(), host).unwrap();
    (client, stub)
}

#[tokio::test]
async fn test_metadata_comes_from_the_module() {
    let (client, stub) = client(false).await;
    let metadata = client.get_metadata().await.unwrap();
    assert_eq!(metadata.name, "operrouter-core");
    assert_eq!(metadata.version, "0.3.0");
    assert_eq!(metadata.description, None);
    assert!(stub.methods().is_empty());
}

#[tokio::test]
async fn test_module_validator_answers_locally() {
    let (client, stub) = client(true).await;
    let mut config = ConfigMap::new();
    config.insert("success".into(), DomainValue::Bool(true));
    config.insert("message".into(), DomainValue::from("ok"));

    let result = client.validate_config(&config).await.unwrap();
    assert!(result.success);
    assert_eq!(result.message, "ok");
    assert!(stub.methods().is_empty());
}

#[tokio::test]
async fn test_module_validation_failure_gets_a_diagnostic() {
    let (client, _stub) = client(true).await;
    let mut config = ConfigMap::new();
    config.insert("success".into(), DomainValue::Bool(false));

    let result = client.validate_config(&config).await.unwrap();
    assert!(!result.success);
    assert!(!result.message.is_empty());
}

#[tokio::test]
async fn test_validation_is_forwarded_without_module_validator() {
    let (client, stub) = client(false).await;
    let result = client.validate_config(&ConfigMap::new()).await.unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "checked remotely");
    assert_eq!(stub.methods(), vec!["validate_config"]);
}

#[tokio::test]
async fn test_other_operations_forward_over_jsonrpc() {
    let (client, stub) = client(true).await;
    let db = ResourceName::new("db1").unwrap();

    assert!(client.ping().await.unwrap().success);
    assert!(client.execute_datasource(&db, "DELETE FROM t").await.unwrap().success);
    assert!(client.close_datasource(&db).await.unwrap().success);

    assert_eq!(
        stub.methods(),
        vec!["ping", "datasource.execute", "datasource.close"]
    );
}

#[tokio::test]
async fn test_unhealthy_pings_report_failure() {
    let (client, _stub) = client(false).await;

    let datasource = client.ping_datasource(&ResourceName::new("db1").unwrap()).await.unwrap();
    assert!(!datasource.success);
    assert_eq!(datasource.message, "unreachable");

    let llm = client.ping_llm(&ResourceName::new("bot").unwrap()).await.unwrap();
    assert!(!llm.success);
    assert_eq!(llm.message, "unreachable");
}

#[tokio::test]
async fn test_every_remote_operation_is_forwarded() {
    let (client, stub) = client(false).await;
    let db = ResourceName::new("db1").unwrap();
    let bot = ResourceName::new("bot").unwrap();
    let mut row = Row::new();
    row.insert("n".into(), DomainValue::Integer(1));

    client.ping().await.unwrap();
    client.validate_config(&ConfigMap::new()).await.unwrap();
    client.load_config("/etc/operrouter.toml").await.unwrap();
    client.get_metadata().await.unwrap();
    client
        .create_datasource(&db, &DataSourceConfig::new("postgres", "localhost", 5432))
        .await
        .unwrap();
    let rows = client.query_datasource(&db, "SELECT 1").await.unwrap();
    assert_eq!(rows.rows, vec![row.clone()]);
    client.execute_datasource(&db, "DELETE FROM t").await.unwrap();
    client.insert_datasource(&db, &row).await.unwrap();
    client.ping_datasource(&db).await.unwrap();
    client.close_datasource(&db).await.unwrap();
    client.create_llm(&bot, &LlmConfig::new("openai", "gpt-4")).await.unwrap();
    assert_eq!(client.generate_llm(&bot, "hi").await.unwrap().text, "reply");
    let messages = [ChatMessage::new("user", "hi")];
    assert_eq!(client.chat_llm(&bot, &messages).await.unwrap().text, "reply");
    assert_eq!(client.embedding_llm(&bot, "hi").await.unwrap().embedding, vec![0.5]);
    client.ping_llm(&bot).await.unwrap();
    client.close_llm(&bot).await.unwrap();

    let expected: Vec<&str> = methods::ALL
        .into_iter()
        .filter(|method| *method != methods::GET_METADATA)
        .collect();
    assert_eq!(stub.methods(), expected);
}

#[tokio::test]
async fn test_spinning_module_is_cut_off_at_the_timeout() {
    let spinning = r#"(module
        (memory (export "memory") 1)
        (func (export "get_metadata") (result i64)
          (loop $spin (br $spin))
          (i64.const 0)))"#;
    let host = ModuleHost::from_bytes(spinning).await.unwrap();
    let config = ClientConfig::new("http://127.0.0.1:9")
        .unwrap()
        .with_timeout(Duration::from_millis(50));
    let client = WasmClient::with_host(config, host).unwrap();

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = tokio::spawn({
        let ticks = Arc::clone(&ticks);
        async move {
            loop {
                tokio::time::sleep(Duration::from_millis(5)).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        }
    });

    let started = Instant::now();
    let result = client.get_metadata().await;
    let elapsed = started.elapsed();

    assert!(matches!(
        result,
        Err(ClientError::Timeout { after }) if after == Duration::from_millis(50)
    ));
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    // The single runtime thread kept serving other tasks meanwhile.
    assert!(ticks.load(Ordering::SeqCst) > 0);

    // The instance is released for the next call, which is bounded again.
    assert!(matches!(
        client.get_metadata().await,
        Err(ClientError::Timeout { .. })
    ));
    ticker.abort();
}

#[tokio::test]
async fn test_loads_module_from_configured_path() {
    let mut file = tempfile::Builder::new().suffix(".wat").tempfile().unwrap();
    file.write_all(core_module(false).as_bytes()).unwrap();

    let config = ClientConfig::new("http://127.0.0.1:9")
        .unwrap()
        .with_wasm_module(file.path());
    let client = WasmClient::new(config).await.unwrap();
    assert_eq!(client.get_metadata().await.unwrap().name, "operrouter-core");
}

#[tokio::test]
async fn test_missing_module_path_is_configuration_error() {
    let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
    assert!(matches!(
        WasmClient::new(config).await,
        Err(ClientError::Configuration { .. })
    ));
}

#[tokio::test]
async fn test_unloadable_module_is_module_error() {
    let config = ClientConfig::new("http://127.0.0.1:9")
        .unwrap()
        .with_wasm_module("/nonexistent/operrouter_core.wasm");
    assert!(matches!(
        WasmClient::new(config).await,
        Err(ClientError::Module { .. })
    ));
}

#[tokio::test]
async fn test_usable_as_trait_object() {
    let (client, _stub) = client(false).await;
    let boxed: Box<dyn OperRouterClient> = Box::new(client);
    assert_eq!(boxed.get_metadata().await.unwrap().version, "0.3.0");
}
