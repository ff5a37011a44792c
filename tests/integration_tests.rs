//! Integration tests for layerlog
//!
//! These tests verify:
//! - Level gating across a logger tree
//! - Prefix composition and tee fan-out
//! - Encoding of entries written to a real file
//! - Panic recovery
//! - Direct-submit and agent-relay shipping against local collectors

use flate2::read::ZlibDecoder;
use layerlog::destinations::datadog::{self, AgentFormat};
use layerlog::prelude::*;
use layerlog::{EnvProvider, MemoryEnv};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn lines(&self) -> Vec<serde_json::Value> {
        let data = self.0.lock().unwrap();
        String::from_utf8_lossy(&data)
            .lines()
            .map(|line| serde_json::from_str(line).expect("JSON line"))
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn json_logger(level: LogLevel) -> (Logger, Capture) {
    let capture = Capture::default();
    let logger = Logger::builder()
        .level(level)
        .json()
        .output(capture.clone())
        .build();
    (logger, capture)
}

const INTAKE_PATH: &str = "/api/v2/logs";

/// Intake mock answering `status` to one deflated submission carrying `api_key`
async fn intake(api_key: &str, status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INTAKE_PATH))
        .and(header("DD-API-KEY", api_key))
        .and(header("Content-Type", "application/json"))
        .and(header("Content-Encoding", "deflate"))
        .respond_with(ResponseTemplate::new(status).set_body_string("intake says no"))
        .expect(1)
        .mount(&server)
        .await;
    server
}

fn intake_endpoint(server: &MockServer) -> String {
    format!("{}{}", server.uri(), INTAKE_PATH)
}

/// Decompressed JSON payload of every submission the intake received
async fn submitted_payloads(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|request| {
            let mut body = Vec::new();
            ZlibDecoder::new(&request.body[..])
                .read_to_end(&mut body)
                .expect("zlib body");
            serde_json::from_slice(&body).expect("JSON payload")
        })
        .collect()
}

/// Accepts `count` agent connections and returns what each one carried
fn agent_collector(count: usize) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let handle = thread::spawn(move || {
        (0..count)
            .map(|_| {
                let (mut conn, _) = listener.accept().unwrap();
                let mut record = String::new();
                conn.read_to_string(&mut record).unwrap();
                record
            })
            .collect()
    });
    (address, handle)
}

#[test]
fn test_log_injection_prevention() {
    let (logger, capture) = json_logger(LogLevel::Info);
    logger.info("User login\nERROR [2024-10-17] Fake error injected", &[]);

    let lines = capture.lines();
    assert_eq!(lines.len(), 1, "Log should be a single line, not multiple");
    assert_eq!(lines[0]["msg"], "User login\\nERROR [2024-10-17] Fake error injected");
}

#[test]
fn test_hierarchy_shares_level_gate() {
    let (root, capture) = json_logger(LogLevel::Warn);
    let api = root.with("api");
    let db = api.with_skip("db", 2);

    db.info("hidden", &[]);
    api.set_level(LogLevel::Debug);
    db.debug("visible", &[]);
    root.with("late").debug("also visible", &[]);

    let lines = capture.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["msg"], "[api][db] visible");
    assert_eq!(lines[0]["name"], "api.db");
    assert_eq!(lines[1]["msg"], "[late] also visible");
    assert_eq!(root.level(), LogLevel::Debug);
}

#[test]
fn test_with_core_does_not_touch_parent() {
    let (root, root_capture) = json_logger(LogLevel::Info);
    let extra_capture = Capture::default();
    let extra = Arc::new(StreamSink::new(
        extra_capture.clone(),
        Encoder::json(),
        LevelGate::new(LogLevel::Debug),
    ));

    let teed = root.with("payments").with_core(extra);
    root.info("root only", &[]);
    teed.info("teed", &[Field::string("order", "A-1")]);

    assert_eq!(root.destinations().len(), 1);
    assert_eq!(teed.destinations().len(), 2);
    assert_eq!(root_capture.lines().len(), 2);

    let extra_lines = extra_capture.lines();
    assert_eq!(extra_lines.len(), 1);
    assert_eq!(extra_lines[0]["msg"], "[payments] teed");
    assert_eq!(extra_lines[0]["order"], "A-1");
}

#[test]
fn test_json_entry_roundtrip() {
    let (logger, capture) = json_logger(LogLevel::Debug);
    logger.with("report").info(
        "generated",
        &[
            Field::string("user", "u-17"),
            Field::int("rows", -3),
            Field::uint("bytes", 4096),
            Field::float("ratio", 0.25),
            Field::bool("cached", false),
            Field::duration("elapsed", Duration::from_millis(1500)),
            Field::any("tags", &["a", "b"]),
        ],
    );

    let entry = &capture.lines()[0];
    assert_eq!(entry["level"], "INFO");
    assert_eq!(entry["msg"], "[report] generated");
    assert_eq!(entry["user"], "u-17");
    assert_eq!(entry["rows"], -3);
    assert_eq!(entry["bytes"], 4096);
    assert_eq!(entry["ratio"], 0.25);
    assert_eq!(entry["cached"], false);
    assert_eq!(entry["elapsed"], "1.5s");
    assert_eq!(entry["tags"], serde_json::json!(["a", "b"]));
    assert!(entry["ts"].is_string());
    assert!(entry["caller"].as_str().unwrap().contains("integration_tests.rs:"));
}

#[test]
fn test_console_output_to_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("console.log");
    let file = fs::File::create(&path).expect("Failed to create log file");

    let logger = Logger::builder().console().output(file).build();
    logger.with("boot").warn("disk almost full", &[Field::int("free_mb", 12)]);
    logger.sync().expect("Failed to flush");

    let content = fs::read_to_string(&path).expect("Failed to read log file");
    let columns: Vec<&str> = content.trim_end().split('\t').collect();
    assert_eq!(columns[1], "WARN");
    assert_eq!(columns[2], "boot");
    assert!(columns[3].starts_with("tests/integration_tests.rs:"));
    assert_eq!(columns[4], "[boot] disk almost full");
    assert_eq!(columns[5], r#"{"free_mb":12}"#);
}

#[test]
fn test_recover_panic_keeps_running() {
    let (logger, capture) = json_logger(LogLevel::Info);
    let (tx, rx) = crossbeam_channel::bounded(1);

    let result = logger.with("worker").recover_panic(
        "handle_job",
        &HashMap::from([("job", 42)]),
        Some(Box::new(move || {
            let _ = tx.send(());
        })),
        || {
            let items: Vec<u32> = Vec::new();
            items[3]
        },
    );

    assert!(result.is_none());
    rx.recv_timeout(Duration::from_secs(5)).expect("cleanup ran");

    let entry = &capture.lines()[0];
    assert_eq!(entry["level"], "ERROR");
    assert_eq!(entry["Func"], "handle_job");
    assert_eq!(entry["Info"]["job"], 42);
    assert!(entry["Recover"].as_str().unwrap().contains("index out of bounds"));
    assert!(entry["stacktrace"].is_string());

    logger.info("still alive", &[]);
    assert_eq!(capture.lines().len(), 2);
}

#[test]
fn test_empty_credentials_yield_nop() {
    let env = MemoryEnv::new();
    let api = datadog::api("").service_name("svc").build_with_env(&env);
    let agent = datadog::agent("").build_with_env(&env);

    let (logger, capture) = json_logger(LogLevel::Info);
    let logger = logger.with_core(api).with_core(agent);
    logger.error("local only", &[]);

    assert_eq!(capture.lines().len(), 1);
    assert!(env.snapshot().is_empty());
    assert!(logger.sync().is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_direct_submit_wire_format() {
    let server = intake("test-key", 202).await;
    let env = MemoryEnv::new();
    let remote = datadog::api("test-key")
        .endpoint(intake_endpoint(&server))
        .no_proxy()
        .site(datadog::EU)
        .source("rust")
        .service_name("billing")
        .hostname("host-1")
        .tags([("env", "test"), ("version", "1")])
        .flush_timeout(Duration::from_secs(5))
        .build_with_env(&env);
    assert_eq!(env.var("DD_API_KEY").as_deref(), Some("test-key"));
    assert_eq!(env.var("DD_SITE").as_deref(), Some(datadog::EU));

    let (logger, _capture) = json_logger(LogLevel::Info);
    let logger = logger.with("api").with_core(remote);
    tokio::task::spawn_blocking(move || {
        logger.write(LogLevel::Warn, "charge failed", &[Field::string("card", "visa")])
    })
    .await
    .unwrap()
    .expect("submission accepted");

    let payloads = submitted_payloads(&server).await;
    assert_eq!(payloads.len(), 1);
    let items = payloads[0].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["ddsource"], "rust");
    assert_eq!(items[0]["ddtags"], "env:test,version:1");
    assert_eq!(items[0]["hostname"], "host-1");
    assert_eq!(items[0]["service"], "billing");

    let message: serde_json::Value =
        serde_json::from_str(items[0]["message"].as_str().unwrap()).unwrap();
    assert_eq!(message["level"], "WARN");
    assert_eq!(message["msg"], "[api] charge failed");
    assert_eq!(message["card"], "visa");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_direct_submit_rejection_is_reported() {
    let server = intake("wrong-key", 403).await;
    let remote = datadog::api("wrong-key")
        .endpoint(intake_endpoint(&server))
        .no_proxy()
        .build_with_env(&MemoryEnv::new());

    let (logger, capture) = json_logger(LogLevel::Info);
    let logger = logger.with_core(remote);
    let result = tokio::task::spawn_blocking(move || logger.write(LogLevel::Error, "lost", &[]))
        .await
        .unwrap();

    match result {
        Err(LoggerError::Rejected { status, body }) => {
            assert_eq!(status, 403);
            assert_eq!(body, "intake says no");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(capture.lines().len(), 1, "local stream still written");
}

#[test]
fn test_direct_submit_respects_deadline() {
    // Accepts connections but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/api/v2/logs", listener.local_addr().unwrap());

    let remote = datadog::api("key")
        .endpoint(endpoint)
        .no_proxy()
        .flush_timeout(Duration::from_millis(100))
        .build_with_env(&MemoryEnv::new());
    let (logger, _capture) = json_logger(LogLevel::Info);
    let logger = logger.with_core(remote);

    let started = Instant::now();
    let result = logger.write(LogLevel::Info, "slow intake", &[]);
    let elapsed = started.elapsed();

    let err = result.expect_err("deadline must be reported");
    assert!(err.is_deadline_exceeded(), "unexpected error: {}", err);
    assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
    drop(listener);
}

#[test]
fn test_remote_level_is_independent() {
    let (address, collector) = agent_collector(1);
    let remote = datadog::agent(address)
        .level(LogLevel::Error)
        .build_with_env(&MemoryEnv::new());

    let (logger, capture) = json_logger(LogLevel::Info);
    let logger = logger.with_core(remote);
    logger.info("local only", &[]);
    logger.error("both", &[]);

    let records = collector.join().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].contains("both"));
    assert_eq!(capture.lines().len(), 2);
}

#[test]
fn test_agent_envelope_records() {
    let (address, collector) = agent_collector(2);
    let remote = datadog::agent(address)
        .env("staging")
        .source("rust")
        .service_name("checkout")
        .build_with_env(&MemoryEnv::new());

    let (logger, _capture) = json_logger(LogLevel::Info);
    let logger = logger.with("cart").with_core(remote);
    logger.info("item added", &[Field::int("qty", 2)]);
    logger.warn("stock low", &[]);

    let records = collector.join().unwrap();
    let statuses: Vec<serde_json::Value> = records
        .iter()
        .map(|record| {
            assert!(record.ends_with('\n'));
            assert_eq!(record.matches('\n').count(), 1);
            serde_json::from_str(record).unwrap()
        })
        .collect();

    assert_eq!(statuses[0]["env"], "staging");
    assert_eq!(statuses[0]["source"], "rust");
    assert_eq!(statuses[0]["service"], "checkout");
    assert_eq!(statuses[0]["status"], "info");
    assert_eq!(statuses[1]["status"], "warn");

    let inner: serde_json::Value =
        serde_json::from_str(statuses[0]["message"].as_str().unwrap()).unwrap();
    assert_eq!(inner["msg"], "[cart] item added");
    assert_eq!(inner["qty"], 2);
}

#[test]
fn test_agent_raw_records() {
    let (address, collector) = agent_collector(1);
    let remote = datadog::agent(address)
        .agent_format(AgentFormat::Raw)
        .build_with_env(&MemoryEnv::new());

    let (logger, _capture) = json_logger(LogLevel::Info);
    logger.with_core(remote).error("raw entry", &[]);

    let records = collector.join().unwrap();
    let entry: serde_json::Value = serde_json::from_str(&records[0]).unwrap();
    assert_eq!(entry["msg"], "raw entry");
    assert_eq!(entry["level"], "ERROR");
}

#[test]
fn test_unreachable_agent_does_not_block_local_output() {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let remote = datadog::agent(format!("127.0.0.1:{}", port))
        .agent_timeout(Some(Duration::from_millis(500)))
        .build_with_env(&MemoryEnv::new());

    let (logger, capture) = json_logger(LogLevel::Info);
    let logger = logger.with_core(remote);
    let result = logger.write(LogLevel::Info, "agent down", &[]);

    assert!(matches!(result, Err(LoggerError::Connection { .. })));
    assert_eq!(capture.lines().len(), 1);
    assert_eq!(logger.metrics().failed_writes(), 1);

    // The convenience methods report instead of failing.
    logger.info("still fine", &[]);
    assert_eq!(capture.lines().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_logging_inside_async_runtime() {
    let server = intake("key", 200).await;
    let remote = datadog::api("key")
        .endpoint(intake_endpoint(&server))
        .no_proxy()
        .build_with_env(&MemoryEnv::new());
    let (logger, capture) = json_logger(LogLevel::Info);
    let logger = logger.with("async").with_core(remote);

    let task_logger = logger.clone();
    tokio::spawn(async move {
        task_logger
            .write(LogLevel::Info, "from a task", &[])
            .expect("submitted from async context");
    })
    .await
    .unwrap();

    assert_eq!(submitted_payloads(&server).await.len(), 1);
    assert_eq!(capture.lines()[0]["msg"], "[async] from a task");
}

#[test]
fn test_concurrent_children_write_whole_lines() {
    let (root, capture) = json_logger(LogLevel::Info);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let logger = root.with(&format!("t{}", t));
            thread::spawn(move || {
                for i in 0..100 {
                    logger.info(format!("message {}", i), &[Field::int("thread", t)]);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let lines = capture.lines();
    assert_eq!(lines.len(), 800);
    assert_eq!(root.metrics().entries_written(), 800);
    for line in lines {
        let thread = line["thread"].as_i64().unwrap();
        assert!(line["msg"].as_str().unwrap().starts_with(&format!("[t{}] message", thread)));
    }
}
