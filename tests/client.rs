use std::{sync::Arc, time::Duration};

use anyhow::Result;
use creality_wifi_box::{BoxClient, Command, ConnectionError, DecodeError, Error};
use pretty_assertions::assert_eq;
use test_context::{test_context, AsyncTestContext};
use testresult::TestResult;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::Mutex,
    task::JoinHandle,
};

const SAMPLE: &str = include_str!("fixtures/box_info.json");

/// What the mock box answers with.
#[derive(Clone, Debug)]
enum Reply {
    Json(u16, String),
    Hang,
}

impl Reply {
    fn ok(body: &str) -> Self {
        Reply::Json(200, body.to_string())
    }
}

/// A fake box listening on loopback.
struct MockBox {
    port: u16,
    reply: Arc<Mutex<Reply>>,
    requests: Arc<Mutex<Vec<String>>>,
    server: JoinHandle<()>,
}

impl MockBox {
    async fn new() -> Result<Self> {
        let port = portpicker::pick_unused_port().ok_or_else(|| anyhow::anyhow!("no port available"))?;
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;

        let reply = Arc::new(Mutex::new(Reply::ok(SAMPLE)));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let server = {
            let reply = reply.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let reply = reply.lock().await.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let _ = serve(stream, reply, requests).await;
                    });
                }
            })
        };

        Ok(Self {
            port,
            reply,
            requests,
            server,
        })
    }

    fn client(&self) -> BoxClient {
        BoxClient::with_timeout("127.0.0.1", self.port, Duration::from_millis(500))
    }

    async fn reply_with(&self, reply: Reply) {
        *self.reply.lock().await = reply;
    }

    async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

impl AsyncTestContext for MockBox {
    async fn setup() -> Self {
        MockBox::new().await.unwrap()
    }

    async fn teardown(self) {
        self.server.abort();
    }
}

/// Read one request, record its target and write the canned reply.
async fn serve(mut stream: TcpStream, reply: Reply, requests: Arc<Mutex<Vec<String>>>) -> Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string();
    requests.lock().await.push(target);

    match reply {
        Reply::Json(status, body) => {
            let response = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await?;
            stream.shutdown().await?;
        }
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_get_info(ctx: &mut MockBox) -> TestResult {
    let client = ctx.client();

    let info = client.get_info().await?;

    assert_eq!(info.model, "Ender-3");
    assert_eq!(info.nozzle_temp, 200);
    assert_eq!(info.consumables_len, 1000);
    assert_eq!(info.print_start_time, 1666666666);
    assert!(!info.error);
    assert_eq!(
        ctx.requests().await,
        vec!["/protocal.csp?opt=main&fname=Info&function=get".to_string()]
    );

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_get_info_is_not_cached(ctx: &mut MockBox) -> TestResult {
    let client = ctx.client();

    let first = client.get_info().await?;
    ctx.reply_with(Reply::ok(&SAMPLE.replace(r#""nozzleTemp": 200"#, r#""nozzleTemp": 215"#)))
        .await;
    let second = client.get_info().await?;

    assert_eq!(first.nozzle_temp, 200);
    assert_eq!(second.nozzle_temp, 215);
    assert_eq!(ctx.requests().await.len(), 2);

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_print_commands(ctx: &mut MockBox) -> TestResult {
    ctx.reply_with(Reply::ok(r#"{"error": 0}"#)).await;
    let client = ctx.client();

    assert!(client.pause_print().await?);
    assert!(client.resume_print().await?);
    assert!(client.stop_print().await?);

    assert_eq!(
        ctx.requests().await,
        [Command::Pause, Command::Resume, Command::Stop]
            .map(|c| format!("/protocal.csp?{}", c.query()))
            .to_vec()
    );

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_command_error(ctx: &mut MockBox) -> TestResult {
    ctx.reply_with(Reply::ok(r#"{"error": 1}"#)).await;
    let client = ctx.client();

    let err = client.pause_print().await.unwrap_err();

    assert!(err.to_string().contains("failed"), "{err}");
    match err {
        Error::CommandFailed { command, code, .. } => {
            assert_eq!(command, Command::Pause);
            assert_eq!(code, serde_json::json!(1));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(ctx.requests().await.len(), 1);

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_invalid_json_response(ctx: &mut MockBox) -> TestResult {
    ctx.reply_with(Reply::ok("not valid json")).await;
    let client = ctx.client();

    let err = client.get_info().await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));
    assert!(err.to_string().contains("Invalid response"));

    let err = client.stop_print().await.unwrap_err();
    assert!(matches!(err, Error::InvalidResponse(_)));

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_mistyped_field(ctx: &mut MockBox) -> TestResult {
    ctx.reply_with(Reply::ok(&SAMPLE.replace(r#""nozzleTemp": 200"#, r#""nozzleTemp": true"#)))
        .await;
    let client = ctx.client();

    let err = client.get_info().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Decode(DecodeError::TypeMismatch {
            field: "nozzle_temp",
            found: "bool",
            ..
        })
    ));

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_http_error(ctx: &mut MockBox) -> TestResult {
    ctx.reply_with(Reply::Json(500, "{}".to_string())).await;
    let client = ctx.client();

    let err = client.get_info().await.unwrap_err();

    assert!(err.to_string().contains("HTTP error"), "{err}");
    match err {
        Error::ConnectionFailed(ConnectionError::Http { status, reason, .. }) => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(reason, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_http_client_error(ctx: &mut MockBox) -> TestResult {
    ctx.reply_with(Reply::Json(404, r#"{"error": 0}"#.to_string())).await;
    let client = ctx.client();

    let err = client.pause_print().await.unwrap_err();

    assert!(err.to_string().contains("HTTP error"), "{err}");
    match err {
        Error::ConnectionFailed(ConnectionError::Http { status, reason, url }) => {
            assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
            assert_eq!(reason, "Not Found");
            assert!(url.ends_with(Command::Pause.query()), "{url}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_timeout_error(ctx: &mut MockBox) -> TestResult {
    ctx.reply_with(Reply::Hang).await;
    let client = ctx.client();

    let err = client.get_info().await.unwrap_err();

    assert!(matches!(err, Error::RequestTimedOut { .. }), "{err:?}");
    assert!(err.to_string().contains("timed out"));

    Ok(())
}

#[tokio::test]
async fn test_connection_error() -> TestResult {
    // Nothing listens on a freshly picked port.
    let port = portpicker::pick_unused_port().ok_or("no port available")?;
    let client = BoxClient::with_timeout("127.0.0.1", port, Duration::from_secs(2));

    let err = client.get_info().await.unwrap_err();
    assert!(matches!(err, Error::ConnectionFailed(ConnectionError::Transport { .. })), "{err:?}");
    assert!(err.to_string().contains("Failed to connect"));

    let err = client.pause_print().await.unwrap_err();
    assert!(matches!(err, Error::ConnectionFailed(_)));

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_close_and_reopen(ctx: &mut MockBox) -> TestResult {
    let mut client = ctx.client();

    client.close();
    assert!(!client.is_open());

    client.get_info().await?;
    assert!(client.is_open());

    client.close();
    client.close();
    assert!(!client.is_open());

    let info = client.get_info().await?;
    assert_eq!(info.model, "Ender-3");
    assert!(client.is_open());

    Ok(())
}

#[test_context(MockBox)]
#[tokio::test]
async fn test_scoped_client(ctx: &mut MockBox) -> TestResult {
    let mut client = ctx.client();

    {
        let scoped = client.scoped();
        assert!(!scoped.is_open());
        scoped.get_info().await?;
        assert!(scoped.is_open());
    }
    assert!(!client.is_open());

    ctx.reply_with(Reply::ok(r#"{"error": 3}"#)).await;
    {
        let scoped = client.scoped();
        assert!(scoped.stop_print().await.is_err());
        assert!(scoped.is_open());
    }
    assert!(!client.is_open());

    Ok(())
}
