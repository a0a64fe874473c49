//! LLM commentator against a local mock HTTP provider.
//!
//! A one-shot TCP server stands in for the model endpoint so the success,
//! error-status, timeout and rate-limit paths run without a network.

use std::time::Duration;

use ekk0_core::commentary::{Commentator, LocalCommentator, PLAY_LINES, ReactionRequest, ReactionSource};
use ekk0_core::config::LlmConfig;
use ekk0_core::creature::CreatureState;
use ekk0_core::types::{ActionKind, Timestamp, VisitorId};
use ekk0_llm::{LlmClient, LlmCommentator, LlmProvider};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn request(visitor: &str) -> ReactionRequest {
    ReactionRequest {
        visitor: VisitorId::from(visitor),
        action: ActionKind::Play,
        creature: CreatureState::new(Timestamp(0)),
        recent_events: vec!["capture: play: Action logged.".into()],
    }
}

/// Read one HTTP request (headers plus `Content-Length` body).
async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.expect("read");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let length = text[..head_end]
                .lines()
                .find_map(|l| {
                    let lower = l.to_ascii_lowercase();
                    lower
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve `responses` in order, one per connection, and return the base URL.
async fn serve(responses: Vec<(u16, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let _ = read_request(&mut stream).await;
            let reply = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).await.expect("write");
            let _ = stream.shutdown().await;
        }
    });
    format!("http://{addr}")
}

fn openai_commentator(base_url: String, config: LlmConfig) -> LlmCommentator {
    let client = LlmClient::new(
        LlmProvider::OpenAiCompatible {
            base_url,
            api_key: "test".into(),
        },
        "mock-model",
        0,
    );
    LlmCommentator::new(client, config, LocalCommentator::seeded(7))
}

#[tokio::test]
async fn successful_reply_is_cleaned() {
    let body = r#"{"choices":[{"message":{"content":"\"wheee\nso floaty\""}}],"usage":{"completion_tokens":4}}"#;
    let base = serve(vec![(200, body.to_string())]).await;
    let commentator = openai_commentator(base, LlmConfig::default());

    let reaction = commentator.generate_reaction(&request("ok")).await;
    assert_eq!(reaction.source, ReactionSource::Primary);
    assert_eq!(reaction.text, "wheee so floaty");
}

#[tokio::test]
async fn gemini_reply_is_read_from_candidates() {
    let body = r#"{"candidates":[{"content":{"parts":[{"text":"zzz space naps"}]}}]}"#;
    let base = serve(vec![(200, body.to_string())]).await;
    let client = LlmClient::new(
        LlmProvider::Gemini {
            base_url: base,
            project: "p".into(),
            location: "l".into(),
            api_key: "k".into(),
        },
        "gemini-2.0-flash",
        0,
    );
    let commentator = LlmCommentator::new(client, LlmConfig::default(), LocalCommentator::seeded(1));
    let reaction = commentator.generate_reaction(&request("gemini")).await;
    assert_eq!(reaction, ekk0_core::commentary::Reaction::primary("zzz space naps"));
}

#[tokio::test]
async fn error_status_falls_back_to_action_line() {
    let base = serve(vec![(503, "{}".to_string())]).await;
    let commentator = openai_commentator(base, LlmConfig::default());

    let reaction = commentator.generate_reaction(&request("down")).await;
    assert_eq!(reaction.source, ReactionSource::Local);
    assert!(PLAY_LINES.contains(&reaction.text.as_str()));
}

#[tokio::test]
async fn empty_text_falls_back_to_action_line() {
    let body = r#"{"choices":[{"message":{"content":"   "}}]}"#;
    let base = serve(vec![(200, body.to_string())]).await;
    let commentator = openai_commentator(base, LlmConfig::default());

    let reaction = commentator.generate_reaction(&request("blank")).await;
    assert_eq!(reaction.source, ReactionSource::Local);
    assert!(PLAY_LINES.contains(&reaction.text.as_str()));
}

#[tokio::test]
async fn silent_provider_times_out() {
    // Accepts connections but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let config = LlmConfig {
        request_timeout_ms: 100,
        ..LlmConfig::default()
    };
    let commentator = openai_commentator(format!("http://{addr}"), config);

    let started = std::time::Instant::now();
    let reaction = commentator.generate_reaction(&request("slow")).await;
    assert_eq!(reaction.source, ReactionSource::Local);
    assert!(PLAY_LINES.contains(&reaction.text.as_str()));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn second_call_inside_window_is_rate_limited() {
    let body = r#"{"choices":[{"message":{"content":"hi"}}]}"#;
    let base = serve(vec![(200, body.to_string()), (200, body.to_string())]).await;
    let commentator = openai_commentator(base, LlmConfig::default());

    let first = commentator.generate_reaction(&request("spam")).await;
    assert_eq!(first.source, ReactionSource::Primary);
    let second = commentator.generate_reaction(&request("spam")).await;
    assert_eq!(second.source, ReactionSource::Local);
    assert!(PLAY_LINES.contains(&second.text.as_str()));

    // Another visitor is not affected.
    let other = commentator.generate_reaction(&request("someone-else")).await;
    assert_eq!(other.source, ReactionSource::Primary);
}
