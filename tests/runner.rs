mod common;

use common::{api_base, start_server, start_sse_server};
use gemini::runner::{
    Error, IMAGE_BASE64, IMAGE_MIME_TYPE, INPUT_PLACEHOLDER, INSTRUCTION, RESPONSE_MIME_TYPE,
    Runner,
};
use gemini::v1beta::{PartData, response::FinishReason, rest};
use serde_json::json;

fn runner_for(addr: std::net::SocketAddr) -> Runner {
    let client = rest::Client::new("key", "gemini-3-flash-preview").with_api_base(api_base(addr));
    Runner::new(client).expect("runner")
}

fn offline_runner() -> Runner {
    Runner::new(rest::Client::new("key", "gemini-3-flash-preview")).expect("runner")
}

#[tokio::test]
async fn prints_fragments_in_arrival_order_without_separators() {
    let (addr, captured, handle) = start_sse_server(vec![
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"{\\\"icon\\\": \"}]}}]}\n\n",
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"thinking\", \"thought\": true}]}}]}\n\n",
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"\\\"fox\\\"\"}]}}]}\n\n",
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"}\"}]}, \"finishReason\": \"STOP\"}], \"usageMetadata\": {\"totalTokenCount\": 42}}\n\n",
    ])
    .await;

    let mut out = Vec::new();
    let summary = runner_for(addr).run(&mut out).await.expect("run");
    let captured = captured.await.unwrap();
    handle.abort();

    assert_eq!(String::from_utf8(out).unwrap(), "{\"icon\": \"fox\"}");
    assert_eq!(summary.fragments, 4);
    assert_eq!(summary.written, 3);
    assert_eq!(summary.bytes, 15);
    assert_eq!(summary.finish_reason, Some(FinishReason::Stop));
    assert_eq!(summary.usage.unwrap().total_token_count, Some(42));

    assert!(
        captured
            .request_line()
            .starts_with("POST /v1beta/models/gemini-3-flash-preview:streamGenerateContent?alt=sse ")
    );
    assert_eq!(captured.header("x-goog-api-key"), Some("key"));
}

#[tokio::test]
async fn tolerates_chunks_with_empty_or_roleless_content() {
    let (addr, _captured, handle) = start_sse_server(vec![
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"[1,\"}]}}]}\n\n",
        b"data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"2]\"}]}}]}\n\n",
        b"data: {\"candidates\": [{\"content\": {}, \"finishReason\": \"STOP\"}]}\n\n",
    ])
    .await;

    let mut out = Vec::new();
    let summary = runner_for(addr).run(&mut out).await.expect("run");
    handle.abort();

    assert_eq!(out, b"[1,2]");
    assert_eq!(summary.fragments, 3);
    assert_eq!(summary.written, 2);
    assert_eq!(summary.finish_reason, Some(FinishReason::Stop));
}

#[tokio::test]
async fn skips_unmodelled_part_kinds() {
    let (addr, _captured, handle) = start_sse_server(vec![
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"videoMetadata\": {}}, {\"text\": \"hi\"}]}}]}\n\n",
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"someFuturePart\": {\"x\": 1}}]}}]}\n\n",
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"!\"}]}}]}\n\n",
    ])
    .await;

    let mut out = Vec::new();
    let summary = runner_for(addr).run(&mut out).await.expect("run");
    handle.abort();

    assert_eq!(out, b"hi!");
    assert_eq!(summary.fragments, 3);
    assert_eq!(summary.written, 2);
}

#[tokio::test]
async fn sends_image_instruction_and_placeholder() {
    let (addr, captured, handle) = start_sse_server(vec![]).await;

    let mut out = Vec::new();
    let summary = runner_for(addr).run(&mut out).await.expect("run");
    let body = captured.await.unwrap().body;
    handle.abort();

    assert_eq!(summary.fragments, 0);
    assert!(out.is_empty());

    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0]["role"], "user");
    assert_eq!(
        contents[0]["parts"],
        json!([
            {"inlineData": {"mimeType": IMAGE_MIME_TYPE, "data": IMAGE_BASE64.trim()}},
            {"text": INSTRUCTION},
            {"text": INPUT_PLACEHOLDER}
        ])
    );
    assert_eq!(body["tools"], json!([{"googleSearch": {}}]));
    assert_eq!(
        body["generationConfig"],
        json!({
            "thinkingConfig": {"thinkingLevel": "HIGH"},
            "mediaResolution": "MEDIA_RESOLUTION_HIGH",
            "responseMimeType": RESPONSE_MIME_TYPE
        })
    );
}

#[tokio::test]
async fn rejected_credential_produces_no_output() {
    let body = br#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}}"#;
    let (addr, _captured, handle) = start_server(body, "400 BAD REQUEST").await;

    let mut out = Vec::new();
    let err = runner_for(addr).run(&mut out).await.unwrap_err();
    handle.abort();

    assert!(out.is_empty());
    match err {
        Error::Rest(rest::Error::Api { status, body }) => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.starts_with("API key not valid"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn malformed_fragment_stops_after_earlier_output() {
    let (addr, _captured, handle) = start_sse_server(vec![
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"partial\"}]}}]}\n\n",
        b"data: {not json\n\n",
        b"data: {\"candidates\": [{\"content\": {\"role\": \"model\", \"parts\": [{\"text\": \"never\"}]}}]}\n\n",
    ])
    .await;

    let mut out = Vec::new();
    let err = runner_for(addr).run(&mut out).await.unwrap_err();
    handle.abort();

    assert_eq!(out, b"partial");
    assert!(matches!(err, Error::Rest(rest::Error::Json(_))));
}

#[test]
fn replacing_placeholder_keeps_structure() {
    let base = offline_runner().contents();
    let replaced = offline_runner()
        .with_input("a red fox, flat vector style")
        .contents();

    assert_eq!(base.len(), replaced.len());
    assert_eq!(base[0].role, replaced[0].role);
    assert_eq!(base[0].parts.len(), 3);
    assert_eq!(replaced[0].parts.len(), 3);
    assert!(matches!(replaced[0].parts[0].data, PartData::InlineData(_)));
    assert_eq!(replaced[0].parts[1].as_text(), Some(INSTRUCTION));
    assert_eq!(base[0].parts[2].as_text(), Some(INPUT_PLACEHOLDER));
    assert_eq!(
        replaced[0].parts[2].as_text(),
        Some("a red fox, flat vector style")
    );
}

#[test]
fn swapping_response_encoding_changes_only_mime_type() {
    let json_request = serde_json::to_value(offline_runner().request()).unwrap();
    let text_request = serde_json::to_value(
        offline_runner()
            .with_response_mime_type("text/plain")
            .request(),
    )
    .unwrap();

    assert_eq!(
        json_request["generationConfig"]["responseMimeType"],
        RESPONSE_MIME_TYPE
    );
    assert_eq!(text_request["generationConfig"]["responseMimeType"], "text/plain");

    let mut normalized = text_request.clone();
    normalized["generationConfig"]["responseMimeType"] = json!(RESPONSE_MIME_TYPE);
    assert_eq!(normalized, json_request);
}
