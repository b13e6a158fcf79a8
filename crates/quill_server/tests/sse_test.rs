//! Token stream decoding over scripted byte chunks.

use futures::{StreamExt, stream};
use quill_error::ServerErrorKind;
use quill_server::{parse_completion_event, parse_kobold_event, token_stream};

fn chunks(
    parts: Vec<&'static str>,
) -> impl futures::Stream<Item = Result<&'static [u8], String>> {
    stream::iter(parts.into_iter().map(|part| Ok(part.as_bytes())))
}

#[tokio::test]
async fn test_tokens_survive_arbitrary_chunking() {
    let bytes = chunks(vec![
        "data: {\"tok",
        "en\": \"a\"}\n\ndata: {\"token\": \"b\"}\n",
        "\ndata: {\"token\": \"c\"}",
    ]);
    let tokens: Vec<String> = token_stream(bytes, parse_kobold_event)
        .map(|token| token.unwrap())
        .collect()
        .await;
    assert_eq!(tokens, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_done_ends_stream() {
    let bytes = chunks(vec![
        "data: {\"choices\":[{\"text\":\"x\"}]}\n\ndata: [DONE]\n\ndata: {\"choices\":[{\"text\":\"y\"}]}\n\n",
    ]);
    let tokens: Vec<String> = token_stream(bytes, parse_completion_event)
        .map(|token| token.unwrap())
        .collect()
        .await;
    assert_eq!(tokens, vec!["x"]);
}

#[tokio::test]
async fn test_transport_error_surfaces_as_stream_error() {
    let bytes = stream::iter(vec![
        Ok("data: {\"token\": \"a\"}\n".as_bytes()),
        Err("connection reset".to_string()),
    ]);
    let items: Vec<_> = token_stream(bytes, parse_kobold_event).collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().unwrap(), "a");
    let err = items[1].as_ref().unwrap_err();
    assert!(matches!(err.kind, ServerErrorKind::Stream(_)));
}
