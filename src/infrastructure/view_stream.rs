// Chunked newline-delimited JSON streaming utilities
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::{broadcast, watch};

/// Create a chunked NDJSON streaming response, one line per item
pub fn chunked_json_stream<S, T>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize,
{
    let byte_stream = stream.map(|item| serialize_line(&item));
    let body = Body::from_stream(byte_stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn serialize_line<T: Serialize>(item: &T) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(item)?;
    let mut line = BytesMut::with_capacity(json.len() + 1);
    line.put_slice(&json);
    line.put_u8(b'\n');
    Ok(line.freeze())
}

/// Resolves once `shutdown` flips to `true` or its sender goes away.
async fn closed(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|closed| *closed).await;
}

/// Emit `render()` immediately and again after every change notification.
/// Ends on shutdown or when the sender side is dropped.
pub fn stream_on_change<T, F>(
    mut changes: watch::Receiver<u64>,
    shutdown: watch::Receiver<bool>,
    render: F,
) -> impl IntoResponse
where
    T: Serialize + Send + 'static,
    F: Fn() -> T + Send + 'static,
{
    let stream = async_stream::stream! {
        let stop = closed(shutdown);
        tokio::pin!(stop);

        changes.mark_unchanged();
        yield render();
        loop {
            let changed = tokio::select! {
                changed = changes.changed() => changed.is_ok(),
                _ = &mut stop => false,
            };
            if !changed {
                break;
            }
            yield render();
        }
    };

    match chunked_json_stream(stream) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Forward every broadcast item until shutdown. Lagging clients skip what they missed.
pub fn stream_broadcast<T>(mut rx: broadcast::Receiver<T>, shutdown: watch::Receiver<bool>) -> impl IntoResponse
where
    T: Serialize + Clone + Send + 'static,
{
    let stream = async_stream::stream! {
        let stop = closed(shutdown);
        tokio::pin!(stop);

        loop {
            let received = tokio::select! {
                received = rx.recv() => Some(received),
                _ = &mut stop => None,
            };
            let Some(received) = received else {
                break;
            };
            match received {
                Ok(item) => yield item,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Advisory stream lagged, skipped {} items", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    match chunked_json_stream(stream) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
