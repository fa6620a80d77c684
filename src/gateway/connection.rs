//! 单连接循环
//!
//! 严格一问一答：读到一条完整消息 → 分发 → 发送响应，之后才读下一条。
//! 入站分片由 tungstenite 在 `max_message_bytes` 内重组；出站响应超过 `max_frame_bytes`
//! 时拆成多个帧，只有最后一帧带 FIN。

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::protocol::frame::coding::{CloseCode, Data, OpCode};
use tokio_tungstenite::tungstenite::protocol::frame::{CloseFrame, Frame};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;

use super::dispatcher::Dispatcher;
use super::message::ResponseEnvelope;
use crate::core::error::RpcError;

/// 连接级参数（来自 [server] 段）
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// 出站分片大小；0 表示不分片
    pub max_frame_bytes: usize,
    /// 空闲 ping 间隔；None 关闭
    pub keepalive: Option<Duration>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            max_frame_bytes: 1024 * 1024,
            keepalive: Some(Duration::from_secs(120)),
        }
    }
}

/// 连接结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEnd {
    ClosedByPeer,
    ClosedByServer(String),
}

/// 运行连接循环直到对端关闭、传输失败或收到关闭信号
pub async fn serve_connection<S>(
    ws: WebSocketStream<S>,
    peer: String,
    dispatcher: Arc<Dispatcher>,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
) -> ConnectionEnd
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tracing::info!("WebSocket connection opened: {}", peer);
    let (mut sink, mut stream) = ws.split();

    // 关闭心跳时仍需一个计时器占位，由 select 守卫跳过
    let period = settings.keepalive.unwrap_or(Duration::from_secs(3600));
    let mut keepalive = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let end = loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                close(&mut sink, CloseCode::Away, "Server shutting down").await;
                break ConnectionEnd::ClosedByServer("shutdown".to_string());
            }
            _ = keepalive.tick(), if settings.keepalive.is_some() => {
                if let Err(e) = sink.send(Message::Ping(Vec::new())).await {
                    tracing::warn!("Keepalive ping to {} failed: {}", peer, e);
                    break ConnectionEnd::ClosedByServer(e.to_string());
                }
            }
            incoming = stream.next() => {
                let text = match incoming {
                    None => break ConnectionEnd::ClosedByPeer,
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket receive error from {}: {}", peer, e);
                        close(&mut sink, CloseCode::Error, "Internal server error").await;
                        break ConnectionEnd::ClosedByServer(e.to_string());
                    }
                    Some(Ok(Message::Text(text))) => Ok(text),
                    Some(Ok(Message::Binary(bytes))) => String::from_utf8(bytes)
                        .map_err(|_| RpcError::MalformedRequest("message is not valid UTF-8".to_string())),
                    Some(Ok(Message::Close(_))) => break ConnectionEnd::ClosedByPeer,
                    // Ping 的 Pong 由 tungstenite 自动回复
                    Some(Ok(_)) => continue,
                };
                keepalive.reset();

                let response = match text {
                    Ok(text) => dispatcher.dispatch_text(&text).await,
                    Err(e) => ResponseEnvelope::error(&e),
                };
                if let Err(e) = send_chunked(&mut sink, response.to_text(), settings.max_frame_bytes).await {
                    tracing::warn!("WebSocket send error to {}: {}", peer, e);
                    close(&mut sink, CloseCode::Error, "Internal server error").await;
                    break ConnectionEnd::ClosedByServer(e.to_string());
                }
            }
        }
    };

    tracing::info!("WebSocket connection closed: {} ({:?})", peer, end);
    end
}

/// 发送一条文本消息；超过 max_frame 时按字节切分为 Text + Continue* 帧
pub async fn send_chunked<S>(sink: &mut S, text: String, max_frame: usize) -> Result<(), S::Error>
where
    S: Sink<Message> + Unpin,
{
    if max_frame == 0 || text.len() <= max_frame {
        return sink.send(Message::Text(text)).await;
    }

    let bytes = text.into_bytes();
    let mut chunks = bytes.chunks(max_frame).peekable();
    let mut opcode = OpCode::Data(Data::Text);
    while let Some(chunk) = chunks.next() {
        let is_final = chunks.peek().is_none();
        sink.feed(Message::Frame(Frame::message(chunk.to_vec(), opcode, is_final)))
            .await?;
        opcode = OpCode::Data(Data::Continue);
    }
    sink.flush().await
}

async fn close<S>(sink: &mut S, code: CloseCode, reason: &str)
where
    S: Sink<Message> + Unpin,
{
    let frame = CloseFrame {
        code,
        reason: reason.to_string().into(),
    };
    // 对端可能已断开
    let _ = sink.send(Message::Close(Some(frame))).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(messages: &[Message]) -> Vec<(OpCode, bool, usize)> {
        messages
            .iter()
            .map(|m| match m {
                Message::Frame(f) => (f.header().opcode, f.header().is_final, f.payload().len()),
                other => panic!("expected raw frame, got {:?}", other),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_small_message_is_single_text() {
        let mut sent: Vec<Message> = Vec::new();
        send_chunked(&mut sent, r#"{"count":0}"#.to_string(), 64).await.unwrap();
        assert_eq!(sent, vec![Message::Text(r#"{"count":0}"#.to_string())]);
    }

    #[tokio::test]
    async fn test_large_message_is_fragmented() {
        let mut sent: Vec<Message> = Vec::new();
        send_chunked(&mut sent, "x".repeat(25), 10).await.unwrap();

        assert_eq!(
            frames(&sent),
            vec![
                (OpCode::Data(Data::Text), false, 10),
                (OpCode::Data(Data::Continue), false, 10),
                (OpCode::Data(Data::Continue), true, 5),
            ]
        );
    }

    #[tokio::test]
    async fn test_exact_multiple_ends_with_final_chunk() {
        let mut sent: Vec<Message> = Vec::new();
        send_chunked(&mut sent, "y".repeat(20), 10).await.unwrap();

        let shape = frames(&sent);
        assert_eq!(shape.len(), 2);
        assert!(!shape[0].1);
        assert!(shape[1].1);
    }
}
