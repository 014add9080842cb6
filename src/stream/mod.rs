//! 上游流式响应解析与转换
//!
//! 云端 provider 使用 SSE，本地 provider 使用逐行 JSON，
//! 两者都被转换为同一种 NDJSON 块流，客户端无需关心由哪个后端提供服务。

mod adapter;
pub mod chunk;
pub mod line;
mod ndjson;
mod sse;

pub use adapter::{relay_ndjson, relay_sse, ChunkStream};
pub use chunk::{ChatChunk, ChunkRole};
pub use line::{LineDecoder, MAX_LINE_SIZE};
pub use sse::{DATA_PREFIX, DONE_SENTINEL};
