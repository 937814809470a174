//! Length-prefixed framing for the encryption RPC
//!
//! A request frame is a one-byte operation code, a big-endian `u32` body
//! length, and a protobuf body. Response frames carry no operation code;
//! the connection is request/response lockstep, so the pending call knows
//! what to decode.
// Copyright 2025 The Custodia Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use custodia_encryption::{CryptoResult, EncryptionError};
use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const OP_ENCRYPT: u8 = 1;
pub const OP_DECRYPT: u8 = 2;

const MAX_FRAME_LEN: u32 = 4 * 1024 * 1024;

fn transport_error(e: std::io::Error) -> EncryptionError {
    EncryptionError::Infrastructure(format!("remote encryption transport: {}", e))
}

/// Write one request frame
pub async fn write_request<S, M>(stream: &mut S, op: u8, message: &M) -> CryptoResult<()>
where
    S: AsyncWrite + Unpin,
    M: Message,
{
    let body = message.encode_to_vec();
    stream.write_u8(op).await.map_err(transport_error)?;
    stream.write_u32(body.len() as u32).await.map_err(transport_error)?;
    stream.write_all(&body).await.map_err(transport_error)?;
    stream.flush().await.map_err(transport_error)
}

/// Read one response frame
pub async fn read_response<S, M>(stream: &mut S) -> CryptoResult<M>
where
    S: AsyncRead + Unpin,
    M: Message + Default,
{
    let len = stream.read_u32().await.map_err(transport_error)?;
    if len > MAX_FRAME_LEN {
        return Err(EncryptionError::Infrastructure(format!(
            "response frame of {} bytes exceeds the {} byte limit",
            len, MAX_FRAME_LEN
        )));
    }

    let mut body = vec![0u8; len as usize];
    stream.read_exact(&mut body).await.map_err(transport_error)?;

    M::decode(body.as_slice()).map_err(|e| {
        EncryptionError::Infrastructure(format!(
            "malformed response from encryption service: {}",
            e
        ))
    })
}
