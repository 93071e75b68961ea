//! Wire encoding for call arguments moved across a [`crate::distributed::broker::Broker`].
//!
//! Rust has no direct equivalent of Python's `*args, **kwargs`, so a call is
//! represented as a single argument value `A` wrapped in [`Call`] — callers that
//! need several logical arguments use a tuple or a struct for `A`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::SerializerKind;
use crate::core::error::PoolError;

#[derive(Serialize)]
struct CallRef<'a, A> {
    args: &'a A,
}

#[derive(Deserialize)]
struct Call<A> {
    args: A,
}

/// Encode `args` for transport over the given serializer kind.
pub(crate) fn encode<A: Serialize>(kind: SerializerKind, args: &A) -> Result<Vec<u8>, PoolError> {
    let wrapped = CallRef { args };
    match kind {
        SerializerKind::Binary => bincode::serialize(&wrapped)
            .map_err(|e| PoolError::DeserializationFailed(e.to_string())),
        SerializerKind::Structured => serde_json::to_vec(&wrapped)
            .map_err(|e| PoolError::DeserializationFailed(e.to_string())),
    }
}

/// Decode a payload previously produced by [`encode`].
pub(crate) fn decode<A: DeserializeOwned>(kind: SerializerKind, bytes: &[u8]) -> Result<A, PoolError> {
    let call: Call<A> = match kind {
        SerializerKind::Binary => {
            bincode::deserialize(bytes).map_err(|e| PoolError::DeserializationFailed(e.to_string()))?
        }
        SerializerKind::Structured => serde_json::from_slice(bytes)
            .map_err(|e| PoolError::DeserializationFailed(e.to_string()))?,
    };
    Ok(call.args)
}
