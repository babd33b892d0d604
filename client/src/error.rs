//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Client error types

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Result alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection timeout
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// Line framing failed
    #[error("Codec error: {0}")]
    Codec(#[from] LinesCodecError),
}
