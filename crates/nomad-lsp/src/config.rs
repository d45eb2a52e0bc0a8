// Dweve Nomad LS - Nomad job specification language server
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Server settings from `initializationOptions`.
//!
//! Example VS Code settings:
//!
//! ```json
//! {
//!   "nomad": {
//!     "maxDocumentSizeMb": 128,
//!     "maxOpenDocuments": 500
//!   }
//! }
//! ```
//!
//! The settings may also be sent without the `nomad` wrapper. Absent fields
//! keep the server's current limits.

use crate::constants::BYTES_PER_MEGABYTE;
use crate::document_manager::DocumentManager;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Limits a client may override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerOptions {
    /// Largest accepted document, in megabytes.
    #[serde(default)]
    pub max_document_size_mb: Option<usize>,
    /// Number of documents kept before LRU eviction.
    #[serde(default)]
    pub max_open_documents: Option<usize>,
}

/// Invalid `initializationOptions`.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid initialization options: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

impl ServerOptions {
    /// Parses options, accepting both `{"nomad": {...}}` and bare `{...}`.
    pub fn from_value(value: serde_json::Value) -> Result<Self, OptionsError> {
        let options: ServerOptions = match value.get("nomad") {
            Some(inner) => serde_json::from_value(inner.clone())?,
            None => serde_json::from_value(value)?,
        };
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<(), OptionsError> {
        if self.max_document_size_mb == Some(0) {
            return Err(OptionsError::Zero {
                name: "maxDocumentSizeMb",
            });
        }
        if self.max_open_documents == Some(0) {
            return Err(OptionsError::Zero {
                name: "maxOpenDocuments",
            });
        }
        Ok(())
    }

    /// Applies the present fields to `manager`.
    pub fn apply(&self, manager: &DocumentManager) {
        if let Some(megabytes) = self.max_document_size_mb {
            info!("Max document size set to {} MB", megabytes);
            manager.set_max_document_size(megabytes.saturating_mul(BYTES_PER_MEGABYTE));
        }
        if let Some(count) = self.max_open_documents {
            info!("Max open documents set to {}", count);
            manager.set_max_cache_size(count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapped_options() {
        let options = ServerOptions::from_value(json!({
            "nomad": { "maxDocumentSizeMb": 8, "maxOpenDocuments": 20 }
        }))
        .unwrap();
        assert_eq!(options.max_document_size_mb, Some(8));
        assert_eq!(options.max_open_documents, Some(20));
    }

    #[test]
    fn test_bare_and_empty_options() {
        let options = ServerOptions::from_value(json!({ "maxOpenDocuments": 3 })).unwrap();
        assert_eq!(options.max_open_documents, Some(3));
        assert_eq!(options.max_document_size_mb, None);

        assert_eq!(ServerOptions::from_value(json!({})).unwrap(), ServerOptions::default());
    }

    #[test]
    fn test_invalid_options() {
        assert!(matches!(
            ServerOptions::from_value(json!({ "maxOpenDocuments": "many" })),
            Err(OptionsError::Malformed(_))
        ));
        assert!(matches!(
            ServerOptions::from_value(json!({ "maxDocumentSizeMb": 0 })),
            Err(OptionsError::Zero { name: "maxDocumentSizeMb" })
        ));
    }

    #[test]
    fn test_apply_updates_manager() {
        let manager = DocumentManager::new(10, 1024);
        ServerOptions {
            max_document_size_mb: Some(2),
            max_open_documents: None,
        }
        .apply(&manager);
        assert_eq!(manager.max_document_size(), 2 * BYTES_PER_MEGABYTE);
        assert_eq!(manager.max_cache_size(), 10);
    }
}
