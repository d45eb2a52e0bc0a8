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

//! Schema model and built-in catalog for Nomad job files.
//!
//! The catalog is a read-only tree of [`SchemaNode`]s built once at startup
//! and shared between documents. Each node lists the attributes and child
//! blocks a body may contain; a child block is either unconditional or
//! [`BlockSchema::Dependent`] on a sibling attribute such as a task's
//! `driver`.
//!
//! # Examples
//!
//! ```
//! use nomad_schema::{BlockSchema, Catalog};
//!
//! let catalog = Catalog::nomad();
//! let job = catalog.root().get_block("job").unwrap();
//! assert!(job.requires_label());
//! assert!(matches!(job, BlockSchema::Unconditional { .. }));
//! ```

mod catalog;
mod model;

pub use catalog::Catalog;
pub use model::{
    AttributeSchema, BlockSchema, DefaultValue, LabelSchema, LiteralKind, SchemaNode, Selection,
    ValueType,
};
