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

//! Built-in schema for the Nomad job specification.
//!
//! Descriptions follow the Nomad documentation at
//! <https://developer.hashicorp.com/nomad/docs/job-specification>.

mod connect;
mod drivers;
mod group;
mod job;
mod task;

use crate::model::{AttributeSchema, BlockSchema, DefaultValue, SchemaNode, ValueType};
use std::sync::Arc;

/// Read-only schema catalog rooted at the top level of a job file.
///
/// Cloning is cheap; clones share the same tree.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: Arc<SchemaNode>,
}

impl Catalog {
    /// Wraps a custom root schema.
    pub fn new(root: SchemaNode) -> Self {
        Self { root: Arc::new(root) }
    }

    /// The Nomad job specification.
    pub fn nomad() -> Self {
        Self::new(job::root())
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::nomad()
    }
}

// Shorthands used by the catalog tables.

fn string(description: &str) -> AttributeSchema {
    AttributeSchema::new(description).with_constraint(ValueType::String)
}

fn number(description: &str) -> AttributeSchema {
    AttributeSchema::new(description).with_constraint(ValueType::Number)
}

fn boolean(description: &str) -> AttributeSchema {
    AttributeSchema::new(description).with_constraint(ValueType::Bool)
}

fn string_list(description: &str) -> AttributeSchema {
    AttributeSchema::new(description).with_constraint(ValueType::list_of(ValueType::String))
}

fn string_map(description: &str) -> AttributeSchema {
    AttributeSchema::new(description).with_constraint(ValueType::map_of(ValueType::String))
}

fn any(description: &str) -> AttributeSchema {
    AttributeSchema::new(description).with_constraint(ValueType::Any)
}

fn block(description: &str, body: SchemaNode) -> BlockSchema {
    BlockSchema::new(description, body)
}

fn named(description: &str, label: &str, body: SchemaNode) -> BlockSchema {
    BlockSchema::new(description, body).with_label(label)
}

fn text(value: &str) -> DefaultValue {
    DefaultValue::String(value.to_string())
}

fn int(value: i64) -> DefaultValue {
    DefaultValue::Number(value as f64)
}

fn flag(value: bool) -> DefaultValue {
    DefaultValue::Bool(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LiteralKind, Selection};
    use nomad_hcl::parse;

    fn walk<'a>(catalog: &'a Catalog, path: &[&str]) -> &'a SchemaNode {
        let mut node = catalog.root();
        for step in path {
            node = match node.get_block(step) {
                Some(BlockSchema::Unconditional { body, .. }) => &**body,
                other => panic!("no unconditional block {:?} ({:?})", step, other.map(|b| b.description())),
            };
        }
        node
    }

    #[test]
    fn test_job_group_task_nesting() {
        let catalog = Catalog::nomad();
        let task = walk(&catalog, &["job", "group", "task"]);
        assert!(task.get_attribute("driver").is_some_and(|a| a.required));
        assert!(task.get_block("resources").is_some());
        assert!(task.get_block("config").is_some());
    }

    #[test]
    fn test_labelled_blocks() {
        let catalog = Catalog::nomad();
        assert!(catalog.root().get_block("job").is_some_and(|b| b.requires_label()));
        assert!(catalog.root().get_block("variable").is_some_and(|b| b.requires_label()));
        let job = walk(&catalog, &["job"]);
        assert!(job.get_block("group").is_some_and(|b| b.requires_label()));
        assert!(job.get_block("update").is_some_and(|b| !b.requires_label()));
    }

    #[test]
    fn test_config_is_driver_dependent() {
        let catalog = Catalog::nomad();
        let task = walk(&catalog, &["job", "group", "task"]);
        match task.get_block("config") {
            Some(BlockSchema::Dependent {
                discriminator, bodies, ..
            }) => {
                assert_eq!(discriminator, "driver");
                for driver in ["docker", "exec", "raw_exec", "java", "podman"] {
                    assert!(bodies.contains_key(driver), "missing {}", driver);
                }
                assert!(bodies["docker"].get_attribute("image").is_some_and(|a| a.required));
                assert!(bodies["exec"].get_attribute("image").is_none());
            }
            other => panic!("config should be dependent, got {:?}", other.map(|b| b.description())),
        }
    }

    #[test]
    fn test_selection_against_catalog() {
        let catalog = Catalog::nomad();
        let task_schema = walk(&catalog, &["job", "group", "task"]);
        let config = task_schema.get_block("config").unwrap();

        let parsed = parse("task \"t\" {\n  driver = \"raw_exec\"\n  config {}\n}\n");
        let task = &parsed.body.blocks[0];
        let selection = config.select(&task.body, &task.body.blocks[0]);
        let body = selection.body().unwrap();
        assert!(body.get_attribute("command").is_some());
        assert!(!matches!(selection, Selection::UnknownValue { .. }));
    }

    #[test]
    fn test_gateway_tree() {
        let catalog = Catalog::nomad();
        let gateway = walk(&catalog, &["job", "group", "service", "connect", "gateway"]);
        for name in ["proxy", "ingress", "terminating", "mesh"] {
            assert!(gateway.get_block(name).is_some(), "missing {}", name);
        }
        let listener = walk(
            &catalog,
            &["job", "group", "service", "connect", "gateway", "ingress", "listener"],
        );
        assert!(listener.get_attribute("port").is_some_and(|a| a.required));
    }

    #[test]
    fn test_literal_kinds_in_catalog() {
        let catalog = Catalog::nomad();
        let artifact = walk(&catalog, &["job", "group", "task", "artifact"]);
        assert_eq!(artifact.get_attribute("source").and_then(|a| a.literal_kind()), Some(LiteralKind::String));
        let job = walk(&catalog, &["job"]);
        assert_eq!(
            job.get_attribute("datacenters").and_then(|a| a.literal_kind()),
            Some(LiteralKind::ListOfString)
        );
        let resources = walk(&catalog, &["job", "group", "task", "resources"]);
        assert_eq!(resources.get_attribute("cpu").and_then(|a| a.literal_kind()), Some(LiteralKind::Other));
    }

    #[test]
    fn test_every_entry_is_documented() {
        fn check(node: &SchemaNode, path: &str) {
            for (name, attribute) in &node.attributes {
                assert!(!attribute.description.is_empty(), "{}.{} undocumented", path, name);
            }
            for (name, block) in &node.blocks {
                assert!(!block.description().is_empty(), "{}.{} undocumented", path, name);
                let child = format!("{}.{}", path, name);
                match block {
                    BlockSchema::Unconditional { body, .. } => check(body, &child),
                    BlockSchema::Dependent { bodies, .. } => {
                        for (value, body) in bodies {
                            check(body, &format!("{}[{}]", child, value));
                        }
                    }
                }
            }
        }
        check(Catalog::nomad().root(), "root");
    }

    #[test]
    fn test_clones_share_tree() {
        let catalog = Catalog::nomad();
        let clone = catalog.clone();
        assert!(std::ptr::eq(catalog.root(), clone.root()));
    }
}
