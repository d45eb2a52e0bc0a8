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

//! Property-based tests for the HCL parser.

use nomad_hcl::{parse, Body};
use proptest::prelude::*;

fn assert_siblings_disjoint(body: &Body) -> Result<(), TestCaseError> {
    for (i, first) in body.blocks.iter().enumerate() {
        for second in &body.blocks[i + 1..] {
            prop_assert!(
                !first.span.overlaps(&second.span),
                "sibling blocks overlap: {} and {}",
                first.span,
                second.span
            );
        }
        assert_siblings_disjoint(&first.body)?;
    }
    Ok(())
}

fn assert_spans_in_bounds(body: &Body, len: usize) -> Result<(), TestCaseError> {
    for attribute in &body.attributes {
        prop_assert!(attribute.span.end <= len);
        prop_assert!(attribute.name_span.start <= attribute.name_span.end);
    }
    for block in &body.blocks {
        prop_assert!(block.span.end <= len);
        prop_assert!(block.header_span.start == block.type_span.start);
        prop_assert!(block.body_span.start >= block.header_span.end);
        assert_spans_in_bounds(&block.body, len)?;
    }
    Ok(())
}

fn block_source(names: &[String]) -> String {
    let mut out = String::new();
    for (i, name) in names.iter().enumerate() {
        out.push_str(&format!("{} \"l{}\" {{\n  attr_{} = \"{}\"\n}}\n", name, i, i, name));
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Property: arbitrary input never panics and spans stay in bounds.
    #[test]
    fn prop_parse_never_panics(input in "\\PC{0,200}") {
        let parsed = parse(&input);
        assert_spans_in_bounds(&parsed.body, input.len())?;
        assert_siblings_disjoint(&parsed.body)?;
    }

    /// Property: HCL-flavoured noise (braces, quotes, interpolations) is handled.
    #[test]
    fn prop_structured_noise(input in "[a-z \"{}\\[\\]=\n$#/*<-]{0,200}") {
        let parsed = parse(&input);
        assert_spans_in_bounds(&parsed.body, input.len())?;
        assert_siblings_disjoint(&parsed.body)?;
    }

    /// Property: well-formed sibling blocks all parse, in order.
    #[test]
    fn prop_sibling_blocks(names in prop::collection::vec("[a-z][a-z_]{0,10}", 1..12)) {
        let source = block_source(&names);
        let parsed = parse(&source);
        prop_assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
        prop_assert_eq!(parsed.body.blocks.len(), names.len());
        for (block, name) in parsed.body.blocks.iter().zip(&names) {
            prop_assert_eq!(&block.block_type, name);
        }
        assert_siblings_disjoint(&parsed.body)?;
    }

    /// Property: nesting depth of well-formed blocks is preserved.
    #[test]
    fn prop_nested_depth(depth in 1_usize..40) {
        let mut source = String::new();
        for i in 0..depth {
            source.push_str(&format!("b{} {{\n", i));
        }
        for _ in 0..depth {
            source.push_str("}\n");
        }
        let parsed = parse(&source);
        prop_assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);

        let mut body = &parsed.body;
        let mut seen = 0;
        while let Some(block) = body.blocks.first() {
            seen += 1;
            body = &block.body;
        }
        prop_assert_eq!(seen, depth);
    }
}

// Pathological nesting must be cut off by the depth limit, never by the stack.

const DEEP: usize = 10_000;

fn reports_nesting_too_deep(source: &str) -> bool {
    parse(source)
        .diagnostics
        .iter()
        .any(|d| d.summary == "Nesting too deep")
}

#[test]
fn test_deep_unary_chain_is_limited() {
    for op in ["!", "-"] {
        let source = format!("a = {}1\nb = 2\n", op.repeat(DEEP));
        let parsed = parse(&source);
        assert!(parsed.diagnostics.iter().any(|d| d.summary == "Nesting too deep"));
        let names: Vec<&str> = parsed.body.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}

#[test]
fn test_deep_index_chain_is_limited() {
    let unclosed = format!("a = {}\n", "x[".repeat(DEEP));
    assert!(reports_nesting_too_deep(&unclosed));

    let balanced = format!("a = {}0{}\n", "x[".repeat(DEEP), "]".repeat(DEEP));
    assert!(reports_nesting_too_deep(&balanced));
}

#[test]
fn test_deep_parentheses_are_limited() {
    let source = format!("a = {}1{}\n", "(".repeat(DEEP), ")".repeat(DEEP));
    assert!(reports_nesting_too_deep(&source));
}

#[test]
fn test_deep_interpolation_is_limited() {
    let source = format!("a = {}{}\n", "\"${".repeat(DEEP), "}\"".repeat(DEEP));
    assert!(reports_nesting_too_deep(&source));
}
