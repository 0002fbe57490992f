//! Calculator Demo - Declarative Page Objects
//!
//! Builds a calculator page object against the in-memory mock host and
//! drives it through the enqueue/settle contract.
//!
//! # Running
//!
//! ```bash
//! cargo run --example calculator_demo -p pagina
//! ```
//!
//! # Features
//!
//! - Hierarchical selector scoping
//! - Default properties (`text`, `click`, `clickOn`, `contains`, ...)
//! - Chainable pending actions settled through `then`

#![allow(clippy::uninlined_format_args, clippy::unwrap_used)]

use pagina::mock::{MockContext, MockElement};
use pagina::{build, Definition, QueryOptions};
use std::rc::Rc;

const KEYPAD: &str = ".calculator :is(a, button, label, input)";

fn main() {
    println!("=== Pagina Calculator Demo ===\n");

    let ctx = wire_mock_dom();
    let page = build_page();
    page.set_context(Rc::new(ctx.clone()));

    demo_selector_resolution(&page);
    demo_chained_clicks(&page, &ctx);
    demo_predicates(&page);

    println!("\n=== Calculator Demo Complete ===");
}

fn wire_mock_dom() -> MockContext {
    let ctx = MockContext::new();
    for digit in ["1", "9"] {
        let id = format!("key-{digit}");
        ctx.add_element(
            MockElement::new(&id)
                .matching(KEYPAD)
                .matching(".calculator .numbers button")
                .with_text(digit),
        );
        let target = digit.to_string();
        ctx.on_click(id, move |dom| dom.append_text("result", &target));
    }
    ctx.add_element(MockElement::new("key-equals").matching(KEYPAD).with_text("="));
    ctx.on_click("key-equals", |_dom| {});
    ctx.add_element(MockElement::new("result").matching(".calculator .screen input"));
    ctx
}

fn build_page() -> pagina::PageNode {
    build(
        Definition::new()
            .scope(".calculator")
            .node(
                "screen",
                Definition::new()
                    .scope(".screen")
                    .node("result", Definition::new().scope("input")),
            )
            .node("keys", Definition::new().scope(".numbers")),
    )
    .unwrap()
}

fn demo_selector_resolution(page: &pagina::PageNode) {
    println!("--- Demo 1: Selector Resolution ---\n");
    let result = page.child("screen").unwrap().child("result").unwrap();
    let resolved = result.resolve_selector(None, &QueryOptions::default());
    println!("screen.result resolves to: {}", resolved);
    let narrowed = result.resolve_selector(None, &QueryOptions::new().with_at(0));
    println!("with at(0): {}\n", narrowed);
}

fn demo_chained_clicks(page: &pagina::PageNode, ctx: &MockContext) {
    println!("--- Demo 2: Chained Clicks ---\n");
    let chain = page
        .click_on("9")
        .unwrap()
        .click_on("1")
        .unwrap()
        .click_on("=")
        .unwrap();
    println!("pending before settle: {}", ctx.pending_count());
    chain.then().unwrap();
    println!("pending after settle:  {}", ctx.pending_count());
    let display = page
        .child("screen")
        .unwrap()
        .child("result")
        .unwrap()
        .text()
        .unwrap();
    println!("screen shows: {display:?}\n");
}

fn demo_predicates(page: &pagina::PageNode) {
    println!("--- Demo 3: Predicates ---\n");
    let result = page.child("screen").unwrap().child("result").unwrap();
    println!("result.is_visible: {}", result.is_visible().unwrap());
    println!("result.contains(\"91\"): {}", result.contains("91").unwrap());
    println!("result.contains(\"99\"): {}", result.contains("99").unwrap());
}
