//! Test host shared by the engine, resolver and bridge tests.

use std::sync::{Arc, OnceLock};

use anyhow::bail;
use serde_json::{Value, json};

use alive_types::agent::{AgentBinding, BackendRef, ParamSpec};
use alive_types::selector::Selector;
use alive_types::tag::Tag;

use crate::backend::{BackendRegistry, BoxBackend};
use crate::host::{Alive, Memory};
use crate::registry::TypeRegistry;
use crate::tool::ToolArgs;

pub(crate) struct Counter {
    memory: Memory,
}

impl Counter {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            memory: Memory::for_type::<Counter>(),
        })
    }
}

impl Alive for Counter {
    fn memory(&self) -> &Memory {
        &self.memory
    }

    fn registry() -> &'static TypeRegistry<Self> {
        static REGISTRY: OnceLock<TypeRegistry<Counter>> = OnceLock::new();
        REGISTRY.get_or_init(build_registry)
    }
}

async fn increment(host: Arc<Counter>, args: ToolArgs) -> anyhow::Result<Value> {
    let by: i64 = args.get("by")?;
    let next = host
        .memory()
        .update("counter", |v| *v = json!(v.as_i64().unwrap_or(0) + by))?;
    Ok(next)
}

async fn add_note(host: Arc<Counter>, args: ToolArgs) -> anyhow::Result<Value> {
    let text: String = args.get("text")?;
    let notes = host.memory().update("notes", |v| {
        if let Some(items) = v.as_array_mut() {
            items.push(json!(text));
        }
    })?;
    Ok(json!(notes.as_array().map(Vec::len).unwrap_or(0)))
}

async fn fail_always(_host: Arc<Counter>, _args: ToolArgs) -> anyhow::Result<Value> {
    bail!("disk on fire")
}

fn agent(targets: &[&str]) -> AgentBinding {
    AgentBinding::new(targets.iter().map(|t| t.parse::<BackendRef>().unwrap()))
}

fn build_registry() -> TypeRegistry<Counter> {
    TypeRegistry::builder("Counter")
        .field("counter", 0i64, "how many times we counted", &["stats"])
        .field("notes", Vec::<String>::new(), "journal entries", &["journal"])
        .field("mood", "calm".to_string(), "", &[])
        .tool(
            "increment",
            "<Increase the counter.>\nAdd `by` to the counter and return the new value.",
            vec![ParamSpec::optional::<i64>("by", json!(1)).describe("amount to add")],
            &["write", "stats"],
            increment,
        )
        .tool(
            "add_note",
            "Append a journal entry.",
            vec![ParamSpec::required::<String>("text")],
            &["journal", "write"],
            add_note,
        )
        .tool("fail_always", "<Always fails.>", vec![], &["danger"], fail_always)
        .agent(
            "summarize",
            "<Summarize the counter.>\nDescribe the counter state in one sentence.",
            vec![],
            &[],
            agent(&["alpha:model-x"]).returns::<String>(),
        )
        .agent(
            "bump_twice",
            "Call increment twice and report the counter.",
            vec![],
            &[],
            agent(&["counter_bot"])
                .include([Selector::method("increment")])
                .returns::<i64>(),
        )
        .agent(
            "stats_only",
            "",
            vec![],
            &[],
            agent(&["stats_bot"]).include([Selector::tag("stats")]),
        )
        .agent(
            "without_journal",
            "",
            vec![],
            &[],
            agent(&["alpha"]).exclude([Selector::tag("journal")]),
        )
        .agent(
            "everything",
            "",
            vec![],
            &[],
            agent(&["alpha"]).include([Selector::All]),
        )
        .agent(
            "nothing",
            "",
            vec![],
            &[],
            agent(&["alpha"]).exclude([Selector::All]),
        )
        .agent(
            "haunted",
            "",
            vec![],
            &[],
            agent(&["spy"]).include([Selector::Tag(Tag::new("ghost"))]),
        )
        .agent(
            "pair",
            "",
            vec![],
            &[],
            agent(&["slow", "fast"]).tolerate_partial().returns::<i64>(),
        )
        .agent(
            "strict_pair",
            "",
            vec![],
            &[],
            agent(&["slow", "broken", "fast"]).returns::<i64>(),
        )
        .agent(
            "bump_once",
            "<Bump the counter by some amount.>",
            vec![ParamSpec::optional::<i64>("by", json!(5))],
            &[],
            agent(&["inner"]).include([Selector::method("increment")]),
        )
        .agent(
            "delegate",
            "Hand the work to another agent.",
            vec![],
            &[],
            agent(&["delegator"]).include([Selector::Tag(Tag::agent())]),
        )
        .agent(
            "recursive",
            "",
            vec![],
            &[],
            agent(&["loop"]).include([Selector::method("recursive")]),
        )
        .agent(
            "risky",
            "",
            vec![],
            &[],
            agent(&["alpha"]).include([Selector::name("fail_always")]),
        )
        .agent(
            "smoke",
            "",
            vec![],
            &[],
            agent(&["test"])
                .include([Selector::tag("stats"), Selector::tag("journal")])
                .returns::<i64>(),
        )
        .agent(
            "inspect",
            "",
            vec![],
            &[],
            agent(&["inspector"]).include([
                Selector::Tag(Tag::memory()),
                Selector::field("mood"),
                Selector::field("notes"),
            ]),
        )
        .agent(
            "discreet",
            "",
            vec![],
            &[],
            agent(&["peeker"]).exclude([Selector::field("mood")]),
        )
        .agent("unbacked", "", vec![], &[], agent(&["nowhere"]))
        .build()
        .expect("Counter declarations are valid")
}

/// Registry holding one backend per `(key, backend)` pair.
pub(crate) fn backends<B>(entries: impl IntoIterator<Item = (&'static str, B)>) -> BackendRegistry
where
    B: crate::backend::Backend + 'static,
{
    entries
        .into_iter()
        .fold(BackendRegistry::new(), |registry, (key, backend)| {
            registry.with(key, BoxBackend::new(backend))
        })
}
