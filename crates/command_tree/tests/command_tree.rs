use std::sync::{Arc, Mutex};

use command_tree::{
    game::{context, subject, subject_from_config, subject_type},
    generic::{optional, seq, string},
    CommandArgs, CommandElement, CommandEngine, CommandErrorCode, CommandSpec, Commander,
    EngineConfig, KeyAllocator, MemorySubjectRegistry, ParseContext, SimpleCommander,
    SubjectRegistry, SubjectStore,
};
use pretty_assertions::assert_eq;
use serde_json::json;

type Journal = Arc<Mutex<Vec<String>>>;

fn registry() -> Arc<dyn SubjectRegistry> {
    Arc::new(
        MemorySubjectRegistry::new()
            .with_subject(SubjectStore::Persistent, "group", "admin")
            .with_subject(SubjectStore::Transient, "group", "adventurer")
            .with_subject(SubjectStore::Persistent, "user", "alice"),
    )
}

fn recording(
    aliases: &[&str],
    arguments: command_tree::ElementRef,
    journal: &Journal,
    render: fn(&dyn Commander, &ParseContext) -> String,
) -> Arc<CommandSpec> {
    let journal = Arc::clone(journal);
    Arc::new(
        CommandSpec::builder()
            .aliases(aliases.iter().copied())
            .arguments(arguments)
            .executor_fn(move |caller, args| {
                journal.lock().expect("journal").push(render(caller, args));
                Ok(())
            })
            .build()
            .expect("build leaf"),
    )
}

fn pex_engine(config: EngineConfig, journal: &Journal) -> CommandEngine {
    let registry = registry();
    let builder = CommandEngine::builder(config);

    let group_add = recording(&["add"], string("name"), journal, |_, args| {
        format!("group add {}", args.one_text(&"name".into()).unwrap_or("?"))
    });
    let group_delete = Arc::new(
        CommandSpec::builder()
            .aliases(["delete", "rm"])
            .permission("pex.group.delete")
            .arguments(string("name"))
            .executor_fn({
                let journal = Arc::clone(journal);
                move |_, args| {
                    let name = args.one_text(&"name".into()).unwrap_or("?");
                    journal
                        .lock()
                        .expect("journal")
                        .push(format!("group delete {name}"));
                    Ok(())
                }
            })
            .build()
            .expect("build delete"),
    );
    let group = Arc::new(
        CommandSpec::builder()
            .aliases(["group", "g"])
            .child_arguments(builder.keys(), [group_add, group_delete])
            .build()
            .expect("build group"),
    );

    let info_subject = subject_from_config(
        "subject",
        Arc::clone(&registry),
        &builder.config().subjects,
    );
    let info = recording(&["info", "i"], info_subject, journal, |caller, args| {
        let subject = args.one_subject(&"subject".into()).expect("subject");
        format!("info {}", caller.formatter().subject(subject))
    });
    let set = recording(
        &["set"],
        seq([subject("subject", Arc::clone(&registry)), optional(context("context"))]),
        journal,
        |caller, args| {
            let subject = args.one_subject(&"subject".into()).expect("subject");
            let pairs = args
                .all_contexts(&"context".into())
                .into_iter()
                .map(|pair| caller.formatter().context(pair))
                .collect::<Vec<_>>();
            format!("set {} {}", subject, pairs.join(","))
        },
    );
    let types = recording(&["types"], subject_type("type", registry), journal, |_, args| {
        format!("types {}", args.one_text(&"type".into()).unwrap_or("?"))
    });

    let pex = CommandSpec::builder()
        .aliases(["pex", "permissionsex"])
        .child_arguments(builder.keys(), [info, set, group, types])
        .build()
        .expect("build pex");

    builder.register(pex).build()
}

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().expect("journal").clone()
}

#[test]
fn child_round_trip_records_spec_and_child_values() {
    let keys = KeyAllocator::new();
    let sub1 = Arc::new(
        CommandSpec::builder()
            .aliases(["sub1"])
            .arguments(string("value"))
            .executor_fn(|_, _| Ok(()))
            .build()
            .expect("build sub1"),
    );
    let root = CommandSpec::builder()
        .aliases(["root"])
        .child_arguments(&keys, [Arc::clone(&sub1)])
        .build()
        .expect("build root");

    let mut args = CommandArgs::parse("sub1 arg").expect("lex");
    let mut context = ParseContext::new();
    root.parse(&mut args, &mut context).expect("parse");

    let dispatcher_key = root.arguments().key().expect("dispatcher key").clone();
    let resolved = context.one_command(&dispatcher_key).expect("resolved");
    assert!(Arc::ptr_eq(resolved, &sub1));
    assert_eq!(context.one_text(&"value".into()), Some("arg"));
    assert!(!args.has_next());
}

#[test]
fn dispatch_runs_nested_leaf() {
    let journal = journal();
    let engine = pex_engine(EngineConfig::default(), &journal);
    let console = SimpleCommander::new("console").with_permission("*");

    engine
        .dispatch(&console, "pex info group:admin")
        .expect("info");
    engine
        .dispatch(&console, "permissionsex g add builders")
        .expect("group add");
    engine
        .dispatch(&console, "pex set user alice world=nether")
        .expect("set");
    engine.dispatch(&console, "pex types user").expect("types");

    assert_eq!(
        entries(&journal),
        vec![
            "info group admin".to_string(),
            "group add builders".to_string(),
            "set user:alice world=nether".to_string(),
            "types user".to_string(),
        ]
    );
}

#[test]
fn parsed_context_renders_as_json() {
    let journal = journal();
    let engine = pex_engine(EngineConfig::default(), &journal);
    let context = engine.parse("pex info group:admin").expect("parse");
    let pex_key = engine
        .root("pex")
        .and_then(|pex| pex.arguments().key())
        .expect("pex dispatcher key")
        .to_string();
    let mut expected = json!({
        "subject": [{ "type": "group", "identifier": "admin" }],
    });
    expected[pex_key] = json!(["info"]);
    expected[engine.dispatcher_key().to_string()] = json!(["pex"]);
    assert_eq!(context.to_json(), expected);
    assert_eq!(context.resolved_commands().len(), 2);
}

#[test]
fn subtrees_built_with_separate_allocators_dispatch_independently() {
    let journal = journal();
    let subtree_keys = KeyAllocator::new();
    let add = recording(&["add"], string("name"), &journal, |_, args| {
        format!("group add {}", args.one_text(&"name".into()).unwrap_or("?"))
    });
    let group = CommandSpec::builder()
        .aliases(["group"])
        .child_arguments(&subtree_keys, [add])
        .build()
        .expect("build group");
    let group_key = group.arguments().key().expect("group key").clone();

    let engine = CommandEngine::builder(EngineConfig::default())
        .register(group)
        .build();
    assert_ne!(engine.dispatcher_key(), &group_key);

    let context = engine.parse("group add builders").expect("parse");
    assert_eq!(context.count(engine.dispatcher_key()), 1);
    assert_eq!(context.count(&group_key), 1);

    let console = SimpleCommander::new("console");
    engine
        .dispatch(&console, "group add builders")
        .expect("dispatch");
    assert_eq!(entries(&journal), vec!["group add builders".to_string()]);
}

#[test]
fn configured_default_type_applies_to_bare_identifiers() {
    let journal = journal();
    let config =
        EngineConfig::from_toml_str("[subjects]\ndefault_type = \"group\"\n").expect("config");
    let engine = pex_engine(config, &journal);
    let console = SimpleCommander::new("console");
    engine.dispatch(&console, "pex i admin").expect("info");
    assert_eq!(entries(&journal), vec!["info group admin".to_string()]);
}

#[test]
fn completion_walks_the_tree() {
    let journal = journal();
    let engine = pex_engine(EngineConfig::default(), &journal);
    let guest = SimpleCommander::new("guest");

    assert_eq!(engine.complete(&guest, ""), vec!["permissionsex", "pex"]);
    assert_eq!(engine.complete(&guest, "pe"), vec!["permissionsex", "pex"]);
    assert_eq!(
        engine.complete(&guest, "pex "),
        vec!["g", "group", "i", "info", "set", "types"]
    );
    assert_eq!(engine.complete(&guest, "pex in"), vec!["info"]);
    assert_eq!(
        engine.complete(&guest, "pex info group:a"),
        vec!["group:admin", "group:adventurer"]
    );
    assert_eq!(engine.complete(&guest, "pex types u"), vec!["user"]);
    assert!(engine.complete(&guest, "pex set user alice wor").is_empty());
    assert!(engine.complete(&guest, "nope ").is_empty());
}

#[test]
fn completion_and_usage_hide_forbidden_children() {
    let journal = journal();
    let engine = pex_engine(EngineConfig::default(), &journal);
    let guest = SimpleCommander::new("guest");
    let admin = SimpleCommander::new("admin").with_permission("pex.group.*");

    assert_eq!(engine.complete(&guest, "pex group "), vec!["add"]);
    assert_eq!(
        engine.complete(&admin, "pex group "),
        vec!["add", "delete", "rm"]
    );

    let group = engine
        .root("pex")
        .and_then(|pex| pex.complete_line(&admin, "gr").into_iter().next())
        .expect("group completion");
    assert_eq!(group, "group");
    assert_eq!(engine.usage(&guest), "permissionsex|pex");
}

#[test]
fn permissions_are_enforced_on_resolved_subcommands() {
    let journal = journal();
    let engine = pex_engine(EngineConfig::default(), &journal);
    let guest = SimpleCommander::new("guest");

    let err = engine
        .dispatch(&guest, "pex group rm builders")
        .expect_err("denied");
    assert_eq!(err.code(), CommandErrorCode::PermissionDenied);
    assert_eq!(err.exit_code(), 4);
    assert!(entries(&journal).is_empty());

    let admin = SimpleCommander::new("admin").with_permission("pex.group.delete");
    engine
        .dispatch(&admin, "pex group rm builders")
        .expect("allowed");
    assert_eq!(entries(&journal), vec!["group delete builders".to_string()]);
}

#[test]
fn input_errors_are_classified() {
    let journal = journal();
    let engine = pex_engine(EngineConfig::default(), &journal);
    let console = SimpleCommander::new("console");

    let unknown = engine
        .dispatch(&console, "pex frobnicate")
        .expect_err("unknown subcommand");
    assert_eq!(unknown.code(), CommandErrorCode::NotFound);
    assert_eq!(
        engine.render_error(&console, &unknown),
        "Unknown subcommand frobnicate\npex frobnicate\n    ^"
    );

    let missing = engine.dispatch(&console, "pex info").expect_err("missing");
    assert_eq!(missing.code(), CommandErrorCode::Usage);
    assert_eq!(missing.to_string(), "Not enough arguments!");

    let extra = engine
        .dispatch(&console, "pex types user group")
        .expect_err("extra");
    assert_eq!(extra.to_string(), "Too many arguments!");

    let bad_type = engine
        .dispatch(&console, "pex types world")
        .expect_err("bad type");
    assert_eq!(bad_type.to_string(), "Subject type world was not valid!");

    let bad_context = engine
        .dispatch(&console, "pex set user:alice nether")
        .expect_err("bad context");
    assert_eq!(
        bad_context.to_string(),
        "Context must be of the form <key>=<value>!"
    );

    let unterminated = engine
        .dispatch(&console, "pex info \"group:admin")
        .expect_err("unterminated quote");
    assert_eq!(unterminated.code(), CommandErrorCode::Usage);
    assert!(entries(&journal).is_empty());
}
