use std::borrow::Cow;
use std::cell::Cell;
use std::path::PathBuf;

use weave_agent::{
    Agent, AgentOptions, AgentState, BootstrapArchive, Instrumentation, LoadEvent,
    TransformerChain,
};
use weave_classfile::fixtures::ClassBuilder;
use weave_classfile::ClassFile;
use weave_config::{AgentConfig, PathPolicy};

fn object_class() -> Vec<u8> {
    ClassBuilder::new("java/lang/Object").no_super().build()
}

fn supported_runtime(_: &str) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(Some(object_class()))
}

fn future_runtime(_: &str) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(Some(
        ClassBuilder::new("java/lang/Object")
            .no_super()
            .version(99, 0)
            .build(),
    ))
}

fn app_classes() -> Vec<(String, Vec<u8>)> {
    ["com/example/A", "com/example/B", "com/example/C"]
        .into_iter()
        .map(|name| (name.to_owned(), ClassBuilder::new(name).build()))
        .collect()
}

fn load<'a>(chain: &TransformerChain, name: &'a str, bytes: &'a [u8]) -> Cow<'a, [u8]> {
    chain.define_class(LoadEvent {
        class_name: Some(name),
        code_source: Some("file:/work/app/target/classes/"),
        class_bytes: bytes,
    })
}

#[test]
fn failed_probe_disables_the_agent_entirely() {
    let mut chain = TransformerChain::new();
    let mut agent = Agent::new(AgentOptions::parse(Some("debuglog")));

    assert_eq!(agent.attach(&future_runtime, &mut chain), AgentState::Disabled);
    assert!(chain.is_empty());

    for (name, bytes) in app_classes() {
        let defined = load(&chain, &name, &bytes);
        assert!(matches!(defined, Cow::Borrowed(_)), "{name} was rewritten");
        assert_eq!(&*defined, &bytes[..]);
    }
}

#[test]
fn unreadable_or_missing_bootstrap_disables_the_agent() {
    let missing = |_: &str| -> anyhow::Result<Option<Vec<u8>>> { Ok(None) };
    let broken =
        |_: &str| -> anyhow::Result<Option<Vec<u8>>> { Err(anyhow::anyhow!("rt.jar is gone")) };

    for bootstrap in [
        &missing as &dyn weave_agent::BootstrapClasses,
        &broken as &dyn weave_agent::BootstrapClasses,
    ] {
        let mut chain = TransformerChain::new();
        let mut agent = Agent::new(AgentOptions::default());
        assert_eq!(agent.attach(bootstrap, &mut chain), AgentState::Disabled);
        assert!(chain.is_empty());
    }
}

#[cfg(unix)]
#[test]
fn active_agent_annotates_loaded_classes() {
    let mut chain = TransformerChain::new();
    let mut agent = Agent::new(AgentOptions::default());
    assert_eq!(agent.state(), AgentState::Unattached);
    assert_eq!(agent.attach(&supported_runtime, &mut chain), AgentState::Active);
    assert_eq!(chain.len(), 1);

    for (name, bytes) in app_classes() {
        let defined = load(&chain, &name, &bytes);
        let class = ClassFile::parse(&defined).unwrap();
        assert_eq!(class.this_class_name().unwrap(), name);
        assert_eq!(
            class.source_location().unwrap().as_deref(),
            Some("/work/app/target/classes")
        );
    }
}

#[test]
fn active_agent_passes_through_classes_it_cannot_handle() {
    let mut chain = TransformerChain::new();
    let mut agent = Agent::new(AgentOptions::parse(Some("debuglog")));
    agent.attach(&supported_runtime, &mut chain);

    let bytes = ClassBuilder::new("com/example/A").build();
    let truncated = &bytes[..bytes.len() / 2];
    let defined = chain.define_class(LoadEvent {
        class_name: Some("com/example/A"),
        code_source: Some("file:/work/app/target/classes/"),
        class_bytes: truncated,
    });
    assert_eq!(&*defined, truncated);

    let runtime_image = chain.define_class(LoadEvent {
        class_name: Some("com/example/A"),
        code_source: Some("jrt:/java.base"),
        class_bytes: &bytes,
    });
    assert_eq!(&*runtime_image, &bytes[..]);

    let no_code_source = chain.define_class(LoadEvent {
        class_name: Some("com/example/A"),
        code_source: None,
        class_bytes: &bytes,
    });
    assert_eq!(&*no_code_source, &bytes[..]);
}

#[test]
fn attach_runs_once() {
    let probes = Cell::new(0);
    let counting = |_: &str| -> anyhow::Result<Option<Vec<u8>>> {
        probes.set(probes.get() + 1);
        Ok(Some(object_class()))
    };

    let mut chain = TransformerChain::new();
    let mut agent = Agent::new(AgentOptions::default());
    assert_eq!(agent.attach(&counting, &mut chain), AgentState::Active);
    assert_eq!(agent.attach(&counting, &mut chain), AgentState::Active);
    assert_eq!(probes.get(), 1);
    assert_eq!(chain.len(), 1);

    // A disabled agent stays disabled even if the runtime would now pass.
    let mut chain = TransformerChain::new();
    let mut agent = Agent::new(AgentOptions::default());
    assert_eq!(agent.attach(&future_runtime, &mut chain), AgentState::Disabled);
    assert_eq!(agent.attach(&supported_runtime, &mut chain), AgentState::Disabled);
    assert!(chain.is_empty());
}

#[cfg(unix)]
#[test]
fn config_selects_the_path_policy() {
    let config = AgentConfig {
        debuglog: true,
        path_policy: PathPolicy::ProjectRelative {
            root: PathBuf::from("/work/app"),
        },
    };
    let mut agent = Agent::from_config(&config);
    assert!(agent.options().debuglog);

    let mut chain = TransformerChain::new();
    agent.attach(&supported_runtime, &mut chain);

    let bytes = ClassBuilder::new("com/example/A").build();
    let defined = load(&chain, "com/example/A", &bytes);
    let class = ClassFile::parse(&defined).unwrap();
    assert_eq!(
        class.source_location().unwrap().as_deref(),
        Some("target/classes")
    );
}

#[test]
fn probe_reads_an_exploded_runtime() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("java/lang")).unwrap();
    std::fs::write(tmp.path().join("java/lang/Object.class"), object_class()).unwrap();

    let mut chain = TransformerChain::new();
    let mut agent = Agent::new(AgentOptions::default());
    let bootstrap = BootstrapArchive::new(tmp.path());
    assert_eq!(agent.attach(&bootstrap, &mut chain), AgentState::Active);
}

#[test]
fn chain_runs_hooks_in_registration_order() {
    struct Append(u8);

    impl weave_agent::ClassLoadHook for Append {
        fn on_load(&self, event: &LoadEvent<'_>) -> Option<Vec<u8>> {
            let mut out = event.class_bytes.to_vec();
            out.push(self.0);
            Some(out)
        }
    }

    let mut chain = TransformerChain::new();
    chain.add_transformer(std::sync::Arc::new(Append(1)));
    chain.add_transformer(std::sync::Arc::new(Append(2)));

    let defined = chain.define_class(LoadEvent {
        class_name: Some("x"),
        code_source: None,
        class_bytes: &[0],
    });
    assert_eq!(&*defined, &[0, 1, 2]);
}
