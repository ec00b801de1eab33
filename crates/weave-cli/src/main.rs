use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use weave_agent::{
    probe, BootstrapArchive, CodeLocation, SourceMetadataTransformer, TransformError,
};
use weave_classfile::{ClassFile, Member};
use weave_config::WeaveConfig;
use weave_lookup::{
    find_source, ClasspathEntryKind, DescriberRegistry, ProjectModel, SourceMatch,
    SourceSearchDirective,
};

#[derive(Parser)]
#[command(
    name = "weave",
    version,
    about = "Inspect and weave source locations into class files"
)]
struct Cli {
    /// Path to a `weave.toml` configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level (same as the agent's `debuglog` option)
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of a class file
    Inspect(InspectArgs),
    /// Record a code location in a class file
    Transform(TransformArgs),
    /// Check whether a runtime's bootstrap classes can be instrumented
    Probe(ProbeArgs),
    /// Print the source-search directives for a project manifest
    Describe(DescribeArgs),
    /// Resolve a source file against a project's directives
    Find(FindArgs),
}

#[derive(Args)]
struct InspectArgs {
    /// Class file to read
    class: PathBuf,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TransformArgs {
    /// Class file to rewrite
    class: PathBuf,
    /// Code-source URL the class was loaded from (e.g. `file:/app/target/classes/`)
    #[arg(long)]
    location: String,
    /// Where to write the result (defaults to rewriting the input in place)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ProbeArgs {
    /// Runtime class source: an exploded directory, `rt.jar` or `java.base.jmod`
    bootstrap: PathBuf,
}

#[derive(Args)]
struct DescribeArgs {
    /// Project manifest (`.toml` or `.json`)
    manifest: PathBuf,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FindArgs {
    /// Project manifest (`.toml` or `.json`)
    manifest: PathBuf,
    /// Source path relative to a source root, e.g. `com/example/A.java`
    source: String,
    /// Emit JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => WeaveConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => WeaveConfig::default(),
    };
    let logging = if cli.verbose || config.agent.debuglog {
        config.logging.verbose()
    } else {
        config.logging.clone()
    };
    weave_config::init_tracing(&logging);

    match cli.command {
        Command::Inspect(args) => {
            let bytes = read(&args.class)?;
            let class = ClassFile::parse(&bytes)
                .with_context(|| format!("failed to parse {}", args.class.display()))?;
            let summary = ClassSummary::new(&class)?;
            if args.json {
                print_json(&summary)?;
            } else {
                summary.print();
            }
            Ok(0)
        }
        Command::Transform(args) => {
            let bytes = read(&args.class)?;
            let location = CodeLocation::from_code_source(Some(&args.location));
            let transformer = SourceMetadataTransformer::new(config.agent.path_policy.clone());
            let output = args.output.as_deref().unwrap_or(&args.class);
            match transformer.try_transform(&bytes, &location) {
                Ok(Some(rewritten)) => {
                    std::fs::write(output, rewritten)
                        .with_context(|| format!("failed to write {}", output.display()))?;
                    tracing::info!(
                        target: "weave.cli",
                        output = %output.display(),
                        "class rewritten"
                    );
                    println!("rewritten: {}", output.display());
                }
                Ok(None) => {
                    if output != args.class {
                        std::fs::write(output, &bytes)
                            .with_context(|| format!("failed to write {}", output.display()))?;
                    }
                    println!("unchanged: {}", args.class.display());
                }
                Err(TransformError::UnresolvableLocation) => anyhow::bail!(
                    "location {:?} does not resolve to a filesystem path",
                    args.location
                ),
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to transform {}", args.class.display()))
                }
            }
            Ok(0)
        }
        Command::Probe(args) => {
            let bootstrap = BootstrapArchive::new(&args.bootstrap);
            match probe(&bootstrap) {
                Ok(()) => {
                    println!("supported: {}", args.bootstrap.display());
                    Ok(0)
                }
                Err(err) => {
                    println!("unsupported: {err}");
                    Ok(1)
                }
            }
        }
        Command::Describe(args) => {
            let project = load_project(&args.manifest)?;
            let directives = DescriberRegistry::default().describe_all(&project);
            if args.json {
                print_json(&directives)?;
            } else {
                for directive in &directives {
                    println!("{}", render_directive(directive));
                }
            }
            Ok(0)
        }
        Command::Find(args) => {
            let project = load_project(&args.manifest)?;
            let directives = DescriberRegistry::default().describe_all(&project);
            let found = find_source(&directives, &args.source);
            if args.json {
                print_json(&found)?;
            } else {
                match &found {
                    Some(SourceMatch::File { path }) => println!("{}", path.display()),
                    Some(SourceMatch::ArchiveEntry { archive, entry }) => {
                        println!("{}!/{}", archive.display(), entry)
                    }
                    None => eprintln!("not found: {}", args.source),
                }
            }
            Ok(if found.is_some() { 0 } else { 1 })
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn load_project(manifest: &Path) -> Result<ProjectModel> {
    ProjectModel::load(manifest)
        .with_context(|| format!("failed to load project manifest {}", manifest.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

fn kind_label(kind: ClasspathEntryKind) -> &'static str {
    match kind {
        ClasspathEntryKind::Directory => "directory",
        ClasspathEntryKind::Jar => "jar",
    }
}

fn render_directive(directive: &SourceSearchDirective) -> String {
    match directive {
        SourceSearchDirective::Dependency {
            entry_kind,
            location,
            sources: Some(sources),
        } => format!(
            "dependency {} [{}] (sources: {})",
            location.display(),
            kind_label(*entry_kind),
            sources.display()
        ),
        SourceSearchDirective::Dependency {
            entry_kind,
            location,
            sources: None,
        } => format!(
            "dependency {} [{}]",
            location.display(),
            kind_label(*entry_kind)
        ),
        SourceSearchDirective::OutputBinding {
            output_dir,
            source_root,
        } => format!(
            "output {} -> {}",
            output_dir.display(),
            source_root.display()
        ),
        SourceSearchDirective::ProjectFallback {
            project,
            source_roots,
        } => {
            let roots: Vec<String> = source_roots
                .iter()
                .map(|root| root.display().to_string())
                .collect();
            format!("project {project} [{}]", roots.join(", "))
        }
    }
}

#[derive(Serialize)]
struct ClassSummary {
    name: String,
    super_class: Option<String>,
    major_version: u16,
    minor_version: u16,
    constant_pool_slots: u16,
    fields: Vec<String>,
    methods: Vec<String>,
    source_file: Option<String>,
    source_location: Option<String>,
}

fn member_names(class: &ClassFile<'_>, members: &[Member<'_>]) -> Result<Vec<String>> {
    members
        .iter()
        .map(|member| -> Result<String> { Ok(class.member_name(member)?.into_owned()) })
        .collect()
}

impl ClassSummary {
    fn new(class: &ClassFile<'_>) -> Result<Self> {
        Ok(Self {
            name: class.this_class_name()?.into_owned(),
            super_class: class.super_class_name()?.map(|name| name.into_owned()),
            major_version: class.major_version,
            minor_version: class.minor_version,
            constant_pool_slots: class.constant_pool.len(),
            fields: member_names(class, &class.fields)?,
            methods: member_names(class, &class.methods)?,
            source_file: class.source_file()?.map(|name| name.into_owned()),
            source_location: class.source_location()?.map(|path| path.into_owned()),
        })
    }

    fn print(&self) {
        println!("class: {}", self.name);
        if let Some(super_class) = &self.super_class {
            println!("  super: {super_class}");
        }
        println!("  version: {}.{}", self.major_version, self.minor_version);
        println!("  constant_pool_slots: {}", self.constant_pool_slots);
        println!("  fields: {}", self.fields.join(", "));
        println!("  methods: {}", self.methods.join(", "));
        println!(
            "  source_file: {}",
            self.source_file.as_deref().unwrap_or("(none)")
        );
        println!(
            "  source_location: {}",
            self.source_location.as_deref().unwrap_or("(none)")
        );
    }
}
