use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use hertpl_cli::Commands;
use hertpl_cli::DepsFormat;
use hertpl_cli::HertplCli;
use hertpl_cli::StageArg;
use hertpl_core::AnyEmptyResult;
use hertpl_core::HertplConfig;
use hertpl_core::HertplError;
use hertpl_core::pipeline::Document;
use hertpl_core::pipeline::Pipeline;
use hertpl_core::pipeline::StageKind;
use hertpl_core::resolver::ProjectResolver;
use hertpl_core::transforms::ScriptDependencies;
use hertpl_core::transforms::scan_script_dependencies;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

const SAMPLE_CONFIG: &str = "# hertpl configuration\n\n# Delimiters of the template \
                             tags.\n[delimiters]\nleft = \"{\"\nright = \"}\"\n\n# Generated \
                             function names look like `<connector><hash><connector><method>`.\n\
                             [naming]\nconnector = \"_\"\nhash_length = 32\n\n# Prefix every \
                             module id with `namespace:`.\n# [resolve]\n# namespace = \
                             \"home\"\n";

fn main() {
	let args = HertplCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Build {
			files,
			out_dir,
			stages,
		}) => run_build(&args, files, out_dir.as_deref(), stages),
		Some(Commands::Deps { file, format }) => run_deps(&args, file, *format),
		None => {
			eprintln!("No subcommand specified. Run `hertpl --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		match e.downcast::<HertplError>() {
			Ok(hertpl_err) => {
				let report: miette::Report = (*hertpl_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Logs go to stderr. `RUST_LOG` picks the filter unless `--verbose` asks
/// for everything at debug level.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::registry()
		.with(
			fmt::layer()
				.with_writer(std::io::stderr)
				.with_ansi(use_color)
				.with_target(true),
		)
		.with(filter)
		.try_init()
		.ok();
}

fn resolve_root(args: &HertplCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// `file` relative to the project root, when it lives inside it.
fn make_relative(file: &Path, root: &Path) -> PathBuf {
	let absolute = if file.is_absolute() {
		file.to_path_buf()
	} else {
		root.join(file)
	};

	absolute
		.strip_prefix(root)
		.map_or_else(|_| file.to_path_buf(), Path::to_path_buf)
}

fn run_init(args: &HertplCli) -> AnyEmptyResult {
	let root = resolve_root(args);

	if let Some(existing) = HertplConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join("hertpl.toml");
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created {}", config_path.display());

	println!();
	println!("Next steps:");
	println!("  1. Adjust the delimiters in hertpl.toml to match your templates");
	println!("  2. Run `hertpl build <FILES>` to transform templates");

	Ok(())
}

fn run_build(
	args: &HertplCli,
	files: &[PathBuf],
	out_dir: Option<&Path>,
	stages: &[StageArg],
) -> AnyEmptyResult {
	let root = resolve_root(args);
	let config = HertplConfig::load_or_default(&root)?;
	let settings = config.settings()?;
	let resolver = Arc::new(ProjectResolver::new(&root, config.resolve.namespace.clone()));

	let pipeline = if stages.is_empty() {
		Pipeline::standard(&settings, resolver.clone())
	} else {
		let kinds: Vec<StageKind> = stages.iter().copied().map(StageKind::from).collect();
		Pipeline::from_stages(&kinds, &settings, resolver.clone())
	};

	tracing::debug!(stages = ?pipeline.stage_names(), root = %resolver.root().display(), "starting build");

	for file in files {
		let relative = make_relative(file, &root);
		let content = std::fs::read_to_string(root.join(&relative))?;
		let id = resolver.file_id(&relative)?;

		let document = pipeline.run(Document::new(&relative, id.into_inner(), content))?;
		let output = document.text().unwrap_or_default();

		match out_dir {
			Some(out_dir) => {
				let target = out_dir.join(&relative);
				if let Some(parent) = target.parent() {
					std::fs::create_dir_all(parent)?;
				}
				std::fs::write(&target, output)?;
				println!("{} {}", colored!("wrote", green), target.display());
			}
			None => print!("{output}"),
		}
	}

	Ok(())
}

#[derive(Serialize)]
struct DepsReport<'a> {
	file: String,
	scripts: &'a [ScriptDependencies],
}

fn run_deps(args: &HertplCli, file: &Path, format: DepsFormat) -> AnyEmptyResult {
	let root = resolve_root(args);
	let settings = HertplConfig::load_or_default(&root)?.settings()?;
	let relative = make_relative(file, &root);
	let content = std::fs::read_to_string(root.join(&relative))?;

	let scripts = scan_script_dependencies(&content, &settings.delimiters)
		.map_err(|error| error.in_file(relative.display().to_string()))?;

	match format {
		DepsFormat::Json => {
			let report = DepsReport {
				file: relative.display().to_string(),
				scripts: &scripts,
			};
			println!("{}", serde_json::to_string_pretty(&report)?);
		}
		DepsFormat::Text => {
			if scripts.is_empty() {
				println!("No script blocks found in {}", relative.display());
				return Ok(());
			}

			for script in &scripts {
				println!(
					"{}",
					colored!(
						format!("{}:{}", relative.display(), script.position),
						bold
					)
				);
				println!("  sync:  {}", script.dependencies.sync.to_array_literal());
				println!("  async: {}", script.dependencies.r#async.to_array_literal());
			}
		}
	}

	Ok(())
}
