use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use hertpl_core::pipeline::StageKind;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Preprocess smarty templates before they are compiled.",
	long_about = "hertpl rewrites smarty templates ahead of compilation: server side <script> \
	              tags become template blocks, relative paths become module ids, script \
	              blocks gain their require dependencies and define blocks become named \
	              functions.\n\nQuick start:\n  hertpl init   Create a hertpl.toml\n  hertpl \
	              build  Transform template files\n  hertpl deps   List the dependencies of \
	              each script block"
)]
pub struct HertplCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `hertpl.toml` in the project root.
	///
	/// If the file already exists, this command is a no-op and exits
	/// successfully.
	Init,
	/// Run the template pipeline over one or more files.
	///
	/// Relative file paths are resolved against the project root. Without
	/// `--out-dir` every transformed file is printed to stdout.
	Build {
		/// Template files to transform.
		#[arg(required = true)]
		files: Vec<PathBuf>,

		/// Write transformed files here, keeping their path relative to the
		/// project root.
		#[arg(long, short)]
		out_dir: Option<PathBuf>,

		/// Run only these stages, in the given order. Defaults to every
		/// stage.
		#[arg(long = "stage", short, value_enum)]
		stages: Vec<StageArg>,
	},
	/// List the dependencies of every script block in a file.
	Deps {
		/// The template file to inspect.
		file: PathBuf,

		/// Output format.
		#[arg(long, value_enum, default_value_t = DepsFormat::Text)]
		format: DepsFormat,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StageArg {
	/// `<script runat="server">` becomes a template script block.
	ReplaceScriptTag,
	/// Relative paths become module ids.
	ExpandPath,
	/// Script blocks gain `sync` and `async` dependency attributes.
	AnalyseScript,
	/// `define` blocks become named functions.
	DefineWidget,
}

impl From<StageArg> for StageKind {
	fn from(stage: StageArg) -> Self {
		match stage {
			StageArg::ReplaceScriptTag => StageKind::ReplaceScriptTag,
			StageArg::ExpandPath => StageKind::ExpandPath,
			StageArg::AnalyseScript => StageKind::AnalyseScript,
			StageArg::DefineWidget => StageKind::DefineWidget,
		}
	}
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DepsFormat {
	/// Human-readable text output.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
