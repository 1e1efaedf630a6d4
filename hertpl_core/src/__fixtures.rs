use std::path::Path;

use crate::Delimiters;
use crate::TemplateSettings;
use crate::resolver::ProjectResolver;

pub fn default_delimiters() -> Delimiters {
	Delimiters::default()
}

pub fn default_settings() -> TemplateSettings {
	TemplateSettings::default()
}

/// Strips the leading `./` and pins every path to version `1.0.0`.
pub fn versioned_resolver() -> impl Fn(&str, &Path) -> String + Send + Sync + 'static {
	|raw: &str, _base: &Path| format!("{}@1.0.0", raw.trim_start_matches("./"))
}

pub fn project_resolver() -> ProjectResolver {
	ProjectResolver::new("/project", Some("home".to_string()))
}

pub const SCRIPT_WITH_FAKE_REQUIRE: &str = r#"{script}var x = "require(fake)"; require("a");{/script}"#;

pub const SCRIPT_WITH_COMMENTED_REQUIRE: &str = "{script}// require(\"b\");\nrequire(\"c\");{/script}";

pub const SCRIPT_WITH_ASYNC_ARRAY: &str = r#"{script}require.async(["x","y"]);{/script}"#;

pub const SERVER_PAGE: &str = r#"<script runat="server">require("./a");</script>
{widget name="./nav"}"#;
