// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
// CLI argument definitions for tvc
//
// Separated from main.rs so that build.rs can include this file
// to generate the man page via clap_mangen.

use clap::Parser;

/// CLI argument parser
#[derive(Parser)]
#[command(
    name = "tvc",
    version,
    about = "Tool Version Control - install developer tools from GitHub releases",
    disable_version_flag = true
)]
#[command(arg(clap::Arg::new("version").long("version").action(clap::ArgAction::Version).help("Print version")))]
pub struct Cli {
    /// Tool to operate on (arduino-cli, protoc, task)
    #[arg(value_name = "TOOL")]
    pub tool: Option<String>,

    /// Version to install (e.g. "3.x", "2", "v1.10beta1"; defaults per tool)
    #[arg(value_name = "VERSION")]
    pub target_version: Option<String>,

    /// List available versions from the release source
    #[arg(short = 'l', long = "list", value_name = "VERSION")]
    pub list: Option<String>,

    /// List installed versions
    #[arg(short = 'i', long = "installed", value_name = "VERSION")]
    pub installed: Option<String>,

    /// Remove installed versions
    #[arg(short = 'p', long = "prune", value_name = "VERSION")]
    pub prune: Option<String>,

    /// GitHub API token used when scraping release tags
    #[arg(short = 't', long = "token", value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Include pre-release versions when resolving
    #[arg(long = "pre-release")]
    pub pre_release: bool,

    /// Make the operation more talkative
    #[arg(short, long)]
    pub verbose: bool,

    /// Generate shell completion script (only bash is supported currently)
    #[arg(long = "completion", value_name = "SHELL", value_parser = parse_completion_shell)]
    pub completion: Option<String>,
}

fn parse_completion_shell(s: &str) -> Result<String, String> {
    match s.to_lowercase().as_str() {
        "bash" => Ok(s.to_lowercase()),
        _ => Err(format!("unsupported shell: {s} (only 'bash' is supported)")),
    }
}
