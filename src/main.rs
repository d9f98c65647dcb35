// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
// Allow multiple crate versions for Windows-only dependencies (we only target unix)
#![allow(clippy::multiple_crate_versions)]
//! Tool Version Control (tvc) - Main Application
//!
//! This is the main entry point for the tvc CLI tool, which installs and
//! pins versions of developer tools published as GitHub release archives
//! (arduino-cli, protoc, task).
//!
//! The application supports:
//! - Installing a tool at a concrete or partially-specified version
//! - Listing available versions from the release source
//! - Managing installed versions in the local tool cache
//! - Pruning old or unused versions
//! - Exposing installed binaries on PATH (GITHUB_PATH or ~/.local/bin)

use std::error::Error;
use std::process::exit;

use clap::Parser;

// Import from library
use tvc::cache::get_available_tags;
use tvc::install::{
    InstallOptions, find_cached_version_dir, install, list_installed_versions, prune_versions,
};
use tvc::{Platform, ToolSpec, compare_versions, is_stable_version, matches_request};

mod cli;
use cli::Cli;

/// Main application entry point
///
/// Parses command line arguments and dispatches to appropriate command
/// handlers. Errors are printed to stderr and exit with non-zero status.
fn main() {
    let cli = Cli::parse();

    // Handle completion generation first (exits immediately)
    if cli.completion.is_some() {
        print_bash_completion();
        return;
    }

    if let Err(e) = run(cli) {
        eprintln!("{e}");
        exit(1);
    }
}

/// Dispatch to the appropriate command handler
fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let Some(tool_name) = cli.tool else {
        return Err("tvc: missing tool\nTry 'tvc --help' for more information.".into());
    };
    let Some(tool) = ToolSpec::from_name(&tool_name) else {
        let known: Vec<&str> = ToolSpec::all().iter().map(|t| t.name).collect();
        return Err(format!(
            "tvc: unknown tool '{}' (known tools: {})",
            tool_name,
            known.join(", ")
        )
        .into());
    };

    let options = InstallOptions {
        platform: Platform::detect(),
        token: cli.token,
        include_prerelease: cli.pre_release,
        verbose: cli.verbose,
    };

    if let Some(pattern) = cli.list {
        cmd_list_available(tool, &pattern, &options)
    } else if let Some(pattern) = cli.installed {
        cmd_list_installed(tool, &pattern, &options)
    } else if let Some(pattern) = cli.prune {
        cmd_prune(tool, &pattern, &options)
    } else {
        // Default action: install, falling back to the tool's default request
        let request = cli
            .target_version
            .unwrap_or_else(|| tool.default_request.to_string());
        cmd_install(tool, &request, &options)
    }
}

// =============================================================================
// Command Implementation Functions
// =============================================================================

/// Install a tool version and expose it on PATH
///
/// Resolves partial requests to concrete versions, serves repeat installs
/// from the tool cache, and prints the concrete version on stdout so CI
/// steps can capture it.
fn cmd_install(tool: &ToolSpec, request: &str, options: &InstallOptions) -> Result<(), Box<dyn Error>> {
    let outcome = install(tool, request, options)?;

    if options.verbose && outcome.downloaded {
        eprintln!(
            "Installed: {} ({})",
            outcome.version,
            outcome.bin_dir.display()
        );
    }

    println!("{}", outcome.version);
    Ok(())
}

/// List available versions from the release source matching a pattern
///
/// Pre-release tags are hidden unless --pre-release is given.
fn cmd_list_available(
    tool: &ToolSpec,
    pattern: &str,
    options: &InstallOptions,
) -> Result<(), Box<dyn Error>> {
    let tags = get_available_tags(tool, options.token.as_deref(), options.verbose)?;

    let mut matching: Vec<String> = tags
        .into_iter()
        .filter(|t| matches_request(t, pattern))
        .filter(|t| options.include_prerelease || is_stable_version(t))
        .collect();

    if matching.is_empty() {
        return Err(format!("No versions found matching {pattern}").into());
    }

    matching.sort_by(|a, b| compare_versions(a, b));

    for version in matching {
        println!("{version}");
    }
    Ok(())
}

/// List installed versions matching a pattern
///
/// Shows all versions present in the local tool cache that match the given
/// pattern. In verbose mode, also shows the cache directory of each.
fn cmd_list_installed(
    tool: &ToolSpec,
    pattern: &str,
    options: &InstallOptions,
) -> Result<(), Box<dyn Error>> {
    let all_versions = list_installed_versions(tool, &options.platform)?;

    let matching: Vec<String> = all_versions
        .into_iter()
        .filter(|v| matches_request(v, pattern))
        .collect();

    if matching.is_empty() {
        return Err(format!("No installed versions found matching {pattern}").into());
    }

    for version in matching {
        if options.verbose {
            if let Some(dir) = find_cached_version_dir(tool, &version, &options.platform)? {
                println!("{version} ({})", dir.display());
                continue;
            }
        }
        println!("{version}");
    }
    Ok(())
}

/// Remove installed versions matching a pattern
fn cmd_prune(tool: &ToolSpec, pattern: &str, options: &InstallOptions) -> Result<(), Box<dyn Error>> {
    let removed = prune_versions(tool, pattern, &options.platform, options.verbose)?;

    if options.verbose {
        eprintln!("Removed {} version(s)", removed.len());
    }

    Ok(())
}

/// Print bash completion script
fn print_bash_completion() {
    print!(
        r#"# bash completion for tvc

_tvc_completions() {{
    local cur prev
    COMPREPLY=()
    cur="${{COMP_WORDS[COMP_CWORD]}}"
    prev="${{COMP_WORDS[COMP_CWORD-1]}}"

    if [[ ${{COMP_CWORD}} -eq 1 && "${{cur}}" != -* ]]; then
        COMPREPLY=($(compgen -W "arduino-cli protoc task" -- "${{cur}}"))
        return
    fi

    if [[ "${{cur}}" == -* ]]; then
        local options=(
            "--completion    (Generate shell completion script)"
            "-h              (Print help)"
            "--help          (Print help)"
            "-i              (List installed versions)"
            "--installed     (List installed versions)"
            "-l              (List available versions from the release source)"
            "--list          (List available versions from the release source)"
            "-p              (Remove installed versions)"
            "--prune         (Remove installed versions)"
            "--pre-release   (Include pre-release versions when resolving)"
            "-t              (GitHub API token)"
            "--token         (GitHub API token)"
            "-v              (Make the operation more talkative)"
            "--verbose       (Make the operation more talkative)"
            "--version       (Print version)"
        )

        local IFS=$'\n'
        local opt name padded
        local width=$((COLUMNS - 1))
        for opt in "${{options[@]}}"; do
            name="${{opt%%  *}}"
            if [[ "$name" == "${{cur}}"* ]]; then
                printf -v padded "%-${{width}}s" "$opt"
                COMPREPLY+=("$padded")
            fi
        done

        if ((${{#COMPREPLY[@]}} == 1)); then
            COMPREPLY[0]="${{COMPREPLY[0]%%  *}}"
        fi
    fi
}}

complete -o nosort -F _tvc_completions tvc
"#
    );
}
