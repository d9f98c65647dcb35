// GNU Affero General Public License v3.0 or later (see LICENSE or https://www.gnu.org/licenses/agpl.txt)
//! Tests for the tvc library and CLI application
//!
//! This module contains unit tests for the version resolver, the tool
//! registry and the cache layers, plus integration tests for the offline
//! parts of the CLI application.

use std::process::Command;
use std::sync::Mutex;

use tvc::*;

// Tests that override XDG_CACHE_HOME must not run in parallel
static CACHE_ENV_LOCK: Mutex<()> = Mutex::new(());

// Helper function to run tvc command and capture output
fn run_tvc(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "--"])
        .args(args)
        .output()
        .expect("Failed to execute tvc command")
}

fn tags(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_string()).collect()
}

// =============================================================================
// UNIT TESTS - Library Functions
// =============================================================================

#[cfg(test)]
mod normalization_tests {
    use super::*;

    #[test]
    fn test_bare_major_gets_zero_components() {
        assert_eq!(normalize_version("2"), "2.0.0");
        assert_eq!(normalize_version("10"), "10.0.0");
    }

    #[test]
    fn test_major_minor_gets_zero_patch() {
        assert_eq!(normalize_version("3.9"), "3.9.0");
        assert_eq!(normalize_version("0.3"), "0.3.0");
    }

    #[test]
    fn test_glued_prerelease_in_minor_component() {
        assert_eq!(normalize_version("1.10beta1"), "1.10.0-beta1");
        assert_eq!(normalize_version("1.10rc1"), "1.10.0-rc1");
        assert_eq!(normalize_version("1.10preview2"), "1.10.0-preview2");
    }

    #[test]
    fn test_glued_prerelease_in_patch_component() {
        assert_eq!(normalize_version("1.8.5beta1"), "1.8.5-beta1");
        assert_eq!(normalize_version("1.8.5rc1"), "1.8.5-rc1");
        assert_eq!(normalize_version("3.20.0rc2"), "3.20.0-rc2");
    }

    #[test]
    fn test_strict_versions_unchanged() {
        // Identity on well-formed three-component versions
        for v in ["3.9.1", "0.0.1", "10.20.30", "4.19.0"] {
            assert_eq!(normalize_version(v), v);
        }
    }

    #[test]
    fn test_normalization_is_idempotent_on_strict_form() {
        for raw in ["2", "3.9", "1.10beta1", "1.8.5rc1"] {
            let once = normalize_version(raw);
            // Hyphenated pre-release labels are already strict
            if !once.contains('-') {
                assert_eq!(normalize_version(&once), once);
            }
        }
    }

    #[test]
    fn test_extra_components_pass_through() {
        // More than three dot-components is an accepted quirk, not an error
        assert_eq!(normalize_version("1.2.3.4"), "1.2.3.4");
    }
}

#[cfg(test)]
mod version_comparison_tests {
    use super::*;

    #[test]
    fn test_compare_versions_basic() {
        assert_eq!(compare_versions("3.7.0", "3.9.0"), std::cmp::Ordering::Less);
        assert_eq!(
            compare_versions("3.10.0", "3.2.0"),
            std::cmp::Ordering::Greater
        );
        assert_eq!(
            compare_versions("3.9.1", "3.9.1"),
            std::cmp::Ordering::Equal
        );
    }

    #[test]
    fn test_compare_versions_prerelease() {
        // A stable release outranks its own pre-releases
        assert_eq!(
            compare_versions("3.9.0-rc1", "3.9.0"),
            std::cmp::Ordering::Less
        );
        assert_eq!(
            compare_versions("3.9.0", "3.9.0-rc1"),
            std::cmp::Ordering::Greater
        );
        assert_eq!(
            compare_versions("3.9.0-rc1", "3.9.0-rc2"),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn test_compare_versions_patch() {
        assert_eq!(compare_versions("1.8.1", "1.8.10"), std::cmp::Ordering::Less);
        assert_eq!(
            compare_versions("1.8.15", "1.8.5"),
            std::cmp::Ordering::Greater
        );
    }

    #[test]
    fn test_compare_versions_missing_components_count_as_zero() {
        assert_eq!(compare_versions("2", "2.0.0"), std::cmp::Ordering::Equal);
        assert_eq!(compare_versions("2.1", "2"), std::cmp::Ordering::Greater);
    }
}

#[cfg(test)]
mod stability_tests {
    use super::*;

    #[test]
    fn test_stable_versions() {
        assert!(is_stable_version("3.9.1"));
        assert!(is_stable_version("0.36.0"));
    }

    #[test]
    fn test_prerelease_versions() {
        assert!(!is_stable_version("1.10beta1"));
        assert!(!is_stable_version("3.9.0-rc1"));
        assert!(!is_stable_version("2.0.0-preview3"));
        assert!(!is_stable_version("0.3.7-alpha.preview"));
    }

    #[test]
    fn test_marker_letters_inside_words_are_not_prerelease() {
        // "rc" inside an unrelated suffix word is not a pre-release label
        assert!(is_stable_version("3.0.0-arch"));
        assert!(is_stable_version("1.0.0-research"));
    }
}

#[cfg(test)]
mod request_matching_tests {
    use super::*;

    #[test]
    fn test_plain_prefix_match() {
        assert!(matches_request("3.9.1", "3.9"));
        assert!(matches_request("3.9.1", "3"));
        assert!(!matches_request("3.9.1", "4"));
    }

    #[test]
    fn test_decorated_patterns() {
        assert!(matches_request("3.9.1", "3.x"));
        assert!(matches_request("3.9.1", "v3.9"));
        assert!(matches_request("2.6.0", "v2.x"));
    }
}

#[cfg(test)]
mod resolver_tests {
    use super::*;

    #[test]
    fn test_resolves_latest_patch_for_partial_request() {
        let available = tags(&["3.7.0", "3.7.1", "3.9.0", "3.9.1"]);
        assert_eq!(resolve_version("3.7", &available).unwrap(), "3.7.1");
    }

    #[test]
    fn test_wildcard_request_picks_highest_stable_over_prerelease() {
        let available = tags(&["3.9.1", "3.9.0", "3.9.0-rc1"]);
        assert_eq!(resolve_version("3.x", &available).unwrap(), "3.9.1");
    }

    #[test]
    fn test_empty_tag_set_is_no_tags_available() {
        assert_eq!(
            resolve_version("3.x", &[]),
            Err(ResolveError::NoTagsAvailable)
        );
    }

    #[test]
    fn test_unmatched_request_is_no_matching_version() {
        let available = tags(&["2.0.0"]);
        assert_eq!(
            resolve_version("5", &available),
            Err(ResolveError::NoMatchingVersion {
                request: "5".to_string()
            })
        );
    }

    #[test]
    fn test_v_prefix_is_preserved_in_result() {
        let available = tags(&["3.9.1"]);
        assert_eq!(resolve_version("v3.x", &available).unwrap(), "v3.9.1");
        // Without the prefix in the request, none is added
        assert_eq!(resolve_version("3.x", &available).unwrap(), "3.9.1");
    }

    #[test]
    fn test_returns_original_tag_text_not_normalized_form() {
        // "1.10beta1" normalizes to "1.10.0-beta1" for ordering but the raw
        // tag text comes back out
        let available = tags(&["1.10beta1"]);
        assert_eq!(resolve_version("1.10", &available).unwrap(), "1.10beta1");
    }

    #[test]
    fn test_stable_outranks_glued_prerelease() {
        let available = tags(&["1.10beta1", "1.10.1"]);
        assert_eq!(resolve_version("1.10", &available).unwrap(), "1.10.1");
    }

    #[test]
    fn test_bare_major_request() {
        let available = tags(&["2.1.0", "2.6.0", "3.0.0"]);
        assert_eq!(resolve_version("2", &available).unwrap(), "2.6.0");
    }

    #[test]
    fn test_normalization_collision_last_tag_wins() {
        // "3.9" and "3.9.0" normalize identically; the later tag in source
        // order is the one returned
        let available = tags(&["3.9", "3.9.0"]);
        assert_eq!(resolve_version("3.9", &available).unwrap(), "3.9.0");

        let reversed = tags(&["3.9.0", "3.9"]);
        assert_eq!(resolve_version("3.9", &reversed).unwrap(), "3.9");
    }

    #[test]
    fn test_source_order_does_not_matter_for_distinct_versions() {
        let available = tags(&["3.9.1", "3.7.0", "3.9.0", "3.7.1"]);
        assert_eq!(resolve_version("3.x", &available).unwrap(), "3.9.1");
        assert_eq!(resolve_version("3.7", &available).unwrap(), "3.7.1");
    }
}

// =============================================================================
// UNIT TESTS - Tool Registry and Platform
// =============================================================================

#[cfg(test)]
mod tool_registry_tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(ToolSpec::from_name("task").map(|t| t.repo), Some("task"));
        assert_eq!(
            ToolSpec::from_name("protoc").map(|t| t.owner),
            Some("protocolbuffers")
        );
        assert!(ToolSpec::from_name("nonexistent").is_none());
    }

    #[test]
    fn test_tags_url() {
        assert_eq!(
            ToolSpec::ARDUINO_CLI.tags_url(),
            "https://api.github.com/repos/arduino/arduino-cli/git/refs/tags"
        );
    }

    #[test]
    fn test_archive_format_per_tool() {
        // protoc ships zip everywhere
        assert_eq!(
            ToolSpec::PROTOC.archive_format(&Platform::LINUX_X86_64),
            ArchiveFormat::Zip
        );
        assert_eq!(
            ToolSpec::TASK.archive_format(&Platform::LINUX_X86_64),
            ArchiveFormat::TarGz
        );
        assert_eq!(
            ToolSpec::TASK.archive_format(&Platform::WINDOWS_X86_64),
            ArchiveFormat::Zip
        );
    }

    #[test]
    fn test_protoc_download_url() {
        let url = ToolSpec::PROTOC.build_download_url("3.9.1", &Platform::LINUX_X86_64);
        assert_eq!(
            url,
            "https://github.com/protocolbuffers/protobuf/releases/download/v3.9.1/protoc-3.9.1-linux-x86_64.zip"
        );
    }

    #[test]
    fn test_task_download_url() {
        let url = ToolSpec::TASK.build_download_url("2.6.0", &Platform::LINUX_X86_64);
        assert_eq!(
            url,
            "https://github.com/go-task/task/releases/download/v2.6.0/task_linux_amd64.tar.gz"
        );
    }

    #[test]
    fn test_arduino_cli_download_url() {
        // arduino-cli tags carry no "v", so neither does the release path
        let url = ToolSpec::ARDUINO_CLI.build_download_url("0.36.0", &Platform::MAC_ARM64);
        assert_eq!(
            url,
            "https://github.com/arduino/arduino-cli/releases/download/0.36.0/arduino-cli_0.36.0_macOS_ARM64.tar.gz"
        );
    }

    #[test]
    fn test_v_prefixed_version_is_not_doubled() {
        let url = ToolSpec::TASK.build_download_url("v2.6.0", &Platform::LINUX_X86_64);
        assert_eq!(
            url,
            "https://github.com/go-task/task/releases/download/v2.6.0/task_linux_amd64.tar.gz"
        );
    }

    #[test]
    fn test_archive_names_follow_upstream_schemes() {
        assert_eq!(
            ToolSpec::PROTOC.archive_name("3.9.1", &Platform::LINUX_ARM64),
            "protoc-3.9.1-linux-aarch_64.zip"
        );
        assert_eq!(
            ToolSpec::PROTOC.archive_name("3.9.1", &Platform::MAC_X86_64),
            "protoc-3.9.1-osx-x86_64.zip"
        );
        assert_eq!(
            ToolSpec::ARDUINO_CLI.archive_name("0.9.0", &Platform::WINDOWS_X86_64),
            "arduino-cli_0.9.0_Windows_64bit.zip"
        );
        assert_eq!(
            ToolSpec::TASK.archive_name("2.6.0", &Platform::MAC_ARM64),
            "task_darwin_arm64.tar.gz"
        );
    }

    #[test]
    fn test_default_requests() {
        assert_eq!(ToolSpec::TASK.default_request, "2.x");
        // Empty request means latest
        assert_eq!(ToolSpec::PROTOC.default_request, "");
    }
}

#[cfg(test)]
mod platform_tests {
    use super::*;

    #[test]
    fn test_detect_returns_known_platform() {
        let platform = Platform::detect();
        let known = [
            Platform::LINUX_X86_64,
            Platform::LINUX_ARM64,
            Platform::MAC_X86_64,
            Platform::MAC_ARM64,
            Platform::WINDOWS_X86_64,
        ];
        assert!(known.contains(&platform));
    }

    #[test]
    fn test_platform_fields() {
        assert_eq!(Platform::LINUX_X86_64.os, "linux");
        assert_eq!(Platform::LINUX_X86_64.arch, "x86_64");
        assert!(!Platform::LINUX_X86_64.is_windows());
        assert!(Platform::WINDOWS_X86_64.is_windows());
    }
}

// =============================================================================
// UNIT TESTS - Cache Layers
// =============================================================================

#[cfg(test)]
mod tag_cache_tests {
    use super::*;
    use tvc::cache::TagCache;

    #[test]
    fn test_tag_cache_matching() {
        let cache = TagCache::new(tags(&["3.7.0", "3.9.1"]));
        assert!(cache.has_matching("3.7"));
        assert!(cache.has_matching("3.x"));
        assert!(!cache.has_matching("4.x"));
    }

    #[test]
    fn test_tag_cache_preserves_source_order() {
        let cache = TagCache::new(tags(&["3.9.1", "3.7.0"]));
        assert_eq!(cache.tags(), &["3.9.1".to_string(), "3.7.0".to_string()]);
    }

    #[test]
    fn test_tag_cache_serde_roundtrip() {
        let cache = TagCache::new(tags(&["3.7.0", "3.9.1"]));
        let json = serde_json::to_string(&cache).unwrap();
        let loaded: TagCache = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.tags(), cache.tags());
        assert_eq!(loaded.timestamp(), cache.timestamp());
    }

    #[test]
    fn test_format_cache_age() {
        let now = chrono::Utc::now();
        assert_eq!(tvc::cache::format_cache_age(&now), "0s ago");

        let two_hours_ago = now - chrono::Duration::hours(2);
        assert_eq!(tvc::cache::format_cache_age(&two_hours_ago), "2h ago");

        let thirty_minutes_ago = now - chrono::Duration::minutes(30);
        assert_eq!(tvc::cache::format_cache_age(&thirty_minutes_ago), "30m ago");
    }

    #[test]
    fn test_cache_file_save_load_and_corruption() {
        let _env = CACHE_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var("XDG_CACHE_HOME", temp.path());
        }

        let tool = &ToolSpec::TASK;

        // No cache yet
        assert!(tvc::cache::load_cached_tags(tool).unwrap().is_none());

        // Save and load roundtrip
        let saved = tags(&["2.6.0", "2.5.2"]);
        tvc::cache::save_cached_tags(tool, &saved).unwrap();
        let loaded = tvc::cache::load_cached_tags(tool).unwrap().unwrap();
        assert_eq!(loaded.tags(), saved.as_slice());

        // A corrupted cache file is removed and treated as absent
        let cache_file = tvc::cache::get_cache_file_path(tool).unwrap();
        std::fs::write(&cache_file, "not json").unwrap();
        assert!(tvc::cache::load_cached_tags(tool).unwrap().is_none());
        assert!(!cache_file.exists());

        unsafe {
            std::env::remove_var("XDG_CACHE_HOME");
        }
    }
}

#[cfg(test)]
mod resolution_policy_tests {
    use super::*;
    use tvc::install::{InstallOptions, resolve_with_cache};

    fn offline_options(include_prerelease: bool) -> InstallOptions {
        InstallOptions {
            platform: Platform::LINUX_X86_64,
            token: None,
            include_prerelease,
            verbose: false,
        }
    }

    #[test]
    fn test_prerelease_tags_gated_by_flag() {
        let _env = CACHE_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var("XDG_CACHE_HOME", temp.path());
        }

        let tool = &ToolSpec::ARDUINO_CLI;
        tvc::cache::save_cached_tags(tool, &tags(&["3.9.0", "3.9.1-rc1"])).unwrap();

        // Pre-release tags are invisible by default
        let resolved = resolve_with_cache(tool, "3.x", &offline_options(false)).unwrap();
        assert_eq!(resolved, "3.9.0");

        // Opting in lets the higher pre-release win
        let resolved = resolve_with_cache(tool, "3.x", &offline_options(true)).unwrap();
        assert_eq!(resolved, "3.9.1-rc1");

        unsafe {
            std::env::remove_var("XDG_CACHE_HOME");
        }
    }

    #[test]
    fn test_cached_match_suppresses_refresh() {
        let _env = CACHE_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var("XDG_CACHE_HOME", temp.path());
        }

        let tool = &ToolSpec::TASK;
        let saved = tags(&["2.6.0"]);
        tvc::cache::save_cached_tags(tool, &saved).unwrap();

        // The cached list already satisfies the request, so no fetch
        // happens and the cache stays untouched (this test runs offline)
        let refreshed =
            tvc::cache::update_cache_for_missing_request(tool, "2.x", None, false).unwrap();
        assert!(!refreshed);
        let loaded = tvc::cache::load_cached_tags(tool).unwrap().unwrap();
        assert_eq!(loaded.tags(), saved.as_slice());

        unsafe {
            std::env::remove_var("XDG_CACHE_HOME");
        }
    }

    #[test]
    fn test_prerelease_only_match_errors_without_refetch() {
        let _env = CACHE_ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = tempfile::tempdir().unwrap();
        unsafe {
            std::env::set_var("XDG_CACHE_HOME", temp.path());
        }

        // The only "3" tag is a pre-release, so the stable-only resolution
        // misses; the raw cached list still matches the request, so the
        // refresh short-circuits and no fetch happens (runs offline)
        let tool = &ToolSpec::ARDUINO_CLI;
        tvc::cache::save_cached_tags(tool, &tags(&["3.9.0-rc1", "2.0.0"])).unwrap();

        let err = resolve_with_cache(tool, "3.x", &offline_options(false)).unwrap_err();
        assert!(err.to_string().contains("no published version matches '3'"));

        unsafe {
            std::env::remove_var("XDG_CACHE_HOME");
        }
    }
}

#[cfg(test)]
mod tool_cache_tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_list_and_prune_cached_versions() {
        let temp = tempfile::tempdir().unwrap();
        // RUNNER_TOOL_CACHE override is confined to this single test to
        // avoid racing parallel tests.
        unsafe {
            std::env::set_var("RUNNER_TOOL_CACHE", temp.path());
        }

        let tool = &ToolSpec::PROTOC;
        let platform = Platform::LINUX_X86_64;

        // Fake two completed extractions and one interrupted one
        for version in ["3.7.1", "3.9.1"] {
            let slot = temp
                .path()
                .join(tool.name)
                .join(version)
                .join(platform.arch);
            fs::create_dir_all(slot.join("bin")).unwrap();
            fs::write(slot.join("bin").join(tool.binary), "").unwrap();
            fs::write(
                slot.parent().unwrap().join(format!("{}.complete", platform.arch)),
                "",
            )
            .unwrap();
        }
        let incomplete = temp.path().join(tool.name).join("3.8.0").join(platform.arch);
        fs::create_dir_all(&incomplete).unwrap();

        // A slot without its completion marker is invisible
        assert!(
            tvc::install::find_cached_version_dir(tool, "3.8.0", &platform)
                .unwrap()
                .is_none()
        );
        assert!(
            tvc::install::find_cached_version_dir(tool, "3.9.1", &platform)
                .unwrap()
                .is_some()
        );

        let installed = tvc::install::list_installed_versions(tool, &platform).unwrap();
        assert_eq!(installed, vec!["3.7.1".to_string(), "3.9.1".to_string()]);

        // Prune one series
        let removed = tvc::install::prune_versions(tool, "3.7", &platform, false).unwrap();
        assert_eq!(removed, vec!["3.7.1".to_string()]);
        let installed = tvc::install::list_installed_versions(tool, &platform).unwrap();
        assert_eq!(installed, vec!["3.9.1".to_string()]);

        // Pruning a pattern with no matches is an error
        assert!(tvc::install::prune_versions(tool, "5.x", &platform, false).is_err());

        unsafe {
            std::env::remove_var("RUNNER_TOOL_CACHE");
        }
    }
}

// =============================================================================
// INTEGRATION TESTS - CLI Application (offline cases only)
// =============================================================================

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn test_help_output() {
        let output = run_tvc(&["--help"]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("--list"));
        assert!(stdout.contains("--prune"));
        assert!(stdout.contains("--pre-release"));
    }

    #[test]
    fn test_missing_tool_fails() {
        let output = run_tvc(&[]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("missing tool"));
    }

    #[test]
    fn test_unknown_tool_fails_and_names_known_tools() {
        let output = run_tvc(&["rustup", "1.x"]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("unknown tool"));
        assert!(stderr.contains("protoc"));
    }

    #[test]
    fn test_completion_script() {
        let output = run_tvc(&["--completion", "bash"]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("complete -o nosort -F _tvc_completions tvc"));
    }

    #[test]
    fn test_unsupported_completion_shell_fails() {
        let output = run_tvc(&["--completion", "zsh"]);
        assert!(!output.status.success());
    }
}
