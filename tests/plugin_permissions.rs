use std::collections::BTreeSet;

const BUILD_SCRIPT: &str = include_str!("../build.rs");
const PLUGIN: &str = include_str!("../src/plugin.rs");
const DEFAULT_PERMISSIONS: &str = include_str!("../permissions/default.toml");

fn quoted(text: &str) -> BTreeSet<String> {
    text.split('"')
        .skip(1)
        .step_by(2)
        .map(str::to_string)
        .collect()
}

fn build_commands() -> BTreeSet<String> {
    let start = BUILD_SCRIPT.find("COMMANDS").unwrap();
    let list = &BUILD_SCRIPT[start..];
    let end = list.find("];").unwrap();
    quoted(&list[..end])
}

fn handler_commands() -> BTreeSet<String> {
    let start = PLUGIN.find("generate_handler![").unwrap();
    let list = &PLUGIN[start..];
    let end = list.find(']').unwrap();
    list[..end]
        .split("commands::gallery::")
        .skip(1)
        .map(|s| s.trim().trim_end_matches(',').trim().to_string())
        .collect()
}

#[test]
fn build_script_lists_every_registered_command() {
    let handlers = handler_commands();
    assert_eq!(handlers.len(), 5);
    assert_eq!(build_commands(), handlers);
}

#[test]
fn default_permission_set_allows_every_command() {
    let start = DEFAULT_PERMISSIONS.find("permissions = [").unwrap();
    let allowed = quoted(&DEFAULT_PERMISSIONS[start..]);
    let expected: BTreeSet<String> = handler_commands()
        .iter()
        .map(|c| format!("allow-{}", c.replace('_', "-")))
        .collect();
    assert_eq!(allowed, expected);
}
