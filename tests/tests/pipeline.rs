use application::controller::ActionController;
use application::parser::CommandParser;
use application::pipeline::Pipeline;
use domain::command::{Command, CommandKind, FileAction, GuiAction};
use domain::outcome::GUI_FAILURE_MESSAGE;
use domain::safety_policy::SafetyPolicy;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tests::{automation_in, ScriptedPlanner};

fn file(action: &str, path: &str, content: &str) -> Command {
    Command::file(
        FileAction {
            action: action.into(),
            path: path.into(),
            content: content.into(),
        },
        format!("{action} {path}"),
    )
}

fn click(x: i64, y: i64) -> Command {
    Command::gui(
        GuiAction {
            action: "click".into(),
            target: "somewhere".into(),
            coordinates: Some((x, y)),
            text: String::new(),
        },
        "click somewhere",
    )
}

#[test]
fn parse_keeps_recognized_entries_in_order() {
    let raw = json!({
        "actions": [
            {"type": "command_line", "command": "ls", "description": "one"},
            {"type": "unknown", "description": "ignored"},
            {"type": "file_operation", "action": "read", "path": "x", "description": "two"},
            {"type": "gui_action", "action": "scroll", "text": "-3", "description": "three"}
        ]
    });
    let commands = CommandParser::new().parse(&raw);
    let descriptions: Vec<&str> = commands.iter().map(Command::description).collect();
    assert_eq!(descriptions, vec!["one", "two", "three"]);
}

#[test]
fn one_good_and_one_malformed_action() {
    let raw = json!({
        "actions": [
            {"type": "file_operation", "action": "write", "path": "./a.txt", "content": "x", "description": "good"},
            {"type": "file_operation", "path": ["not", "a", "string"]}
        ]
    });
    let commands = CommandParser::new().parse(&raw);
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].description(), "good");
    assert_eq!(commands[0].kind(), CommandKind::FileOperation);
}

#[test]
fn restricted_prefixes_respect_component_boundaries() {
    let policy = SafetyPolicy::new();
    assert!(!policy.is_path_safe(Path::new("/etc/ssh")));
    assert!(!policy.is_path_safe(Path::new("/etc/ssh/sshd_config")));
    assert!(!policy.is_path_safe(Path::new("/root/.bashrc")));
    assert!(policy.is_path_safe(Path::new("/etc/sshd")));
    assert!(policy.is_path_safe(Path::new("/rootfs/file")));
    assert!(policy.is_path_safe(Path::new("/etc/passwd-backup")));
    assert!(policy.is_path_safe(Path::new("/tmp/notes.txt")));
}

#[cfg(unix)]
#[tokio::test]
async fn empty_shell_command_does_not_crash() {
    let dir = TempDir::new().unwrap();
    let automation = automation_in(dir.path());
    let result = ActionController::new()
        .execute(&Command::shell("", "nothing"), &automation)
        .await;
    // `sh -c ''` exits 0 with no output.
    assert!(result.success);
    assert_eq!(result.kind, CommandKind::CommandLine);
    assert!(result.output.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn failing_shell_command_reports_stderr() {
    let dir = TempDir::new().unwrap();
    let automation = automation_in(dir.path());
    let result = ActionController::new()
        .execute(&Command::shell("echo oops >&2; exit 3", "fail"), &automation)
        .await;
    assert!(!result.success);
    assert_eq!(result.error.trim(), "oops");
}

#[tokio::test]
async fn off_screen_click_fails_without_host_action() {
    let dir = TempDir::new().unwrap();
    let automation = automation_in(dir.path());
    let result = ActionController::new().execute(&click(-1, -1), &automation).await;

    assert!(!result.success);
    assert_eq!(result.error, GUI_FAILURE_MESSAGE);
    assert!(automation.gui.driver().calls().is_empty());
}

#[tokio::test]
async fn on_screen_click_reaches_driver() {
    let dir = TempDir::new().unwrap();
    let automation = automation_in(dir.path());
    let result = ActionController::new().execute(&click(100, 200), &automation).await;

    assert!(result.success);
    assert_eq!(automation.gui.driver().calls(), vec!["click Left x1 at 100,200"]);
}

#[tokio::test]
async fn write_to_restricted_path_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let automation = automation_in(dir.path());
    let secret = Path::new("/root/secret.txt");
    let existed = secret.exists();
    let before = fs::read(secret).ok();

    let result = ActionController::new()
        .execute(&file("write", "/root/secret.txt", "leak"), &automation)
        .await;

    assert!(!result.success);
    assert!(result.error.contains("Path not allowed for safety reasons"));
    assert_eq!(secret.exists(), existed);
    assert_eq!(fs::read(secret).ok(), before);
}

#[tokio::test]
async fn write_then_read_round_trips() {
    let dir = TempDir::new().unwrap();
    let automation = automation_in(dir.path());
    let controller = ActionController::new();

    let written = controller
        .execute(&file("write", "./mcp_output/notes.txt", "hello"), &automation)
        .await;
    assert!(written.success, "{}", written.error);

    let read = controller
        .execute(&file("read", "./mcp_output/notes.txt", ""), &automation)
        .await;
    assert!(read.success);
    assert_eq!(read.output, "hello");
}

#[tokio::test]
async fn placeholder_path_is_redirected() {
    let dir = TempDir::new().unwrap();
    let automation = automation_in(dir.path());
    let result = ActionController::new()
        .execute(&file("write", "/path/to/file.txt", "redirected"), &automation)
        .await;

    assert!(result.success, "{}", result.error);
    let target = dir.path().join("mcp_output").join("file.txt");
    assert_eq!(fs::read_to_string(&target).unwrap(), "redirected");
    assert!(!Path::new("/path/to/file.txt").exists());
}

#[tokio::test]
async fn pipeline_runs_a_scripted_plan() {
    let dir = TempDir::new().unwrap();
    let planner = ScriptedPlanner(json!({
        "actions": [
            {"type": "file_operation", "action": "write", "path": "todo.txt", "content": "milk", "description": "write list"},
            {"type": "gui_action", "action": "hotkey", "text": "ctrl+s", "description": "save"},
            {"type": "gui_action", "action": "click", "coordinates": "nowhere", "description": "malformed"},
            {"type": "file_operation", "action": "delete", "path": "/etc/shadow", "description": "delete shadow"}
        ],
        "reasoning": "write a list and save it"
    }));
    let pipeline = Pipeline::new(planner, automation_in(dir.path()));

    let results = pipeline.run_instruction("make a shopping list", &mut ()).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(results[1].success);
    assert!(!results[2].success);
    assert_eq!(fs::read_to_string(dir.path().join("todo.txt")).unwrap(), "milk");
    assert_eq!(pipeline.automation().gui.driver().calls(), vec!["hotkey ctrl+s"]);
}

#[test]
fn output_directory_is_prepared() {
    let dir = TempDir::new().unwrap();
    let automation = automation_in(dir.path());
    let created = automation.init_output_directory().unwrap();
    assert!(created.join("README.txt").is_file());
}
