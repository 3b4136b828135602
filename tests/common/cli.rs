use super::Workspace;
use assert_cmd::Command;
use std::ffi::OsStr;

/// A `gcmigrate` command isolated from the caller's config and environment.
pub fn gcmigrate(workspace: &Workspace) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("gcmigrate");
    let mut cmd = std::process::Command::new(bin.as_os_str());
    cmd.current_dir(workspace.path())
        .env("HOME", workspace.path())
        .env_remove("RUST_LOG")
        .env_remove("GCMIGRATE_CONFIG")
        .env_remove("GCMIGRATE_PROJECT")
        .env_remove("GCMIGRATE_REPO_URL")
        .env_remove("GCMIGRATE_DESTINATION_START");
    Command::from_std(cmd)
}

/// `gcmigrate` with the standard test project flags.
pub fn gcmigrate_for_project<I, S>(workspace: &Workspace, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = gcmigrate(workspace);
    cmd.args([
        "--project",
        super::PROJECT,
        "--repo-url",
        super::REPO_URL,
        "--start",
        "11",
    ])
    .args(args);
    cmd
}
