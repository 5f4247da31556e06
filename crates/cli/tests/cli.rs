use assert_cmd::Command;

fn bookshelf() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf").unwrap();
    cmd.env_remove("BOOKSHELF_ENV")
        .env("BOOKSHELF_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"));
    cmd
}

#[test]
fn openapi_lists_every_route() {
    let output = bookshelf().args(["openapi", "--compact"]).output().unwrap();
    assert!(output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let paths = document["paths"].as_object().unwrap();
    for path in [
        "/",
        "/healthz",
        "/api/books",
        "/api/books/{id}",
        "/api/users",
        "/api/users/{email}/reset-password",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}

#[test]
fn settings_reflect_environment_overrides() {
    let output = bookshelf()
        .args(["settings"])
        .env("BOOKSHELF_SERVER__PORT", "4100")
        .env("BOOKSHELF_AUTH__BCRYPT_COST", "6")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("port: 4100"), "{stdout}");
    assert!(stdout.contains("bcrypt_cost: 6"), "{stdout}");
}

#[test]
fn unknown_environment_fails_fast() {
    let output = bookshelf()
        .args(["settings"])
        .env("BOOKSHELF_ENV", "qa")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unsupported environment"));
}
