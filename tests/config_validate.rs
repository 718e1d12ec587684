use assetforge::config::{load_and_validate, StepSpec};
use assetforge::errors::AssetforgeError;
use assetforge_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use assetforge_test_utils::init_tracing;

#[test]
fn two_task_cycle_is_rejected_before_any_task_runs() {
    init_tracing();

    let res = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::cmd("echo a").after("b").build())
        .with_task("b", TaskConfigBuilder::cmd("echo b").after("a").build())
        .try_build();

    assert!(matches!(res, Err(AssetforgeError::DagCycle(_))));
}

#[test]
fn self_dependency_is_rejected() {
    init_tracing();

    let res = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::cmd("echo a").after("a").build())
        .try_build();

    assert!(matches!(res, Err(AssetforgeError::ConfigError(_))));
}

#[test]
fn unknown_prerequisite_is_rejected() {
    init_tracing();

    let res = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::cmd("echo a").after("ghost").build())
        .try_build();

    assert!(matches!(res, Err(AssetforgeError::ConfigError(_))));
}

#[test]
fn empty_config_is_rejected() {
    init_tracing();
    let res = ConfigFileBuilder::new().try_build();
    assert!(matches!(res, Err(AssetforgeError::ConfigError(_))));
}

#[test]
fn task_needs_at_most_one_body() {
    init_tracing();

    // Neither cmd nor src, and nothing to aggregate either.
    let neither = ConfigFileBuilder::new()
        .with_task("a", Default::default())
        .try_build();
    assert!(matches!(neither, Err(AssetforgeError::ConfigError(_))));

    // Both cmd and src.
    let mut both = TaskConfigBuilder::pipeline(&["js/*.js"]).build();
    both.cmd = Some("echo".to_string());
    let res = ConfigFileBuilder::new().with_task("a", both).try_build();
    assert!(matches!(res, Err(AssetforgeError::ConfigError(_))));
}

#[test]
fn body_less_task_with_prerequisites_is_an_aggregator() {
    init_tracing();

    let res = ConfigFileBuilder::new()
        .with_task("styles", TaskConfigBuilder::cmd("sass scss:css").build())
        .with_task("scripts", TaskConfigBuilder::pipeline(&["js/*.js"]).build())
        .with_task(
            "default",
            TaskConfigBuilder::aggregate(&["styles", "scripts"]).build(),
        )
        .try_build();

    assert!(res.is_ok());
}

#[test]
fn steps_without_src_are_rejected() {
    init_tracing();

    let mut task = TaskConfigBuilder::cmd("echo").build();
    task.steps.push(StepSpec::Concat {
        output: "out.js".into(),
    });
    let res = ConfigFileBuilder::new().with_task("a", task).try_build();
    assert!(matches!(res, Err(AssetforgeError::ConfigError(_))));
}

#[test]
fn duplicate_concat_outputs_are_surfaced_not_last_write_wins() {
    init_tracing();

    // Two tasks both writing js/vendor.js: a configuration error, even
    // though the tasks are otherwise valid.
    let res = ConfigFileBuilder::new()
        .with_task(
            "vendor-a",
            TaskConfigBuilder::pipeline(&["js/a/*.js"])
                .step(StepSpec::Concat {
                    output: "vendor.js".into(),
                })
                .dest("js")
                .build(),
        )
        .with_task(
            "vendor-b",
            TaskConfigBuilder::pipeline(&["js/b/*.js"])
                .step(StepSpec::Concat {
                    output: "vendor.js".into(),
                })
                .dest("js")
                .build(),
        )
        .try_build();

    match res {
        Err(AssetforgeError::DuplicateOutput { path, .. }) => {
            assert_eq!(path, std::path::PathBuf::from("js/vendor.js"));
        }
        other => panic!("expected DuplicateOutput, got {other:?}"),
    }
}

#[test]
fn rename_steps_are_considered_for_output_collisions() {
    init_tracing();

    // concat main.js + rename .min collides with concat main.min.js.
    let res = ConfigFileBuilder::new()
        .with_task(
            "one",
            TaskConfigBuilder::pipeline(&["js/a/*.js"])
                .step(StepSpec::Concat {
                    output: "main.js".into(),
                })
                .step(StepSpec::Rename {
                    suffix: Some(".min".into()),
                    extension: None,
                })
                .build(),
        )
        .with_task(
            "two",
            TaskConfigBuilder::pipeline(&["js/b/*.js"])
                .step(StepSpec::Concat {
                    output: "main.min.js".into(),
                })
                .build(),
        )
        .try_build();

    assert!(matches!(res, Err(AssetforgeError::DuplicateOutput { .. })));
}

#[test]
fn same_output_name_under_different_dest_dirs_is_fine() {
    init_tracing();

    let res = ConfigFileBuilder::new()
        .with_task(
            "one",
            TaskConfigBuilder::pipeline(&["js/a/*.js"])
                .step(StepSpec::Concat {
                    output: "bundle.js".into(),
                })
                .dest("a")
                .build(),
        )
        .with_task(
            "two",
            TaskConfigBuilder::pipeline(&["js/b/*.js"])
                .step(StepSpec::Concat {
                    output: "bundle.js".into(),
                })
                .dest("b")
                .build(),
        )
        .try_build();

    assert!(res.is_ok());
}

#[test]
fn lint_flag_requires_a_command() {
    init_tracing();

    let res = ConfigFileBuilder::new()
        .with_task(
            "check",
            TaskConfigBuilder::pipeline(&["*.html"]).lint(true).build(),
        )
        .try_build();

    assert!(matches!(res, Err(AssetforgeError::ConfigError(_))));
}

#[test]
fn load_and_validate_reads_toml_from_disk() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Assetforge.toml");
    std::fs::write(
        &path,
        r#"
        [paths]
        source = "site/src"
        dest = "site/build"

        [watch]
        debounce_ms = 250

        [task.styles]
        cmd = "sass scss:css"
        watch = ["scss/**/*.scss"]

        [task.minify-css]
        cmd = "cssmin css/main.css build/css/main.min.css"
        after = ["styles"]
        "#,
    )
    .unwrap();

    let cfg = load_and_validate(&path).unwrap();
    assert_eq!(cfg.watch.debounce_ms, 250);
    assert_eq!(cfg.paths.source, std::path::PathBuf::from("site/src"));
    assert_eq!(cfg.task.len(), 2);
    assert_eq!(cfg.task["minify-css"].after, vec!["styles".to_string()]);
}

#[test]
fn malformed_toml_is_a_toml_error() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Assetforge.toml");
    std::fs::write(&path, "[task.broken\ncmd = ").unwrap();

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, AssetforgeError::TomlError(_)));
}

#[test]
fn zero_debounce_window_is_rejected() {
    init_tracing();

    let res = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::cmd("echo").build())
        .with_debounce_ms(0)
        .try_build();

    assert!(matches!(res, Err(AssetforgeError::ConfigError(_))));
}
