use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use pretty_assertions::assert_eq;
use tempfile::{TempDir, tempdir};

use crate::config::Settings;
use crate::dispatch::{self, DispatchOptions};
use crate::error::{GenerateError, SourceModelError};
use crate::generator::{CancellationToken, Generator, HEADER, NullMonitor, Outcome, ProgressTracker, Project};
use crate::model::{JavaSourceModel, ModelLoad, SourceModel};
use crate::workspace::FsWorkspace;

// Helper function to lay out a project directory inside a scratch workspace
fn create_project(name: &str) -> Result<(TempDir, PathBuf)> {
    let workspace = tempdir()?;
    let root = workspace.path().join(name);
    fs::create_dir_all(&root)?;
    Ok((workspace, root))
}

// Helper function to write a source file, creating parent directories
fn write_source(root: &Path, relative: &str, content: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn generate(root: &Path, settings: &Settings) -> Result<crate::generator::GenerationReport, GenerateError> {
    let project = Project::new("App", root);
    Generator::new(settings, &FsWorkspace, &NullMonitor)
        .run_loading(&project, |monitor| JavaSourceModel::open(root, settings, monitor))
}

fn artifact_lines(root: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(root.join("project.aidl"))?;
    assert!(content.starts_with(HEADER));
    Ok(content[HEADER.len()..].lines().map(str::to_string).collect())
}

const CLASSPATH: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<classpath>
    <classpathentry kind="src" path="src"/>
    <classpathentry kind="src" path="gen"/>
    <classpathentry kind="src" path="/Shared/src"/>
    <classpathentry kind="lib" path="libs/support.jar"/>
    <classpathentry kind="con" path="com.android.ide.eclipse.adt.ANDROID_FRAMEWORK"/>
    <classpathentry kind="output" path="bin/classes"/>
</classpath>
"#;

#[test]
fn test_android_project_end_to_end() -> Result<()> {
    let (workspace, root) = create_project("App")?;
    fs::write(root.join(".classpath"), CLASSPATH)?;
    fs::create_dir_all(root.join("libs"))?;
    fs::write(root.join("libs/support.jar"), b"PK\x03\x04")?;

    write_source(&root, "src/com/example/Foo.java", r#"
package com.example;

import android.os.Parcel;
import android.os.Parcelable;

public class Foo implements Parcelable {
    public static final Parcelable.Creator<Foo> CREATOR = new Parcelable.Creator<Foo>() {
        public Foo createFromParcel(Parcel in) { return new Foo(); }
        public Foo[] newArray(int size) { return new Foo[size]; }
    };

    public int describeContents() { return 0; }
    public void writeToParcel(Parcel dest, int flags) {}
}
"#)?;
    write_source(&root, "src/com/example/Bar.java", r#"
package com.example;

/** Plain class, never listed. */
public class Bar implements java.io.Serializable, Comparable<Bar> {
    public int compareTo(Bar other) { return 0; }
}
"#)?;
    write_source(&root, "src/com/example/Outer.java", r#"
package com.example;

import android.os.Parcelable;

public class Outer implements Parcelable {
    public static class Inner implements Parcelable {
        enum Mode { ON, OFF }
    }

    static class Plain {
        static class Deep extends Foo {}
    }
}
"#)?;
    write_source(&root, "src/com/example/model/Child.java", r#"
package com.example.model;

import com.example.*;

public final class Child extends Foo implements Runnable {
    public void run() {}
}
"#)?;
    write_source(&root, "src/com/example/model/Rich.java", r#"
package com.example.model;

public interface Rich extends android.os.Parcelable {
}

class RichImpl implements Rich {
}
"#)?;
    write_source(&root, "gen/com/example/R.java", r#"
/* AUTO-GENERATED FILE. DO NOT MODIFY. */
package com.example;

public final class R {
    public static final class string { public static final int app_name = 0x7f040000; }
}
"#)?;

    // Linked sibling project, only used for resolution
    let shared = workspace.path().join("Shared");
    write_source(&shared, "src/com/shared/Token.java", r#"
package com.shared;

public class Token implements android.os.Parcelable {}
"#)?;
    write_source(&root, "src/com/example/Session.java", r#"
package com.example;

import com.shared.Token;

public class Session extends Token {}
"#)?;

    let report = generate(&root, &Settings::default())?;

    assert_eq!(report.outcome, Outcome::Written);
    assert_eq!(
        artifact_lines(&root)?,
        vec![
            "parcelable com.example.Foo;",
            "parcelable com.example.Outer;",
            "parcelable com.example.Outer.Inner;",
            "parcelable com.example.Outer.Plain.Deep;",
            "parcelable com.example.Session;",
            "parcelable com.example.model.Child;",
            "parcelable com.example.model.Rich;",
            "parcelable com.example.model.RichImpl;",
        ]
    );
    assert_eq!(report.stats.roots_scanned, 2);
    assert_eq!(report.stats.roots_skipped, 2);
    Ok(())
}

#[test]
fn test_default_roots_without_classpath() -> Result<()> {
    let (_workspace, root) = create_project("App")?;
    write_source(&root, "src/a/First.java", "package a; public class First implements android.os.Parcelable {}")?;
    write_source(&root, "gen/b/Second.java", "package b; public class Second implements android.os.Parcelable {}")?;
    write_source(&root, "other/c/Ignored.java", "package c; public class Ignored implements android.os.Parcelable {}")?;

    generate(&root, &Settings::default())?;

    assert_eq!(
        artifact_lines(&root)?,
        vec!["parcelable a.First;", "parcelable b.Second;"]
    );
    Ok(())
}

#[test]
fn test_known_supertypes_extend_library_hierarchies() -> Result<()> {
    let (_workspace, root) = create_project("App")?;
    write_source(&root, "src/com/example/State.java", r#"
package com.example;

import android.os.Bundle;

public class State extends Bundle {}
"#)?;

    let lenient = generate(&root, &Settings::default())?;
    assert_eq!(lenient.outcome, Outcome::Skipped);
    assert!(!root.join("project.aidl").exists());

    let settings = Settings::from_toml(r#"
[known_supertypes]
"android.os.Bundle" = ["android.os.Parcelable", "java.lang.Cloneable"]
"#)?;
    generate(&root, &settings)?;
    assert_eq!(artifact_lines(&root)?, vec!["parcelable com.example.State;"]);
    Ok(())
}

#[test]
fn test_strict_resolution_rejects_unknown_supertypes() -> Result<()> {
    let (_workspace, root) = create_project("App")?;
    write_source(&root, "src/com/example/Widget.java", r#"
package com.example;

public class Widget extends MissingBase implements android.os.Parcelable {}
"#)?;
    fs::write(root.join("project.aidl"), "previous\n")?;

    let settings = Settings {
        strict_resolution: true,
        ..Settings::default()
    };
    let err = generate(&root, &settings).unwrap_err();

    match err {
        GenerateError::SourceModel(SourceModelError::UnresolvedType { name, referenced_from }) => {
            assert_eq!(name, "MissingBase");
            assert_eq!(referenced_from, "com.example.Widget");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(fs::read_to_string(root.join("project.aidl"))?, "previous\n");

    // The same project passes when unresolvable names are ignored
    generate(&root, &Settings::default())?;
    assert_eq!(artifact_lines(&root)?, vec!["parcelable com.example.Widget;"]);
    Ok(())
}

#[test]
fn test_cyclic_hierarchy_is_an_error() -> Result<()> {
    let (_workspace, root) = create_project("App")?;
    write_source(&root, "src/loop/A.java", "package loop; interface A extends B {}")?;
    write_source(&root, "src/loop/B.java", "package loop; interface B extends A {}")?;

    let err = generate(&root, &Settings::default()).unwrap_err();

    assert!(matches!(
        err,
        GenerateError::SourceModel(SourceModelError::CyclicHierarchy { .. })
    ));
    assert!(!root.join("project.aidl").exists());
    Ok(())
}

#[test]
fn test_parse_error_leaves_artifact_unmodified() -> Result<()> {
    let (_workspace, root) = create_project("App")?;
    let previous = format!("{}parcelable com.example.Foo;\n", HEADER);
    fs::write(root.join("project.aidl"), &previous)?;
    write_source(&root, "src/com/example/Foo.java", "package com.example; public class Foo implements android.os.Parcelable {}")?;
    write_source(&root, "src/com/example/Broken.java", "package com.example; public class Broken implements {")?;

    let tracker = ProgressTracker::hidden(CancellationToken::new());
    let result = dispatch::run_project(&Project::new("App", &root), &DispatchOptions::default(), &tracker);

    let err = result.unwrap_err();
    let parse = err.downcast_ref::<GenerateError>();
    assert!(
        matches!(parse, Some(GenerateError::SourceModel(SourceModelError::Parse { .. }))),
        "unexpected error: {:#}",
        err
    );
    assert_eq!(fs::read_to_string(root.join("project.aidl"))?, previous);
    Ok(())
}

#[test]
fn test_regeneration_from_disk_is_idempotent() -> Result<()> {
    let (_workspace, root) = create_project("App")?;
    write_source(&root, "src/com/example/Foo.java", r#"
package com.example;
public class Foo implements android.os.Parcelable {
    public static class Part implements android.os.Parcelable {}
}
"#)?;

    let first = generate(&root, &Settings::default())?;
    let bytes = fs::read(root.join("project.aidl"))?;
    let second = generate(&root, &Settings::default())?;

    assert_eq!(first.digest, second.digest);
    assert_eq!(fs::read(root.join("project.aidl"))?, bytes);
    Ok(())
}

#[test]
fn test_project_settings_file_and_marker_override() -> Result<()> {
    let (_workspace, root) = create_project("App")?;
    fs::write(root.join("aidl-preprocess.toml"), "artifact_name = \"parcelables.aidl\"\nsource_roots = [\"java\"]\n")?;
    write_source(&root, "java/com/example/Foo.java", r#"
package com.example;
public class Foo implements android.os.Parcelable, Marker {}
interface Marker {}
"#)?;

    let tracker = ProgressTracker::hidden(CancellationToken::new());
    let project = Project::new("App", &root);
    let report = dispatch::run_project(&project, &DispatchOptions::default(), &tracker)?;
    assert_eq!(report.artifact, root.join("parcelables.aidl"));
    assert_eq!(report.parcelables.as_slice(), ["com.example.Foo"]);

    let options = DispatchOptions {
        marker: Some("com.example.Marker".to_string()),
        ..DispatchOptions::default()
    };
    let report = dispatch::run_project(&project, &options, &tracker)?;
    assert_eq!(report.parcelables.as_slice(), ["com.example.Foo"]);
    assert!(!root.join("project.aidl").exists());
    Ok(())
}

#[test]
fn test_model_enumerates_in_stable_order() -> Result<()> {
    let (_workspace, root) = create_project("App")?;
    write_source(&root, "src/b/Two.java", "package b; class Two {} class Three {}")?;
    write_source(&root, "src/a/One.java", "package a; class One { class Nested {} }")?;

    let model = match JavaSourceModel::open(&root, &Settings::default(), &NullMonitor)? {
        ModelLoad::Loaded(model) => model,
        ModelLoad::Cancelled => panic!("load without a cancellation request was cancelled"),
    };
    let roots = model.source_roots()?;
    assert_eq!(roots.len(), 1);

    let mut seen = Vec::new();
    for package in model.packages(&roots[0])? {
        for unit in model.compilation_units(&package)? {
            for id in model.types(&unit)? {
                seen.push(model.declaration(id)?.fqn.clone());
            }
        }
    }
    assert_eq!(seen, vec!["a.One", "b.Two", "b.Three"]);
    Ok(())
}

#[tokio::test]
async fn test_projects_run_independently() -> Result<()> {
    let (_first_guard, first) = create_project("First")?;
    let (_second_guard, second) = create_project("Second")?;
    write_source(&first, "src/p/Ok.java", "package p; public class Ok implements android.os.Parcelable {}")?;
    write_source(&second, "src/p/Bad.java", "package p; public class Bad {")?;

    let projects = vec![Project::new("First", &first), Project::new("Second", &second)];
    let results = dispatch::run_projects(projects, DispatchOptions::default(), CancellationToken::new()).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].project.name, "First");
    assert!(results[0].result.is_ok());
    assert!(results[1].result.is_err());
    assert!(first.join("project.aidl").exists());
    assert!(!second.join("project.aidl").exists());
    Ok(())
}

#[tokio::test]
async fn test_cancelled_run_writes_nothing() -> Result<()> {
    let (_guard, root) = create_project("App")?;
    write_source(&root, "src/p/Foo.java", "package p; public class Foo implements android.os.Parcelable {}")?;

    let token = CancellationToken::new();
    token.cancel();
    let results = dispatch::run_projects(vec![Project::new("App", &root)], DispatchOptions::default(), token).await;

    let report = results.into_iter().next().map(|result| result.result);
    match report {
        Some(Ok(report)) => assert_eq!(report.outcome, Outcome::Cancelled),
        other => panic!("unexpected result: {:?}", other.map(|r| r.map(|report| report.outcome))),
    }
    assert!(!root.join("project.aidl").exists());
    Ok(())
}

#[test]
fn test_missing_project_directory_is_an_error() -> Result<()> {
    let workspace = tempdir()?;
    let missing = workspace.path().join("Typo");

    let tracker = ProgressTracker::hidden(CancellationToken::new());
    let result = dispatch::run_project(&Project::new("Typo", &missing), &DispatchOptions::default(), &tracker);

    let err = result.unwrap_err();
    match err.downcast_ref::<GenerateError>() {
        Some(GenerateError::SourceModel(SourceModelError::Io { path, source })) => {
            assert_eq!(path, &missing);
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!missing.exists());
    Ok(())
}

#[test]
fn test_cancellation_stops_source_loading() -> Result<()> {
    let (_workspace, root) = create_project("App")?;
    write_source(&root, "src/p/Bad.java", "package p; class Bad {")?;
    write_source(&root, "src/p/Foo.java", "package p; public class Foo implements android.os.Parcelable {}")?;

    let token = CancellationToken::new();
    token.cancel();

    let loaded = JavaSourceModel::open(&root, &Settings::default(), &token)?;
    assert!(matches!(loaded, ModelLoad::Cancelled));

    let tracker = ProgressTracker::hidden(token);
    let report = dispatch::run_project(&Project::new("App", &root), &DispatchOptions::default(), &tracker)?;
    assert_eq!(report.outcome, Outcome::Cancelled);
    assert!(report.parcelables.is_empty());
    assert!(!root.join("project.aidl").exists());
    Ok(())
}

#[test]
fn test_unreadable_settings_fail_the_project() -> Result<()> {
    let (workspace, root) = create_project("App")?;
    write_source(&root, "src/p/Foo.java", "package p; public class Foo implements android.os.Parcelable {}")?;

    let options = DispatchOptions {
        config: Some(workspace.path().join("missing.toml")),
        ..DispatchOptions::default()
    };
    let tracker = ProgressTracker::hidden(CancellationToken::new());
    let result = dispatch::run_project(&Project::new("App", &root), &options, &tracker);

    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("missing.toml"), "unexpected error: {:#}", err);
    assert!(!root.join("project.aidl").exists());
    Ok(())
}
