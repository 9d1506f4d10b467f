//! End-to-end fix scenarios driven through the verification harness.

use fixwright::config::EngineConfig;
use fixwright::fix::{BatchApplier, CodeAction, FixCatalog, FixError, Intent, NodeKey};
use fixwright::semantic::DeclarationIndex;
use fixwright::verify::{FixCase, Verifier, VerifyError};
use fixwright::{FixEngine, NodeKind, Selection, SourceModel};

fn verifier() -> Verifier {
    Verifier::from_config(&EngineConfig::default()).unwrap()
}

fn verifier_with_check_overload() -> Verifier {
    let mut config = EngineConfig::default();
    config.overloads.type_checks.push("check".to_string());
    Verifier::from_config(&config).unwrap()
}

#[test]
fn mark_valid_target_inserts_marker_before_declaration() {
    let case = FixCase::new(
        r#"class Tests {
    [InlineData(1)]
    public void {|X1008:Check|}(int value) {
        Assert.Equal(1, value);
    }
}
"#,
        r#"class Tests {
    [Theory]
    [InlineData(1)]
    public void Check(int value) {
        Assert.Equal(1, value);
    }
}
"#,
    )
    .with_key("mark-valid-target");

    let report = verifier().verify(&case).unwrap();
    assert_eq!(report.applied, vec!["mark-valid-target"]);
}

#[test]
fn remove_conflicting_markers_keeps_parameters() {
    let case = FixCase::new(
        r#"class Tests {
    [InlineData(1)]
    [MemberData(nameof(Cases))]
    public void {|X1008:Check|}(int value) { }
}
"#,
        r#"class Tests {
    public void Check(int value) { }
}
"#,
    )
    .with_key("remove-conflicting-markers");

    verifier().verify(&case).unwrap();
}

#[test]
fn typeof_argument_becomes_type_argument() {
    let case = FixCase::new(
        r#"class Foo { }

class Tests {
    void Run(object value) {
        {|X2007:check(typeof(Foo), value)|};
    }
}
"#,
        r#"class Foo { }

class Tests {
    void Run(object value) {
        check<Foo>(value);
    }
}
"#,
    )
    .with_key("use generic overload for Foo");

    verifier_with_check_overload().verify(&case).unwrap();
}

#[test]
fn unresolved_type_offers_no_fix() {
    let source = r#"class Tests {
    void Run(object value) {
        {|X2007:check(typeof(Bar), value)|};
    }
}
"#;
    let expected = source
        .replace("{|X2007:", "")
        .replace("|}", "");

    // The diagnostic is reported but the text is left as is
    let report = verifier_with_check_overload()
        .verify(&FixCase::new(source, expected.clone()))
        .unwrap();
    assert_eq!(report.diagnostics, 1);
    assert!(report.applied.is_empty());

    let mut config = EngineConfig::default();
    config.overloads.type_checks.push("check".to_string());
    let engine = FixEngine::from_config(&config).unwrap();
    let model = engine.diagnose(&expected).unwrap();
    assert!(engine.code_actions(&model).unwrap().is_empty());
}

#[test]
fn independent_fixes_on_one_declaration_batch_together() {
    let case = FixCase::new(
        r#"class Tests {
    [Fact]
    [InlineData(1)]
    public void {|X1001:{|X1005:Check|}|}(int value) { }
}
"#,
        r#"class Tests {
    [Fact]
    public void Check() { }
}
"#,
    );

    let report = verifier().verify(&case).unwrap();
    assert_eq!(report.diagnostics, 2);
    assert_eq!(report.applied.len(), 2);
}

#[test]
fn fixes_on_the_same_attribute_list_conflict() {
    let source = "class Tests {\n    [Fact, InlineData(1)]\n    public void Check(int value) { }\n}\n";
    let model = SourceModel::parse(source).unwrap();
    let method = model
        .tree()
        .descendants()
        .find(|n| n.kind() == NodeKind::MethodDeclaration)
        .unwrap();
    let remove = |key: &str, name: &str| {
        CodeAction::new(
            &model,
            key,
            key,
            Intent::RemoveAttributes {
                declaration: NodeKey::of(method),
                names: vec![name.to_string()],
            },
        )
    };

    let actions = vec![remove("remove-data", "InlineData"), remove("remove-fact", "Fact")];
    match BatchApplier::default().apply(&model, &actions) {
        Err(FixError::Conflict(report)) => {
            let keys: Vec<_> = report.keys().into_iter().collect();
            assert_eq!(keys, vec!["remove-data", "remove-fact"]);
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(model.text(), source);
}

#[test]
fn catalog_fixes_on_one_attribute_list_conflict_in_every_layout() {
    let engine = FixEngine::from_config(&EngineConfig::default()).unwrap();
    let layouts = [
        "class Tests {\n    [InlineData(1)]\n    public void Check(int value) { }\n}\n",
        "class Tests { [InlineData(1)] public void Check(int value) { } }",
        "class Tests {\n    [InlineData(1), Trait(\"a\", \"b\")]\n    public void Check(int value) { }\n}\n",
    ];

    for source in layouts {
        let model = engine.diagnose(source).unwrap();
        let actions = engine.code_actions(&model).unwrap();
        let keys: Vec<&str> = actions
            .iter()
            .map(|a| a.equivalence_key.as_str())
            .collect();
        assert_eq!(keys, vec!["mark-valid-target", "remove-conflicting-markers"]);

        match BatchApplier::default().apply(&model, &actions) {
            Err(FixError::Conflict(report)) => {
                let keys: Vec<_> = report.keys().into_iter().collect();
                assert_eq!(keys, vec!["mark-valid-target", "remove-conflicting-markers"]);
            }
            other => panic!("expected conflict for {source:?}, got {other:?}"),
        }
        assert_eq!(model.text(), source);
    }
}

#[test]
fn multi_edit_action_is_applied_whole_or_not_at_all() {
    let source = "class Foo { }\n\nclass Tests {\n    void Run(object value) {\n        check(typeof(Foo), value);\n    }\n}\n";
    let mut config = EngineConfig::default();
    config.overloads.type_checks.push("check".to_string());
    let engine = FixEngine::from_config(&config).unwrap();

    let model = engine.diagnose(source).unwrap();
    let mut actions = engine.code_actions(&model).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].synthesize(&model).unwrap().len(), 2);

    let type_of = model
        .tree()
        .descendants()
        .find(|n| n.kind() == NodeKind::TypeOf)
        .unwrap();
    actions.push(CodeAction::new(
        &model,
        "Replace typeof",
        "replace-typeof",
        Intent::ReplaceNode {
            target: NodeKey::of(type_of),
            text: "null".to_string(),
        },
    ));

    match BatchApplier::default().apply(&model, &actions) {
        Err(FixError::Conflict(report)) => {
            let keys: Vec<_> = report.keys().into_iter().collect();
            assert_eq!(keys, vec!["replace-typeof", "use generic overload for Foo"]);
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    // The callee rename does not overlap anything, yet it is not applied either
    assert!(model.text().contains("check(typeof(Foo), value)"));
    assert_eq!(model.text(), source);
}

#[test]
fn remove_parameters_from_fact() {
    let case = FixCase::new(
        "class Tests {\n    [Fact]\n    public void {|X1001:Check|}(int value, string name) { }\n}\n",
        "class Tests {\n    [Fact]\n    public void Check() { }\n}\n",
    )
    .with_key("Remove Parameters");

    verifier().verify(&case).unwrap();
}

#[test]
fn abstract_type_check_uses_assignable_from() {
    let case = FixCase::new(
        r#"using System;

class Tests {
    void Run(object value) {
        {|X2018:Assert.IsType<IDisposable>(value)|};
    }
}
"#,
        r#"using System;

class Tests {
    void Run(object value) {
        Assert.IsAssignableFrom<IDisposable>(value);
    }
}
"#,
    );

    let report = verifier().verify(&case).unwrap();
    assert_eq!(report.applied, vec!["Use Assert.IsAssignableFrom"]);
}

#[test]
fn unknown_key_is_reported_with_suggestion() {
    let case = FixCase::new(
        "class Tests {\n    [InlineData(1)]\n    public void {|X1008:Check|}(int value) { }\n}\n",
        "",
    )
    .with_key("remove-conflicting-marker");

    match verifier().verify(&case) {
        Err(VerifyError::Fix(FixError::UnknownEquivalenceKey {
            suggestion,
            available,
            ..
        })) => {
            assert_eq!(suggestion.as_deref(), Some("remove-conflicting-markers"));
            assert_eq!(available.len(), 2);
        }
        other => panic!("expected unknown key, got {other:?}"),
    }
}

#[test]
fn engine_fixes_whole_file_until_stable() {
    let source = r#"class Tests {
    [InlineData(1)]
    public void First(int value) { }

    [Fact]
    public void Second(int value) { }

    [Fact]
    public void Clean() { }
}
"#;
    let engine = FixEngine::from_config(&EngineConfig::default()).unwrap();
    let report = engine.fix(source, &Selection::First).unwrap();
    assert_eq!(
        report.source,
        r#"class Tests {
    [Theory]
    [InlineData(1)]
    public void First(int value) { }

    [Fact]
    public void Second() { }

    [Fact]
    public void Clean() { }
}
"#
    );
    assert!(report.remaining.is_empty());
}

#[test]
fn catalog_lookup_is_shared_and_ordered() {
    let catalog = FixCatalog::global();
    let names: Vec<_> = catalog
        .providers_for("X1008")
        .into_iter()
        .map(|p| p.name())
        .collect();
    assert_eq!(names, vec!["mark-as-valid-target", "remove-conflicting-markers"]);

    let model = SourceModel::parse("class T { [InlineData(1)] void M(int x) { } }").unwrap();
    let engine = FixEngine::from_config(&EngineConfig::default()).unwrap();
    let diagnosed = engine.diagnose(model.text()).unwrap();
    let first = catalog
        .fixes_for(&diagnosed, &diagnosed.diagnostics()[0], &DeclarationIndex::default())
        .unwrap();
    let second = catalog
        .fixes_for(&diagnosed, &diagnosed.diagnostics()[0], &DeclarationIndex::default())
        .unwrap();
    assert_eq!(first, second);
}
