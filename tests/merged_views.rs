//! End-to-end tests over the public engine surface

use metamerge::{
    Adapt, AliasDecl, Attribute, ElementDef, ElementModel, MergeEngine, MergeError, MetaValue,
    ResolveError, SearchStrategy, Selector, UnitInstance, UnitTypeDecl, UnitTypeRegistry,
    ValueType,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn string_array() -> ValueType {
    ValueType::array(ValueType::String)
}

/// Registry with the classic mirror-pair + cross-unit-alias shape:
/// `Config(value <-> locations)`, `XmlConfig.xmlFiles -> Config.locations`,
/// and `MetaXml` meta-annotated with a preset `XmlConfig`.
fn registry() -> Arc<UnitTypeRegistry> {
    let registry = UnitTypeRegistry::new();
    registry.declare(
        UnitTypeDecl::builder("Config")
            .attribute(
                Attribute::new("value", string_array())
                    .with_default(MetaValue::Array(vec![]))
                    .alias_for(AliasDecl::local("locations")),
            )
            .attribute(
                Attribute::new("locations", string_array())
                    .with_default(MetaValue::Array(vec![]))
                    .alias_for(AliasDecl::local("value")),
            )
            .build(),
    );
    registry.declare(
        UnitTypeDecl::builder("XmlConfig")
            .attribute(
                Attribute::new("xmlFiles", string_array())
                    .with_default(MetaValue::Array(vec![]))
                    .alias_for(AliasDecl::in_unit("Config".into(), "locations")),
            )
            .meta(UnitInstance::new("Config"))
            .build(),
    );
    registry.declare(
        UnitTypeDecl::builder("MetaXml")
            .meta(UnitInstance::new("XmlConfig").with("xmlFiles", MetaValue::array(["deep.xml"])))
            .build(),
    );
    registry.declare(
        UnitTypeDecl::builder("Plain")
            .attribute(Attribute::new("name", ValueType::String).with_default(""))
            .attribute(Attribute::new("count", ValueType::Integer).with_default(3i64))
            .build(),
    );
    Arc::new(registry)
}

fn engine() -> MergeEngine {
    MergeEngine::new(registry())
}

#[test]
fn test_no_aliases_is_pure_pass_through() {
    let engine = engine();
    let mut model = ElementModel::new();
    let element = model.define(
        ElementDef::new("App").annotated(UnitInstance::new("Plain").with("name", "app")),
    );
    let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    let entry = view.get(&"Plain".into()).unwrap();
    assert_eq!(entry.get("name").unwrap(), MetaValue::string("app"));
    assert_eq!(entry.get("count").unwrap(), MetaValue::Integer(3));
    assert!(entry.is_default("count").unwrap());
    assert!(!entry.is_default("name").unwrap());
}

#[test]
fn test_mirror_members_report_identical_values() {
    let engine = engine();
    let mut model = ElementModel::new();
    let element = model.define(
        ElementDef::new("App")
            .annotated(UnitInstance::new("Config").with("value", MetaValue::array(["a.xml"]))),
    );
    let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    let entry = view.get(&"Config".into()).unwrap();
    assert_eq!(entry.get("value").unwrap(), MetaValue::array(["a.xml"]));
    assert_eq!(entry.get("locations").unwrap(), MetaValue::array(["a.xml"]));
}

#[test]
fn test_mirror_conflict_names_both_attributes() {
    let engine = engine();
    let mut model = ElementModel::new();
    let element = model.define(
        ElementDef::new("App").annotated(
            UnitInstance::new("Config")
                .with("value", MetaValue::array(["a.xml"]))
                .with("locations", MetaValue::array(["b.xml"])),
        ),
    );
    let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    let entry = view.get(&"Config".into()).unwrap();
    let err = entry.get("value").unwrap_err();
    let MergeError::Resolve(ResolveError::MirrorConflict(conflict)) = err else {
        panic!("expected a mirror conflict, got {err}");
    };
    assert_eq!(conflict.attribute_a, "value");
    assert_eq!(conflict.attribute_b, "locations");
}

#[test]
fn test_cross_unit_alias_overrides_meta_level() {
    let engine = engine();
    let mut model = ElementModel::new();
    let element = model.define(
        ElementDef::new("App")
            .annotated(UnitInstance::new("XmlConfig").with("xmlFiles", MetaValue::array(["b.xml"]))),
    );
    let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();

    assert!(view.is_present(&"Config".into()));
    assert!(!view.is_directly_present(&"Config".into()));
    let entry = view.get(&"Config".into()).unwrap();
    assert_eq!(entry.distance(), 1);
    assert_eq!(entry.get("locations").unwrap(), MetaValue::array(["b.xml"]));
    assert_eq!(entry.get("value").unwrap(), MetaValue::array(["b.xml"]));
}

#[test]
fn test_meta_defaults_apply_when_root_is_silent() {
    let engine = engine();
    let mut model = ElementModel::new();
    let element =
        model.define(ElementDef::new("App").annotated(UnitInstance::new("XmlConfig")));
    let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    let entry = view.get(&"Config".into()).unwrap();
    assert_eq!(entry.get("locations").unwrap(), MetaValue::Array(vec![]));
}

#[test]
fn test_queries_are_idempotent() {
    let engine = engine();
    let mut model = ElementModel::new();
    let element = model.define(
        ElementDef::new("App")
            .annotated(UnitInstance::new("XmlConfig").with("xmlFiles", MetaValue::array(["b.xml"]))),
    );
    let first = engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    let second = engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    assert_eq!(first.len(), second.len());
    let a = first.get(&"Config".into()).unwrap();
    let b = second.get(&"Config".into()).unwrap();
    assert_eq!(a.get("locations").unwrap(), b.get("locations").unwrap());
}

#[test]
fn test_mapping_trees_are_shared_across_queries() {
    let engine = engine();
    let mut model = ElementModel::new();
    let element =
        model.define(ElementDef::new("App").annotated(UnitInstance::new("XmlConfig")));
    engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    let first = engine.cache().tree(&"XmlConfig".into()).unwrap();
    let second = engine.cache().tree(&"XmlConfig".into()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_missing_entry_is_a_typed_absence() {
    let engine = engine();
    let mut model = ElementModel::new();
    let element = model.define(ElementDef::new("Bare"));
    let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    assert!(!view.is_present(&"Config".into()));
    let err = view.get(&"Config".into()).unwrap_err();
    assert!(matches!(err, MergeError::MissingEntry { .. }));
}

#[test]
fn test_default_selection_prefers_the_nearest_level() {
    let engine = engine();
    let mut model = ElementModel::new();
    model.define(
        ElementDef::new("Base")
            .annotated(UnitInstance::new("XmlConfig").with("xmlFiles", MetaValue::array(["near.xml"]))),
    );
    let element = model.define(
        ElementDef::new("App")
            .extends("Base")
            .annotated(UnitInstance::new("MetaXml")),
    );
    let view = engine
        .of(&model, &element, SearchStrategy::Superclass)
        .unwrap();

    // App carries Config at distance 2 (via MetaXml -> XmlConfig), Base at
    // distance 1; the level closer to the element outranks the shorter
    // meta-declaration chain.
    let entry = view.get(&"Config".into()).unwrap();
    assert_eq!(entry.aggregate_index(), 0);
    assert_eq!(entry.distance(), 2);
    assert_eq!(
        entry.get("locations").unwrap(),
        MetaValue::array(["deep.xml"])
    );
}

#[test]
fn test_selectors_diverge_on_depth_versus_declaration() {
    let engine = engine();
    let mut model = ElementModel::new();
    model.define(
        ElementDef::new("Base")
            .annotated(UnitInstance::new("Config").with("value", MetaValue::array(["base.xml"]))),
    );
    let element = model.define(
        ElementDef::new("App")
            .extends("Base")
            .annotated(UnitInstance::new("XmlConfig").with("xmlFiles", MetaValue::array(["app.xml"]))),
    );
    let view = engine
        .of(&model, &element, SearchStrategy::Superclass)
        .unwrap();

    // Nearest stays on the element's own level even though Config is only
    // meta-present there; FirstDeclared walks past it to the physically
    // attached instance on Base.
    let nearest = view
        .get_with(&"Config".into(), |_| true, Selector::Nearest)
        .unwrap();
    assert_eq!((nearest.aggregate_index(), nearest.distance()), (0, 1));
    assert_eq!(
        nearest.get("locations").unwrap(),
        MetaValue::array(["app.xml"])
    );

    let first = view
        .get_with(&"Config".into(), |_| true, Selector::FirstDeclared)
        .unwrap();
    assert_eq!((first.aggregate_index(), first.distance()), (1, 0));
    assert_eq!(
        first.get("locations").unwrap(),
        MetaValue::array(["base.xml"])
    );
}

#[test]
fn test_get_with_applies_the_predicate_before_selection() {
    let engine = engine();
    let mut model = ElementModel::new();
    model.define(
        ElementDef::new("Base")
            .annotated(UnitInstance::new("Config").with("value", MetaValue::array(["base.xml"]))),
    );
    let element = model.define(
        ElementDef::new("App")
            .extends("Base")
            .annotated(UnitInstance::new("Config").with("value", MetaValue::array(["app.xml"]))),
    );
    let view = engine
        .of(&model, &element, SearchStrategy::Superclass)
        .unwrap();

    let inherited = view
        .get_with(
            &"Config".into(),
            |entry| entry.aggregate_index() > 0,
            Selector::Nearest,
        )
        .unwrap();
    assert_eq!(
        inherited.get("locations").unwrap(),
        MetaValue::array(["base.xml"])
    );

    let err = view
        .get_with(&"Config".into(), |_| false, Selector::Nearest)
        .unwrap_err();
    assert!(matches!(err, MergeError::MissingEntry { .. }));
}

#[test]
fn test_stream_preserves_traversal_order() {
    let engine = engine();
    let mut model = ElementModel::new();
    model.define(ElementDef::new("Base").annotated(UnitInstance::new("XmlConfig")));
    let element = model.define(
        ElementDef::new("App")
            .extends("Base")
            .annotated(UnitInstance::new("XmlConfig")),
    );
    let view = engine
        .of(&model, &element, SearchStrategy::Superclass)
        .unwrap();
    let depths: Vec<usize> = view
        .stream_unit(&"Config".into())
        .map(|entry| entry.aggregate_index())
        .collect();
    assert_eq!(depths, [0, 1]);
}

/// `ScriptConfig` declares two attributes that both override the same
/// ancestor attribute, making them implicit mirrors of each other.
fn script_registry() -> Arc<UnitTypeRegistry> {
    let registry = UnitTypeRegistry::new();
    registry.declare(
        UnitTypeDecl::builder("Config")
            .attribute(
                Attribute::new("locations", string_array())
                    .with_default(MetaValue::Array(vec![])),
            )
            .build(),
    );
    registry.declare(
        UnitTypeDecl::builder("ScriptConfig")
            .attribute(
                Attribute::new("value", string_array())
                    .with_default(MetaValue::Array(vec![]))
                    .alias_for(AliasDecl::in_unit("Config".into(), "locations")),
            )
            .attribute(
                Attribute::new("groovyScripts", string_array())
                    .with_default(MetaValue::Array(vec![]))
                    .alias_for(AliasDecl::in_unit("Config".into(), "locations")),
            )
            .meta(UnitInstance::new("Config"))
            .build(),
    );
    Arc::new(registry)
}

#[test]
fn test_sibling_overrides_of_one_ancestor_resolve_together() {
    let engine = MergeEngine::new(script_registry());
    let mut model = ElementModel::new();
    let element = model.define(
        ElementDef::new("App").annotated(
            UnitInstance::new("ScriptConfig").with("groovyScripts", MetaValue::array(["s.groovy"])),
        ),
    );
    let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();

    let script = view.get(&"ScriptConfig".into()).unwrap();
    assert_eq!(
        script.get("value").unwrap(),
        MetaValue::array(["s.groovy"])
    );
    assert_eq!(
        script.get("groovyScripts").unwrap(),
        MetaValue::array(["s.groovy"])
    );

    let config = view.get(&"Config".into()).unwrap();
    assert_eq!(
        config.get("locations").unwrap(),
        MetaValue::array(["s.groovy"])
    );
}

#[test]
fn test_sibling_overrides_conflict_when_both_set_differently() {
    let engine = MergeEngine::new(script_registry());
    let mut model = ElementModel::new();
    let element = model.define(
        ElementDef::new("App").annotated(
            UnitInstance::new("ScriptConfig")
                .with("value", MetaValue::array(["a.groovy"]))
                .with("groovyScripts", MetaValue::array(["b.groovy"])),
        ),
    );
    let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();

    let script = view.get(&"ScriptConfig".into()).unwrap();
    let err = script.get("value").unwrap_err();
    let MergeError::Resolve(ResolveError::MirrorConflict(conflict)) = err else {
        panic!("expected a mirror conflict, got {err}");
    };
    assert_eq!(conflict.attribute_a, "value");
    assert_eq!(conflict.attribute_b, "groovyScripts");
}

#[test]
fn test_as_map_applies_adaptation_flags() {
    let registry = UnitTypeRegistry::new();
    registry.declare(
        UnitTypeDecl::builder("Filter")
            .attribute(Attribute::new("pattern", ValueType::String).with_default("*"))
            .attribute(Attribute::new("negate", ValueType::Boolean).with_default(false))
            .build(),
    );
    registry.declare(
        UnitTypeDecl::builder("Import")
            .attribute(
                Attribute::new("target", ValueType::Class)
                    .with_default(MetaValue::class("java.lang.Object")),
            )
            .attribute(
                Attribute::new(
                    "filters",
                    ValueType::array(ValueType::Unit("Filter".into())),
                )
                .with_default(MetaValue::Array(vec![])),
            )
            .build(),
    );
    let engine = MergeEngine::new(Arc::new(registry));

    let mut model = ElementModel::new();
    let element = model.define(
        ElementDef::new("App").annotated(
            UnitInstance::new("Import")
                .with("target", MetaValue::class("com.example.App"))
                .with(
                    "filters",
                    MetaValue::Array(vec![MetaValue::nested(
                        UnitInstance::new("Filter").with("pattern", "com.*"),
                    )]),
                ),
        ),
    );
    let view = engine.of(&model, &element, SearchStrategy::Direct).unwrap();
    let entry = view.get(&"Import".into()).unwrap();

    let map = entry
        .as_map(&[Adapt::ClassToString, Adapt::NestedToMap])
        .unwrap();
    assert_eq!(map["target"], MetaValue::string("com.example.App"));
    let MetaValue::Array(filters) = &map["filters"] else {
        panic!("filters should stay an array");
    };
    let MetaValue::Nested(filter) = &filters[0] else {
        panic!("expected a nested instance");
    };
    assert_eq!(filter.value("pattern"), Some(&MetaValue::string("com.*")));
    assert_eq!(filter.value("negate"), Some(&MetaValue::Boolean(false)));

    assert_eq!(
        entry.to_json().unwrap(),
        json!({
            "target": "com.example.App",
            "filters": [{"pattern": "com.*", "negate": false}],
        })
    );
}
