//! Registry-declared schemas for realistic configuration shapes, converted
//! into typed structs: a package manifest and a file-sharing server.

use kdlconf_core::{ConfigNode, ObjectValue, Value, ValueType};
use kdlconf_schema::{
    child, children, dynamic, object, property_of, tag, value_of, values_of, Deserializer,
    IntoSchema, Primitive, Schema, SchemaRegistry, TagKey, TagMap, TagSchemas,
};
use serde::{Deserialize, Serialize};

// ─── Package manifest ────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct PackageDependency {
    name: String,
    version: String,
    dev: Option<bool>,
    path: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct DependenciesGroup {
    platform: Option<String>,
    package_dependencies: Vec<PackageDependency>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Package {
    name: String,
    version: String,
    dependencies: Vec<DependenciesGroup>,
}

fn package_schema() -> Schema {
    let registry = SchemaRegistry::new();
    registry
        .define_type::<PackageDependency>(|b| {
            b.field("name", tag())
                .field("version", value_of(0, [ValueType::String]))
                .field("dev", property_of("dev", [ValueType::Boolean]))
                .optional("dev")
                .field("path", property_of("path", [ValueType::String]))
                .optional("path")
        })
        .unwrap();
    registry
        .define_type::<DependenciesGroup>(|b| {
            b.field("platform", property_of("platform", [ValueType::String]))
                .optional("platform")
                .with_default("package_dependencies")
                .field(
                    "package_dependencies",
                    children((TagKey::Any, registry.reference_type::<PackageDependency>())),
                )
        })
        .unwrap();
    registry
        .define_type::<Package>(|b| {
            b.field("name", child(("name", Primitive::String)))
                .field("version", child(("version", Primitive::String)))
                .field(
                    "dependencies",
                    children(("dependencies", registry.reference_type::<DependenciesGroup>())),
                )
                .with_default("dependencies")
        })
        .unwrap();
    assert!(registry.unresolved().is_empty());
    child(("package", registry.reference_type::<Package>()))
}

fn package_document() -> ConfigNode {
    ConfigNode::root(vec![ConfigNode::new("package")
        .with_child(ConfigNode::new("name").with_value("my-pkg"))
        .with_child(ConfigNode::new("version").with_value("1.2.3"))
        .with_child(
            ConfigNode::new("dependencies")
                .with_child(
                    ConfigNode::new("winapi")
                        .with_value("1.0.0")
                        .with_property("path", "./crates/my-winapi-fork"),
                )
                .with_child(
                    ConfigNode::new("miette")
                        .with_value("2.0.0")
                        .with_property("dev", true),
                ),
        )
        .with_child(
            ConfigNode::new("dependencies")
                .with_property("platform", "windows")
                .with_child(ConfigNode::new("winapi").with_value("0.3")),
        )])
}

#[test]
fn test_package_manifest_into_struct() {
    let package: Package = Deserializer::new()
        .deserialize_into(&package_document(), &package_schema())
        .unwrap();

    assert_eq!(
        package,
        Package {
            name: "my-pkg".into(),
            version: "1.2.3".into(),
            dependencies: vec![
                DependenciesGroup {
                    platform: None,
                    package_dependencies: vec![
                        PackageDependency {
                            name: "winapi".into(),
                            version: "1.0.0".into(),
                            dev: None,
                            path: Some("./crates/my-winapi-fork".into()),
                        },
                        PackageDependency {
                            name: "miette".into(),
                            version: "2.0.0".into(),
                            dev: Some(true),
                            path: None,
                        },
                    ],
                },
                DependenciesGroup {
                    platform: Some("windows".into()),
                    package_dependencies: vec![PackageDependency {
                        name: "winapi".into(),
                        version: "0.3".into(),
                        dev: None,
                        path: None,
                    }],
                },
            ],
        }
    );
}

#[test]
fn test_package_without_dependencies_uses_empty_default() {
    let root = ConfigNode::root(vec![ConfigNode::new("package")
        .with_child(ConfigNode::new("name").with_value("bare"))
        .with_child(ConfigNode::new("version").with_value("0.1.0"))]);

    let package: Package = Deserializer::new()
        .deserialize_into(&root, &package_schema())
        .unwrap();

    assert!(package.dependencies.is_empty());
}

#[test]
fn test_result_objects_carry_type_names() {
    let value = Deserializer::new()
        .deserialize(&package_document(), &package_schema())
        .unwrap();

    let package = value.as_object().unwrap();
    assert_eq!(package.type_name.as_deref(), Some("Package"));
    let group = package.get("dependencies").and_then(Value::as_list).unwrap()[0]
        .as_object()
        .unwrap();
    assert_eq!(group.type_name.as_deref(), Some("DependenciesGroup"));
}

#[test]
fn test_conversion_failure_is_distinct_from_document_issues() {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Strict {
        name: u32,
    }
    let schema = object().field("name", tag()).into_schema();

    let err = Deserializer::new()
        .deserialize_into::<Strict>(&ConfigNode::new("not-a-number"), &schema)
        .unwrap_err();

    assert!(err.issues().is_none());
}

// ─── File-sharing server ─────────────────────────────────────────────

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Allow {
    values: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Deny {
    values: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct RolePath {
    path: String,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct User {
    user: String,
    password: String,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Role {
    users: Vec<User>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct PhysicalFileSystem {
    path: String,
    ignore: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Remote {
    name: String,
    address: String,
    port: u16,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Server {
    port: Option<u16>,
}

impl Default for Server {
    fn default() -> Self {
        Self { port: Some(8080) }
    }
}

#[derive(Debug, Default, Serialize)]
struct Mount {}

#[derive(Debug, Default, Serialize)]
struct ShareConfig {}

fn permission_tags(registry: &SchemaRegistry) -> TagMap {
    TagMap::new()
        .tag("allow", registry.reference_type::<Allow>())
        .tag("deny", registry.reference_type::<Deny>())
        .tag("path", registry.reference_type::<RolePath>())
}

fn share_schema() -> Schema {
    let registry = SchemaRegistry::new();

    registry
        .define_type::<Allow>(|b| b.field("values", values_of(0, [ValueType::String])))
        .unwrap();
    registry
        .define_type::<Deny>(|b| b.field("values", values_of(0, [ValueType::String])))
        .unwrap();
    registry
        .define_type::<RolePath>(|b| {
            let tags = registry.clone();
            b.field("path", value_of(0, [ValueType::String])).field(
                "permissions",
                children(TagSchemas::factory(move || permission_tags(&tags))),
            )
        })
        .unwrap();
    registry
        .define_type::<User>(|b| {
            b.field("user", value_of(0, [ValueType::String]))
                .field("password", value_of(1, [ValueType::String]))
        })
        .unwrap();
    registry
        .define_type::<Role>(|b| {
            b.field("users", children(("user", registry.reference_type::<User>())))
                .field("permissions", children(permission_tags(&registry)))
        })
        .unwrap();
    registry
        .define_type::<PhysicalFileSystem>(|b| {
            b.field("path", property_of("path", [ValueType::String]))
                .field("ignore", children(("ignore", Primitive::String)))
        })
        .unwrap();
    registry
        .define_type::<Remote>(|b| {
            b.field("name", value_of(0, [ValueType::String]))
                .field("address", property_of("address", [ValueType::String]))
                .field("port", property_of("port", [ValueType::Number]))
        })
        .unwrap();
    registry
        .define_type::<Server>(|b| b.field("port", child(("port", Primitive::Number)).optional()))
        .unwrap();

    let physical = registry.reference_type::<PhysicalFileSystem>();
    let file_system = dynamic(move |node, _| {
        match node.values.first().and_then(|v| v.as_str()) {
            Some("physical") => Ok(physical.clone()),
            _ => Ok(object().field("kind", value_of(0, ValueType::ALL)).into_schema()),
        }
    });
    registry
        .define_type::<Mount>(|b| {
            b.field("target", value_of(0, [ValueType::String]))
                .field("fs", child(("fs", file_system)))
        })
        .unwrap();

    registry
        .define_type::<ShareConfig>(|b| {
            b.field("roles", children(("role", registry.reference_type::<Role>())))
                .field("mounts", children(("mount", registry.reference_type::<Mount>())))
                .field("remotes", children(("remote", registry.reference_type::<Remote>())))
                .field("server", child(("server", registry.reference_type::<Server>())))
                .with_default("server")
        })
        .unwrap();

    assert!(registry.unresolved().is_empty());
    registry.reference_type::<ShareConfig>()
}

fn share_document() -> ConfigNode {
    ConfigNode::root(vec![
        ConfigNode::new("role")
            .with_value("admin")
            .with_child(ConfigNode::new("user").with_value("alice").with_value("secret"))
            .with_child(ConfigNode::new("allow").with_value("/"))
            .with_child(
                ConfigNode::new("path")
                    .with_value("/private")
                    .with_child(ConfigNode::new("deny").with_value("/private/x"))
                    .with_child(
                        ConfigNode::new("path")
                            .with_value("/private/y")
                            .with_child(ConfigNode::new("allow").with_value("/private/y")),
                    ),
            ),
        ConfigNode::new("mount")
            .with_value("/data")
            .with_child(ConfigNode::new("fs").with_value("physical").with_property("path", "/srv/data")),
        ConfigNode::new("mount")
            .with_value("/tmp")
            .with_child(ConfigNode::new("fs").with_value("memory")),
        ConfigNode::new("remote")
            .with_value("backup")
            .with_property("address", "10.0.0.2")
            .with_property("port", 8080),
    ])
}

fn field<'a>(object: &'a ObjectValue, name: &str) -> &'a Value {
    object.get(name).unwrap_or(&Value::Null)
}

#[test]
fn test_share_config_resolves() {
    let value = Deserializer::new()
        .deserialize(&share_document(), &share_schema())
        .unwrap();
    let config = value.as_object().unwrap();

    let remotes: Vec<Remote> = field(config, "remotes").clone().into_typed().unwrap();
    assert_eq!(
        remotes,
        vec![Remote {
            name: "backup".into(),
            address: "10.0.0.2".into(),
            port: 8080,
        }]
    );

    let roles = field(config, "roles").as_list().unwrap();
    let role = roles[0].as_object().unwrap();
    let users: Vec<User> = field(role, "users").clone().into_typed().unwrap();
    assert_eq!(users[0].user, "alice");
}

#[test]
fn test_heterogeneous_permissions_keep_declared_types() {
    let value = Deserializer::new()
        .deserialize(&share_document(), &share_schema())
        .unwrap();
    let role = value.get("roles").and_then(Value::as_list).unwrap()[0].clone();
    let permissions = role.get("permissions").and_then(Value::as_list).unwrap();

    let kinds: Vec<&str> = permissions
        .iter()
        .filter_map(|p| p.as_object().and_then(|o| o.type_name.as_deref()))
        .collect();
    assert_eq!(kinds, ["Allow", "RolePath"]);

    // Self-referential nesting: path → path → allow.
    let nested = permissions[1]
        .get("permissions")
        .and_then(Value::as_list)
        .unwrap();
    let inner_path = nested[1].as_object().unwrap();
    assert_eq!(inner_path.type_name.as_deref(), Some("RolePath"));
    let inner_allow: Allow = field(inner_path, "permissions")
        .as_list()
        .unwrap()[0]
        .clone()
        .into_typed()
        .unwrap();
    assert_eq!(inner_allow.values, vec!["/private/y".to_string()]);
}

#[test]
fn test_dynamic_file_system_selection() {
    let value = Deserializer::new()
        .deserialize(&share_document(), &share_schema())
        .unwrap();
    let mounts = value.get("mounts").and_then(Value::as_list).unwrap();

    let physical: PhysicalFileSystem = mounts[0]
        .get("fs")
        .cloned()
        .unwrap()
        .into_typed()
        .unwrap();
    assert_eq!(physical.path, "/srv/data");
    assert!(physical.ignore.is_empty());

    let memory = mounts[1].get("fs").unwrap();
    assert_eq!(memory.get("kind"), Some(&Value::String("memory".into())));
}

#[test]
fn test_absent_server_synthesized_from_prototype() {
    let value = Deserializer::new()
        .deserialize(&share_document(), &share_schema())
        .unwrap();

    let server: Server = value.get("server").cloned().unwrap().into_typed().unwrap();
    assert_eq!(server, Server { port: Some(8080) });
}

#[test]
fn test_nested_issue_path() {
    let root = ConfigNode::root(vec![ConfigNode::new("role").with_child(
        ConfigNode::new("path")
            .with_value("/a")
            .with_child(ConfigNode::new("path").with_value(42)),
    )]);

    let err = Deserializer::new()
        .deserialize(&root, &share_schema())
        .unwrap_err();

    let issues = err.issues().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(
        issues.issues()[0].path,
        "top() > role[nth(0)] > path[nth(0)] > path[nth(0)][val(0)]"
    );
    assert_eq!(
        issues.issues()[0].message,
        "Expected type String, got Number instead"
    );
}
