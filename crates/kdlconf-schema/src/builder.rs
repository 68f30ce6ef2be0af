//! # Schema Builder
//!
//! Field-declaration API for composite types. Each constructor below
//! returns a ready `Schema`; `ObjectBuilder` assembles them into an Object
//! schema in declaration order, which is also the order fields are resolved
//! in.
//!
//! ## Selector Defaults
//!
//! | Constructor | single | optional | length |
//! |-------------|--------|----------|--------|
//! | `child` | yes | no | — |
//! | `children` | no | yes | — |
//! | `value` / `value_of` | yes | no | 1 |
//! | `values` / `values_of` | no | no | unbounded |
//! | `property` / `property_of` | — | no | — |
//!
//! ## Modifiers and the Merge Rule
//!
//! `optional` and `default` modifiers may be declared before or after the
//! field they target. When a field is registered again with a schema of the
//! same family (Children, Values or Property), the new schema inherits the
//! earlier declaration's flags. Modifiers aimed at kinds without flags, and
//! re-registrations across families, change nothing.

use std::sync::Arc;

use kdlconf_core::{ConfigNode, ObjectValue, ValueType};

use crate::schema::{
    ChildrenSchema, DynamicContext, DynamicSchema, IntoSchema, IntoTagSchemas, ObjectSchema,
    PropertySchema, Schema, ValuesSchema,
};

/// Select exactly one child by tag; mandatory unless modified.
pub fn child(tags: impl IntoTagSchemas) -> Schema {
    Schema::Children(ChildrenSchema::one(tags))
}

/// Select every child matching the tag set; optional unless modified.
pub fn children(tags: impl IntoTagSchemas) -> Schema {
    Schema::Children(ChildrenSchema {
        optional: true,
        ..ChildrenSchema::many(tags)
    })
}

/// The positional value at `index`, any type.
pub fn value(index: usize) -> Schema {
    value_of(index, ValueType::ALL)
}

/// The positional value at `index`, restricted to `types`.
pub fn value_of(index: usize, types: impl IntoIterator<Item = ValueType>) -> Schema {
    Schema::Values(ValuesSchema {
        start: index,
        length: Some(1),
        single: true,
        types: types.into_iter().collect(),
        optional: false,
        default: false,
    })
}

/// Every positional value from `start` on, any type.
pub fn values(start: usize) -> Schema {
    values_of(start, ValueType::ALL)
}

/// Every positional value from `start` on, restricted to `types`.
pub fn values_of(start: usize, types: impl IntoIterator<Item = ValueType>) -> Schema {
    Schema::Values(ValuesSchema {
        start,
        length: None,
        single: false,
        types: types.into_iter().collect(),
        optional: false,
        default: false,
    })
}

/// The property `name`, any type.
pub fn property(name: impl Into<String>) -> Schema {
    property_of(name, ValueType::ALL)
}

/// The property `name`, restricted to `types`.
pub fn property_of(name: impl Into<String>, types: impl IntoIterator<Item = ValueType>) -> Schema {
    Schema::Property(PropertySchema {
        name: name.into(),
        types: types.into_iter().collect(),
        optional: false,
        default: false,
    })
}

/// The current node's own tag.
pub fn tag() -> Schema {
    Schema::Tag
}

/// The raw current node.
pub fn node() -> Schema {
    Schema::Node
}

/// A schema chosen from the node at deserialization time.
pub fn dynamic(
    factory: impl Fn(&ConfigNode, &DynamicContext<'_>) -> Result<Schema, String>
        + Send
        + Sync
        + 'static,
) -> Schema {
    Schema::Dynamic(DynamicSchema::new(factory))
}

/// Start an untyped Object schema (results are bare mappings).
pub fn object() -> ObjectBuilder {
    ObjectBuilder::default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Optional,
    Default,
}

/// Assembles an Object schema field by field.
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    type_name: Option<String>,
    prototype: Option<ObjectValue>,
    fields: Vec<(String, Schema)>,
    /// Modifiers declared before their field.
    pending: Vec<(String, Modifier)>,
}

impl ObjectBuilder {
    /// Start an Object schema for a named type with no prototype.
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// Start an Object schema whose results begin as a copy of `prototype`.
    ///
    /// Field values already present on the prototype become the fallback
    /// passed to each field's resolution.
    pub fn with_prototype(prototype: ObjectValue) -> Self {
        Self {
            type_name: prototype.type_name.clone(),
            prototype: Some(prototype),
            ..Self::default()
        }
    }

    /// Register `schema` for `name`.
    pub fn field(mut self, name: impl Into<String>, schema: impl IntoSchema) -> Self {
        let name = name.into();
        let mut schema = schema.into_schema();

        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => {
                if let (Some((optional, default)), true) =
                    (existing.flags(), existing.same_family(&schema))
                {
                    if let Some((o, d)) = schema.flags_mut() {
                        *o = optional;
                        *d = default;
                    }
                }
                *existing = schema;
            }
            None => {
                let mut i = 0;
                while i < self.pending.len() {
                    if self.pending[i].0 == name {
                        let (_, modifier) = self.pending.remove(i);
                        schema = apply(schema, modifier);
                    } else {
                        i += 1;
                    }
                }
                self.fields.push((name, schema));
            }
        }
        self
    }

    /// Mark field `name` optional.
    pub fn optional(self, name: impl Into<String>) -> Self {
        self.modify(name.into(), Modifier::Optional)
    }

    /// Mark field `name` default.
    pub fn with_default(self, name: impl Into<String>) -> Self {
        self.modify(name.into(), Modifier::Default)
    }

    fn modify(mut self, name: String, modifier: Modifier) -> Self {
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some((_, schema)) => {
                let current = std::mem::replace(schema, Schema::Tag);
                *schema = apply(current, modifier);
            }
            None => self.pending.push((name, modifier)),
        }
        self
    }

    /// Finish the schema.
    pub fn build(self) -> Arc<ObjectSchema> {
        if !self.pending.is_empty() {
            tracing::debug!(
                type_name = ?self.type_name,
                orphaned = self.pending.len(),
                "modifiers declared for fields that were never registered"
            );
        }
        Arc::new(ObjectSchema {
            type_name: self.type_name,
            prototype: self.prototype,
            fields: self.fields,
        })
    }
}

fn apply(schema: Schema, modifier: Modifier) -> Schema {
    match modifier {
        Modifier::Optional => schema.optional(),
        Modifier::Default => schema.with_default(),
    }
}

impl IntoSchema for ObjectBuilder {
    fn into_schema(self) -> Schema {
        Schema::Object(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Primitive, TagKey, TagMap, TagSchemas};

    fn flags_of(schema: &ObjectSchema, name: &str) -> Option<(bool, bool)> {
        schema.field(name).and_then(Schema::flags)
    }

    #[test]
    fn test_selector_defaults() {
        assert_eq!(child(("a", Primitive::String)).flags(), Some((false, false)));
        assert_eq!(children(("a", Primitive::String)).flags(), Some((true, false)));
        match values(2) {
            Schema::Values(v) => {
                assert_eq!((v.start, v.length, v.single), (2, None, false));
                assert_eq!(v.types, ValueType::ALL.to_vec());
            }
            other => panic!("unexpected {other:?}"),
        }
        match value_of(1, [ValueType::String]) {
            Schema::Values(v) => assert_eq!((v.start, v.length, v.single), (1, Some(1), true)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_modifier_after_field() {
        let schema = object()
            .field("dev", property_of("dev", [ValueType::Boolean]))
            .optional("dev")
            .build();
        assert_eq!(flags_of(&schema, "dev"), Some((true, false)));
    }

    #[test]
    fn test_modifier_before_field() {
        let schema = object()
            .with_default("deps")
            .field("deps", children(("dependencies", Schema::Node)))
            .build();
        assert_eq!(flags_of(&schema, "deps"), Some((true, true)));
    }

    #[test]
    fn test_reregistration_inherits_flags_within_family() {
        let schema = object()
            .field("path", property("path"))
            .optional("path")
            .field("path", property_of("path", [ValueType::String]))
            .build();
        assert_eq!(flags_of(&schema, "path"), Some((true, false)));
        match schema.field("path") {
            Some(Schema::Property(p)) => assert_eq!(p.types, vec![ValueType::String]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reregistration_across_families_does_not_merge() {
        let schema = object()
            .field("x", property("x"))
            .optional("x")
            .field("x", value(0))
            .build();
        assert_eq!(flags_of(&schema, "x"), Some((false, false)));
    }

    #[test]
    fn test_modifier_on_flagless_kind_is_ignored() {
        let schema = object().field("name", tag()).optional("name").build();
        assert!(matches!(schema.field("name"), Some(Schema::Tag)));
    }

    #[test]
    fn test_field_order_is_declaration_order() {
        let schema = object()
            .field("b", tag())
            .field("a", node())
            .field("b", tag())
            .build();
        let names: Vec<&str> = schema.fields().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_tag_set_shapes() {
        let single = child(("name", Primitive::String));
        let literal = children(TagMap::new().tag("allow", node()).tag("deny", node()));
        let wildcard = children((TagKey::Any, node()));
        let factory = children(TagSchemas::factory(|| TagMap::new().tag("x", tag())));

        for (schema, expected) in [
            (single, "name"),
            (literal, "allow, deny"),
            (wildcard, "*"),
            (factory, "x"),
        ] {
            match schema {
                Schema::Children(c) => assert_eq!(c.tags.resolve().describe(), expected),
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
