/// Define a presentation class: a struct wrapping a [`crate::Core`], its
/// static schema table, and typed field accessors.
///
/// ```ignore
/// presentation! {
///     /// A named requirement of a node type.
///     pub struct RequirementDefinition (short_form "capability") {
///         capability "capability": prim(Str) [required, check(FieldCheck::TypeExists(TypeCategory::Capability))];
///         node "node": prim(Str);
///         relationship "relationship": obj(RequirementDefinitionRelationship);
///     }
/// }
/// ```
///
/// Class options, each optional but fixed in order:
/// `(short_form "key")` expands non-mapping raws into `{key: raw}`;
/// `(allow_unknown)` accepts undeclared keys;
/// `(extra_validate path)` runs `path(&self, &mut ValidateCx)` after the
/// structural pass.
#[macro_export]
macro_rules! presentation {
    // Entry arms normalize the option combinations onto @build.
    ( $(#[$m:meta])* pub struct $N:ident { $($fields:tt)* } ) => {
        $crate::presentation!{ @build $(#[$m])* ($N) (None) (false) () { $($fields)* } }
    };
    ( $(#[$m:meta])* pub struct $N:ident (short_form $sf:literal) { $($fields:tt)* } ) => {
        $crate::presentation!{ @build $(#[$m])* ($N) (Some($sf)) (false) () { $($fields)* } }
    };
    ( $(#[$m:meta])* pub struct $N:ident (allow_unknown) { $($fields:tt)* } ) => {
        $crate::presentation!{ @build $(#[$m])* ($N) (None) (true) () { $($fields)* } }
    };
    ( $(#[$m:meta])* pub struct $N:ident (short_form $sf:literal) (allow_unknown) { $($fields:tt)* } ) => {
        $crate::presentation!{ @build $(#[$m])* ($N) (Some($sf)) (true) () { $($fields)* } }
    };
    ( $(#[$m:meta])* pub struct $N:ident (extra_validate $ev:path) { $($fields:tt)* } ) => {
        $crate::presentation!{ @build $(#[$m])* ($N) (None) (false) ($ev) { $($fields)* } }
    };
    ( $(#[$m:meta])* pub struct $N:ident (short_form $sf:literal) (extra_validate $ev:path) { $($fields:tt)* } ) => {
        $crate::presentation!{ @build $(#[$m])* ($N) (Some($sf)) (false) ($ev) { $($fields)* } }
    };
    ( $(#[$m:meta])* pub struct $N:ident (allow_unknown) (extra_validate $ev:path) { $($fields:tt)* } ) => {
        $crate::presentation!{ @build $(#[$m])* ($N) (None) (true) ($ev) { $($fields)* } }
    };

    ( @build
        $(#[$m:meta])*
        ($N:ident) ($sf:expr) ($au:expr) ($($ev:path)?)
        {
            $( $accessor:ident $key:literal : $kind:ident ( $($arg:tt)* ) $( [ $($mods:tt)* ] )? ; )*
        }
    ) => {
        $(#[$m])*
        pub struct $N {
            core: $crate::Core,
        }

        impl $crate::Presented for $N {
            fn schema() -> &'static $crate::ClassSchema {
                const FIELDS: &[$crate::FieldDescriptor] = &[
                    $( $crate::__mods!(
                        $crate::__descriptor!($key, $kind($($arg)*)) ;
                        $($($mods)*)?
                    ) ),*
                ];
                static SCHEMA: $crate::ClassSchema = $crate::ClassSchema {
                    name: stringify!($N),
                    short_form: $sf,
                    allow_unknown: $au,
                    fields: FIELDS,
                };
                &SCHEMA
            }

            fn from_core(mut core: $crate::Core) -> Self {
                if let Some(key) = Self::schema().short_form {
                    core.normalize_short_form(key);
                }
                $N { core }
            }

            fn core(&self) -> &$crate::Core {
                &self.core
            }

            fn validate(&self, cx: &mut $crate::ValidateCx) {
                $crate::validate_fields(self, cx);
                $( $ev(self, cx); )?
            }
        }

        impl $N {
            /// The key under which this presentation appeared.
            pub fn name(&self) -> &str {
                &self.core.name
            }

            pub fn fullname(&self) -> String {
                self.core.fullname()
            }

            pub fn raw(&self) -> &$crate::doc::Value {
                &self.core.raw
            }

            pub fn locator(&self) -> &$crate::doc::Locator {
                &self.core.locator
            }

            $( $crate::__accessor!{ $accessor, $key, $kind($($arg)*) } )*
        }
    };
}

/// Fold field modifiers onto a descriptor expression.
#[doc(hidden)]
#[macro_export]
macro_rules! __mods {
    ($desc:expr ; ) => { $desc };
    ($desc:expr ; required $(, $($rest:tt)*)? ) => {
        $crate::__mods!($desc.required() ; $($($rest)*)?)
    };
    ($desc:expr ; check($e:expr) $(, $($rest:tt)*)? ) => {
        $crate::__mods!($desc.check($e) ; $($($rest)*)?)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __descriptor {
    ($key:literal, prim($k:ident)) => {
        $crate::FieldDescriptor::new(
            $key,
            $crate::FieldKind::Primitive($crate::PrimitiveKind::$k),
            None,
        )
    };
    ($key:literal, prim_list($k:ident)) => {
        $crate::FieldDescriptor::new(
            $key,
            $crate::FieldKind::PrimitiveList($crate::PrimitiveKind::$k),
            None,
        )
    };
    ($key:literal, obj($C:ty)) => {
        $crate::FieldDescriptor::new(
            $key,
            $crate::FieldKind::Object,
            Some($crate::ChildOps {
                class_name: stringify!($C),
                validate: $crate::validate_erased::<$C>,
            }),
        )
    };
    ($key:literal, obj_list($C:ty)) => {
        $crate::FieldDescriptor::new(
            $key,
            $crate::FieldKind::ObjectList,
            Some($crate::ChildOps {
                class_name: stringify!($C),
                validate: $crate::validate_erased::<$C>,
            }),
        )
    };
    ($key:literal, obj_dict($C:ty)) => {
        $crate::FieldDescriptor::new(
            $key,
            $crate::FieldKind::ObjectDict,
            Some($crate::ChildOps {
                class_name: stringify!($C),
                validate: $crate::validate_erased::<$C>,
            }),
        )
    };
    ($key:literal, obj_seq($C:ty)) => {
        $crate::FieldDescriptor::new(
            $key,
            $crate::FieldKind::ObjectSequencedList,
            Some($crate::ChildOps {
                class_name: stringify!($C),
                validate: $crate::validate_erased::<$C>,
            }),
        )
    };
    ($key:literal, unknown_dict($C:ty)) => {
        $crate::FieldDescriptor::new(
            $key,
            $crate::FieldKind::UnknownFieldsDict,
            Some($crate::ChildOps {
                class_name: stringify!($C),
                validate: $crate::validate_erased::<$C>,
            }),
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __accessor {
    ($accessor:ident, $key:literal, prim(Str)) => {
        pub fn $accessor(&self) -> Option<String> {
            self.core.raw.get($key).and_then($crate::coerce_str)
        }
    };
    ($accessor:ident, $key:literal, prim(Int)) => {
        pub fn $accessor(&self) -> Option<i64> {
            self.core.raw.get($key).and_then($crate::coerce_int)
        }
    };
    ($accessor:ident, $key:literal, prim(Float)) => {
        pub fn $accessor(&self) -> Option<f64> {
            self.core.raw.get($key).and_then($crate::coerce_float)
        }
    };
    ($accessor:ident, $key:literal, prim(Bool)) => {
        pub fn $accessor(&self) -> Option<bool> {
            self.core.raw.get($key).and_then($crate::coerce_bool)
        }
    };
    ($accessor:ident, $key:literal, prim(Any)) => {
        pub fn $accessor(&self) -> Option<&$crate::doc::Value> {
            self.core.raw.get($key)
        }
    };
    ($accessor:ident, $key:literal, prim_list(Str)) => {
        pub fn $accessor(&self) -> Vec<String> {
            self.core
                .raw
                .get($key)
                .and_then($crate::doc::Value::as_seq)
                .map(|items| items.iter().filter_map($crate::coerce_str).collect())
                .unwrap_or_default()
        }
    };
    ($accessor:ident, $key:literal, prim_list(Int)) => {
        pub fn $accessor(&self) -> Vec<i64> {
            self.core
                .raw
                .get($key)
                .and_then($crate::doc::Value::as_seq)
                .map(|items| items.iter().filter_map($crate::coerce_int).collect())
                .unwrap_or_default()
        }
    };
    ($accessor:ident, $key:literal, prim_list(Any)) => {
        pub fn $accessor(&self) -> Vec<$crate::doc::Value> {
            self.core
                .raw
                .get($key)
                .and_then($crate::doc::Value::as_seq)
                .map(|items| items.to_vec())
                .unwrap_or_default()
        }
    };
    ($accessor:ident, $key:literal, obj($C:ty)) => {
        pub fn $accessor(&self) -> Option<$C> {
            self.core.raw.get($key).map(|raw| {
                $crate::present_child::<$C>(&self.core, $key, raw, self.core.locator.get($key))
            })
        }
    };
    ($accessor:ident, $key:literal, obj_list($C:ty)) => {
        pub fn $accessor(&self) -> Vec<$C> {
            let locator = self.core.locator.get($key);
            self.core
                .raw
                .get($key)
                .and_then($crate::doc::Value::as_seq)
                .map(|items| {
                    items
                        .iter()
                        .enumerate()
                        .map(|(index, raw)| {
                            $crate::present_child::<$C>(
                                &self.core,
                                &index.to_string(),
                                raw,
                                locator.index(index),
                            )
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
    };
    ($accessor:ident, $key:literal, obj_dict($C:ty)) => {
        pub fn $accessor(&self) -> $crate::indexmap::IndexMap<String, $C> {
            let locator = self.core.locator.get($key);
            self.core
                .raw
                .get($key)
                .and_then($crate::doc::Value::as_map)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|(name, raw)| {
                            let child = $crate::present_child::<$C>(
                                &self.core,
                                name,
                                raw,
                                locator.get(name),
                            );
                            (name.clone(), child)
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
    };
    ($accessor:ident, $key:literal, obj_seq($C:ty)) => {
        pub fn $accessor(&self) -> Vec<(String, $C)> {
            let locator = self.core.locator.get($key);
            self.core
                .raw
                .get($key)
                .and_then($crate::doc::Value::as_seq)
                .map(|items| {
                    items
                        .iter()
                        .enumerate()
                        .filter_map(|(index, item)| {
                            let entries = item.as_map().filter(|m| m.len() == 1)?;
                            let (name, raw) = entries.iter().next()?;
                            let child = $crate::present_child::<$C>(
                                &self.core,
                                name,
                                raw,
                                locator.index(index).get(name),
                            );
                            Some((name.clone(), child))
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
    };
    ($accessor:ident, $key:literal, unknown_dict($C:ty)) => {
        pub fn $accessor(&self) -> $crate::indexmap::IndexMap<String, $C> {
            use $crate::Presented;
            let schema = Self::schema();
            self.core
                .raw
                .as_map()
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|(name, _)| !schema.declares(name))
                        .map(|(name, raw)| {
                            let child = $crate::present_child::<$C>(
                                &self.core,
                                name,
                                raw,
                                self.core.locator.get(name),
                            );
                            (name.clone(), child)
                        })
                        .collect()
                })
                .unwrap_or_default()
        }
    };
}
