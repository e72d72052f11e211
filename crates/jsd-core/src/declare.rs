//! # Class-Like Declarations
//!
//! [`ObjectSchema`] lets a Rust type stand for an object schema, the way a
//! class stands for one: the type declares its fields once, and every use of
//! the type shares the harvested definition.
//!
//! ```
//! use jsd_core::{Compile, DefinitionBuilder, ObjectSchema, StringType};
//!
//! struct Email;
//!
//! impl ObjectSchema for Email {
//!     const NAME: &'static str = "Email";
//!
//!     fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
//!         object
//!             .field("service", StringType::new())
//!             .field("value", StringType::new().required())
//!     }
//! }
//!
//! let schema = Email::required().unwrap().compile();
//! assert_eq!(schema["required"], serde_json::json!(["value"]));
//! ```
//!
//! ## Harvesting Guarantees
//!
//! - `declare` runs once per type for the life of the process, even when
//!   threads race on first use; later calls to
//!   [`ObjectSchema::definition`] return the same `Arc`.
//! - First-time harvests are serialised by one process-wide reentrant lock,
//!   so a declaration may reference other declared types freely. The
//!   registry's own lock is never held while `declare` runs.
//! - A type whose declaration reaches itself is rejected with
//!   [`DefinitionError::CyclicDefinition`].

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::{ReentrantMutex, RwLock};

use crate::error::DefinitionError;
use crate::normalize::Kind;
use crate::object::{DefinitionBuilder, ObjectDefinition, ObjectType};

/// A Rust type that declares an object schema.
pub trait ObjectSchema: 'static {
    /// Definition name used in diagnostics.
    const NAME: &'static str;

    /// Declare the fields. Called once per type.
    fn declare(object: DefinitionBuilder) -> DefinitionBuilder;

    /// The harvested definition, built on first use.
    fn definition() -> Result<Arc<ObjectDefinition>, DefinitionError>
    where
        Self: Sized,
    {
        harvest::<Self>()
    }

    /// An optional instance.
    fn optional() -> Result<ObjectType, DefinitionError>
    where
        Self: Sized,
    {
        Self::definition().map(ObjectType::new)
    }

    /// A required instance.
    fn required() -> Result<ObjectType, DefinitionError>
    where
        Self: Sized,
    {
        Self::optional().map(ObjectType::required)
    }

    /// A bare descriptor for this object.
    fn bare() -> Result<Kind, DefinitionError>
    where
        Self: Sized,
    {
        Self::definition().map(Kind::Object)
    }
}

type Definitions = RwLock<HashMap<TypeId, Arc<ObjectDefinition>>>;

fn definitions() -> &'static Definitions {
    static DEFINITIONS: OnceLock<Definitions> = OnceLock::new();
    DEFINITIONS.get_or_init(Definitions::default)
}

fn harvest_lock() -> &'static ReentrantMutex<()> {
    static HARVEST: OnceLock<ReentrantMutex<()>> = OnceLock::new();
    HARVEST.get_or_init(|| ReentrantMutex::new(()))
}

thread_local! {
    static IN_PROGRESS: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// Marks a type as being harvested on this thread until dropped.
struct HarvestGuard(TypeId);

impl HarvestGuard {
    fn enter(id: TypeId) -> Option<Self> {
        IN_PROGRESS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&id) {
                None
            } else {
                stack.push(id);
                Some(HarvestGuard(id))
            }
        })
    }
}

impl Drop for HarvestGuard {
    fn drop(&mut self) {
        IN_PROGRESS.with(|stack| stack.borrow_mut().retain(|id| *id != self.0));
    }
}

/// Whether `T` has already been harvested.
pub fn is_harvested<T: ObjectSchema>() -> bool {
    definitions().read().contains_key(&TypeId::of::<T>())
}

fn harvest<T: ObjectSchema>() -> Result<Arc<ObjectDefinition>, DefinitionError> {
    let id = TypeId::of::<T>();
    if let Some(existing) = definitions().read().get(&id) {
        return Ok(Arc::clone(existing));
    }

    // Re-check once serialised: another thread may have harvested `T` while
    // this one waited.
    let _serialised = harvest_lock().lock();
    if let Some(existing) = definitions().read().get(&id) {
        return Ok(Arc::clone(existing));
    }

    let guard = HarvestGuard::enter(id).ok_or_else(|| DefinitionError::CyclicDefinition {
        name: T::NAME.to_string(),
    })?;
    let built = T::declare(ObjectDefinition::builder(T::NAME)).build();
    drop(guard);
    let definition = Arc::new(built?);

    definitions().write().insert(id, Arc::clone(&definition));
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArrayType, BooleanType, Compile, OneOfType, StringType};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTED_DECLARATIONS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl ObjectSchema for Counted {
        const NAME: &'static str = "Counted";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            COUNTED_DECLARATIONS.fetch_add(1, Ordering::SeqCst);
            object.field("n", BooleanType::new())
        }
    }

    #[test]
    fn declare_runs_once_per_type() {
        let first = Counted::definition().unwrap();
        let second = Counted::definition().unwrap();
        let _instance = Counted::required().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(is_harvested::<Counted>());
        assert_eq!(COUNTED_DECLARATIONS.load(Ordering::SeqCst), 1);
    }

    static RACED_DECLARATIONS: AtomicUsize = AtomicUsize::new(0);

    struct Raced;

    impl ObjectSchema for Raced {
        const NAME: &'static str = "Raced";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            RACED_DECLARATIONS.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(100));
            object.field("inner", Inner::required())
        }
    }

    #[test]
    fn concurrent_first_use_declares_once() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| Raced::definition().unwrap()))
            .collect();
        let definitions: Vec<Arc<ObjectDefinition>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(RACED_DECLARATIONS.load(Ordering::SeqCst), 1);
        assert!(definitions.iter().all(|d| Arc::ptr_eq(d, &definitions[0])));
        assert_eq!(definitions[0].required_field_names(), ["inner"]);
    }

    struct Inner;

    impl ObjectSchema for Inner {
        const NAME: &'static str = "Inner";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            object.field("s", StringType::new().required())
        }
    }

    struct Outer;

    impl ObjectSchema for Outer {
        const NAME: &'static str = "Outer";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            object.field("inner", Inner::required())
        }
    }

    #[test]
    fn nested_declarations() {
        let compiled = Outer::optional().unwrap().compile();
        assert_eq!(
            compiled,
            json!({
                "type": ["object", "null"],
                "required": ["inner"],
                "properties": {
                    "inner": {
                        "type": "object",
                        "required": ["s"],
                        "properties": {"s": {"type": "string"}},
                    },
                },
            })
        );
    }

    struct Base;

    impl ObjectSchema for Base {
        const NAME: &'static str = "Base";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            object
                .field("id", StringType::new().required())
                .field("tags", ArrayType::of(StringType::new()))
        }
    }

    struct Derived;

    impl ObjectSchema for Derived {
        const NAME: &'static str = "Derived";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            object
                .inherit::<Base>()
                .field("tags", ArrayType::of(StringType::new()).map(ArrayType::required))
                .field("active", BooleanType::new())
        }
    }

    #[test]
    fn inherited_fields() {
        let def = Derived::definition().unwrap();
        let names: Vec<&str> = def.fields().keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "tags", "active"]);
        assert_eq!(def.required_field_names(), ["id", "tags"]);
        assert_eq!(Base::definition().unwrap().required_field_names(), ["id"]);
    }

    struct Loop;

    impl ObjectSchema for Loop {
        const NAME: &'static str = "Loop";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            object.field("again", Loop::optional())
        }
    }

    #[test]
    fn self_reference_is_rejected() {
        let err = Loop::definition().unwrap_err();
        match err {
            DefinitionError::InvalidArgument { argument, source } => {
                assert_eq!(argument, "field 'Loop.again'");
                assert_eq!(
                    *source,
                    DefinitionError::CyclicDefinition { name: "Loop".to_string() }
                );
            }
            other => panic!("expected InvalidArgument, got: {other}"),
        }
        assert!(!is_harvested::<Loop>());
    }

    struct Broken;

    impl ObjectSchema for Broken {
        const NAME: &'static str = "Broken";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            object
                .field("x", StringType::new())
                .field("x", StringType::new())
        }
    }

    struct OnBroken;

    impl ObjectSchema for OnBroken {
        const NAME: &'static str = "OnBroken";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            object.inherit::<Broken>()
        }
    }

    #[test]
    fn failing_parent_is_reported() {
        let err = OnBroken::definition().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid parent 'Broken' of 'OnBroken': duplicate field 'x' in object 'Broken'"
        );
        assert!(!is_harvested::<Broken>());
    }

    struct Choice;

    impl ObjectSchema for Choice {
        const NAME: &'static str = "Choice";

        fn declare(object: DefinitionBuilder) -> DefinitionBuilder {
            object.field(
                "thing",
                OneOfType::new([
                    crate::Type::from(StringType::new().required()),
                    BooleanType::new().required().into(),
                ]),
            )
        }
    }

    #[test]
    fn bare_object_descriptor() {
        let array = ArrayType::of(Choice::bare()).unwrap();
        let item = array.item_type().unwrap();
        assert!(!item.is_required());
        assert_eq!(
            array.compile()["items"],
            json!({
                "type": ["object", "null"],
                "properties": {
                    "thing": {"oneOf": [{"type": "string"}, {"type": "boolean"}]},
                },
            })
        );
    }
}
