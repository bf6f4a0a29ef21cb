use crate::base::{BaseModel, Field};
use crate::error::Result;
use crate::factory::Factory;
use crate::instance::{Instance, Slot};
use crate::value::Value;
use tracing::trace;

/// Classifies every field of `base` and materializes it onto `instance`.
///
/// The whole base model is classified before the first slot is installed, so an invalid
/// declaration leaves the instance untouched. Installation is rejected once the instance is
/// sealed.
///
/// # Errors
/// Returns the classification error of the first invalid declaration, or
/// [`crate::ModelError::Internal`] if `instance` is already sealed.
pub fn copy(base: &BaseModel, instance: &Instance) -> Result<()> {
    let fields = base.resolve()?;
    let node = instance.node();
    let store = node.tree().store();

    for (key, field) in fields {
        let label = instance.label_for(&key);
        let kind = field.kind();
        let slot = match field {
            Field::Computed(getter) => Slot::Computed { cell: store.computed(label), getter },
            Field::Primitive(default) => Slot::Data(store.observable(label, default)),
            Field::Map(factory) => {
                node.register_submodel(key.clone(), Factory::Map(factory.clone()))?;
                let seed = Value::Map(factory.placeholder(instance, &label));
                Slot::Data(store.observable(label, seed))
            },
            Field::Array(factory) => {
                node.register_submodel(key.clone(), Factory::Array(factory.clone()))?;
                let seed = Value::Array(factory.placeholder(instance, &label));
                Slot::Data(store.observable(label, seed))
            },
            Field::Submodel(factory) => {
                node.register_submodel(key.clone(), factory)?;
                Slot::Data(store.observable(label, Value::Null))
            },
            Field::Action(f) => Slot::Action(f),
            Field::Method(f) => Slot::Method(f),
        };
        trace!(node = %node.id(), %key, %kind, "Field installed");
        instance.install(key, slot)?;
    }
    Ok(())
}
